use crate::commands::split::SplitOptions;
use crate::naming::CollisionPolicy;
use crate::pattern::KeyGroup;
use crate::pdf::text::TextEngine;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "keysplit")]
#[command(about = "Split a PDF into documents wherever a regex-captured key changes")]
#[command(version)]
pub struct Cli {
    /// Output verbose process info
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server
    Mcp,

    /// Split pages into documents that share the same regex match
    Split(SplitArgs),

    /// Show the key captured on each page
    Keys {
        /// Regex whose capture group is the split key
        pattern: String,

        /// PDF file to inspect
        path: PathBuf,

        /// Capture group holding the key (index or name)
        #[arg(short = 'g', long, default_value = "1")]
        key_group: KeyGroup,

        /// Case insensitive pattern
        #[arg(long)]
        ignore_case: bool,

        /// Text extraction backend
        #[arg(long, value_enum, default_value_t = TextEngine::Lopdf)]
        text_engine: TextEngine,
    },
}

#[derive(Args)]
pub struct SplitArgs {
    /// PDF file to split
    #[arg(short, long)]
    input: PathBuf,

    /// Existing directory to write the documents to
    #[arg(short, long)]
    output: PathBuf,

    /// Regex whose capture group is the split key
    #[arg(short = 'm', long = "matching-key-split", value_name = "REGEX")]
    pattern: Option<String>,

    /// Capture group holding the key (index or name)
    #[arg(short = 'g', long, default_value = "1")]
    key_group: KeyGroup,

    /// Case insensitive pattern (keys are still compared exactly)
    #[arg(long)]
    ignore_case: bool,

    /// Start output file names with today's date
    #[arg(short, long)]
    dated: bool,

    /// Show every regex match and group per page
    #[arg(short, long)]
    explicit: bool,

    /// What to do when a key repeats later in the document
    #[arg(long, value_enum, default_value_t = CollisionPolicy::Suffix)]
    on_collision: CollisionPolicy,

    /// Text extraction backend
    #[arg(long, value_enum, default_value_t = TextEngine::Lopdf)]
    text_engine: TextEngine,

    /// List the documents that would be written without writing them
    #[arg(long)]
    dry_run: bool,
}

impl From<SplitArgs> for SplitOptions {
    fn from(args: SplitArgs) -> Self {
        SplitOptions {
            input: args.input,
            output_dir: args.output,
            pattern: args.pattern,
            key_group: args.key_group,
            case_insensitive: args.ignore_case,
            dated: args.dated,
            explicit: args.explicit,
            on_collision: args.on_collision,
            text_engine: args.text_engine,
            dry_run: args.dry_run,
        }
    }
}
