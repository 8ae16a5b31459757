use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};

use crate::commands::keys::page_keys;
use crate::commands::split::{split, SplitOptions};
use crate::naming::CollisionPolicy;
use crate::pattern::{KeyGroup, KeyPattern};
use crate::pdf::text::TextEngine;

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfSplitRequest {
    #[schemars(description = "Path to the PDF file to split")]
    pub path: String,
    #[schemars(description = "Existing directory to write the documents to")]
    pub output_dir: String,
    #[schemars(description = "Regular expression whose capture group is the split key")]
    pub pattern: String,
    #[schemars(description = "Capture group holding the key, index or name (default: 1)")]
    #[serde(default)]
    pub key_group: Option<String>,
    #[schemars(description = "Case insensitive pattern (default: false)")]
    #[serde(default)]
    pub case_insensitive: bool,
    #[schemars(description = "Prefix output names with today's date as YYYYMMDD_ (default: false)")]
    #[serde(default)]
    pub dated: bool,
    #[schemars(description = "What to do when a key repeats: suffix, fail or overwrite (default: suffix)")]
    #[serde(default)]
    pub on_collision: Option<String>,
    #[schemars(description = "Only report the documents that would be written (default: false)")]
    #[serde(default)]
    pub dry_run: bool,
    #[schemars(description = "Text extraction backend: lopdf or pdf-extract (default: lopdf)")]
    #[serde(default)]
    pub text_engine: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfPageKeysRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(description = "Regular expression whose capture group is the split key")]
    pub pattern: String,
    #[schemars(description = "Capture group holding the key, index or name (default: 1)")]
    #[serde(default)]
    pub key_group: Option<String>,
    #[schemars(description = "Case insensitive pattern (default: false)")]
    #[serde(default)]
    pub case_insensitive: bool,
    #[schemars(description = "Text extraction backend: lopdf or pdf-extract (default: lopdf)")]
    #[serde(default)]
    pub text_engine: Option<String>,
}

fn parse_group(group: Option<&str>) -> std::result::Result<KeyGroup, String> {
    group.map_or(Ok(KeyGroup::default()), |g| g.parse::<KeyGroup>())
}

fn parse_collision(policy: Option<&str>) -> std::result::Result<CollisionPolicy, String> {
    match policy {
        None => Ok(CollisionPolicy::default()),
        Some(p) => <CollisionPolicy as clap::ValueEnum>::from_str(p, true),
    }
}

fn parse_engine(engine: Option<&str>) -> std::result::Result<TextEngine, String> {
    match engine {
        None => Ok(TextEngine::default()),
        Some(e) => <TextEngine as clap::ValueEnum>::from_str(e, true),
    }
}

#[derive(Debug, Clone)]
pub struct PdfServer {
    tool_router: ToolRouter<Self>,
}

impl PdfServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl PdfServer {
    #[tool(description = "Split a PDF into separate documents wherever the key captured by a regex changes from one page to the next. Returns the written files with their page ranges.")]
    fn pdf_split_by_key(&self, Parameters(req): Parameters<PdfSplitRequest>) -> String {
        let key_group = match parse_group(req.key_group.as_deref()) {
            Ok(g) => g,
            Err(e) => return format!("Error: {}", e),
        };
        let on_collision = match parse_collision(req.on_collision.as_deref()) {
            Ok(p) => p,
            Err(e) => return format!("Error: {}", e),
        };
        let text_engine = match parse_engine(req.text_engine.as_deref()) {
            Ok(e) => e,
            Err(e) => return format!("Error: {}", e),
        };

        let options = SplitOptions {
            input: req.path.into(),
            output_dir: req.output_dir.into(),
            pattern: Some(req.pattern),
            key_group,
            case_insensitive: req.case_insensitive,
            dated: req.dated,
            on_collision,
            text_engine,
            dry_run: req.dry_run,
            ..Default::default()
        };

        match split(&options) {
            Ok(report) => {
                serde_json::to_string_pretty(&report).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Show the key a regex captures on every page of a PDF, to tune a split pattern without writing files")]
    fn pdf_page_keys(&self, Parameters(req): Parameters<PdfPageKeysRequest>) -> String {
        let key_group = match parse_group(req.key_group.as_deref()) {
            Ok(g) => g,
            Err(e) => return format!("Error: {}", e),
        };
        let text_engine = match parse_engine(req.text_engine.as_deref()) {
            Ok(e) => e,
            Err(e) => return format!("Error: {}", e),
        };
        let pattern = match KeyPattern::compile(&req.pattern, key_group, req.case_insensitive) {
            Ok(p) => p,
            Err(e) => return format!("Error: {}", e),
        };

        match page_keys(&req.path, &pattern, text_engine) {
            Ok(keys) => {
                let result: Vec<PageKeyResult> = keys
                    .into_iter()
                    .map(|k| PageKeyResult {
                        page: k.page,
                        key: k.key,
                    })
                    .collect();
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {}", e),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PageKeyResult {
    pub page: u32,
    pub key: Option<String>,
}

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Key-based PDF splitting. Use pdf_page_keys to check what a pattern captures on \
                 each page, then pdf_split_by_key to write one PDF per run of pages sharing a key."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = PdfServer::new();

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
