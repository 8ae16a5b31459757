pub mod keys;
pub mod split;
