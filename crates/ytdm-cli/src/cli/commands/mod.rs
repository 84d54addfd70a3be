//! CLI command handlers. Each command is in its own file.

mod config;
mod download;
mod options;

pub use config::run_config;
pub use download::run_download;
pub use options::run_options;
