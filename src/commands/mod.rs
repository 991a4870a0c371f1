//! CLI command handlers.

mod archive;
mod config;
mod fetch;
mod filter;

pub use archive::run_archive_command;
pub use config::run_config_show_command;
pub use fetch::run_fetch_command;
pub use filter::run_filter_command;
