//! Command implementations for the CLI.

mod alias;
mod battery;
mod config;
mod info;
mod scan;

pub use alias::cmd_alias;
pub use battery::cmd_battery;
pub use config::cmd_config;
pub use info::cmd_info;
pub use scan::cmd_scan;
