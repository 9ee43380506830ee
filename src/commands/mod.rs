//! CLI command handlers.
//!
//! Each submodule handles a specific CLI command:
//! - `package` - Build the deployment archive
//! - `preflight` - Check host tools and project files
//! - `clean` - Remove packaging outputs
//! - `show` - Display information

mod clean;
mod package;
mod preflight;
mod show;

pub use clean::{cmd_clean, CleanTarget};
pub use package::cmd_package;
pub use preflight::cmd_preflight;
pub use show::{cmd_show, ShowTarget};
