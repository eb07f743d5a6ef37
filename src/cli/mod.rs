//! Command-line interface.

pub mod commands;
pub mod context;
pub mod output;
pub mod table;
pub mod types;

pub use context::AppContext;
pub use types::{Cli, Commands};

use console::style;

/// Report a command error and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "error": err.to_string(),
            "causes": err.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>(),
        });
        let rendered = serde_json::to_string_pretty(&body).unwrap_or_default();
        eprintln!("{rendered}");
    } else {
        eprintln!("{} {err}", style("Error:").red().bold());
        for cause in err.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
    }
    std::process::exit(1);
}
