//! Output formatting utilities for the CLI.

use anyhow::{anyhow, Result};
use console::style;
use serde::Serialize;

use crate::domain::models::{Diagnostic, Outcome};

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        let rendered = serde_json::to_string_pretty(&result.to_json()).unwrap_or_default();
        println!("{rendered}");
    } else {
        println!("{}", result.to_human());
    }
}

/// Truncate a string to a maximum number of characters, appending "..." if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Unwrap an operation outcome at the command edge.
///
/// `Failed` becomes an error naming `what`; otherwise the value is returned
/// with any diagnostics so they can be shown alongside the result.
pub fn settle<T>(outcome: Outcome<T>, what: &str) -> Result<(T, Vec<Diagnostic>)> {
    match outcome.into_parts() {
        (Some(value), diagnostics) => Ok((value, diagnostics)),
        (None, diagnostics) => {
            let detail = diagnostics
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            Err(anyhow!("{what} failed: {detail}"))
        }
    }
}

/// Human rendering of degraded-operation diagnostics, empty when there are none.
pub fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    if diagnostics.is_empty() {
        return String::new();
    }
    let mut lines = vec![format!("\n{}", style("Warnings:").yellow().bold())];
    lines.extend(diagnostics.iter().map(|d| format!("  ! {d}")));
    lines.join("\n")
}
