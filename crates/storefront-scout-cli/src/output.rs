//! Stdout formatting. Logs go to stderr through tracing; only data lands here.

use serde::Serialize;

const RULE_WIDTH: usize = 60;

/// Print a banner line, a title, and a closing banner line.
pub fn section(title: &str) {
    let rule = "=".repeat(RULE_WIDTH);
    println!("\n{rule}\n{title}\n{rule}");
}

/// Pretty-print any serializable value.
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("  Error: failed to serialize output: {e}"),
    }
}
