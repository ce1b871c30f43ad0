//! Command handlers for ctrlcmd CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod analyze;
pub mod classes;
pub mod configure;
pub mod generate;

/// Escape a string for CSV output
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
