use crate::error::{ErrorContext, RemoteLockError};
use std::fmt::Write;

const BOLD_RED: &str = "\x1b[1;31m";
const DIM: &str = "\x1b[2m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

pub fn format_error_chain(error: &RemoteLockError) -> String {
    let context = ErrorContext::new(error);
    context.to_string()
}

/// Same layout as [`format_error_chain`], styled with ANSI escapes when
/// `use_color` is set.
pub fn format_error_with_color(error: &RemoteLockError, use_color: bool) -> String {
    if !use_color {
        return format_error_chain(error);
    }

    let context = ErrorContext::new(error);
    let mut output = format!("{BOLD_RED}Error:{RESET} {error}");
    if let Some(details) = &context.details {
        let _ = write!(output, "\n\nDetails: {DIM}{details}{RESET}");
    }
    if let Some(suggestion) = &context.suggestion {
        let _ = write!(output, "\n\n{YELLOW}Suggestion:{RESET} {suggestion}");
    }
    output
}
