mod json;
mod summary;

pub use json::write_report;
pub use summary::{format_summary, print_summary};
