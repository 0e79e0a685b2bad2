//! Terminal output helpers.

mod tables;

pub use tables::{print_separator, truncate_string, yes_no};
