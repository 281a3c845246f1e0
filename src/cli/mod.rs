//! Console interaction: validated prompts and filter collection.

pub mod filters;
pub mod prompt;
