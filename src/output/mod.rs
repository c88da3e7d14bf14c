//! Report formatters.
//!
//! - [`text::TextOutput`] for people (the default)
//! - [`json::JsonOutput`] for scripts (`--output json`)

pub mod json;
pub mod text;

pub use json::{JsonOutput, JsonOutputError};
pub use text::TextOutput;
