//! Placeholder templates for generated product names and descriptions.
//!
//! A template is free text with `&Key` placeholders (`Key` is `[A-Za-z]+`).
//! Keys are matched case-insensitively and a placeholder must end at a word
//! boundary. Every operation here is total: malformed templates render as
//! literal text.

pub mod context;
pub mod template;

pub use context::GenerationContext;
pub use template::{
    Template, active_placeholders, contains_placeholder, insert_placeholder, placeholder,
    remove_placeholder, render,
};
