//! Output formats for a judgment.

pub mod json;
pub mod text;

pub use json::render_json;
pub use text::render_text;
