//! Forest renderers: structured document, annotated markup, console tree.
//!
//! All renderers are pure functions of the forest (plus the timestamp for
//! markup); identical forests produce byte-identical output.

pub mod console;
pub mod document;
pub mod markup;

pub use console::ForestConvert;
pub use document::{to_structured_document, Document};
pub use markup::{escape_html, utc_offset_from_minutes, MarkupOptions, TreeRenderer};

