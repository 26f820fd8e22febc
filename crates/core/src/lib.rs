pub mod dom;
pub mod form;

pub use dom::Document;
pub use form::{FieldValue, Form, FormConfig, FormError};

/// Parse an HTML string into a fillable document.
/// This is the primary entry point for formtree-core.
pub fn parse(html: &str) -> Document {
    Document::parse(html)
}
