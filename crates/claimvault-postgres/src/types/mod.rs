//! Database enum types shared across models and queries.

mod document_kind;

pub use document_kind::DocumentKind;
