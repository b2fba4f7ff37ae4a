//! Documents, identifiers and the option types of store operations.
//!
//! A [Document] is the nested key/value record the store keeps. Nested fields
//! are addressed with dotted paths:
//!
//! ```rust
//! use docquery::collection::Document;
//!
//! let mut doc = Document::new();
//! doc.put("name", "Alice").unwrap();
//! doc.put("address.city", "Rome").unwrap();
//! assert_eq!(doc.fields().len(), 2);
//! ```

mod document;
mod find_options;
mod object_id;
mod update_options;

pub use document::*;
pub use find_options::*;
pub use object_id::*;
pub use update_options::*;
