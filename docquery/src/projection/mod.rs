//! The projection engine: typed models to sparse, dotted-path documents.
//!
//! A model describes its fields through [Record], normally generated by
//! `#[derive(Model)]`. [project] walks those fields and keeps only the ones
//! the caller meaningfully set:
//!
//! 1. the model is encoded with its own `Convertible` impl, and a field whose
//!    key is missing from that encoding is skipped;
//! 2. a field equal to the zero value of its type is skipped;
//! 3. a nested record is projected recursively and its keys are prefixed
//!    with `field.`;
//! 4. any other field is stored whole under its key.
//!
//! The result is used as an equality filter or as the body of a `$set`
//! update. [cast] converts between two `Convertible` types through the same
//! intermediate form.

mod cast;
mod projector;
mod record;
mod sparse;

pub use cast::*;
pub use projector::*;
pub use record::*;
pub use sparse::SparseDocument;
