//! Typed CRUD access to collections.

mod model;
mod querier;

pub use model::*;
pub use querier::*;
