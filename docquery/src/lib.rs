//! # docquery
//!
//! A typed data-access layer for document databases.
//!
//! Application models are plain structs deriving `Convertible` and `Model`
//! from `docquery_derive`. A [querier::Querier] turns partially populated
//! models into sparse filter and `$set` update documents through the
//! [projection] engine and runs them against a [store::DocumentStore]:
//!
//! - fields left at their zero value are not part of the query,
//! - nested models are flattened into dotted paths (`address.city`),
//! - `*_by_filter` variants accept a hand built [projection::SparseDocument]
//!   for the cases a zero value must be matched or written.
//!
//! The crate ships an in-memory store selected by the `memory://` scheme:
//!
//! ```rust
//! use docquery::{doc, sparse, Adapter};
//!
//! let adapter = Adapter::builder().uri("memory://").connect().unwrap();
//! let products = adapter.collection("products").unwrap();
//! products.insert_one(doc! { name: "Widget", address: { city: "Rome" } }).unwrap();
//! assert_eq!(products.count_documents(&sparse! { "address.city" => "Rome" }).unwrap(), 1);
//! ```

pub mod adapter;
pub mod adapter_builder;
pub mod adapter_config;
pub mod collection;
pub mod common;
pub mod errors;
pub mod projection;
pub mod querier;
pub mod store;

pub use adapter::*;
pub use adapter_builder::*;
pub use adapter_config::*;
