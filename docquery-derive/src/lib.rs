//! # docquery derive macros
//!
//! ### `Convertible`
//!
//! Generates the conversion between a type and its `Value` form. Structs
//! become documents keyed by field name; decoding is lenient, so a key that is
//! missing or null decodes to the field type's `Default`.
//!
//! ### `Model`
//!
//! Generates the field descriptor the projection engine walks, the zero check
//! used when the model is nested inside another model, and the collection
//! name. A model derives both:
//!
//! ```rust,ignore
//! use docquery_derive::{Convertible, Model};
//!
//! #[derive(Default, Convertible, Model)]
//! #[model(name = "products")]
//! #[converter(ignored = "cache")]
//! pub struct Product {
//!     #[field(name = "_id", omit_empty)]
//!     pub id: Option<ObjectId>,
//!     pub name: String,
//!     #[field(name = "qty")]
//!     pub quantity: i32,
//!     pub address: Address,
//!     #[field(leaf)]
//!     pub status: Status,
//!     #[field(skip)]
//!     pub note: String,
//!     pub cache: Vec<u8>,
//! }
//! ```
//!
//! ## Field attributes
//!
//! - `name = "key"`: external key. `"key,omitempty"` also sets `omit_empty`,
//!   and `"-"` is the same as `skip`.
//! - `omit_empty`: the key is left out of the encoding when the value is zero.
//! - `skip`: never encoded, never projected, decoded as `Default`.
//! - `leaf`: stored whole by the projection engine. Needed for field types
//!   that do not implement `FieldKind`, such as enums and structs deriving only
//!   `Convertible`; such types must implement `Default` and `PartialEq`.

extern crate proc_macro;
mod attributes;
mod convertible;
mod model;

use crate::convertible::{generate_convertible_for_enum, generate_convertible_for_struct};
use crate::model::generate_model_for_struct;
use proc_macro::TokenStream;
use syn::{Data, DeriveInput};

/// Derives `docquery::common::Convertible` for a struct with named fields or
/// an enum.
#[proc_macro_derive(Convertible, attributes(converter, field))]
pub fn derive_convertible(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    let result = match ast.data {
        Data::Struct(ref data) => generate_convertible_for_struct(&ast, data),
        Data::Enum(ref data) => generate_convertible_for_enum(&ast, data),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &ast,
            "Cannot derive Convertible for unions. Only structs and enums are supported.",
        )),
    };

    match result {
        Ok(token_stream) => token_stream.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

/// Derives `Record`, `FieldKind` and `Model` for a struct with named fields.
///
/// The struct must also implement `Convertible`, normally through
/// `#[derive(Convertible)]`.
#[proc_macro_derive(Model, attributes(model, field, converter))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    let result = match ast.data {
        Data::Struct(ref data) => generate_model_for_struct(&ast, data),
        Data::Enum(_) => Err(syn::Error::new_spanned(
            &ast,
            "Cannot derive Model for enums. Mark enum fields with #[field(leaf)] instead.",
        )),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &ast,
            "Cannot derive Model for unions. Only structs are supported.",
        )),
    };

    match result {
        Ok(token_stream) => token_stream.into(),
        Err(e) => e.to_compile_error().into(),
    }
}
