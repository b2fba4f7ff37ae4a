use crate::attributes::{named_fields, ContainerAttributes};
use crate::convertible::zero_check;
use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{DataStruct, DeriveInput, Result};

pub(crate) fn generate_model_for_struct(ast: &DeriveInput, data: &DataStruct) -> Result<TokenStream> {
    let attributes = ContainerAttributes::parse(ast)?;
    let fields = named_fields(&data.fields, &attributes.ignored, ast.ident.span())?;

    let name = &ast.ident;
    let model_name = attributes
        .model_name
        .unwrap_or_else(|| name.unraw().to_string());
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let projected: Vec<_> = fields.iter().filter(|field| !field.skip).collect();

    let descriptors: Vec<TokenStream> = projected
        .iter()
        .map(|field| {
            let key = &field.key;
            let ident = field.ident;
            if field.leaf {
                quote! { docquery::projection::FieldDescriptor::leaf(#key, &self.#ident) }
            } else {
                quote! { docquery::projection::FieldDescriptor::of(#key, &self.#ident) }
            }
        })
        .collect();

    let zero_checks: Vec<TokenStream> = projected
        .iter()
        .map(|field| {
            let ident = field.ident;
            zero_check(field, quote! { &self.#ident })
        })
        .collect();

    Ok(quote! {
        impl #impl_generics docquery::projection::Record for #name #ty_generics #where_clause {
            fn field_descriptors(&self) -> ::std::vec::Vec<docquery::projection::FieldDescriptor<'_>> {
                ::std::vec![#(#descriptors),*]
            }
        }

        impl #impl_generics docquery::projection::FieldKind for #name #ty_generics #where_clause {
            fn is_zero(&self) -> bool {
                true #(&& #zero_checks)*
            }

            fn shape(&self) -> docquery::projection::FieldShape<'_> {
                docquery::projection::FieldShape::Record(self)
            }
        }

        impl #impl_generics docquery::querier::Model for #name #ty_generics #where_clause {
            fn model_name() -> &'static str {
                #model_name
            }
        }
    })
}
