use crate::attributes::{named_fields, ContainerAttributes, ModelField};
use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;
use syn::spanned::Spanned;
use syn::{DataEnum, DataStruct, DeriveInput, Fields, Result};

pub(crate) fn generate_convertible_for_struct(ast: &DeriveInput, data: &DataStruct) -> Result<TokenStream> {
    let attributes = ContainerAttributes::parse(ast)?;
    let fields = named_fields(&data.fields, &attributes.ignored, ast.ident.span())?;

    let name = &ast.ident;
    let type_name = name.to_string();
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let puts: Vec<TokenStream> = fields
        .iter()
        .filter(|field| !field.skip)
        .map(|field| {
            let ident = field.ident;
            field_put(field, quote! { &self.#ident })
        })
        .collect();
    let initializers: Vec<TokenStream> = fields
        .iter()
        .map(|field| field_initializer(field, quote! { doc }))
        .collect();

    Ok(quote! {
        impl #impl_generics docquery::common::Convertible for #name #ty_generics #where_clause {
            type Output = Self;

            fn to_value(&self) -> docquery::errors::QueryResult<docquery::common::Value> {
                #[allow(unused_mut)]
                let mut doc = docquery::collection::Document::new();
                #(#puts)*
                Ok(docquery::common::Value::Document(doc))
            }

            fn from_value(value: &docquery::common::Value) -> docquery::errors::QueryResult<Self::Output> {
                match value {
                    docquery::common::Value::Document(doc) => Ok(#name {
                        #(#initializers,)*
                    }),
                    _ => Err(docquery::errors::QueryError::new(
                        &format!("Value of type {} is not a {} document", value.type_name(), #type_name),
                        docquery::errors::ErrorKind::ObjectMappingError,
                    )),
                }
            }
        }
    })
}

/// Unit variants are stored as their name. Variants carrying data are stored as
/// `{"variant": name, "value": ...}` with a document for named fields and an
/// array for positional ones.
pub(crate) fn generate_convertible_for_enum(ast: &DeriveInput, data: &DataEnum) -> Result<TokenStream> {
    let attributes = ContainerAttributes::parse(ast)?;
    let name = &ast.ident;
    let type_name = name.to_string();
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let mut to_value_arms = Vec::with_capacity(data.variants.len());
    let mut unit_arms = Vec::new();
    let mut data_arms = Vec::new();

    for variant in &data.variants {
        let variant_ident = &variant.ident;
        let variant_name = variant_ident.to_string();

        match &variant.fields {
            Fields::Unit => {
                to_value_arms.push(quote! {
                    #name::#variant_ident => Ok(docquery::common::Value::String(#variant_name.to_string()))
                });
                unit_arms.push(quote! {
                    #variant_name => Ok(#name::#variant_ident)
                });
            }
            Fields::Named(_) => {
                let fields = named_fields(&variant.fields, &attributes.ignored, variant.span())?;
                let bound: Vec<&Ident> = fields
                    .iter()
                    .filter(|field| !field.skip)
                    .map(|field| field.ident)
                    .collect();
                let puts: Vec<TokenStream> = fields
                    .iter()
                    .filter(|field| !field.skip)
                    .map(|field| {
                        let ident = field.ident;
                        field_put(field, quote! { #ident })
                    })
                    .collect();
                let initializers: Vec<TokenStream> = fields
                    .iter()
                    .map(|field| field_initializer(field, quote! { data }))
                    .collect();

                to_value_arms.push(quote! {
                    #name::#variant_ident { #(#bound,)* .. } => {
                        #[allow(unused_mut)]
                        let mut doc = docquery::collection::Document::new();
                        #(#puts)*
                        tagged(#variant_name, docquery::common::Value::Document(doc))
                    }
                });
                data_arms.push(quote! {
                    #variant_name => match &payload {
                        docquery::common::Value::Document(data) => Ok(#name::#variant_ident {
                            #(#initializers,)*
                        }),
                        _ => Err(invalid(#variant_name)),
                    }
                });
            }
            Fields::Unnamed(unnamed) => {
                let count = unnamed.unnamed.len();
                let bindings: Vec<Ident> = (0..count)
                    .map(|i| Ident::new(&format!("field_{}", i), Span::call_site()))
                    .collect();
                let types: Vec<&syn::Type> = unnamed.unnamed.iter().map(|f| &f.ty).collect();
                let indices: Vec<usize> = (0..count).collect();

                to_value_arms.push(quote! {
                    #name::#variant_ident(#(#bindings),*) => {
                        let items = vec![#(docquery::common::Convertible::to_value(#bindings)?),*];
                        tagged(#variant_name, docquery::common::Value::Array(items))
                    }
                });
                data_arms.push(quote! {
                    #variant_name => match &payload {
                        docquery::common::Value::Array(items) if items.len() == #count => {
                            Ok(#name::#variant_ident(
                                #(docquery::common::from_value::<#types>(&items[#indices])?,)*
                            ))
                        }
                        _ => Err(invalid(#variant_name)),
                    }
                });
            }
        }
    }

    Ok(quote! {
        impl #impl_generics docquery::common::Convertible for #name #ty_generics #where_clause {
            type Output = Self;

            fn to_value(&self) -> docquery::errors::QueryResult<docquery::common::Value> {
                #[allow(dead_code)]
                fn tagged(
                    variant: &str,
                    payload: docquery::common::Value,
                ) -> docquery::errors::QueryResult<docquery::common::Value> {
                    let mut doc = docquery::collection::Document::new();
                    doc.put("variant", variant)?;
                    doc.put("value", payload)?;
                    Ok(docquery::common::Value::Document(doc))
                }

                match self {
                    #(#to_value_arms,)*
                }
            }

            fn from_value(value: &docquery::common::Value) -> docquery::errors::QueryResult<Self::Output> {
                #[allow(dead_code)]
                fn invalid(variant: &str) -> docquery::errors::QueryError {
                    docquery::errors::QueryError::new(
                        &format!("Value is not a valid {}::{}", #type_name, variant),
                        docquery::errors::ErrorKind::ObjectMappingError,
                    )
                }

                match value {
                    docquery::common::Value::String(variant) => match variant.as_str() {
                        #(#unit_arms,)*
                        other => Err(invalid(other)),
                    },
                    docquery::common::Value::Document(doc) => {
                        let variant = doc.get("variant")?;
                        #[allow(unused_variables)]
                        let payload = doc.get("value")?;
                        match variant.as_str().unwrap_or_default() {
                            #(#unit_arms,)*
                            #(#data_arms,)*
                            other => Err(invalid(other)),
                        }
                    }
                    _ => Err(docquery::errors::QueryError::new(
                        &format!("Value of type {} is not a {}", value.type_name(), #type_name),
                        docquery::errors::ErrorKind::ObjectMappingError,
                    )),
                }
            }
        }
    })
}

/// Emits `doc.put(key, value)`, guarded by a zero check for `omit_empty`
/// fields. `access` is a reference to the field value.
fn field_put(field: &ModelField, access: TokenStream) -> TokenStream {
    let key = &field.key;
    let put = quote! {
        doc.put(#key, docquery::common::Convertible::to_value(#access)?)?;
    };

    if field.omit_empty {
        let zero = zero_check(field, access);
        quote! {
            if !(#zero) {
                #put
            }
        }
    } else {
        put
    }
}

/// A missing or null key decodes to the field type's default.
fn field_initializer(field: &ModelField, source: TokenStream) -> TokenStream {
    let ident = field.ident;
    if field.skip {
        return quote! { #ident: ::core::default::Default::default() };
    }

    let key = &field.key;
    let ty = field.ty;
    quote! {
        #ident: match #source.get(#key)? {
            docquery::common::Value::Null => ::core::default::Default::default(),
            field_value => docquery::common::from_value::<#ty>(&field_value)?,
        }
    }
}

/// Zero check of a field; `access` is a reference to the field value.
pub(crate) fn zero_check(field: &ModelField, access: TokenStream) -> TokenStream {
    if field.leaf {
        quote! { docquery::projection::is_zero_value(#access) }
    } else {
        quote! { docquery::projection::FieldKind::is_zero(#access) }
    }
}
