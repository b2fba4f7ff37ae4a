use proc_macro2::Span;
use syn::ext::IdentExt;
use syn::{DeriveInput, Field, Fields, Ident, LitStr, Result, Type};

/// Attributes placed on the struct or enum itself.
#[derive(Default)]
pub(crate) struct ContainerAttributes {
    /// Fields listed in `#[converter(ignored = "a, b")]`.
    pub(crate) ignored: Vec<String>,
    /// `#[model(name = "...")]`.
    pub(crate) model_name: Option<String>,
}

impl ContainerAttributes {
    pub(crate) fn parse(ast: &DeriveInput) -> Result<Self> {
        let mut attributes = ContainerAttributes::default();

        for attr in &ast.attrs {
            if attr.path().is_ident("converter") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("ignored") {
                        let s: LitStr = meta.value()?.parse()?;
                        attributes.ignored.extend(
                            s.value()
                                .split(',')
                                .map(|field| field.trim().to_string())
                                .filter(|field| !field.is_empty()),
                        );
                        Ok(())
                    } else {
                        Err(meta.error("expected `ignored = \"field, ...\"`"))
                    }
                })?;
            } else if attr.path().is_ident("model") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("name") {
                        let s: LitStr = meta.value()?.parse()?;
                        if s.value().trim().is_empty() {
                            return Err(syn::Error::new_spanned(&s, "model name must not be empty"));
                        }
                        attributes.model_name = Some(s.value().trim().to_string());
                        Ok(())
                    } else {
                        Err(meta.error("expected `name = \"...\"`"))
                    }
                })?;
            }
        }
        Ok(attributes)
    }
}

/// A named field together with its `#[field(...)]` settings.
pub(crate) struct ModelField<'a> {
    pub(crate) ident: &'a Ident,
    pub(crate) ty: &'a Type,
    /// External key the field is stored under.
    pub(crate) key: String,
    pub(crate) omit_empty: bool,
    pub(crate) skip: bool,
    pub(crate) leaf: bool,
}

impl<'a> ModelField<'a> {
    fn parse(field: &'a Field, ignored: &[String]) -> Result<Self> {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "field must be named"))?;
        let field_name = ident.unraw().to_string();

        let mut model_field = ModelField {
            ident,
            ty: &field.ty,
            key: field_name.clone(),
            omit_empty: false,
            skip: ignored.contains(&field_name),
            leaf: false,
        };

        for attr in &field.attrs {
            if !attr.path().is_ident("field") {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let s: LitStr = meta.value()?.parse()?;
                    model_field.apply_name(&s)
                } else if meta.path.is_ident("omit_empty") {
                    model_field.omit_empty = true;
                    Ok(())
                } else if meta.path.is_ident("skip") {
                    model_field.skip = true;
                    Ok(())
                } else if meta.path.is_ident("leaf") {
                    model_field.leaf = true;
                    Ok(())
                } else {
                    Err(meta.error("expected one of `name`, `omit_empty`, `skip`, `leaf`"))
                }
            })?;
        }
        Ok(model_field)
    }

    // "key,omitempty": the key comes before the first comma, modifiers after it
    fn apply_name(&mut self, s: &LitStr) -> Result<()> {
        let value = s.value();
        let mut parts = value.split(',').map(str::trim);

        let key = parts.next().unwrap_or_default();
        if key == "-" {
            self.skip = true;
        } else if !key.is_empty() {
            if key.contains('.') || key.starts_with('$') {
                return Err(syn::Error::new_spanned(
                    s,
                    "field key must not contain '.' or start with '$'",
                ));
            }
            self.key = key.to_string();
        }

        for modifier in parts {
            match modifier {
                "omitempty" | "omit_empty" => self.omit_empty = true,
                "" => {}
                other => {
                    return Err(syn::Error::new_spanned(
                        s,
                        format!("unknown field modifier '{}'", other),
                    ))
                }
            }
        }
        Ok(())
    }
}

/// Collects the named fields of a struct or struct-like variant.
pub(crate) fn named_fields<'a>(
    fields: &'a Fields,
    ignored: &[String],
    span: Span,
) -> Result<Vec<ModelField<'a>>> {
    let named = match fields {
        Fields::Named(named) => &named.named,
        _ => return Err(syn::Error::new(span, "only structs with named fields are supported")),
    };

    let fields = named
        .iter()
        .map(|field| ModelField::parse(field, ignored))
        .collect::<Result<Vec<ModelField>>>()?;

    let mut seen: Vec<&str> = Vec::with_capacity(fields.len());
    for field in fields.iter().filter(|field| !field.skip) {
        if seen.contains(&field.key.as_str()) {
            return Err(syn::Error::new_spanned(
                field.ident,
                format!("duplicate field key '{}'", field.key),
            ));
        }
        seen.push(&field.key);
    }
    Ok(fields)
}
