//! Parsing of struct-level and field-level `#[sq(...)]` attributes.

use syn::{DeriveInput, Result};

const DEFAULT_SOFT_DELETE: &str = "deleted_at";
const DEFAULT_CREATED_AT: &str = "created_at";
const DEFAULT_UPDATED_AT: &str = "updated_at";

/// Struct-level attributes.
///
/// Supports: `#[sq(table = "user", soft_delete, timestamps)]`,
/// `#[sq(soft_delete = "removed_at", created_at = "inserted_at")]` and
/// `#[sq(table_of = TableUser)]`.
#[derive(Default)]
pub(crate) struct StructAttr {
    pub table: Option<syn::LitStr>,
    pub table_of: Option<syn::Path>,
    pub soft_delete: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl StructAttr {
    pub fn has_conventions(&self) -> bool {
        self.soft_delete.is_some() || self.created_at.is_some() || self.updated_at.is_some()
    }

    fn merge(&mut self, other: StructAttr) {
        self.table = other.table.or(self.table.take());
        self.table_of = other.table_of.or(self.table_of.take());
        self.soft_delete = other.soft_delete.or(self.soft_delete.take());
        self.created_at = other.created_at.or(self.created_at.take());
        self.updated_at = other.updated_at.or(self.updated_at.take());
    }
}

impl syn::parse::Parse for StructAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = StructAttr::default();

        while !input.is_empty() {
            let key: syn::Ident = input.parse()?;
            let has_value = input.peek(syn::Token![=]);
            if has_value {
                let _: syn::Token![=] = input.parse()?;
            }

            match key.to_string().as_str() {
                "table" => {
                    require_value(&key, has_value)?;
                    attr.table = Some(input.parse()?);
                }
                "table_of" => {
                    require_value(&key, has_value)?;
                    attr.table_of = Some(input.parse()?);
                }
                "soft_delete" => {
                    attr.soft_delete = Some(optional_name(input, has_value, DEFAULT_SOFT_DELETE)?);
                }
                "created_at" => {
                    attr.created_at = Some(optional_name(input, has_value, DEFAULT_CREATED_AT)?);
                }
                "updated_at" => {
                    attr.updated_at = Some(optional_name(input, has_value, DEFAULT_UPDATED_AT)?);
                }
                "timestamps" => {
                    if has_value {
                        return Err(syn::Error::new_spanned(
                            &key,
                            "`timestamps` takes no value; use created_at = \"..\" / updated_at = \"..\"",
                        ));
                    }
                    attr.created_at = Some(DEFAULT_CREATED_AT.to_string());
                    attr.updated_at = Some(DEFAULT_UPDATED_AT.to_string());
                }
                _ => {
                    return Err(syn::Error::new_spanned(
                        &key,
                        format!("unknown sq attribute `{key}`"),
                    ));
                }
            }

            if input.is_empty() {
                break;
            }
            let _: syn::Token![,] = input.parse()?;
        }

        Ok(attr)
    }
}

fn require_value(key: &syn::Ident, has_value: bool) -> Result<()> {
    if has_value {
        Ok(())
    } else {
        Err(syn::Error::new_spanned(key, format!("`{key}` requires a value")))
    }
}

fn optional_name(input: syn::parse::ParseStream, has_value: bool, default: &str) -> Result<String> {
    if has_value {
        let lit: syn::LitStr = input.parse()?;
        Ok(lit.value())
    } else {
        Ok(default.to_string())
    }
}

/// Collect every struct-level `#[sq(...)]` attribute.
pub(crate) fn struct_attr(input: &DeriveInput) -> Result<StructAttr> {
    let mut attr = StructAttr::default();
    for a in &input.attrs {
        if a.path().is_ident("sq") {
            attr.merge(a.parse_args::<StructAttr>()?);
        }
    }
    Ok(attr)
}

/// Field-level attributes: `column = "..."`, `pk`, `generated`, `skip`.
#[derive(Default)]
pub(crate) struct FieldAttr {
    pub column: Option<String>,
    pub pk: bool,
    pub generated: bool,
    pub skip: bool,
}

impl syn::parse::Parse for FieldAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();

        while !input.is_empty() {
            let key: syn::Ident = input.parse()?;
            match key.to_string().as_str() {
                "column" => {
                    let _: syn::Token![=] = input.parse()?;
                    let lit: syn::LitStr = input.parse()?;
                    attr.column = Some(lit.value());
                }
                "pk" => attr.pk = true,
                "generated" => attr.generated = true,
                "skip" => attr.skip = true,
                _ => {
                    return Err(syn::Error::new_spanned(
                        &key,
                        format!("unknown sq field attribute `{key}`"),
                    ));
                }
            }

            if input.is_empty() {
                break;
            }
            let _: syn::Token![,] = input.parse()?;
        }

        Ok(attr)
    }
}

pub(crate) fn field_attr(field: &syn::Field) -> Result<FieldAttr> {
    let mut attr = FieldAttr::default();
    for a in &field.attrs {
        if a.path().is_ident("sq") {
            let parsed = a.parse_args::<FieldAttr>()?;
            attr.column = parsed.column.or(attr.column);
            attr.pk |= parsed.pk;
            attr.generated |= parsed.generated;
            attr.skip |= parsed.skip;
        }
    }
    Ok(attr)
}
