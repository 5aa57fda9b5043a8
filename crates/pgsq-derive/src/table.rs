//! Table derive macro implementation

use crate::attrs::{StructAttr, struct_attr};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let attr = struct_attr(&input)?;
    if let Some(path) = &attr.table_of {
        return Err(syn::Error::new_spanned(
            path,
            "`table_of` is only valid on #[derive(Model)]",
        ));
    }
    let Some(table) = &attr.table else {
        return Err(syn::Error::new_spanned(
            &input,
            "Table requires #[sq(table = \"table_name\")]",
        ));
    };
    check_table_name(table)?;
    let table_def = table_def_expr(table, &attr);

    Ok(quote! {
        impl #impl_generics ::pgsq::DescribesTable for #name #ty_generics #where_clause {
            fn table() -> &'static ::pgsq::TableDef {
                static TABLE: ::pgsq::TableDef = #table_def;
                &TABLE
            }
        }

        impl #impl_generics #name #ty_generics #where_clause {
            pub const TABLE: &'static str = #table;
        }
    })
}

/// `TableDef::new(..)` followed by the configured convention setters.
pub(crate) fn table_def_expr(table: &syn::LitStr, attr: &StructAttr) -> TokenStream {
    let soft_delete = attr.soft_delete.iter();
    let created_at = attr.created_at.iter();
    let updated_at = attr.updated_at.iter();
    quote! {
        ::pgsq::TableDef::new(#table)
            #(.soft_delete(#soft_delete))*
            #(.created_at(#created_at))*
            #(.updated_at(#updated_at))*
    }
}

pub(crate) fn check_table_name(table: &syn::LitStr) -> Result<()> {
    let value = table.value();
    if value.is_empty() || value.contains('\0') {
        return Err(syn::Error::new_spanned(table, "invalid table name"));
    }
    Ok(())
}
