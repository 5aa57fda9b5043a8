//! Model derive macro implementation

use crate::attrs::{field_attr, struct_attr};
use crate::table::{check_table_name, table_def_expr};
use heck::ToShoutySnakeCase;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Model can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Model can only be derived for structs",
            ));
        }
    };

    let attr = struct_attr(&input)?;
    let table_impl = match (&attr.table, &attr.table_of) {
        (Some(_), Some(path)) => {
            return Err(syn::Error::new_spanned(
                path,
                "ambiguous table: use either `table` or `table_of`, not both",
            ));
        }
        (None, None) => {
            return Err(syn::Error::new_spanned(
                &input,
                "Model requires #[sq(table = \"table_name\")] or #[sq(table_of = TableType)]",
            ));
        }
        (None, Some(path)) => {
            if attr.has_conventions() {
                return Err(syn::Error::new_spanned(
                    path,
                    "soft_delete/timestamps come from the `table_of` type; declare them there",
                ));
            }
            quote! { <#path as ::pgsq::DescribesTable>::table() }
        }
        (Some(table), None) => {
            check_table_name(table)?;
            let table_def = table_def_expr(table, &attr);
            quote! {
                static TABLE: ::pgsq::TableDef = #table_def;
                &TABLE
            }
        }
    };

    let mut column_defs = Vec::new();
    let mut decoders = Vec::new();
    let mut values = Vec::new();
    let mut consts = Vec::new();
    let mut pk_count = 0usize;

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let fa = field_attr(field)?;

        if fa.skip {
            if fa.pk || fa.generated || fa.column.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "`skip` cannot be combined with other sq attributes",
                ));
            }
            decoders.push(quote! { #ident: ::core::default::Default::default() });
            continue;
        }

        let column = fa.column.unwrap_or_else(|| ident.to_string());
        if column.is_empty() {
            return Err(syn::Error::new_spanned(field, "column name must not be empty"));
        }

        let mut def = quote! { ::pgsq::ColumnDef::new(#column) };
        if fa.pk {
            pk_count += 1;
            def = quote! { #def.primary_key() };
        }
        if fa.generated {
            def = quote! { #def.generated() };
        }
        column_defs.push(def);

        decoders.push(quote! { #ident: row.get_or_default(#column)? });
        values.push(quote! { ::pgsq::Param::new(::core::clone::Clone::clone(&self.#ident)) });

        let const_name = format_ident!("COL_{}", ident.to_string().to_shouty_snake_case());
        consts.push(quote! {
            pub const #const_name: ::pgsq::Column = ::pgsq::Column::new(#column);
        });
    }

    if pk_count > 1 {
        return Err(syn::Error::new_spanned(
            &input,
            "only one field can be marked #[sq(pk)]",
        ));
    }
    if column_defs.is_empty() {
        return Err(syn::Error::new_spanned(&input, "Model maps no columns"));
    }
    let column_count = column_defs.len();

    Ok(quote! {
        impl #impl_generics ::pgsq::DescribesTable for #name #ty_generics #where_clause {
            fn table() -> &'static ::pgsq::TableDef {
                #table_impl
            }
        }

        impl #impl_generics ::pgsq::Model for #name #ty_generics #where_clause {
            fn columns() -> &'static [::pgsq::ColumnDef] {
                static COLUMNS: [::pgsq::ColumnDef; #column_count] = [#(#column_defs),*];
                &COLUMNS
            }

            fn decode(row: &::pgsq::RowView<'_>) -> ::pgsq::OrmResult<Self> {
                Ok(Self {
                    #(#decoders),*
                })
            }

            fn values(&self) -> ::std::vec::Vec<::pgsq::Param> {
                ::std::vec![#(#values),*]
            }
        }

        impl #impl_generics ::pgsq::FromRow for #name #ty_generics #where_clause {
            fn from_row(row: &::pgsq::tokio_postgres::Row) -> ::pgsq::OrmResult<Self> {
                <Self as ::pgsq::Model>::decode(&::pgsq::RowView::new(row))
            }
        }

        impl #impl_generics #name #ty_generics #where_clause {
            #(#consts)*
        }
    })
}
