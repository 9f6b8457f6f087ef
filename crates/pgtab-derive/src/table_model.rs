//! TableModel derive macro implementation

mod attrs;

use crate::common::syn_types::{option_inner, scalar_sql_type};
use attrs::{get_field_attr, get_table_name};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

/// How a field travels through the codec.
enum Storage {
    /// Natively encoded scalar, converted with `From`/`FromValue`.
    Scalar,
    /// Tagged object; `optional` when the field is `Option<T>`.
    Object { inner: syn::Type, optional: bool },
}

struct ColumnField {
    ident: syn::Ident,
    ty: syn::Type,
    column: String,
    sql_type: String,
    modifiers: Vec<String>,
    storage: Storage,
}

fn analyze_field(field: &syn::Field) -> Result<ColumnField> {
    let ident = field
        .ident
        .clone()
        .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
    let attr = get_field_attr(field)?;

    let (optional, value_ty) = match option_inner(&field.ty) {
        Some(inner) => (true, inner),
        None => (false, &field.ty),
    };
    let scalar = if attr.is_object {
        None
    } else {
        scalar_sql_type(value_ty)
    };

    let storage = match scalar {
        Some(_) => Storage::Scalar,
        None => Storage::Object {
            inner: value_ty.clone(),
            optional,
        },
    };

    // One space-joined modifier: separate modifiers render comma-separated DDL.
    let mut parts = attr.modifiers;
    if attr.is_id {
        parts.insert(0, "PRIMARY KEY".to_string());
    }
    let modifiers: Vec<String> = if parts.is_empty() {
        Vec::new()
    } else {
        vec![parts.join(" ")]
    };

    Ok(ColumnField {
        column: attr.column.unwrap_or_else(|| ident.to_string()),
        sql_type: attr
            .sql_type
            .unwrap_or_else(|| scalar.unwrap_or("TEXT").to_string()),
        modifiers,
        storage,
        ty: field.ty.clone(),
        ident,
    })
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "TableModel can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "TableModel can only be derived for structs",
            ));
        }
    };
    if fields.is_empty() {
        return Err(syn::Error::new_spanned(
            &input,
            "TableModel needs at least one field",
        ));
    }

    let table_name = get_table_name(&input)?;
    let columns = fields
        .iter()
        .map(analyze_field)
        .collect::<Result<Vec<_>>>()?;

    let column_defs = columns.iter().map(|c| {
        let column = &c.column;
        let sql_type = &c.sql_type;
        let modifiers = &c.modifiers;
        quote! {
            ::pgtab::Column::new(#column, #sql_type)#(.modifier(#modifiers))*
        }
    });

    let to_values = columns.iter().map(|c| {
        let ident = &c.ident;
        match &c.storage {
            Storage::Scalar => quote! {
                ::pgtab::Value::from(::core::clone::Clone::clone(&self.#ident))
            },
            Storage::Object { optional: false, .. } => quote! {
                ::pgtab::Value::object(::core::clone::Clone::clone(&self.#ident))
            },
            Storage::Object { optional: true, .. } => quote! {
                match &self.#ident {
                    ::core::option::Option::Some(v) => {
                        ::pgtab::Value::object(::core::clone::Clone::clone(v))
                    }
                    ::core::option::Option::None => ::pgtab::Value::Null,
                }
            },
        }
    });

    let from_record = columns.iter().enumerate().map(|(index, c)| {
        let ident = &c.ident;
        let ty = &c.ty;
        match &c.storage {
            Storage::Scalar => quote! {
                #ident: record.take::<#ty>(#index)?
            },
            Storage::Object {
                inner,
                optional: false,
            } => quote! {
                #ident: record.get_object::<#inner>(#index)?
            },
            Storage::Object {
                inner,
                optional: true,
            } => quote! {
                #ident: record.get_object_opt::<#inner>(#index)?
            },
        }
    });

    let registrations = columns.iter().filter_map(|c| match &c.storage {
        Storage::Object { inner, .. } => Some(quote! {
            registry.register::<#inner>();
        }),
        Storage::Scalar => None,
    });

    let expected = columns.len();

    Ok(quote! {
        impl #impl_generics ::pgtab::model::TableModel for #name #ty_generics #where_clause {
            const TABLE: &'static str = #table_name;

            fn columns() -> ::std::vec::Vec<::pgtab::Column> {
                ::std::vec![#(#column_defs),*]
            }

            fn to_values(&self) -> ::std::vec::Vec<::pgtab::Value> {
                ::std::vec![#(#to_values),*]
            }

            #[allow(unused_mut)]
            fn from_record(mut record: ::pgtab::Record) -> ::pgtab::TabResult<Self> {
                if record.len() != #expected {
                    return ::core::result::Result::Err(
                        ::pgtab::TabError::mismatch(#expected, record.len()),
                    );
                }
                ::core::result::Result::Ok(Self {
                    #(#from_record),*
                })
            }

            fn register_types(registry: &mut ::pgtab::TypeRegistry) {
                let _ = &registry;
                #(#registrations)*
            }
        }
    })
}
