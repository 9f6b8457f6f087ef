//! Attribute parsing for the TableModel derive macro.
//!
//! Handles struct-level `#[orm(table = "...")]` and field-level
//! `#[orm(id, column = "...", sql_type = "...", modifiers = "...", object)]`.

use heck::ToSnakeCase;
use syn::{DeriveInput, Result};

/// Parsed field-level attributes.
#[derive(Default)]
pub(super) struct FieldAttr {
    pub is_id: bool,
    pub is_object: bool,
    pub column: Option<String>,
    pub sql_type: Option<String>,
    pub modifiers: Vec<String>,
}

impl syn::parse::Parse for FieldAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();

        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            if ident == "id" {
                attr.is_id = true;
            } else if ident == "object" {
                attr.is_object = true;
            } else {
                let _: syn::Token![=] = input.parse()?;
                let value: syn::LitStr = input.parse()?;
                if ident == "column" {
                    attr.column = Some(value.value());
                } else if ident == "sql_type" {
                    attr.sql_type = Some(value.value());
                } else if ident == "modifiers" {
                    attr.modifiers.extend(
                        value
                            .value()
                            .split(',')
                            .map(str::trim)
                            .filter(|m| !m.is_empty())
                            .map(str::to_string),
                    );
                } else {
                    return Err(syn::Error::new_spanned(
                        &ident,
                        format!("unknown orm attribute `{}`", ident),
                    ));
                }
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        if !input.is_empty() {
            return Err(input.error("expected `,` between orm attributes"));
        }
        Ok(attr)
    }
}

/// Merge every `#[orm(...)]` on a field.
pub(super) fn get_field_attr(field: &syn::Field) -> Result<FieldAttr> {
    let mut merged = FieldAttr::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        let parsed: FieldAttr = attr.parse_args()?;
        merged.is_id |= parsed.is_id;
        merged.is_object |= parsed.is_object;
        if parsed.column.is_some() {
            merged.column = parsed.column;
        }
        if parsed.sql_type.is_some() {
            merged.sql_type = parsed.sql_type;
        }
        merged.modifiers.extend(parsed.modifiers);
    }
    Ok(merged)
}

/// Table name from `#[orm(table = "...")]`, defaulting to the snake_case type name.
pub(super) fn get_table_name(input: &DeriveInput) -> Result<String> {
    for attr in &input.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        let nested = attr.parse_args::<syn::MetaNameValue>()?;
        if !nested.path.is_ident("table") {
            return Err(syn::Error::new_spanned(
                &nested.path,
                "expected #[orm(table = \"table_name\")]",
            ));
        }
        if let syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(lit),
            ..
        }) = &nested.value
        {
            return Ok(lit.value());
        }
        return Err(syn::Error::new_spanned(
            &nested.value,
            "table name must be a string literal",
        ));
    }
    Ok(input.ident.to_string().to_snake_case())
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_field_attr_flags_and_values() {
        let field: syn::Field = parse_quote! {
            #[orm(id, column = "user_id", modifiers = "NOT NULL, UNIQUE")]
            id: String
        };
        let attr = get_field_attr(&field).unwrap();
        assert!(attr.is_id);
        assert!(!attr.is_object);
        assert_eq!(attr.column.as_deref(), Some("user_id"));
        assert_eq!(attr.modifiers, vec!["NOT NULL", "UNIQUE"]);
    }

    #[test]
    fn test_field_attrs_merge() {
        let field: syn::Field = parse_quote! {
            #[orm(sql_type = "VARCHAR(64)")]
            #[orm(object)]
            tags: Vec<String>
        };
        let attr = get_field_attr(&field).unwrap();
        assert!(attr.is_object);
        assert_eq!(attr.sql_type.as_deref(), Some("VARCHAR(64)"));
    }

    #[test]
    fn test_unknown_field_attr_is_an_error() {
        let field: syn::Field = parse_quote! {
            #[orm(colum = "typo")]
            id: String
        };
        assert!(get_field_attr(&field).is_err());
    }

    #[test]
    fn test_table_name() {
        let input: DeriveInput = parse_quote! {
            #[orm(table = "people")]
            struct User { id: String }
        };
        assert_eq!(get_table_name(&input).unwrap(), "people");

        let input: DeriveInput = parse_quote! {
            struct UserAccount { id: String }
        };
        assert_eq!(get_table_name(&input).unwrap(), "user_account");
    }
}
