//! Type helper utilities for syn type analysis.

/// Extract the inner type T from Option<T>, or return None if not an Option type.
///
/// Recognizes `Option<T>`, `std::option::Option<T>`, and `core::option::Option<T>`.
pub fn option_inner(ty: &syn::Type) -> Option<&syn::Type> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    let seg = type_path.path.segments.last()?;
    if seg.ident != "Option" {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    let syn::GenericArgument::Type(inner) = args.args.first()? else {
        return None;
    };
    Some(inner)
}

/// Default column type for a field type the codec stores natively.
///
/// Returns `None` for anything else; such fields are stored as tagged objects.
pub fn scalar_sql_type(ty: &syn::Type) -> Option<&'static str> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    if type_path.qself.is_some() {
        return None;
    }
    let seg = type_path.path.segments.last()?;
    if !seg.arguments.is_none() {
        return None;
    }

    let is_json = seg.ident == "Value"
        && type_path
            .path
            .segments
            .iter()
            .any(|s| s.ident == "serde_json");

    match seg.ident.to_string().as_str() {
        "bool" => Some("BOOLEAN"),
        "i8" | "i16" => Some("SMALLINT"),
        "i32" => Some("INTEGER"),
        "i64" => Some("BIGINT"),
        "f32" => Some("REAL"),
        "f64" => Some("DOUBLE PRECISION"),
        "String" => Some("TEXT"),
        "Value" if is_json => Some("JSONB"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_option_inner() {
        let ty: syn::Type = parse_quote!(Option<String>);
        assert!(option_inner(&ty).is_some());

        let ty: syn::Type = parse_quote!(std::option::Option<i32>);
        assert!(option_inner(&ty).is_some());

        let ty: syn::Type = parse_quote!(String);
        assert!(option_inner(&ty).is_none());

        let ty: syn::Type = parse_quote!(Vec<String>);
        assert!(option_inner(&ty).is_none());
    }

    #[test]
    fn test_scalar_sql_type() {
        let ty: syn::Type = parse_quote!(i32);
        assert_eq!(scalar_sql_type(&ty), Some("INTEGER"));

        let ty: syn::Type = parse_quote!(std::string::String);
        assert_eq!(scalar_sql_type(&ty), Some("TEXT"));

        let ty: syn::Type = parse_quote!(f64);
        assert_eq!(scalar_sql_type(&ty), Some("DOUBLE PRECISION"));

        let ty: syn::Type = parse_quote!(serde_json::Value);
        assert_eq!(scalar_sql_type(&ty), Some("JSONB"));

        // Structured types are stored as objects
        let ty: syn::Type = parse_quote!(Address);
        assert_eq!(scalar_sql_type(&ty), None);

        let ty: syn::Type = parse_quote!(Vec<i32>);
        assert_eq!(scalar_sql_type(&ty), None);

        let ty: syn::Type = parse_quote!(Value);
        assert_eq!(scalar_sql_type(&ty), None);

        let ty: syn::Type = parse_quote!(u32);
        assert_eq!(scalar_sql_type(&ty), None);
    }
}
