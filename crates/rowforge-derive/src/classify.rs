// Maps field types onto declared types by looking at their syntax.
use quote::ToTokens;
use rowforge_compiler::DeclaredType;
use syn::{GenericArgument, PathArguments, Type, TypePath};

/// Type text without the spaces `ToTokens` puts between tokens.
pub fn type_text(ty: &Type) -> String {
    ty.to_token_stream().to_string().replace(' ', "")
}

/// The single generic argument of the last path segment, if it has exactly one.
pub fn single_argument(path: &TypePath) -> Option<&Type> {
    let segment = path.path.segments.last()?;
    match &segment.arguments {
        PathArguments::AngleBracketed(args) if args.args.len() == 1 => match &args.args[0] {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

fn last_ident(path: &TypePath) -> Option<String> {
    if path.qself.is_some() {
        return None;
    }
    path.path.segments.last().map(|s| s.ident.to_string())
}

fn is_ident(ty: &Type, ident: &str) -> bool {
    match ty {
        Type::Path(path) => last_ident(path).as_deref() == Some(ident),
        _ => false,
    }
}

fn strip_groups(ty: &Type) -> &Type {
    match ty {
        Type::Group(group) => strip_groups(&group.elem),
        Type::Paren(paren) => strip_groups(&paren.elem),
        other => other,
    }
}

/// Splits `Option<T>` into `(T, true)`; anything else is `(ty, false)`.
pub fn unwrap_option(ty: &Type) -> (&Type, bool) {
    let ty = strip_groups(ty);
    if let Type::Path(path) = ty {
        if last_ident(path).as_deref() == Some("Option") {
            if let Some(inner) = single_argument(path) {
                return (strip_groups(inner), true);
            }
        }
    }
    (ty, false)
}

/// The element type of `Vec<T>`, or the type itself.
pub fn collection_element(ty: &Type) -> &Type {
    if let Type::Path(path) = ty {
        if last_ident(path).as_deref() == Some("Vec") {
            if let Some(inner) = single_argument(path) {
                return inner;
            }
        }
    }
    ty
}

/// Declared type of a non-optional, non-relation field.
pub fn classify(ty: &Type) -> DeclaredType {
    let ty = strip_groups(ty);
    let Type::Path(path) = ty else {
        return DeclaredType::Unsupported(type_text(ty));
    };
    let Some(ident) = last_ident(path) else {
        return DeclaredType::Unsupported(type_text(ty));
    };
    match ident.as_str() {
        "i8" => DeclaredType::Int8,
        "i16" => DeclaredType::Int16,
        "i32" => DeclaredType::Int32,
        "i64" => DeclaredType::Int64,
        "u8" => DeclaredType::UInt8,
        "u16" => DeclaredType::UInt16,
        "u32" => DeclaredType::UInt32,
        "bool" => DeclaredType::Boolean,
        "f32" => DeclaredType::Float32,
        "f64" => DeclaredType::Float64,
        "char" => DeclaredType::Char,
        "String" => DeclaredType::Text,
        // no lossless INTEGER representation
        "u64" | "u128" | "i128" | "usize" | "isize" | "Option" => {
            DeclaredType::Unsupported(type_text(ty))
        }
        "DateTime" => match single_argument(path) {
            Some(tz) if is_ident(tz, "Utc") => DeclaredType::DateTime,
            _ => DeclaredType::Unsupported(type_text(ty)),
        },
        "Vec" => match single_argument(path) {
            Some(inner) if is_ident(inner, "u8") => DeclaredType::Bytes,
            _ => DeclaredType::Object(type_text(ty)),
        },
        _ => DeclaredType::Object(type_text(ty)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn primitives() {
        assert_eq!(classify(&parse_quote!(i8)), DeclaredType::Int8);
        assert_eq!(classify(&parse_quote!(i64)), DeclaredType::Int64);
        assert_eq!(classify(&parse_quote!(u32)), DeclaredType::UInt32);
        assert_eq!(classify(&parse_quote!(bool)), DeclaredType::Boolean);
        assert_eq!(classify(&parse_quote!(f32)), DeclaredType::Float32);
        assert_eq!(classify(&parse_quote!(String)), DeclaredType::Text);
        assert_eq!(classify(&parse_quote!(std::string::String)), DeclaredType::Text);
        assert_eq!(classify(&parse_quote!(char)), DeclaredType::Char);
    }

    #[test]
    fn dates_and_bytes() {
        assert_eq!(classify(&parse_quote!(DateTime<Utc>)), DeclaredType::DateTime);
        assert_eq!(classify(&parse_quote!(chrono::DateTime<chrono::Utc>)), DeclaredType::DateTime);
        assert_eq!(classify(&parse_quote!(Vec<u8>)), DeclaredType::Bytes);
        assert_eq!(
            classify(&parse_quote!(DateTime<Local>)),
            DeclaredType::Unsupported("DateTime<Local>".into())
        );
    }

    #[test]
    fn everything_else_is_opaque() {
        assert_eq!(
            classify(&parse_quote!(CustomType)),
            DeclaredType::Object("CustomType".into())
        );
        assert_eq!(
            classify(&parse_quote!(Vec<String>)),
            DeclaredType::Object("Vec<String>".into())
        );
        assert_eq!(
            classify(&parse_quote!(HashMap<String, i32>)),
            DeclaredType::Object("HashMap<String,i32>".into())
        );
    }

    #[test]
    fn unmappable_types() {
        assert_eq!(classify(&parse_quote!(u64)), DeclaredType::Unsupported("u64".into()));
        assert_eq!(
            classify(&parse_quote!((i32, i32))),
            DeclaredType::Unsupported("(i32,i32)".into())
        );
        assert!(matches!(classify(&parse_quote!(&'static str)), DeclaredType::Unsupported(_)));
        assert!(matches!(classify(&parse_quote!([u8; 4])), DeclaredType::Unsupported(_)));
    }

    #[test]
    fn options_are_nullable() {
        let ty: Type = parse_quote!(Option<i32>);
        let (inner, nullable) = unwrap_option(&ty);
        assert!(nullable);
        assert_eq!(classify(inner), DeclaredType::Int32);
        let nested: Type = parse_quote!(Option<Option<i32>>);
        let (inner, _) = unwrap_option(&nested);
        assert!(matches!(classify(inner), DeclaredType::Unsupported(_)));
    }

    #[test]
    fn collections_expose_their_element() {
        let ty: Type = parse_quote!(Vec<Chapter>);
        assert_eq!(type_text(collection_element(&ty)), "Chapter");
    }
}
