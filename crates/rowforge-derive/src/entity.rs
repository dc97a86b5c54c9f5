use proc_macro2::{Span, TokenStream};
use quote::ToTokens;
use rowforge_compiler::{
    compile, render_adapter, ColumnDescriptor, DeclaredType, SchemaError, SchemaModel,
};
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Error, Field, Fields, Ident};

use crate::attrs::{field_attrs, struct_attrs, FieldAttrs};
use crate::classify::{classify, collection_element, type_text, unwrap_option};

// derive_entity
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };
    match expand(&input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

struct MappedField<'a> {
    field: &'a Field,
    column: ColumnDescriptor,
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "Entity cannot be derived for generic structs",
        ));
    }
    let named = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            other => {
                return Err(Error::new_spanned(
                    other,
                    "Entity can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(Error::new_spanned(
                &input.ident,
                "Entity can only be derived for structs with named fields",
            ));
        }
    };

    let struct_attrs = struct_attrs(&input.attrs)?;
    let mut identity: Option<&Ident> = None;
    let mut fallback_identity: Option<(&Field, FieldAttrs)> = None;
    let mut mapped = Vec::new();

    for field in named {
        let Some(ident) = field.ident.as_ref() else {
            return Err(Error::new_spanned(field, "expected a named field"));
        };
        let attrs = field_attrs(&field.attrs)?;
        if attrs.id {
            if identity.is_some() {
                return Err(Error::new_spanned(field, "only one field can be the identity"));
            }
            check_identity(field, &attrs)?;
            identity = Some(ident);
            continue;
        }
        if attrs.one_to_one && attrs.one_to_many {
            return Err(Error::new_spanned(
                field,
                "a field cannot be both one_to_one and one_to_many",
            ));
        }
        // `r#type` is accessed as `r#type` but stored as `type`
        let field_name = ident.to_string();
        let column_name = attrs
            .column
            .clone()
            .unwrap_or_else(|| ident.unraw().to_string());
        let (inner, nullable) = unwrap_option(&field.ty);
        let declared = if attrs.one_to_one {
            DeclaredType::OneToOne(type_text(inner))
        } else if attrs.one_to_many {
            DeclaredType::OneToMany(type_text(collection_element(inner)))
        } else {
            classify(inner)
        };
        let mut column = ColumnDescriptor::new(column_name, declared).with_field(field_name);
        if nullable {
            column = column.nullable();
        }
        if ident == "id" {
            fallback_identity = Some((field, attrs));
        }
        mapped.push(MappedField { field, column });
    }

    // a field named `id` is the identity when nothing is marked
    let identity = match (identity, fallback_identity) {
        (Some(ident), _) => ident.to_string(),
        (None, Some((field, attrs))) => {
            check_identity(field, &attrs)?;
            mapped.retain(|m| !std::ptr::eq(m.field, field));
            String::from("id")
        }
        (None, None) => {
            return Err(Error::new_spanned(
                &input.ident,
                "Entity needs an i64 identity field: mark one with #[rowforge(id)] or name it `id`",
            ));
        }
    };

    let mut builder = SchemaModel::builder(input.ident.to_string()).identity(identity);
    for m in &mapped {
        builder = builder.column(m.column.clone());
    }
    if let Some(parent) = &struct_attrs.child_of {
        builder = builder.child_of(parent.to_token_stream().to_string().replace(' ', ""));
    }
    let schema = builder
        .build()
        .map_err(|err| schema_error(input, &mapped, err))?;
    let compiled = compile(&schema).map_err(|err| schema_error(input, &mapped, err))?;

    let source = render_adapter(&compiled);
    source
        .parse::<TokenStream>()
        .map_err(|err| Error::new(Span::call_site(), format!("rowforge generated invalid code: {err}")))
}

// the identity column is always named after its field
fn check_identity(field: &Field, attrs: &FieldAttrs) -> syn::Result<()> {
    if attrs.column.is_some() || attrs.one_to_one || attrs.one_to_many {
        return Err(Error::new_spanned(
            field,
            "the identity field cannot take column, one_to_one or one_to_many",
        ));
    }
    if let Some(ident) = &field.ident {
        if ident.unraw() != *ident {
            return Err(Error::new_spanned(ident, "the identity field cannot be a raw identifier"));
        }
    }
    if classify(&field.ty) == DeclaredType::Int64 {
        Ok(())
    } else {
        Err(Error::new_spanned(&field.ty, "the identity field must be an i64"))
    }
}

// points the error at the field it is about, when there is one
fn schema_error(input: &DeriveInput, mapped: &[MappedField], err: SchemaError) -> Error {
    let field = match &err {
        SchemaError::UnmappedType { field, .. } => {
            mapped.iter().find(|m| m.column.field() == field.as_str())
        }
        SchemaError::DuplicateColumn { column, .. } | SchemaError::IdentityCollision { column, .. } => {
            mapped.iter().rev().find(|m| m.column.name() == column.as_str())
        }
        _ => None,
    };
    match field {
        Some(m) => Error::new_spanned(m.field, err.to_string()),
        None => Error::new_spanned(&input.ident, err.to_string()),
    }
}
