use syn::{Attribute, LitStr, Path, Result};

#[derive(Default)]
pub struct FieldAttrs {
    pub id: bool,
    pub column: Option<String>,
    pub one_to_one: bool,
    pub one_to_many: bool,
}

pub fn field_attrs(attrs: &[Attribute]) -> Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("rowforge")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                out.id = true;
            } else if meta.path.is_ident("column") {
                let name: LitStr = meta.value()?.parse()?;
                out.column = Some(name.value());
            } else if meta.path.is_ident("one_to_one") {
                out.one_to_one = true;
            } else if meta.path.is_ident("one_to_many") {
                out.one_to_many = true;
            } else {
                return Err(meta.error("unknown rowforge field attribute"));
            }
            Ok(())
        })?;
    }
    Ok(out)
}

#[derive(Default)]
pub struct StructAttrs {
    pub child_of: Option<Path>,
}

pub fn struct_attrs(attrs: &[Attribute]) -> Result<StructAttrs> {
    let mut out = StructAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("rowforge")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("child_of") {
                out.child_of = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unknown rowforge struct attribute"))
            }
        })?;
    }
    Ok(out)
}
