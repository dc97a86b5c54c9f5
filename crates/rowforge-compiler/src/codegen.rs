//! Renders a [`CompiledSchema`] into the Rust source of an `Entity` impl.
//!
//! The derive macro parses the rendered text into tokens, and the command-line
//! driver prints it, so the source is the single artifact of a compilation.
//! Rendering is deterministic and has no side effects.
//!
//! The rendered impl is meant to live in the module that declares the type:
//! `type_path()` is built from `module_path!()` and the last segment of the
//! schema's target type.

use std::fmt::Write;

use crate::compiler::{ColumnPlan, CompiledSchema};
use crate::schema::{ColumnDescriptor, DeclaredType, RelationalKind};

const HEADER: &str = "// Generated by rowforge. Do not modify!";

/// Small indenting line writer.
struct SourceWriter {
    out: String,
    depth: usize,
}

impl SourceWriter {
    fn new() -> Self {
        Self {
            out: String::new(),
            depth: 0,
        }
    }
    fn line(&mut self, text: &str) {
        if text.is_empty() {
            self.out.push('\n');
            return;
        }
        for _ in 0..self.depth {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }
    fn begin(&mut self, text: &str) {
        self.line(text);
        self.depth += 1;
    }
    fn end(&mut self, text: &str) {
        self.depth -= 1;
        self.line(text);
    }
    fn finish(self) -> String {
        self.out
    }
}

/// The last path segment of a type path.
pub fn type_ident(target_type: &str) -> &str {
    target_type
        .rsplit(|c: char| c == ':' || c == '.')
        .next()
        .unwrap_or(target_type)
}

fn declared_type_expr(declared: &DeclaredType) -> String {
    const PREFIX: &str = "::rowforge::compiler::DeclaredType::";
    let (variant, path) = match declared {
        DeclaredType::Object(path) => ("Object", path),
        DeclaredType::OneToOne(path) => ("OneToOne", path),
        DeclaredType::OneToMany(path) => ("OneToMany", path),
        DeclaredType::Unsupported(path) => ("Unsupported", path),
        unit => return format!("{}{:?}", PREFIX, unit),
    };
    format!("{}{}(::std::string::String::from({:?}))", PREFIX, variant, path)
}

fn column_expr(column: &ColumnDescriptor) -> String {
    let mut expr = format!(
        "::rowforge::compiler::ColumnDescriptor::new({:?}, {})",
        column.name(),
        declared_type_expr(column.declared_type())
    );
    if column.field() != column.name() {
        let _ = write!(expr, ".with_field({:?})", column.field());
    }
    if column.is_nullable() {
        expr.push_str(".nullable()");
    }
    expr
}

/// Expression turning a field value into a `Value`.
/// `place` names the value itself, `reference` a `&` to it.
fn encode_expr(declared: &DeclaredType, place: &str, reference: &str) -> String {
    match declared {
        DeclaredType::Text => format!(
            "::rowforge::Value::from(::std::string::String::as_str({}))",
            reference
        ),
        DeclaredType::Bytes => format!(
            "::rowforge::Value::from(::std::vec::Vec::as_slice({}))",
            reference
        ),
        DeclaredType::Boolean => format!(
            "::rowforge::Value::Integer(::rowforge::convert::bool_to_integer({}))",
            place
        ),
        DeclaredType::DateTime => format!(
            "::rowforge::Value::Integer(::rowforge::convert::date_to_millis({}))",
            reference
        ),
        DeclaredType::Object(_) => format!(
            "::rowforge::Value::Blob(::rowforge::codec::serialize({})?)",
            reference
        ),
        // integers, floats and chars are Copy
        _ => format!("::rowforge::Value::from({})", place),
    }
}

/// Expression turning the raw accessor result into the field type.
fn decode_expr(declared: &DeclaredType, column: &str, raw: &str) -> String {
    match declared {
        DeclaredType::Int64 | DeclaredType::Float64 | DeclaredType::Text | DeclaredType::Bytes => {
            raw.to_string()
        }
        DeclaredType::Boolean => format!("::rowforge::convert::integer_to_bool({})", raw),
        DeclaredType::Float32 => format!("{} as f32", raw),
        DeclaredType::Char => format!("::rowforge::convert::text_to_char({:?}, &{})?", column, raw),
        DeclaredType::DateTime => format!("::rowforge::convert::millis_to_date({:?}, {})?", column, raw),
        DeclaredType::Object(_) => format!("::rowforge::codec::deserialize(&{})?", raw),
        _ => format!("::rowforge::convert::narrow({:?}, {})?", column, raw),
    }
}

fn encode_statement(plan: &ColumnPlan) -> String {
    let column = &plan.column;
    let declared = column.declared_type();
    let value = if column.is_nullable() {
        format!(
            "match &self.{} {{ Some(v) => {}, None => ::rowforge::Value::Null }}",
            column.field(),
            encode_expr(declared, "*v", "v")
        )
    } else {
        encode_expr(
            declared,
            &format!("self.{}", column.field()),
            &format!("&self.{}", column.field()),
        )
    };
    format!("values.put({:?}, {});", column.name(), value)
}

fn decode_statement(plan: &ColumnPlan) -> String {
    let column = &plan.column;
    let accessor = plan.reader.accessor();
    let value = if column.is_nullable() {
        format!(
            "match row.optional_{}({:?})? {{ Some(raw) => Some({}), None => None }}",
            accessor,
            column.name(),
            decode_expr(column.declared_type(), column.name(), "raw")
        )
    } else {
        let raw = format!("row.{}({:?})?", accessor, column.name());
        decode_expr(column.declared_type(), column.name(), &raw)
    };
    format!("target.{} = {};", column.field(), value)
}

pub fn render_adapter(compiled: &CompiledSchema) -> String {
    let schema = compiled.schema();
    let ident = type_ident(schema.target_type());
    let identity = schema.identity_column();
    let mapped: Vec<&ColumnPlan> = compiled.plans().iter().filter(|p| p.is_mapped()).collect();

    let mut w = SourceWriter::new();
    w.line(HEADER);
    w.begin(&format!("impl ::rowforge::Entity for {} {{", ident));

    w.begin("fn type_path() -> &'static str {");
    w.line(&format!("concat!(module_path!(), \"::\", {:?})", ident));
    w.end("}");
    w.line("");

    w.begin("fn schema_model() -> ::std::result::Result<::rowforge::compiler::SchemaModel, ::rowforge::compiler::SchemaError> {");
    w.line("::rowforge::compiler::SchemaModel::builder(Self::type_path())");
    w.depth += 1;
    w.line(&format!(".identity({:?})", identity));
    for column in schema.columns() {
        // the builder adds the reverse reference itself
        if column.kind() == RelationalKind::OneToManyChildMarker {
            continue;
        }
        w.line(&format!(".column({})", column_expr(column)));
    }
    if let Some(parent) = schema.parent_type() {
        w.line(&format!(
            ".child_of(<{} as ::rowforge::Entity>::type_path())",
            parent
        ));
    }
    w.line(".build()");
    w.depth -= 1;
    w.end("}");
    w.line("");

    w.begin("fn identity(&self) -> i64 {");
    w.line(&format!("self.{}", identity));
    w.end("}");
    w.line("");

    w.begin("fn set_identity(&mut self, identity: i64) {");
    w.line(&format!("self.{} = identity;", identity));
    w.end("}");
    w.line("");

    w.begin("fn encode(&self) -> ::rowforge::Result<::rowforge::RowValues> {");
    if mapped.is_empty() {
        w.line("Ok(::rowforge::RowValues::new())");
    } else {
        w.line("let mut values = ::rowforge::RowValues::new();");
        for plan in &mapped {
            w.line(&encode_statement(plan));
        }
        w.line("Ok(values)");
    }
    w.end("}");
    w.line("");

    w.begin("fn map_row(row: &::rowforge::Row, target: &mut Self) -> ::rowforge::Result<()> {");
    w.line(&format!("target.{} = row.integer({:?})?;", identity, identity));
    for plan in &mapped {
        w.line(&decode_statement(plan));
    }
    w.line("Ok(())");
    w.end("}");

    w.end("}");
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::schema::SchemaModel;

    fn render(schema: SchemaModel) -> String {
        render_adapter(&compile(&schema).expect("compiles"))
    }

    #[test]
    fn type_ident_is_last_segment() {
        assert_eq!(type_ident("library::model::Book"), "Book");
        assert_eq!(type_ident("com.example.Book"), "Book");
        assert_eq!(type_ident("Book"), "Book");
    }

    #[test]
    fn golden_note_adapter() {
        let schema = SchemaModel::builder("notes::Note")
            .column(ColumnDescriptor::new("title", DeclaredType::Text))
            .column(ColumnDescriptor::new("pinned", DeclaredType::Boolean))
            .column(ColumnDescriptor::new("createdAt", DeclaredType::DateTime).with_field("created_at"))
            .column(ColumnDescriptor::new("rank", DeclaredType::Int32).nullable())
            .build()
            .expect("valid schema");
        let expected = r#"// Generated by rowforge. Do not modify!
impl ::rowforge::Entity for Note {
    fn type_path() -> &'static str {
        concat!(module_path!(), "::", "Note")
    }

    fn schema_model() -> ::std::result::Result<::rowforge::compiler::SchemaModel, ::rowforge::compiler::SchemaError> {
        ::rowforge::compiler::SchemaModel::builder(Self::type_path())
            .identity("id")
            .column(::rowforge::compiler::ColumnDescriptor::new("title", ::rowforge::compiler::DeclaredType::Text))
            .column(::rowforge::compiler::ColumnDescriptor::new("pinned", ::rowforge::compiler::DeclaredType::Boolean))
            .column(::rowforge::compiler::ColumnDescriptor::new("createdAt", ::rowforge::compiler::DeclaredType::DateTime).with_field("created_at"))
            .column(::rowforge::compiler::ColumnDescriptor::new("rank", ::rowforge::compiler::DeclaredType::Int32).nullable())
            .build()
    }

    fn identity(&self) -> i64 {
        self.id
    }

    fn set_identity(&mut self, identity: i64) {
        self.id = identity;
    }

    fn encode(&self) -> ::rowforge::Result<::rowforge::RowValues> {
        let mut values = ::rowforge::RowValues::new();
        values.put("title", ::rowforge::Value::from(::std::string::String::as_str(&self.title)));
        values.put("pinned", ::rowforge::Value::Integer(::rowforge::convert::bool_to_integer(self.pinned)));
        values.put("createdAt", ::rowforge::Value::Integer(::rowforge::convert::date_to_millis(&self.created_at)));
        values.put("rank", match &self.rank { Some(v) => ::rowforge::Value::from(*v), None => ::rowforge::Value::Null });
        Ok(values)
    }

    fn map_row(row: &::rowforge::Row, target: &mut Self) -> ::rowforge::Result<()> {
        target.id = row.integer("id")?;
        target.title = row.text("title")?;
        target.pinned = ::rowforge::convert::integer_to_bool(row.integer("pinned")?);
        target.created_at = ::rowforge::convert::millis_to_date("createdAt", row.integer("createdAt")?)?;
        target.rank = match row.optional_integer("rank")? { Some(raw) => Some(::rowforge::convert::narrow("rank", raw)?), None => None };
        Ok(())
    }
}
"#;
        assert_eq!(render(schema), expected);
    }

    #[test]
    fn blobs_render_through_the_codec() {
        let source = render(
            SchemaModel::builder("app::Attachment")
                .column(ColumnDescriptor::new("data", DeclaredType::Object("CustomType".into())))
                .column(ColumnDescriptor::new("raw", DeclaredType::Bytes))
                .column(ColumnDescriptor::new("extra", DeclaredType::Object("CustomType".into())).nullable())
                .build()
                .expect("valid schema"),
        );
        assert!(source.contains(
            r#"values.put("data", ::rowforge::Value::Blob(::rowforge::codec::serialize(&self.data)?));"#
        ));
        assert!(source.contains(
            r#"values.put("raw", ::rowforge::Value::from(::std::vec::Vec::as_slice(&self.raw)));"#
        ));
        assert!(source.contains(r#"target.data = ::rowforge::codec::deserialize(&row.bytes("data")?)?;"#));
        assert!(source.contains(r#"target.raw = row.bytes("raw")?;"#));
        assert!(source.contains(
            r#"target.extra = match row.optional_bytes("extra")? { Some(raw) => Some(::rowforge::codec::deserialize(&raw)?), None => None };"#
        ));
        assert!(source.contains(
            r#"::rowforge::compiler::DeclaredType::Object(::std::string::String::from("CustomType"))"#
        ));
    }

    #[test]
    fn relations_are_described_but_not_mapped() {
        let source = render(
            SchemaModel::builder("library::Chapter")
                .column(ColumnDescriptor::new("heading", DeclaredType::Text))
                .column(ColumnDescriptor::new("editor", DeclaredType::OneToOne("Person".into())))
                .column(ColumnDescriptor::new("notes", DeclaredType::OneToMany("Note".into())))
                .child_of("Book")
                .build()
                .expect("valid schema"),
        );
        assert!(source.contains(".child_of(<Book as ::rowforge::Entity>::type_path())"));
        assert!(!source.contains("Book_id"));
        assert!(!source.contains("values.put(\"editor\""));
        assert!(!source.contains("target.notes"));
        assert!(source.contains("target.heading = row.text(\"heading\")?;"));
    }

    #[test]
    fn relation_only_schema_encodes_nothing() {
        let source = render(
            SchemaModel::builder("library::Index")
                .column(ColumnDescriptor::new("books", DeclaredType::OneToMany("Book".into())))
                .build()
                .expect("valid schema"),
        );
        assert!(source.contains("        Ok(::rowforge::RowValues::new())\n"));
        assert!(!source.contains("let mut values"));
    }

    #[test]
    fn floats_and_chars() {
        let source = render(
            SchemaModel::builder("app::Reading")
                .column(ColumnDescriptor::new("value", DeclaredType::Float32))
                .column(ColumnDescriptor::new("unit", DeclaredType::Char))
                .build()
                .expect("valid schema"),
        );
        assert!(source.contains("target.value = row.real(\"value\")? as f32;"));
        assert!(source.contains("target.unit = ::rowforge::convert::text_to_char(\"unit\", &row.text(\"unit\")?)?;"));
        assert!(source.contains("values.put(\"unit\", ::rowforge::Value::from(self.unit));"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let schema = SchemaModel::builder("app::Reading")
            .column(ColumnDescriptor::new("value", DeclaredType::Float64))
            .column(ColumnDescriptor::new("taken", DeclaredType::DateTime).nullable())
            .build()
            .expect("valid schema");
        assert_eq!(render(schema.clone()), render(schema));
    }
}
