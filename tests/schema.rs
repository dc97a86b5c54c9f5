use chrono::{DateTime, Utc};
use rowforge::compiler::{RelationalKind, SqlType};
use rowforge::{Dispatcher, Entity, Registry};
use rusqlite::Connection;

mod library {
    use super::*;

    #[derive(Entity, Default, Debug, Clone, PartialEq)]
    pub struct Book {
        pub id: i64,
        pub title: String,
        #[rowforge(column = "pageCount")]
        pub page_count: i32,
        pub published: DateTime<Utc>,
        #[rowforge(one_to_many)]
        pub chapters: Vec<Chapter>,
    }

    #[derive(Entity, Default, Debug, Clone, PartialEq)]
    #[rowforge(child_of = Book)]
    pub struct Chapter {
        pub id: i64,
        pub heading: String,
        pub number: u16,
    }

    #[derive(Entity, Default, Debug, Clone, PartialEq)]
    pub struct Shelf {
        #[rowforge(id)]
        pub _id: i64,
        pub label: Option<String>,
        #[rowforge(one_to_one)]
        pub featured: Option<Book>,
    }

    #[derive(Entity, Default, Debug)]
    pub struct Empty {
        pub id: i64,
    }
}

mod planner {
    use super::*;

    #[derive(Entity, Default, Debug, Clone, PartialEq)]
    pub struct Task {
        pub id: i64,
        pub order: i32,
        pub group: Option<String>,
        pub r#type: String,
        #[rowforge(column = "due date")]
        pub due: DateTime<Utc>,
    }
}

use library::{Book, Chapter, Empty, Shelf};
use planner::Task;

fn registry() -> Registry {
    let registry = Registry::new();
    registry.register::<Book>().expect("register");
    registry.register::<Chapter>().expect("register");
    registry.register::<Shelf>().expect("register");
    registry.register::<Empty>().expect("register");
    registry
}

#[test]
fn book_statement_matches_golden_output() {
    let registry = registry();
    let adapter = registry.adapter::<Book>().expect("adapter");
    assert_eq!(adapter.table_name(), "schema_library_Book");
    assert_eq!(
        adapter.create_statement(),
        "CREATE TABLE schema_library_Book (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT, pageCount INTEGER, published INTEGER);"
    );
}

#[test]
fn statements_are_deterministic() {
    let first = Book::schema_model().expect("schema");
    let second = Book::schema_model().expect("schema");
    assert_eq!(
        rowforge::compiler::emit_create_statement(&first).expect("statement"),
        rowforge::compiler::emit_create_statement(&second).expect("statement")
    );
}

#[test]
fn zero_column_tables_hold_only_the_identity() {
    let registry = registry();
    let adapter = registry.adapter::<Empty>().expect("adapter");
    assert_eq!(
        adapter.create_statement(),
        "CREATE TABLE schema_library_Empty (id INTEGER PRIMARY KEY AUTOINCREMENT);"
    );
    let conn = Connection::open_in_memory().expect("in-memory db");
    let dispatcher = Dispatcher::new(&registry, &conn);
    dispatcher.create_table::<Empty>().expect("create");
    let id = dispatcher.insert(&Empty::default()).expect("insert");
    assert_eq!(id, 1);
}

#[test]
fn relations_and_renames_are_described_in_the_model() {
    let book = Book::schema_model().expect("schema");
    let chapters = book.column("chapters").expect("relation column");
    assert_eq!(chapters.kind(), RelationalKind::OneToManyParentField);
    assert_eq!(book.column("pageCount").expect("renamed").field(), "page_count");

    let chapter = Chapter::schema_model().expect("schema");
    assert_eq!(chapter.parent_type(), Some("schema::library::Book"));
    let reference = chapter.parent_reference().expect("reverse reference");
    assert_eq!(reference.name(), "schema_library_Book_id");

    let shelf = Shelf::schema_model().expect("schema");
    assert_eq!(shelf.identity_column(), "_id");
    assert_eq!(shelf.column("featured").expect("relation").kind(), RelationalKind::OneToOne);
    assert!(shelf.column("label").expect("label").is_nullable());
}

#[test]
fn child_and_one_to_one_columns_are_integers() {
    let registry = registry();
    let chapter = registry.adapter::<Chapter>().expect("adapter");
    assert_eq!(
        chapter.create_statement(),
        "CREATE TABLE schema_library_Chapter (id INTEGER PRIMARY KEY AUTOINCREMENT, heading TEXT, number INTEGER, schema_library_Book_id INTEGER);"
    );
    let shelf = registry.adapter::<Shelf>().expect("adapter");
    assert_eq!(
        shelf.create_statement(),
        "CREATE TABLE schema_library_Shelf (_id INTEGER PRIMARY KEY AUTOINCREMENT, label TEXT, featured INTEGER);"
    );
    let featured = shelf
        .compiled()
        .plans()
        .iter()
        .find(|p| p.column.name() == "featured")
        .expect("plan");
    assert_eq!(featured.storage, SqlType::Integer);
    assert!(!featured.is_mapped());
}

#[test]
fn relations_are_left_alone_by_encode_and_decode() {
    let registry = registry();
    let conn = Connection::open_in_memory().expect("in-memory db");
    let dispatcher = Dispatcher::new(&registry, &conn);
    dispatcher.create_all().expect("create");

    let book = Book {
        title: "Earthsea".into(),
        page_count: 183,
        chapters: vec![Chapter::default()],
        ..Book::default()
    };
    let values = dispatcher.to_values(&book).expect("encode");
    assert!(!values.contains("chapters"));

    let id = dispatcher.insert(&book).expect("insert");
    let loaded: Book = dispatcher.find_by_id(id).expect("query").expect("row");
    assert!(loaded.chapters.is_empty());
    assert_eq!(loaded.title, "Earthsea");

    let shelf = Shelf {
        label: Some("fantasy".into()),
        featured: Some(loaded),
        ..Shelf::default()
    };
    let shelf_id = dispatcher.insert(&shelf).expect("insert");
    let loaded: Shelf = dispatcher.find_by_id(shelf_id).expect("query").expect("row");
    assert_eq!(loaded._id, shelf_id);
    assert!(loaded.featured.is_none());
}

#[test]
fn children_are_written_and_read_in_two_phases() {
    let registry = registry();
    let conn = Connection::open_in_memory().expect("in-memory db");
    let dispatcher = Dispatcher::new(&registry, &conn);
    dispatcher.create_all().expect("create");

    let first = dispatcher.insert(&Book::default()).expect("insert");
    let second = dispatcher.insert(&Book::default()).expect("insert");
    for (n, heading) in ["Warrior", "Shadow", "Hunt"].iter().enumerate() {
        let chapter = Chapter {
            heading: heading.to_string(),
            number: n as u16 + 1,
            ..Chapter::default()
        };
        dispatcher.insert_child(first, &chapter).expect("insert child");
    }
    dispatcher
        .insert_child(second, &Chapter { heading: "Other".into(), ..Chapter::default() })
        .expect("insert child");

    let chapters: Vec<Chapter> = dispatcher.query_children(first).expect("children");
    let headings: Vec<&str> = chapters.iter().map(|c| c.heading.as_str()).collect();
    assert_eq!(headings, vec!["Warrior", "Shadow", "Hunt"]);
    assert_eq!(chapters[2].number, 3);
    assert_eq!(dispatcher.query_children::<Chapter>(second).expect("children").len(), 1);
}

#[test]
fn parents_are_not_child_tables() {
    let registry = registry();
    let conn = Connection::open_in_memory().expect("in-memory db");
    let dispatcher = Dispatcher::new(&registry, &conn);
    let err = dispatcher.insert_child(1, &Book::default()).unwrap_err();
    assert!(matches!(err, rowforge::RowforgeError::Configuration(_)));
}

#[test]
fn keyword_and_spaced_names_are_quoted() {
    let registry = Registry::new();
    registry.register::<Task>().expect("register");
    let adapter = registry.adapter::<Task>().expect("adapter");
    assert_eq!(
        adapter.create_statement(),
        r#"CREATE TABLE schema_planner_Task (id INTEGER PRIMARY KEY AUTOINCREMENT, "order" INTEGER, "group" TEXT, type TEXT, "due date" INTEGER);"#
    );
}

#[test]
fn keyword_columns_survive_every_operation() {
    let registry = Registry::new();
    registry.register::<Task>().expect("register");
    let conn = Connection::open_in_memory().expect("in-memory db");
    let dispatcher = Dispatcher::new(&registry, &conn);
    dispatcher.create_table::<Task>().expect("create");

    let tasks: Vec<Task> = (1..=3)
        .map(|n| Task {
            order: 4 - n,
            group: Some("chores".into()),
            r#type: format!("kind {}", n),
            ..Task::default()
        })
        .collect();
    assert_eq!(dispatcher.insert_all(&tasks).expect("batch"), 3);

    let sorted: Vec<Task> = dispatcher
        .query_table(&rowforge::Predicate::all(), Some(r#""order""#))
        .expect("query");
    let orders: Vec<i32> = sorted.iter().map(|t| t.order).collect();
    assert_eq!(orders, vec![1, 2, 3]);
    assert_eq!(sorted[0].r#type, "kind 3");

    let mut first = sorted[0].clone();
    first.group = None;
    first.order = 10;
    assert_eq!(dispatcher.update_entity(&first).expect("update"), 1);
    let loaded: Task = dispatcher.find_by_id(first.id).expect("query").expect("row");
    assert_eq!(loaded, first);

    let removed = dispatcher
        .delete::<Task>(&rowforge::Predicate::column_equals("group", "chores".into()))
        .expect("delete");
    assert_eq!(removed, 2);
    dispatcher.drop_table::<Task>().expect("drop");
}
