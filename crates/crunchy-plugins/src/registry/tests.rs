//! Unit tests for the keyed handler table.

use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::error::RegistryError;

#[fixture]
fn table() -> HandlerTable<String, str> {
    let mut table = HandlerTable::new("service");
    table
        .register("style_pycode".to_owned(), Arc::from("first"))
        .expect("register");
    table
}

#[rstest]
fn lookup_returns_registered_handler(table: HandlerTable<String, str>) {
    let handler = table.lookup(&"style_pycode".to_owned()).expect("lookup");
    assert_eq!(&**handler, "first");
    assert!(table.contains(&"style_pycode".to_owned()));
    assert_eq!(table.len(), 1);
}

#[rstest]
fn duplicate_registration_keeps_the_first_handler(mut table: HandlerTable<String, str>) {
    let err = table
        .register("style_pycode".to_owned(), Arc::from("second"))
        .expect_err("duplicate");
    assert_eq!(err, RegistryError::duplicate("service", "style_pycode"));
    let handler = table.lookup(&"style_pycode".to_owned()).expect("lookup");
    assert_eq!(&**handler, "first");
}

#[rstest]
fn replace_returns_displaced_handler(mut table: HandlerTable<String, str>) {
    let previous = table.replace("style_pycode".to_owned(), Arc::from("second"));
    assert_eq!(previous.as_deref(), Some("first"));
    let handler = table.lookup(&"style_pycode".to_owned()).expect("lookup");
    assert_eq!(&**handler, "second");
}

#[rstest]
fn missing_key_is_a_typed_miss(table: HandlerTable<String, str>) {
    let err = table.lookup(&"nope".to_owned()).expect_err("miss");
    assert_eq!(err, RegistryError::not_found("service", "nope"));
}

#[test]
fn keys_are_sorted() {
    let mut table: HandlerTable<String, str> = HandlerTable::new("service");
    for key in ["b", "c", "a"] {
        table
            .register(key.to_owned(), Arc::from(key))
            .expect("register");
    }
    assert_eq!(table.keys(), vec!["a", "b", "c"]);
    assert!(format!("{table:?}").contains("service"));
}
