//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use sqlchain_core::{
    entity,
    error::InternalError,
    expr::MemberRef,
    plan::{Connection, Cursor, Row},
    sql::SqlQuery,
    traits::FromRow,
    value::Value,
};
use std::{cell::RefCell, sync::Arc};

///
/// Book
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub pages: i32,
}

entity! {
    Book,
    path = "library::Book",
    table = "books",
    fields = [("id", "book_id"), ("title", "book_title"), ("pages", "pages")],
}

impl FromRow for Book {
    fn from_row(row: &Row) -> Result<Self, InternalError> {
        Ok(Self {
            id: row.read("id")?,
            title: row.read("title")?,
            pages: row.read("pages")?,
        })
    }
}

pub fn book_title() -> MemberRef {
    MemberRef::of::<Book, String>("title")
}

pub fn book_pages() -> MemberRef {
    MemberRef::of::<Book, i32>("pages")
}

pub fn book_row(id: i32, title: &str, pages: i32) -> Row {
    let columns: Arc<[String]> = ["id", "title", "pages"]
        .into_iter()
        .map(str::to_string)
        .collect();

    Row::new(
        columns,
        vec![Value::Int(id), Value::Text(title.into()), Value::Int(pages)],
    )
    .expect("three columns")
}

pub fn scalar_row(value: Value) -> Row {
    Row::new(Arc::from(vec!["value".to_string()]), vec![value]).expect("one column")
}

///
/// Shelf
///
/// In-memory connection. Every command returns the same rows; rendered SQL
/// and bound values are recorded for inspection.
///

#[derive(Default)]
pub struct Shelf {
    rows: Vec<Row>,
    log: RefCell<Vec<(String, Vec<Value>)>>,
}

impl Shelf {
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            log: RefCell::default(),
        }
    }

    pub fn log(&self) -> Vec<(String, Vec<Value>)> {
        self.log.borrow().clone()
    }
}

impl Connection for Shelf {
    type Cursor<'a> = ShelfCursor<'a>;

    fn open<'a>(
        &'a self,
        query: &SqlQuery,
        params: &[Value],
    ) -> Result<Self::Cursor<'a>, InternalError> {
        self.log
            .borrow_mut()
            .push((query.to_string(), params.to_vec()));

        Ok(ShelfCursor {
            rows: self.rows.iter(),
        })
    }
}

///
/// ShelfCursor
///

pub struct ShelfCursor<'a> {
    rows: std::slice::Iter<'a, Row>,
}

impl Cursor for ShelfCursor<'_> {
    fn next_row(&mut self) -> Result<Option<Row>, InternalError> {
        Ok(self.rows.next().cloned())
    }
}
