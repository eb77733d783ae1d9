//! Shared fixtures for in-crate tests: a mapped entity and an in-memory
//! connection that replays canned rows.

use crate::{
    error::InternalError,
    expr::MemberRef,
    plan::{Connection, Cursor, Row},
    sql::SqlQuery,
    traits::FromRow,
    value::Value,
};
use std::{
    cell::{Cell, RefCell},
    sync::Arc,
};

///
/// Person
///

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Person {
    pub id: i32,
    pub name: String,
    pub age: i32,
}

entity! {
    Person,
    path = "test_support::Person",
    table = "people",
    fields = [("id", "person_id"), ("name", "full_name"), ("age", "age")],
}

impl FromRow for Person {
    fn from_row(row: &Row) -> Result<Self, InternalError> {
        Ok(Self {
            id: row.read("id")?,
            name: row.read("name")?,
            age: row.read("age")?,
        })
    }
}

pub fn person_id() -> MemberRef {
    MemberRef::of::<Person, i32>("id")
}

pub fn person_name() -> MemberRef {
    MemberRef::of::<Person, String>("name")
}

pub fn person_age() -> MemberRef {
    MemberRef::of::<Person, i32>("age")
}

///
/// MemoryConnection
///
/// Replays the same rows for every command and records what it was asked
/// to run. No SQL is interpreted.
///

#[derive(Default)]
pub struct MemoryConnection {
    rows: Vec<Row>,
    fail_at: Option<usize>,
    opened: Cell<usize>,
    live: Cell<usize>,
    commands: RefCell<Vec<(String, Vec<Value>)>>,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_row(mut self, cells: &[(&str, Value)]) -> Self {
        let columns: Arc<[String]> = cells.iter().map(|(name, _)| (*name).to_string()).collect();
        let values = cells.iter().map(|(_, value)| value.clone()).collect();

        self.rows.push(Row::new(columns, values).expect("matching row arity"));
        self
    }

    /// Fail when the cursor reaches row `index`.
    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Commands opened so far.
    pub fn opened(&self) -> usize {
        self.opened.get()
    }

    /// Cursors currently open.
    pub fn live(&self) -> usize {
        self.live.get()
    }

    /// Rendered SQL and bound values of every opened command.
    pub fn commands(&self) -> Vec<(String, Vec<Value>)> {
        self.commands.borrow().clone()
    }
}

impl Connection for MemoryConnection {
    type Cursor<'a> = MemoryCursor<'a>;

    fn open<'a>(
        &'a self,
        query: &SqlQuery,
        params: &[Value],
    ) -> Result<Self::Cursor<'a>, InternalError> {
        self.opened.set(self.opened.get() + 1);
        self.live.set(self.live.get() + 1);
        self.commands
            .borrow_mut()
            .push((query.to_string(), params.to_vec()));

        Ok(MemoryCursor {
            conn: self,
            next: 0,
        })
    }
}

///
/// MemoryCursor
///

pub struct MemoryCursor<'a> {
    conn: &'a MemoryConnection,
    next: usize,
}

impl Cursor for MemoryCursor<'_> {
    fn next_row(&mut self) -> Result<Option<Row>, InternalError> {
        if self.conn.fail_at == Some(self.next) {
            return Err(InternalError::connection("reader failed"));
        }

        let row = self.conn.rows.get(self.next).cloned();
        self.next += 1;

        Ok(row)
    }
}

impl Drop for MemoryCursor<'_> {
    fn drop(&mut self) {
        self.conn.live.set(self.conn.live.get() - 1);
    }
}
