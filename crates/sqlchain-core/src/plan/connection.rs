use crate::{error::InternalError, plan::Row, sql::SqlQuery, value::Value};

///
/// Connection
///
/// Command-execution boundary. A driver renders `query` in its own dialect,
/// binds `params` by slot index, and returns a forward-only cursor. The
/// cursor owns whatever reader the driver opened; dropping it releases that
/// reader.
///

pub trait Connection {
    type Cursor<'a>: Cursor
    where
        Self: 'a;

    fn open<'a>(
        &'a self,
        query: &SqlQuery,
        params: &[Value],
    ) -> Result<Self::Cursor<'a>, InternalError>;
}

///
/// Cursor
/// Forward-only row reader.
///

pub trait Cursor {
    /// Next row, or `None` once the result set is exhausted.
    fn next_row(&mut self) -> Result<Option<Row>, InternalError>;
}
