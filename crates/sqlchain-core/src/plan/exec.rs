use crate::{
    error::InternalError,
    obs::sink::Span,
    plan::{CompiledPlan, Connection, Cursor},
    traits::FromRow,
    value::Value,
};
use std::marker::PhantomData;

///
/// PlanQuery
///
/// A compiled plan bound to one template's parameter values. Every call to
/// `iter` runs the command again from the start.
///

pub struct PlanQuery<'p, T, C> {
    pub(super) plan: &'p CompiledPlan,
    pub(super) conn: &'p C,
    pub(super) params: Vec<Value>,
    pub(super) _marker: PhantomData<fn() -> T>,
}

impl<'p, T, C> PlanQuery<'p, T, C>
where
    T: FromRow,
    C: Connection,
{
    #[must_use]
    pub const fn plan(&self) -> &'p CompiledPlan {
        self.plan
    }

    /// Bound parameter values, by slot index.
    #[must_use]
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Start a fresh enumeration. The command runs on the first `next`.
    #[must_use]
    pub fn iter(&self) -> Rows<'_, T, C> {
        Rows {
            plan: self.plan,
            conn: self.conn,
            params: &self.params,
            state: RowsState::Pending,
            _marker: PhantomData,
        }
    }

    /// Drain one enumeration into a vector.
    pub fn to_vec(&self) -> Result<Vec<T>, InternalError> {
        self.iter().collect()
    }
}

impl<'q, T, C> IntoIterator for &'q PlanQuery<'_, T, C>
where
    T: FromRow,
    C: Connection,
{
    type Item = Result<T, InternalError>;
    type IntoIter = Rows<'q, T, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

///
/// Rows
///
/// One forward-only enumeration. The cursor opens lazily and is released as
/// soon as the enumeration ends, fails, or is dropped.
///

pub struct Rows<'q, T, C: Connection + 'q> {
    plan: &'q CompiledPlan,
    conn: &'q C,
    params: &'q [Value],
    state: RowsState<C::Cursor<'q>>,
    _marker: PhantomData<fn() -> T>,
}

enum RowsState<K> {
    Pending,
    Open { cursor: K, span: Span },
    Done,
}

impl<'q, T, C> Rows<'q, T, C>
where
    T: FromRow,
    C: Connection + 'q,
{
    /// True once the cursor has been opened and not yet released.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.state, RowsState::Open { .. })
    }

    fn open(&mut self) -> Result<(), InternalError> {
        let sql = self.plan.sql();
        tracing::trace!(element = %sql.element(), params = self.params.len(), "opening cursor");

        let span = Span::new(sql.element().name());
        let cursor = self.conn.open(sql, self.params)?;
        self.state = RowsState::Open { cursor, span };

        Ok(())
    }

    fn advance(&mut self) -> Result<Option<T>, InternalError> {
        if matches!(self.state, RowsState::Pending) {
            self.open()?;
        }

        let RowsState::Open { cursor, span } = &mut self.state else {
            return Ok(None);
        };

        match cursor.next_row()? {
            Some(row) => {
                span.add_rows(1);
                T::from_row(&row).map(Some)
            }
            None => Ok(None),
        }
    }
}

impl<'q, T, C> Iterator for Rows<'q, T, C>
where
    T: FromRow,
    C: Connection + 'q,
{
    type Item = Result<T, InternalError>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.state, RowsState::Done) {
            return None;
        }

        match self.advance() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.state = RowsState::Done;
                None
            }
            Err(err) => {
                tracing::debug!(error = %err, "enumeration failed");
                self.state = RowsState::Done;
                Some(Err(err))
            }
        }
    }
}
