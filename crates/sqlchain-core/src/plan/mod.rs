//! Compiled plans and their execution.
//!
//! A `CompiledPlan` pairs the template it was compiled from with the SQL
//! query that template produced. It stores no parameter values: binding
//! re-reads them from whichever matching template is being executed.

mod cache;
mod connection;
mod exec;
mod row;


use crate::{
    error::InternalError,
    expr::{Expr, ExprRef, TypeRef, expr_matches},
    model::{MappingSchema, SchemaId},
    obs::sink::{self, MetricsEvent},
    parse::{ExpressionParser, ParseError, ParserRegistry},
    sql::{ParamSlot, SqlQuery},
    traits::FromRow,
    value::Value,
};
use std::{marker::PhantomData, sync::Arc};

// re-exports
pub use cache::{CacheStats, PlanCache};
pub use connection::{Connection, Cursor};
pub use exec::{PlanQuery, Rows};
pub use row::Row;

///
/// CompiledPlan
///

#[derive(Debug)]
pub struct CompiledPlan {
    template: ExprRef,
    schema: SchemaId,
    sql: SqlQuery,
}

impl CompiledPlan {
    /// Parse `template` under `schema` through the operator registry.
    pub fn compile(
        registry: &ParserRegistry,
        schema: &MappingSchema,
        template: &ExprRef,
    ) -> Result<Self, ParseError> {
        let parser = ExpressionParser::new(registry, schema, template);

        match parser.compile() {
            Ok(sql) => {
                sink::record(MetricsEvent::PlanCompiled {
                    element: sql.element().name(),
                });
                tracing::debug!(
                    schema = %schema.id(),
                    element = %sql.element(),
                    params = sql.params().len(),
                    "plan compiled"
                );

                Ok(Self {
                    template: Arc::clone(template),
                    schema: schema.id(),
                    sql,
                })
            }
            Err(err) => {
                sink::record(MetricsEvent::CompileFailed);
                tracing::debug!(schema = %schema.id(), error = %err, "plan compile failed");

                Err(err)
            }
        }
    }

    /// Template this plan was compiled from.
    #[must_use]
    pub fn template(&self) -> &Expr {
        &self.template
    }

    #[must_use]
    pub const fn schema(&self) -> SchemaId {
        self.schema
    }

    #[must_use]
    pub const fn sql(&self) -> &SqlQuery {
        &self.sql
    }

    #[must_use]
    pub fn params(&self) -> &[ParamSlot] {
        self.sql.params()
    }

    /// Element type produced by each result row.
    #[must_use]
    pub const fn element(&self) -> TypeRef {
        self.sql.element()
    }

    /// True when this plan can serve `template` under `schema`.
    #[must_use]
    pub fn matches(&self, schema: SchemaId, template: &Expr) -> bool {
        self.schema == schema && expr_matches(&self.template, template)
    }

    /// Read every parameter value from a template matching this plan's.
    pub fn bind(&self, template: &Expr) -> Result<Vec<Value>, InternalError> {
        self.sql
            .params()
            .iter()
            .map(|slot| slot.bind(template))
            .collect()
    }

    /// Bind `template` and prepare a lazy result enumeration of `T`.
    ///
    /// Nothing touches the connection until the result is iterated.
    pub fn query<'p, T, C>(
        &'p self,
        conn: &'p C,
        template: &Expr,
    ) -> Result<PlanQuery<'p, T, C>, InternalError>
    where
        T: FromRow + 'static,
        C: Connection,
    {
        let requested = TypeRef::of::<T>();
        if requested != self.element() {
            return Err(InternalError::executor_invariant(format!(
                "plan produces {}, requested {requested}",
                self.element()
            )));
        }

        if !expr_matches(&self.template, template) {
            return Err(InternalError::plan_invariant(
                "template does not match the plan it is executed with",
            ));
        }

        let params = self.bind(template)?;

        Ok(PlanQuery {
            plan: self,
            conn,
            params,
            _marker: PhantomData,
        })
    }
}
