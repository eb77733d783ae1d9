use crate::{
    chain::Queryable,
    config::{ConfigError, CoreConfig},
    error::InternalError,
    expr::ExprRef,
    model::MappingSchema,
    obs::sink::{MetricsSink, with_metrics_sink},
    parse::{ParseError, ParserRegistry},
    plan::{CompiledPlan, Connection, PlanCache, PlanQuery},
    sql::SqlQuery,
    traits::FromRow,
};
use std::{marker::PhantomData, sync::Arc};
use thiserror::Error as ThisError;

///
/// QueryError
///

#[derive(Debug, ThisError)]
pub enum QueryError {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Internal(#[from] InternalError),
}

///
/// QuerySession
///
/// Session-scoped handle with policy (debug, metrics) over one mapping
/// schema, a plan cache and the operator registry.
///

pub struct QuerySession {
    schema: Arc<MappingSchema>,
    cache: Arc<PlanCache>,
    registry: ParserRegistry,
    debug: bool,
    metrics: Option<&'static dyn MetricsSink>,
}

impl QuerySession {
    /// Session over the process-wide plan cache.
    #[must_use]
    pub fn new(schema: Arc<MappingSchema>) -> Self {
        Self {
            schema,
            cache: PlanCache::global(),
            registry: ParserRegistry::default(),
            debug: false,
            metrics: None,
        }
    }

    /// Session with its own cache built from `config`.
    pub fn from_config(
        schema: Arc<MappingSchema>,
        config: &CoreConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let cache = PlanCache::new(&config.plan_cache)?;

        Ok(Self::new(schema)
            .with_cache(Arc::new(cache))
            .debug(config.session.debug))
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<PlanCache>) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: ParserRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub const fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub const fn metrics_sink(mut self, sink: &'static dyn MetricsSink) -> Self {
        self.metrics = Some(sink);
        self
    }

    #[must_use]
    pub fn schema(&self) -> &MappingSchema {
        &self.schema
    }

    #[must_use]
    pub const fn cache(&self) -> &Arc<PlanCache> {
        &self.cache
    }

    fn with_metrics<T>(&self, f: impl FnOnce() -> T) -> T {
        if let Some(sink) = self.metrics {
            with_metrics_sink(sink, f)
        } else {
            f()
        }
    }

    /// Cached plan for `query`, compiling it on a miss.
    pub fn compile<T: 'static>(
        &self,
        query: &Queryable<T>,
    ) -> Result<Arc<CompiledPlan>, QueryError> {
        self.with_metrics(|| self.compile_template(query.expr()))
    }

    fn compile_template(&self, template: &ExprRef) -> Result<Arc<CompiledPlan>, QueryError> {
        let plan = self
            .cache
            .get_or_compile(self.schema.id(), template, || {
                CompiledPlan::compile(&self.registry, &self.schema, template)
            })?;

        self.log_explain(plan.sql());

        Ok(plan)
    }

    /// Compile `query` and keep its template for repeated execution.
    pub fn prepare<T: FromRow>(&self, query: &Queryable<T>) -> Result<Prepared<T>, QueryError> {
        let plan = self.compile(query)?;

        Ok(Prepared {
            plan,
            template: Arc::clone(query.expr()),
            _marker: PhantomData,
        })
    }

    /// Compile, bind and fully enumerate `query` on `conn`.
    pub fn query<T, C>(&self, conn: &C, query: &Queryable<T>) -> Result<Vec<T>, QueryError>
    where
        T: FromRow,
        C: Connection,
    {
        self.with_metrics(|| -> Result<Vec<T>, QueryError> {
            let plan = self.compile_template(query.expr())?;
            let rows = plan.query::<T, C>(conn, query.expr())?.to_vec()?;

            Ok(rows)
        })
    }

    /// Rendered SQL for `query`.
    pub fn explain<T: 'static>(&self, query: &Queryable<T>) -> Result<String, QueryError> {
        let plan = self.compile(query)?;

        Ok(plan.sql().to_string())
    }

    fn log_explain(&self, sql: &SqlQuery) {
        if self.debug {
            tracing::debug!(sql = %sql, "explain");
        } else {
            tracing::trace!(sql = %sql, "explain");
        }
    }
}

///
/// Prepared
/// A compiled plan paired with the template it will bind values from.
///

pub struct Prepared<T> {
    plan: Arc<CompiledPlan>,
    template: ExprRef,
    _marker: PhantomData<fn() -> T>,
}

impl<T: FromRow> Prepared<T> {
    #[must_use]
    pub const fn plan(&self) -> &Arc<CompiledPlan> {
        &self.plan
    }

    #[must_use]
    pub fn sql(&self) -> &SqlQuery {
        self.plan.sql()
    }

    /// Bind this template's values; rows are read lazily from `conn`.
    pub fn query<'a, C: Connection>(
        &'a self,
        conn: &'a C,
    ) -> Result<PlanQuery<'a, T, C>, QueryError> {
        Ok(self.plan.query(conn, &self.template)?)
    }
}

///
/// TESTS
///
