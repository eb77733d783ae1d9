//! Core runtime for sqlchain: operator-chain templates, the structural plan
//! cache, the operator parsing pipeline, and lazy plan execution.

#[macro_use]
mod macros;

// public exports are one module level down
pub mod chain;
pub mod config;
pub mod error;
pub mod expr;
pub mod model;
pub mod obs;
pub mod parse;
pub mod plan;
pub mod session;
pub mod sql;
pub mod traits;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Default bound on retained plans, and on the entries one lookup scans.
pub const DEFAULT_PLAN_CACHE_DEPTH: usize = 100;

///
/// Prelude
///
/// Chain-building vocabulary only.
/// No caches, parsers or errors are re-exported here.
///

pub mod prelude {
    pub use crate::{
        chain::Queryable,
        expr::{Expr, ExprExt, ExprRef, MemberRef},
        model::{EntityModel, FieldModel, MappingSchema},
        session::QuerySession,
        traits::{EntityKind, FromRow, Path},
        value::{ClosureEnv, Value},
    };
}
