//! ## Crate layout
//! - `core`: operator-chain templates, the plan cache, the operator parsers,
//!   SQL model and lazy execution.
//! - `error`: public error type with a stable kind + origin taxonomy.
//!
//! The `prelude` module carries the chain-building vocabulary plus the
//! session and error types most callers need.

pub use sqlchain_core as core;

pub mod error;

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//
// Macros
//

pub use sqlchain_core::entity;

// re-exports
pub use error::Error;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        core::{
            chain::Queryable,
            config::CoreConfig,
            expr::{Expr, ExprExt as _, ExprRef, MemberRef, TypeRef},
            model::MappingSchema,
            plan::{Connection, Cursor, Row},
            session::{Prepared, QuerySession},
            traits::{EntityKind as _, FromRow, Path as _},
            value::{ClosureEnv, Value},
        },
        error::Error,
    };
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::sync::Arc;

    struct Track {
        title: String,
    }

    crate::entity! {
        Track,
        path = "music::Track",
        table = "tracks",
        fields = [("title", "track_title")],
    }

    impl FromRow for Track {
        fn from_row(row: &Row) -> Result<Self, crate::core::error::InternalError> {
            Ok(Self {
                title: row.read("title")?,
            })
        }
    }

    #[test]
    fn prelude_builds_and_explains_a_chain() -> Result<(), Error> {
        let session = QuerySession::from_config(
            Arc::new(MappingSchema::new("music")),
            &CoreConfig::default(),
        )?;
        let title = MemberRef::of::<Track, String>("title");
        let query = Queryable::<Track>::table().order_by(|x| x.field(title));

        let sql = session.explain(&query)?;

        assert_eq!(
            sql,
            "SELECT t0.track_title AS title FROM tracks t0 ORDER BY t0.track_title"
        );
        Ok(())
    }

    #[test]
    fn rows_map_through_from_row() {
        let row = Row::new(Arc::from(vec!["title".to_string()]), vec![Value::from("Blue")])
            .expect("one column");

        let track = Track::from_row(&row).expect("maps");

        assert_eq!(track.title, "Blue");
    }
}
