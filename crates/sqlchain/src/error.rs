use derive_more::Display;
use serde::{Deserialize, Serialize};
use sqlchain_core::{
    config::ConfigError,
    error::{ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError},
    parse::ParseError,
    session::QueryError,
};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Debug, Deserialize, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        let kind = match err.class {
            ErrorClass::NotFound | ErrorClass::Unsupported
                if err.origin == CoreErrorOrigin::Mapping =>
            {
                ErrorKind::Mapping
            }
            ErrorClass::Internal if err.origin == CoreErrorOrigin::Connection => {
                ErrorKind::Connection
            }
            _ => ErrorKind::Internal,
        };

        Self::new(kind, err.origin.into(), err.message)
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        let kind = match err {
            ParseError::UnsupportedConstruction { .. }
            | ParseError::UnsupportedOperator { .. }
            | ParseError::UnsupportedExpression { .. } => QueryErrorKind::Unsupported,
            ParseError::UnknownMember { .. }
            | ParseError::UnboundParameter { .. }
            | ParseError::DetachedLink { .. } => QueryErrorKind::Invalid,
            ParseError::UnmappedSource { .. } => QueryErrorKind::Unmapped,
        };

        Self::new(ErrorKind::Query(kind), ErrorOrigin::Parse, err.to_string())
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Parse(err) => err.into(),
            QueryError::Internal(err) => err.into(),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorKind::Config, ErrorOrigin::Config, err.to_string())
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    Query(QueryErrorKind),

    /// Configuration could not be loaded or is out of range.
    Config,

    /// The driver failed to run a command or read a row.
    Connection,

    /// A row did not fit the requested element type.
    Mapping,

    /// The caller cannot remediate this.
    Internal,
}

///
/// QueryErrorKind
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum QueryErrorKind {
    /// The chain refers to members or parameters that do not exist.
    Invalid,

    /// The chain uses an operator or expression with no SQL translation.
    Unsupported,

    /// The mapping schema has no table for the chain's source.
    Unmapped,
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Config,
    Connection,
    Executor,
    Mapping,
    Parse,
    Plan,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Plan => Self::Plan,
            CoreErrorOrigin::Executor => Self::Executor,
            CoreErrorOrigin::Connection => Self::Connection,
            CoreErrorOrigin::Mapping => Self::Mapping,
        }
    }
}

///
/// TESTS
///
