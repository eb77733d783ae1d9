use crate::{error::InternalError, model::EntityModel, plan::Row, value::Value};

///
/// Path
/// Fully-qualified type path.
///

pub trait Path {
    const PATH: &'static str;
}

///
/// EntityKind
/// A mapped entity that a chain can start from.
///

pub trait EntityKind: Path + FromRow + Send + Sync + 'static {
    const MODEL: &'static EntityModel;
}

///
/// FromRow
///
/// Row-to-value mapping supplied by the relational-mapping layer.
/// Columns are addressed by member name (entity field name or projection
/// member name).
///

pub trait FromRow: Sized + 'static {
    fn from_row(row: &Row) -> Result<Self, InternalError>;
}

///
/// FromValue
/// Typed read of one column value.
///

pub trait FromValue: Sized {
    /// Target type name used in mapping errors.
    const EXPECTED: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for i32 {
    const EXPECTED: &'static str = "i32";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_int()
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "i64";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_long()
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "f64";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_float()
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "String";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_text().map(str::to_string)
    }
}

// `NULL` maps to `None`; anything else must map to `T`.
impl<T: FromValue> FromValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_value(value: &Value) -> Option<Self> {
        if value.is_null() {
            Some(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

// Single-column results map straight from the scalar column.
macro_rules! impl_from_row_scalar {
    ( $( $ty:ty ),* $(,)? ) => {
        $(
            impl FromRow for $ty {
                fn from_row(row: &Row) -> Result<Self, InternalError> {
                    row.scalar_as()
                }
            }
        )*
    };
}

impl_from_row_scalar!(i32, i64, f64, bool, String, Option<i32>, Option<i64>, Option<String>);
