/// Implement `Path` and `EntityKind` for a struct mapped to one table.
///
/// ```ignore
/// sqlchain_core::entity! {
///     Person,
///     path = "app::Person",
///     table = "people",
///     fields = [("id", "person_id"), ("name", "full_name")],
/// }
/// ```
#[macro_export]
macro_rules! entity {
    (
        $entity:ty,
        path = $path:expr,
        table = $table:expr,
        fields = [ $( ($field:expr, $column:expr) ),+ $(,)? ] $(,)?
    ) => {
        impl $crate::traits::Path for $entity {
            const PATH: &'static str = $path;
        }

        impl $crate::traits::EntityKind for $entity {
            const MODEL: &'static $crate::model::EntityModel = &$crate::model::EntityModel {
                path: $path,
                table: $table,
                fields: &[
                    $(
                        $crate::model::FieldModel {
                            name: $field,
                            column: $column,
                        },
                    )+
                ],
            };
        }
    };
}
