///
/// EntityModel
/// Minimal, macro-generated runtime model for one mapped entity.
///

#[derive(Debug)]
pub struct EntityModel {
    /// Fully-qualified Rust type path (for dispatch and diagnostics).
    pub path: &'static str,
    /// Default table name; a mapping schema may override it.
    pub table: &'static str,
    /// Ordered field list (authoritative for projection and row mapping).
    pub fields: &'static [FieldModel],
}

impl EntityModel {
    /// Look up a field by its member name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldModel> {
        self.fields.iter().find(|field| field.name == name)
    }
}

///
/// FieldModel
/// Member-to-column mapping for one entity field.
///

#[derive(Debug)]
pub struct FieldModel {
    /// Member name as used in templates and rows.
    pub name: &'static str,
    /// Column name in the mapped table.
    pub column: &'static str,
}
