use lsdgen_manifest::DefaultNested;

/// Position of a parameter inside the inline objects of one constructor
///
/// Scopes are copied when extended, so siblings never see each other's
/// field names.
#[derive(Debug, Clone, Default)]
pub(crate) struct FieldScope<'p> {
    pub(crate) parent_field_names: Vec<String>,
    /// Nested default values that apply below this scope
    pub(crate) default_nested: &'p [DefaultNested],
}

impl<'p> FieldScope<'p> {
    /// Scope of a field, replacing the nested defaults when it declares any
    pub(crate) fn with_field(&self, name: &str, default_nested: &'p [DefaultNested]) -> Self {
        let mut parent_field_names = self.parent_field_names.clone();
        parent_field_names.push(name.to_string());
        FieldScope {
            parent_field_names,
            default_nested: if default_nested.is_empty() {
                self.default_nested
            } else {
                default_nested
            },
        }
    }

    pub(crate) fn without_last_field(&self) -> Self {
        let mut parent_field_names = self.parent_field_names.clone();
        parent_field_names.pop();
        FieldScope {
            parent_field_names,
            default_nested: self.default_nested,
        }
    }

    pub(crate) fn path(&self) -> String {
        self.parent_field_names.join("_")
    }

    /// Nested defaults whose path is exactly this scope
    pub(crate) fn matching_defaults(&self) -> impl Iterator<Item = &'p DefaultNested> + '_ {
        let path = self.path();
        self.default_nested
            .iter()
            .filter(move |nested| nested.param_path.join("_") == path)
    }
}
