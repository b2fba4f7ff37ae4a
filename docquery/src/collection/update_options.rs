use crate::common::{SortOrder, Value};

/// Which image of the document a find-and-modify operation returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnDocument {
    /// The document as it was before the modification.
    #[default]
    Before,
    /// The document as it is after the modification.
    After,
}

/// Options for updating a single document.
///
/// ```rust
/// use docquery::collection::{FindOneAndUpdateOptions, ReturnDocument};
///
/// let options = FindOneAndUpdateOptions::new()
///     .return_document(ReturnDocument::After)
///     .upsert(true);
/// assert!(options.is_upsert());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOneAndUpdateOptions {
    return_document: ReturnDocument,
    upsert: bool,
    sort_by: Vec<(String, SortOrder)>,
}

impl FindOneAndUpdateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn return_document(mut self, return_document: ReturnDocument) -> Self {
        self.return_document = return_document;
        self
    }

    /// Inserts a new document when nothing matches.
    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }

    /// Chooses which match is updated when several match.
    pub fn sort_by(mut self, field_name: &str, sort_order: SortOrder) -> Self {
        self.sort_by.push((field_name.to_string(), sort_order));
        self
    }

    pub fn returned(&self) -> ReturnDocument {
        self.return_document
    }

    pub fn is_upsert(&self) -> bool {
        self.upsert
    }

    pub fn sort_keys(&self) -> &[(String, SortOrder)] {
        &self.sort_by
    }
}

/// Options for replacing a single document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOneAndReplaceOptions {
    return_document: ReturnDocument,
    upsert: bool,
}

impl FindOneAndReplaceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn return_document(mut self, return_document: ReturnDocument) -> Self {
        self.return_document = return_document;
        self
    }

    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }

    pub fn returned(&self) -> ReturnDocument {
        self.return_document
    }

    pub fn is_upsert(&self) -> bool {
        self.upsert
    }
}

/// Options for updating every matching document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOptions {
    upsert: bool,
}

impl UpdateOptions {
    pub fn new(upsert: bool) -> Self {
        Self { upsert }
    }

    pub fn is_upsert(&self) -> bool {
        self.upsert
    }
}

/// Creates `UpdateOptions` that insert a document when nothing matches.
pub fn upsert() -> UpdateOptions {
    UpdateOptions::new(true)
}

/// Outcome of an update-many operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateResult {
    /// Documents matching the filter.
    pub matched_count: u64,
    /// Matched documents whose content actually changed.
    pub modified_count: u64,
    /// `_id` of the inserted document, when the update upserted.
    pub upserted_id: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_one_and_update_defaults() {
        let options = FindOneAndUpdateOptions::default();
        assert_eq!(options.returned(), ReturnDocument::Before);
        assert!(!options.is_upsert());
        assert!(options.sort_keys().is_empty());
    }

    #[test]
    fn test_find_one_and_update_builder() {
        let options = FindOneAndUpdateOptions::new()
            .return_document(ReturnDocument::After)
            .upsert(true)
            .sort_by("age", SortOrder::Descending);
        assert_eq!(options.returned(), ReturnDocument::After);
        assert!(options.is_upsert());
        assert_eq!(options.sort_keys()[0], ("age".to_string(), SortOrder::Descending));
    }

    #[test]
    fn test_find_one_and_replace_builder() {
        let options = FindOneAndReplaceOptions::new().upsert(true);
        assert!(options.is_upsert());
        assert_eq!(options.returned(), ReturnDocument::Before);
    }

    #[test]
    fn test_update_options() {
        assert!(!UpdateOptions::default().is_upsert());
        assert!(upsert().is_upsert());
    }

    #[test]
    fn test_update_result_default() {
        let result = UpdateResult::default();
        assert_eq!(result.matched_count, 0);
        assert_eq!(result.modified_count, 0);
        assert!(result.upserted_id.is_none());
    }
}
