use ariob_types::Issue;
use serde::{de::DeserializeOwned, Serialize};

/// A payload type that can live inside a [`Thing`](crate::Thing).
///
/// Structural checks (required fields, field types) come from serde;
/// `validate` adds the semantic ones. Return every failing field, not
/// just the first.
pub trait Schema: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Discriminator written to the `schema` meta field.
    const TYPE: &'static str;

    fn validate(&self) -> Result<(), Vec<Issue>> {
        Ok(())
    }
}
