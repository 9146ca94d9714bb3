use serde::{Deserialize, Serialize};

/// Meta fields an update patch may never touch.
pub const PROTECTED_FIELDS: [&str; 4] = ["id", "soul", "schema", "createdAt"];

/// Storage path of an entity: `prefix/id`.
pub fn soul(prefix: &str, id: &str) -> String {
    format!("{prefix}/{id}")
}

/// A stored entity: meta fields plus a schema-typed payload.
///
/// The payload is flattened, so on the wire a `Thing<Post>` is one JSON
/// object holding both the meta fields and the post's own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thing<D> {
    pub id: String,
    /// Always `prefix/id`; never changed after creation.
    pub soul: String,
    /// Type tag of the payload schema.
    pub schema: String,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default = "default_public")]
    pub public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(flatten)]
    pub data: D,
}

fn default_public() -> bool {
    true
}
