use crate::schema::Schema;
use crate::thing::Thing;
use ariob_crypto::KeyPair;
use ariob_types::{AppError, AppResult, Issue};
use serde::{Deserialize, Serialize};

/// Storage prefix of public profiles (`who/<pub>`).
pub const WHO_PREFIX: &str = "who";

/// Public profile of an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub alias: String,
    #[serde(rename = "pub")]
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl Profile {
    pub fn new(alias: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            public_key: public_key.into(),
            display_name: None,
            avatar: None,
            bio: None,
        }
    }
}

impl Schema for Profile {
    const TYPE: &'static str = "who";

    fn validate(&self) -> Result<(), Vec<Issue>> {
        let mut issues = Vec::new();
        if self.alias.trim().is_empty() {
            issues.push(Issue::new("/alias", "must not be empty"));
        }
        if self.alias.chars().count() > 64 {
            issues.push(Issue::new("/alias", "must be at most 64 characters"));
        }
        if self.public_key.is_empty() {
            issues.push(Issue::new("/pub", "must not be empty"));
        }
        if issues.is_empty() { Ok(()) } else { Err(issues) }
    }
}

/// A stored profile entity.
pub type Who = Thing<Profile>;

/// How an identity authenticates against the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    Keypair,
    Mnemonic,
    Traditional,
}

/// Exported credentials: the full key pair plus optional hints.
///
/// This is the plaintext backup format accepted by account import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(flatten)]
    pub pair: KeyPair,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_method: Option<AuthMethod>,
}

impl Credentials {
    pub fn new(pair: KeyPair) -> Self {
        Self {
            pair,
            alias: None,
            auth_method: None,
        }
    }

    /// Parses and checks a credentials document.
    pub fn parse(json: &str) -> AppResult<Self> {
        let credentials: Credentials = serde_json::from_str(json)
            .map_err(|e| AppError::validation("invalid credentials format").with_cause(e))?;
        credentials
            .pair
            .validate()
            .map_err(|e| AppError::validation("invalid credentials format").with_cause(e))?;
        Ok(credentials)
    }

    pub fn to_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
