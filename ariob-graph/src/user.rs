use crate::error::GraphResult;
use ariob_crypto::KeyPair;
use async_trait::async_trait;

/// The graph store's user system.
///
/// At most one user is authenticated at a time; authenticating replaces
/// the current user.
#[async_trait]
pub trait GraphUser: Send + Sync + std::fmt::Debug {
    /// Registers `alias` with a password, generating the user's key pair.
    async fn create(&self, alias: &str, password: &str) -> GraphResult<KeyPair>;

    /// Authenticates with alias and password, returning the user's pair.
    async fn auth(&self, alias: &str, password: &str) -> GraphResult<KeyPair>;

    /// Authenticates directly with a key pair.
    async fn auth_pair(&self, pair: &KeyPair) -> GraphResult<()>;

    /// Drops the authenticated user.
    fn leave(&self);

    /// Public key of the authenticated user.
    fn is(&self) -> Option<String>;
}
