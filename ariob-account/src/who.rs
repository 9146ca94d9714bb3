use crate::error::AccountError;
use ariob_crypto::{CryptoSuite, KeyPair};
use ariob_data::{Adapter, EntityService};
use ariob_graph::GraphUser;
use ariob_model::{Profile, Validator, Who, WHO_PREFIX};
use ariob_types::{AppError, AppResult, Clock};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// How to sign up or log in.
#[derive(Debug, Clone)]
pub enum AuthRequest {
    /// Sign up generates a pair when none is given; login requires one.
    KeyPair {
        alias: String,
        pair: Option<KeyPair>,
    },
    /// Sign up generates a phrase when none is given; login requires one.
    Mnemonic {
        alias: String,
        phrase: Option<String>,
        passphrase: String,
    },
    /// Alias/password account in the graph's own user system.
    Password { alias: String, password: String },
}

impl AuthRequest {
    pub fn alias(&self) -> &str {
        match self {
            AuthRequest::KeyPair { alias, .. }
            | AuthRequest::Mnemonic { alias, .. }
            | AuthRequest::Password { alias, .. } => alias,
        }
    }
}

/// An authenticated identity.
#[derive(Clone)]
pub struct Identity {
    pub profile: Who,
    pub pair: KeyPair,
    /// Set only when sign-up generated the phrase; show it to the user once.
    pub mnemonic: Option<String>,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("profile", &self.profile)
            .field("pair", &self.pair)
            .field("mnemonic", &self.mnemonic.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Sign-up, login and public profiles (`who/<pub>`).
///
/// At most one identity is authenticated at a time; it is whatever the
/// graph user system currently reports.
#[derive(Debug)]
pub struct WhoService {
    user: Arc<dyn GraphUser>,
    profiles: EntityService<Profile>,
    suite: Arc<dyn CryptoSuite>,
    current: Mutex<Option<Who>>,
}

impl WhoService {
    pub fn new(
        user: Arc<dyn GraphUser>,
        adapter: Arc<dyn Adapter>,
        suite: Arc<dyn CryptoSuite>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let profiles = EntityService::new(Validator::new(WHO_PREFIX, clock), adapter)
            .with_identity(Arc::clone(&user));
        Self {
            user,
            profiles,
            suite,
            current: Mutex::new(None),
        }
    }

    fn current_slot(&self) -> MutexGuard<'_, Option<Who>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Creates an identity, authenticates it and writes its profile.
    pub async fn signup(&self, request: AuthRequest) -> AppResult<Identity> {
        let alias = request.alias().to_string();
        let (pair, mnemonic) = match request {
            AuthRequest::KeyPair { pair, .. } => {
                let pair = pair.unwrap_or_else(|| self.suite.generate_key_pair());
                pair.validate()?;
                self.user.auth_pair(&pair).await?;
                (pair, None)
            }
            AuthRequest::Mnemonic {
                phrase, passphrase, ..
            } => {
                let generated = phrase.is_none();
                let phrase = match phrase {
                    Some(phrase) => phrase,
                    None => self.suite.generate_mnemonic()?,
                };
                let pair = self.pair_from_mnemonic(&phrase, &passphrase)?;
                self.user.auth_pair(&pair).await?;
                (pair, generated.then_some(phrase))
            }
            AuthRequest::Password { password, .. } => {
                self.user.create(&alias, &password).await?;
                let pair = self.user.auth(&alias, &password).await?;
                (pair, None)
            }
        };

        let profile = match self
            .profiles
            .create_with_id(&pair.public, Profile::new(&alias, &pair.public))
            .await
        {
            Ok(profile) => profile,
            Err(err) => {
                warn!(alias = %alias, error = %err, "profile write failed, leaving");
                self.logout();
                return Err(err);
            }
        };
        *self.current_slot() = Some(profile.clone());
        info!(alias = %alias, "identity signed up");
        Ok(Identity {
            profile,
            pair,
            mnemonic,
        })
    }

    /// Authenticates an existing identity and loads its profile.
    pub async fn login(&self, request: AuthRequest) -> AppResult<Identity> {
        let pair = match request {
            AuthRequest::KeyPair { pair, .. } => {
                let pair = pair.ok_or(AccountError::IncompleteRequest("key pair required"))?;
                self.user.auth_pair(&pair).await?;
                pair
            }
            AuthRequest::Mnemonic {
                phrase, passphrase, ..
            } => {
                let phrase =
                    phrase.ok_or(AccountError::IncompleteRequest("mnemonic phrase required"))?;
                let pair = self.pair_from_mnemonic(&phrase, &passphrase)?;
                self.user.auth_pair(&pair).await?;
                pair
            }
            AuthRequest::Password { alias, password } => {
                self.user.auth(&alias, &password).await?
            }
        };

        let profile = match self.profiles.get(&pair.public).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                self.logout();
                return Err(AccountError::ProfileNotFound(pair.public.clone()).into());
            }
            Err(err) => {
                self.logout();
                return Err(err);
            }
        };
        *self.current_slot() = Some(profile.clone());
        debug!(alias = %profile.data.alias, "identity logged in");
        Ok(Identity {
            profile,
            pair,
            mnemonic: None,
        })
    }

    pub fn logout(&self) {
        self.user.leave();
        *self.current_slot() = None;
    }

    /// Profile of the authenticated identity, if any.
    pub fn current(&self) -> Option<Who> {
        let public_key = self.user.is()?;
        self.current_slot()
            .clone()
            .filter(|profile| profile.id == public_key)
    }

    /// Public key the graph user system is authenticated as.
    pub fn public_key(&self) -> Option<String> {
        self.user.is()
    }

    pub async fn profile(&self, public_key: &str) -> AppResult<Option<Who>> {
        self.profiles.get(public_key).await
    }

    /// Patches the authenticated identity's own profile.
    pub async fn update_profile(&self, patch: Value) -> AppResult<Who> {
        let public_key = self
            .user
            .is()
            .ok_or_else(|| AppError::auth("not authenticated"))?;
        let updated = self
            .profiles
            .update(&public_key, patch)
            .await?
            .ok_or(AccountError::ProfileNotFound(public_key))?;
        *self.current_slot() = Some(updated.clone());
        Ok(updated)
    }

    fn pair_from_mnemonic(&self, phrase: &str, passphrase: &str) -> AppResult<KeyPair> {
        self.suite
            .pair_from_mnemonic(phrase, passphrase)
            .map_err(|err| AppError::from(AccountError::InvalidMnemonic).with_cause(err))
    }
}
