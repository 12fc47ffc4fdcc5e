use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{SaltString, rand_core::OsRng},
};
use std::sync::Arc;

use crate::{
    config::AppConfig,
    error::{AppError, Result},
    models::{NewUser, UserIdentity, UserRecord},
    repository::CredentialStore,
};

/// Passwords
///
/// Argon2id hashing with the configured cost. Also keeps a hash of a throwaway
/// password so a login for an unknown account does the same work as a login
/// with a wrong password.
pub struct Passwords {
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl Passwords {
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self> {
        let params = Params::new(memory_kib, iterations, Params::DEFAULT_P_COST, None)
            .map_err(|e| AppError::Internal(format!("invalid argon2 parameters: {e}")))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut passwords = Self {
            argon2,
            dummy_hash: String::new(),
        };
        passwords.dummy_hash = passwords.hash("not-a-real-account-password")?;
        Ok(passwords)
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.argon2_memory_kib, config.argon2_iterations)
    }

    /// Hashes `password` with a fresh random salt into a PHC string.
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
    }

    /// Constant-time comparison of `password` against a stored PHC string. An
    /// unparseable hash never matches.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

/// Runs CPU-bound hashing off the async workers.
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))
}

/// verify_credentials
///
/// Resolves `identifier` (username or email) and checks `password`. Unknown
/// accounts and wrong passwords both yield `InvalidCredentials`.
pub async fn verify_credentials(
    store: &dyn CredentialStore,
    passwords: &Arc<Passwords>,
    identifier: &str,
    password: &str,
) -> Result<UserIdentity> {
    let record = store.find_by_identifier(identifier).await?;

    let (hash, identity) = match record {
        Some(record) => (record.password_hash.clone(), Some(record.identity())),
        None => (passwords.dummy_hash.clone(), None),
    };

    let passwords = Arc::clone(passwords);
    let password = password.to_owned();
    let matched = blocking(move || passwords.verify(&password, &hash)).await?;

    match (matched, identity) {
        (true, Some(identity)) => Ok(identity),
        _ => Err(AppError::InvalidCredentials),
    }
}

/// register_user
///
/// Hashes the password and creates the account. Store rejections (duplicate
/// username or email) are reported as a generic registration failure.
pub async fn register_user(
    store: &dyn CredentialStore,
    passwords: &Arc<Passwords>,
    username: String,
    password: String,
    email: Option<String>,
    admin: bool,
) -> Result<UserRecord> {
    let hasher = Arc::clone(passwords);
    let password_hash = blocking(move || hasher.hash(&password)).await??;

    store
        .create_user(NewUser {
            username,
            email,
            password_hash,
            admin,
        })
        .await
        .map_err(|e| match e {
            AppError::ValidationFailure(_) => {
                AppError::ValidationFailure("Registration failed".to_string())
            }
            other => other,
        })
}
