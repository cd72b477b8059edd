use std::fmt;

use anyhow::{Context, Result};
use keyring::Entry;
use tracing::debug;

use crate::config::Config;

const SERVICE_NAME: &str = "shelfstats";

/// Environment variable for the progress-service API key
pub const API_KEY_ENV: &str = "HARDCOVER_API_KEY";
/// Environment variable for the progress-service user id
pub const USER_ID_ENV: &str = "HARDCOVER_USER_ID";

const API_KEY_ACCOUNT: &str = "hardcover-api-key";
const USER_ID_ACCOUNT: &str = "hardcover-user-id";

/// Keychain storage for the progress-service credentials
pub struct CredentialStore;

impl CredentialStore {
    pub fn store_api_key(api_key: &str) -> Result<()> {
        Self::store(API_KEY_ACCOUNT, api_key)
    }

    pub fn store_user_id(user_id: &str) -> Result<()> {
        Self::store(USER_ID_ACCOUNT, user_id)
    }

    pub fn api_key() -> Option<String> {
        Self::get(API_KEY_ACCOUNT)
    }

    pub fn user_id() -> Option<String> {
        Self::get(USER_ID_ACCOUNT)
    }

    /// Delete both stored values; missing entries are not an error
    pub fn clear() -> Result<()> {
        for account in [API_KEY_ACCOUNT, USER_ID_ACCOUNT] {
            let entry = Entry::new(SERVICE_NAME, account)
                .context("Failed to create keyring entry")?;
            match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => {
                    return Err(e).context("Failed to delete credential from keychain");
                }
            }
        }
        Ok(())
    }

    fn store(account: &str, secret: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, account)
            .context("Failed to create keyring entry")?;
        entry
            .set_password(secret)
            .context("Failed to store credential in keychain")?;
        Ok(())
    }

    fn get(account: &str) -> Option<String> {
        let entry = match Entry::new(SERVICE_NAME, account) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(account, error = %e, "Keychain unavailable");
                return None;
            }
        };
        match entry.get_password() {
            Ok(secret) => Some(secret),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                debug!(account, error = %e, "Failed to read keychain entry");
                None
            }
        }
    }
}

/// Where a credential value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Baked into the binary at build time
    BuildTime,
    Environment,
    Keychain,
    ConfigFile,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::BuildTime => write!(f, "build-time injection"),
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Keychain => write!(f, "keychain"),
            CredentialSource::ConfigFile => write!(f, "config file"),
        }
    }
}

/// API key and user id for the progress service. Either may be missing,
/// in which case the progress feature stays off.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HardcoverCredentials {
    pub api_key: Option<String>,
    pub user_id: Option<String>,
    pub api_key_source: Option<CredentialSource>,
    pub user_id_source: Option<CredentialSource>,
}

impl HardcoverCredentials {
    pub fn new(api_key: Option<String>, user_id: Option<String>) -> Self {
        Self {
            api_key: non_blank(api_key),
            user_id: non_blank(user_id),
            api_key_source: None,
            user_id_source: None,
        }
    }

    /// Resolve both values from every supported source, first match wins.
    pub fn resolve(config: &Config) -> Self {
        let (api_key, api_key_source) = pick([
            (option_env!("HARDCOVER_API_KEY").map(str::to_string), CredentialSource::BuildTime),
            (std::env::var(API_KEY_ENV).ok(), CredentialSource::Environment),
            (CredentialStore::api_key(), CredentialSource::Keychain),
            (config.hardcover_api_key.clone(), CredentialSource::ConfigFile),
        ]);
        let (user_id, user_id_source) = pick([
            (option_env!("HARDCOVER_USER_ID").map(str::to_string), CredentialSource::BuildTime),
            (std::env::var(USER_ID_ENV).ok(), CredentialSource::Environment),
            (CredentialStore::user_id(), CredentialSource::Keychain),
            (config.hardcover_user_id.clone(), CredentialSource::ConfigFile),
        ]);

        debug!(?api_key_source, ?user_id_source, "Resolved progress-service credentials");

        Self {
            api_key,
            user_id,
            api_key_source,
            user_id_source,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.user_id.is_some()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn pick<const N: usize>(
    candidates: [(Option<String>, CredentialSource); N],
) -> (Option<String>, Option<CredentialSource>) {
    candidates
        .into_iter()
        .find_map(|(value, source)| non_blank(value).map(|v| (Some(v), Some(source))))
        .unwrap_or((None, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_first_non_blank() {
        let (value, source) = pick([
            (None, CredentialSource::BuildTime),
            (Some("  ".to_string()), CredentialSource::Environment),
            (Some("from-keychain".to_string()), CredentialSource::Keychain),
            (Some("from-config".to_string()), CredentialSource::ConfigFile),
        ]);
        assert_eq!(value.as_deref(), Some("from-keychain"));
        assert_eq!(source, Some(CredentialSource::Keychain));
    }

    #[test]
    fn test_pick_nothing() {
        let (value, source) = pick([(None, CredentialSource::Environment)]);
        assert!(value.is_none());
        assert!(source.is_none());
    }

    #[test]
    fn test_new_trims_and_drops_blank() {
        let creds = HardcoverCredentials::new(Some(" key ".to_string()), Some(String::new()));
        assert_eq!(creds.api_key.as_deref(), Some("key"));
        assert!(creds.user_id.is_none());
        assert!(!creds.is_configured());
    }
}
