//! Secure credential storage via the OS keychain.
//!
//! Provides functions to load and save secrets stored in the system
//! keychain. At startup, [`populate_env_from_keychain`] copies any stored
//! credentials into environment variables so the existing config flow picks
//! them up transparently.

use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Keychain service name used for all stored credentials.
const SERVICE: &str = "bookwatch";

/// Known credential keys managed by this module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialKey {
    TelegramBotToken,
    BinanceApiKey,
}

impl CredentialKey {
    /// Returns the keychain entry identifier.
    pub fn keyring_id(self) -> &'static str {
        match self {
            Self::TelegramBotToken => "telegram_bot_token",
            Self::BinanceApiKey => "binance_api_key",
        }
    }

    /// Returns the environment variable name for this credential.
    pub fn env_var(self) -> &'static str {
        match self {
            Self::TelegramBotToken => "TELEGRAM_BOT_TOKEN",
            Self::BinanceApiKey => "BINANCE_API_KEY",
        }
    }

    /// Looks a key up by its keychain identifier.
    pub fn from_keyring_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.keyring_id() == id)
    }

    /// All credential keys.
    pub const ALL: [CredentialKey; 2] = [Self::TelegramBotToken, Self::BinanceApiKey];
}

/// Loads a credential from the keychain, returning `None` if not set.
pub fn load(key: CredentialKey) -> Option<Zeroizing<String>> {
    let entry = keyring::Entry::new(SERVICE, key.keyring_id()).ok()?;
    match entry.get_password() {
        Ok(password) => Some(Zeroizing::new(password)),
        Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            warn!(key = key.keyring_id(), error = %e, "failed to read keychain entry");
            None
        }
    }
}

/// Saves a credential to the keychain.
///
/// # Errors
///
/// Returns [`BookwatchError::Config`](crate::BookwatchError::Config) if the
/// keychain rejects the entry.
pub fn save(key: CredentialKey, value: &str) -> crate::Result<()> {
    let entry = keyring::Entry::new(SERVICE, key.keyring_id())
        .map_err(|e| crate::BookwatchError::Config(format!("keyring entry error: {e}")))?;
    entry
        .set_password(value)
        .map_err(|e| crate::BookwatchError::Config(format!("failed to save to keychain: {e}")))
}

/// Populates environment variables from the keychain for any
/// credentials not already set in the environment.
///
/// Call this at startup before [`crate::config::fetch_config`] and before
/// the tokio runtime spawns worker threads.
pub fn populate_env_from_keychain() {
    for key in CredentialKey::ALL {
        if std::env::var(key.env_var()).is_err()
            && let Some(value) = load(key)
        {
            debug!(key = key.env_var(), "loaded credential from keychain");
            // SAFETY: called from `main` before any other thread exists.
            unsafe {
                std::env::set_var(key.env_var(), value.as_str());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_config_variables() {
        assert_eq!(CredentialKey::TelegramBotToken.env_var(), "TELEGRAM_BOT_TOKEN");
        assert_eq!(CredentialKey::BinanceApiKey.env_var(), "BINANCE_API_KEY");
    }

    #[test]
    fn looks_up_keys_by_keyring_id() {
        assert_eq!(
            CredentialKey::from_keyring_id("telegram_bot_token"),
            Some(CredentialKey::TelegramBotToken)
        );
        assert_eq!(CredentialKey::from_keyring_id("database_password"), None);
    }

    #[test]
    fn keyring_ids_are_distinct() {
        assert_ne!(
            CredentialKey::TelegramBotToken.keyring_id(),
            CredentialKey::BinanceApiKey.keyring_id()
        );
    }
}
