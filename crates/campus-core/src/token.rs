// ── Credential storage ──
//
// The token store is a dumb get/set/clear slot for the bearer credential.
// It never inspects what it holds; validity is the guard's concern.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use directories::ProjectDirs;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, warn};

const KEYRING_SERVICE: &str = "campus";

/// Failure reading or writing the persisted credential.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("keyring: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("cannot determine a data directory for credentials")]
    NoDataDir,
}

/// Durable slot holding at most one bearer credential.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Result<Option<SecretString>, TokenStoreError>;

    fn set(&self, token: &SecretString) -> Result<(), TokenStoreError>;

    /// Remove the credential. Clearing an empty store succeeds.
    fn clear(&self) -> Result<(), TokenStoreError>;
}

/// Feeds the request-side auth stage from a token store.
///
/// Read at send time, so a logout between two requests takes effect
/// immediately.
pub struct StoredCredential(pub Arc<dyn TokenStore>);

impl campus_api::CredentialSource for StoredCredential {
    fn bearer(&self) -> Option<SecretString> {
        self.0.get().unwrap_or_else(|e| {
            warn!(error = %e, "cannot read stored credential");
            None
        })
    }
}

// ── In-memory ────────────────────────────────────────────────────────

/// Process-local store; readers see a lock-free snapshot.
#[derive(Default)]
pub struct MemoryTokenStore {
    slot: ArcSwapOption<SecretString>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: SecretString) -> Self {
        let store = Self::new();
        store.slot.store(Some(token.into()));
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<Option<SecretString>, TokenStoreError> {
        Ok(self.slot.load_full().map(|t| SecretString::from(t.expose_secret())))
    }

    fn set(&self, token: &SecretString) -> Result<(), TokenStoreError> {
        self.slot.store(Some(SecretString::from(token.expose_secret()).into()));
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        self.slot.store(None);
        Ok(())
    }
}

// ── File ─────────────────────────────────────────────────────────────

/// A single file holding the credential string.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/tokens/<profile>` under the platform data directory.
    pub fn for_profile(profile: &str) -> Result<Self, TokenStoreError> {
        let dirs = ProjectDirs::from("com", "campus", "campus").ok_or(TokenStoreError::NoDataDir)?;
        Ok(Self::new(dirs.data_dir().join("tokens").join(profile)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: io::Error) -> TokenStoreError {
        TokenStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Result<Option<SecretString>, TokenStoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                Ok((!token.is_empty()).then(|| SecretString::from(token)))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_err(e)),
        }
    }

    fn set(&self, token: &SecretString) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path).map_err(|e| self.io_err(e))?;

        // `mode` only applies on creation; tighten a pre-existing file
        // before the credential reaches it.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_err(e))?;
        }
        file.write_all(token.expose_secret().as_bytes())
            .map_err(|e| self.io_err(e))?;

        debug!(path = %self.path.display(), "credential written");
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(e)),
        }
    }
}

// ── Keyring ──────────────────────────────────────────────────────────

/// System keyring entry `campus` / `<profile>/token`.
pub struct KeyringTokenStore {
    entry: keyring::Entry,
}

impl KeyringTokenStore {
    pub fn new(profile: &str) -> Result<Self, TokenStoreError> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile}/token"))?;
        Ok(Self { entry })
    }
}

impl TokenStore for KeyringTokenStore {
    fn get(&self) -> Result<Option<SecretString>, TokenStoreError> {
        match self.entry.get_password() {
            Ok(token) if token.is_empty() => Ok(None),
            Ok(token) => Ok(Some(SecretString::from(token))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, token: &SecretString) -> Result<(), TokenStoreError> {
        self.entry.set_password(token.expose_secret())?;
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s)
    }

    fn assert_store_contract(store: &dyn TokenStore) {
        assert!(store.get().unwrap().is_none());

        store.set(&secret("first")).unwrap();
        assert_eq!(store.get().unwrap().unwrap().expose_secret(), "first");

        store.set(&secret("second")).unwrap();
        assert_eq!(store.get().unwrap().unwrap().expose_secret(), "second");

        store.clear().unwrap();
        assert!(store.get().unwrap().is_none());
        store.clear().unwrap();
        assert!(store.get().unwrap().is_none());
    }

    #[test]
    fn memory_store_contract() {
        assert_store_contract(&MemoryTokenStore::new());
    }

    #[test]
    fn file_store_contract() {
        let dir = tempfile::tempdir().unwrap();
        assert_store_contract(&FileTokenStore::new(dir.path().join("nested").join("token")));
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        FileTokenStore::new(&path).set(&secret("abc")).unwrap();

        let reopened = FileTokenStore::new(&path);
        assert_eq!(reopened.get().unwrap().unwrap().expose_secret(), "abc");
    }

    #[test]
    fn file_store_treats_blank_file_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "  \n").unwrap();
        assert!(FileTokenStore::new(path).get().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("token"));
        store.set(&secret("abc")).unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn file_store_tightens_existing_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "old").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileTokenStore::new(&path);
        store.set(&secret("fresh")).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.get().unwrap().unwrap().expose_secret(), "fresh");
    }
}
