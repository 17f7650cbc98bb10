use super::{BindingTable, PersistenceError};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const APP_DIR: &str = "padbind";
const BINDINGS_DIR: &str = "bindings";

/// Binding tables on disk, one `<controller>.toml` per controller name
#[derive(Clone, Debug)]
pub struct BindingStore {
    base_path: PathBuf,
}

impl BindingStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// `<config_dir>/padbind/bindings`, falling back to `~/.config` and then `.`
    pub fn default_location() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| {
            let home = dirs::home_dir().unwrap_or_else(|| {
                warn!("Could not determine home directory, using current directory");
                PathBuf::from(".")
            });
            home.join(".config")
        });
        config_dir.join(APP_DIR).join(BINDINGS_DIR)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn path_for(&self, controller: &str) -> PathBuf {
        self.base_path
            .join(format!("{}.toml", sanitize_file_name(controller)))
    }

    pub async fn save(&self, table: &BindingTable) -> Result<PathBuf, PersistenceError> {
        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| io_error(&self.base_path, e))?;

        let path = self.path_for(&table.controller);
        let content = toml::to_string_pretty(table)?;
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| io_error(&path, e))?;

        info!(
            "Saved {} bindings of {} to {}",
            table.len(),
            table.controller,
            path.display()
        );
        Ok(path)
    }

    /// `Ok(None)` when the controller was never saved
    pub async fn load(&self, controller: &str) -> Result<Option<BindingTable>, PersistenceError> {
        let path = self.path_for(controller);
        if !tokio::fs::try_exists(&path)
            .await
            .map_err(|e| io_error(&path, e))?
        {
            debug!("No stored bindings for {}", controller);
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| io_error(&path, e))?;
        let table: BindingTable = toml::from_str(&content)?;
        debug!("Loaded {} bindings for {}", table.len(), controller);
        Ok(Some(table))
    }

    /// Deletes the stored table. Returns `false` if there was none.
    pub async fn reset(&self, controller: &str) -> Result<bool, PersistenceError> {
        let path = self.path_for(controller);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("Removed stored bindings of {}", controller);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(&path, e)),
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> PersistenceError {
    PersistenceError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Controller names come from the device and may contain anything
fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "controller".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::candidate::CandidateInput;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(
            sanitize_file_name("Xbox Wireless Controller"),
            "Xbox_Wireless_Controller"
        );
        assert_eq!(sanitize_file_name("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize_file_name("  "), "controller");
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = BindingStore::new(dir.path().join("bindings"));

        let mut table = BindingTable::new("Test Pad");
        table.configured = true;
        table.bind_button("accept", CandidateInput::JoyButton { index: 3 });

        let path = store.save(&table).await.unwrap();
        assert_eq!(path, dir.path().join("bindings").join("Test_Pad.toml"));

        let loaded = store.load("Test Pad").await.unwrap();
        assert_eq!(loaded, Some(table));
    }

    #[tokio::test]
    async fn test_load_unknown_controller() {
        let dir = TempDir::new().unwrap();
        let store = BindingStore::new(dir.path());

        assert!(store.load("nobody").await.unwrap().is_none());
        assert!(!store.reset("nobody").await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_removes_file() {
        let dir = TempDir::new().unwrap();
        let store = BindingStore::new(dir.path());
        store.save(&BindingTable::new("pad")).await.unwrap();

        assert!(store.reset("pad").await.unwrap());
        assert!(store.load("pad").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let store = BindingStore::new(dir.path());
        tokio::fs::write(store.path_for("pad"), "buttons = 5")
            .await
            .unwrap();

        let result = store.load("pad").await;
        assert!(matches!(result, Err(PersistenceError::Parse(_))));
    }
}
