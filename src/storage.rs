use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const MAX_RECENT_DESTINATIONS: usize = 10;

pub trait Storage {
    async fn load_token(&self) -> Result<Option<String>, StorageError>;

    async fn save_token(&mut self, token: &str) -> Result<(), StorageError>;

    async fn clear_token(&mut self) -> Result<(), StorageError>;

    /// Recently used transfer destinations of `account`, most recent first.
    async fn load_recent_destinations(&self, account: &str) -> Result<Vec<String>, StorageError>;

    async fn remember_destination(
        &mut self,
        account: &str,
        destination: &str,
    ) -> Result<(), StorageError>;
}

/// Everything the client keeps between runs.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct ClientState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(default)]
    pub transfer_history: HashMap<String, Vec<String>>,
}

impl ClientState {
    fn remember(&mut self, account: &str, destination: &str) {
        let recent = self
            .transfer_history
            .entry(account.to_owned())
            .or_default();
        recent.retain(|d| d != destination);
        recent.insert(0, destination.to_owned());
        recent.truncate(MAX_RECENT_DESTINATIONS);
    }

    fn recent(&self, account: &str) -> Vec<String> {
        self.transfer_history
            .get(account)
            .cloned()
            .unwrap_or_default()
    }
}

/// Case-insensitive substring match of `input` against saved destinations.
pub fn suggest<'a>(recent: &'a [String], input: &str) -> Vec<&'a str> {
    let needle = input.trim().to_lowercase();
    recent
        .iter()
        .filter(|d| d.to_lowercase().contains(&needle))
        .map(|d| d.as_str())
        .collect()
}

// implementations

#[allow(dead_code)]
pub struct InmemoryStorage {
    state: ClientState,
}

impl InmemoryStorage {
    #[allow(dead_code)]
    pub fn new() -> InmemoryStorage {
        InmemoryStorage {
            state: ClientState::default(),
        }
    }
}

impl Storage for InmemoryStorage {
    async fn load_token(&self) -> Result<Option<String>, StorageError> {
        Ok(self.state.access_key.clone())
    }

    async fn save_token(&mut self, token: &str) -> Result<(), StorageError> {
        self.state.access_key = Some(token.to_owned());
        Ok(())
    }

    async fn clear_token(&mut self) -> Result<(), StorageError> {
        self.state.access_key = None;
        Ok(())
    }

    async fn load_recent_destinations(&self, account: &str) -> Result<Vec<String>, StorageError> {
        Ok(self.state.recent(account))
    }

    async fn remember_destination(
        &mut self,
        account: &str,
        destination: &str,
    ) -> Result<(), StorageError> {
        self.state.remember(account, destination);
        Ok(())
    }
}

/// JSON state file, rewritten in full on every change.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> FileStorage {
        FileStorage { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_bytes(&self) -> Result<Option<Vec<u8>>, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn read(&self) -> Result<ClientState, StorageError> {
        match self.read_bytes().await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(ClientState::default()),
        }
    }

    /// Like `read`, but an unparsable file counts as empty state.
    async fn read_or_reset(&self) -> Result<ClientState, StorageError> {
        let Some(bytes) = self.read_bytes().await? else {
            return Ok(ClientState::default());
        };
        Ok(serde_json::from_slice(&bytes).unwrap_or_else(|err| {
            tracing::warn!("discarding corrupt state file {}: {}", self.path.display(), err);
            ClientState::default()
        }))
    }

    async fn write(&self, state: &ClientState) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(state)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::debug!("state written to {}", self.path.display());
        Ok(())
    }

    async fn update<F>(&self, change: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut ClientState),
    {
        let mut state = self.read().await?;
        change(&mut state);
        self.write(&state).await
    }

    // Token writes tolerate a corrupt file; logout has to work regardless.
    async fn update_token(&self, token: Option<String>) -> Result<(), StorageError> {
        let mut state = self.read_or_reset().await?;
        state.access_key = token;
        self.write(&state).await
    }
}

impl Storage for FileStorage {
    async fn load_token(&self) -> Result<Option<String>, StorageError> {
        Ok(self.read().await?.access_key)
    }

    async fn save_token(&mut self, token: &str) -> Result<(), StorageError> {
        self.update_token(Some(token.to_owned())).await
    }

    async fn clear_token(&mut self) -> Result<(), StorageError> {
        self.update_token(None).await
    }

    async fn load_recent_destinations(&self, account: &str) -> Result<Vec<String>, StorageError> {
        Ok(self.read().await?.recent(account))
    }

    async fn remember_destination(
        &mut self,
        account: &str,
        destination: &str,
    ) -> Result<(), StorageError> {
        self.update(|state| state.remember(account, destination))
            .await
    }
}
