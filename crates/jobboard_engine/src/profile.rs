use std::sync::Arc;

use jobboard_logging::{board_error, board_warn};

use crate::{KeyValueStore, StorageError};

pub const PROFILE_IMAGE_KEY: &str = "@profile_image";

/// Profile preferences kept next to the saved jobs.
pub struct ProfileStore {
    storage: Arc<dyn KeyValueStore>,
}

impl ProfileStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Stored profile image URI. Read failures are logged and read as unset.
    pub async fn load_image(&self) -> Option<String> {
        match self.storage.get(PROFILE_IMAGE_KEY).await {
            Ok(uri) => uri.filter(|uri| !uri.trim().is_empty()),
            Err(err) => {
                board_warn!("Failed to load profile image: {}", err);
                None
            }
        }
    }

    pub async fn save_image(&self, uri: &str) -> Result<(), StorageError> {
        self.storage
            .set(PROFILE_IMAGE_KEY, uri.trim())
            .await
            .inspect_err(|err| board_error!("Failed to save profile image: {}", err))
    }

    pub async fn clear_image(&self) -> Result<(), StorageError> {
        self.storage.remove(PROFILE_IMAGE_KEY).await
    }
}
