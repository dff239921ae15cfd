//! Shared application state.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::photos::PhotoStore;
use crate::storage::Storage;

pub struct AppState {
    pub storage: Storage,
    pub photos: Box<dyn PhotoStore>,
    /// Where locally stored photos live; `None` when a remote photo
    /// endpoint is configured and nothing is served from disk.
    pub photo_dir: Option<PathBuf>,
}

pub type SharedState = Arc<Mutex<AppState>>;
