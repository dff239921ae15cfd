//! mingle-web: HTTP server for the mingle social events backend.
//!
//! Provides a REST API for accounts, friendships, and events with
//! friendship-graph gated visibility, and persists state in SQLite.

pub mod config;
pub mod handlers;
pub mod router;
pub mod state;
pub mod utils;

use std::sync::Arc;

use clap::Parser;

use crate::photos::{FilePhotoStore, PhotoStore, RemotePhotoStore};
use crate::storage::Storage;

use config::{Cli, Config};
use state::{AppState, SharedState};

/// Entry point: parse CLI, open storage, start server.
pub async fn run() {
    let cli = Cli::parse();
    let config = Config::from_cli_and_env(cli);

    crate::logging::init();

    crate::mlog!("mingle-web starting");
    crate::mlog!("  data directory: {}", config.data_dir.display());

    let db_path = config.data_dir.join("mingle.db");
    let storage = Storage::open(&db_path).expect("failed to open database");
    crate::mlog!("  database: {}", db_path.display());

    let (photos, photo_dir): (Box<dyn PhotoStore>, _) = match config.photo_endpoint {
        Some(endpoint) => {
            crate::mlog!("  photos: remote endpoint {}", endpoint);
            (Box::new(RemotePhotoStore::new(endpoint)), None)
        }
        None => {
            let store = FilePhotoStore::new(&config.data_dir.join("photos"))
                .expect("failed to create photo directory");
            let dir = store.photo_dir().to_path_buf();
            crate::mlog!("  photos: local directory {}", dir.display());
            (Box::new(store), Some(dir))
        }
    };

    let state: SharedState = Arc::new(tokio::sync::Mutex::new(AppState {
        storage,
        photos,
        photo_dir,
    }));

    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind");
    crate::mlog!("mingle-web listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await.expect("server error");
}
