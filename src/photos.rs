//! Photo storage collaborator.
//!
//! Event photos arrive as `data:image/<fmt>;base64,<bytes>` data URLs. A
//! [`PhotoStore`] turns the payload into a stable URL before the event is
//! persisted; any failure here aborts the surrounding create or update.
//! Superseded photos are not garbage-collected by this crate.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;

#[derive(Debug)]
pub enum PhotoError {
    /// The payload is not a well-formed base64 image data URL.
    InvalidPayload(String),
    Io(std::io::Error),
    /// The remote blob endpoint failed or answered with an unexpected status.
    Transport(String),
}

impl std::fmt::Display for PhotoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhotoError::InvalidPayload(msg) => write!(f, "invalid photo payload: {msg}"),
            PhotoError::Io(e) => write!(f, "io error: {e}"),
            PhotoError::Transport(msg) => write!(f, "photo upload failed: {msg}"),
        }
    }
}

impl std::error::Error for PhotoError {}

impl From<std::io::Error> for PhotoError {
    fn from(e: std::io::Error) -> Self {
        PhotoError::Io(e)
    }
}

/// Stores a photo payload under a caller-chosen key and returns the URL the
/// stored photo is reachable at.
pub trait PhotoStore: Send {
    fn store(&self, key: &str, data_url: &str) -> Result<String, PhotoError>;
}

/// Generate a random photo key (16 bytes, hex-encoded).
pub fn generate_photo_key() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Split a `data:image/<fmt>;base64,<data>` URL into the image format and
/// the decoded bytes.
pub fn parse_data_url(data_url: &str) -> Result<(String, Vec<u8>), PhotoError> {
    let rest = data_url
        .strip_prefix("data:image/")
        .ok_or_else(|| PhotoError::InvalidPayload("expected a data:image/ URL".to_string()))?;
    let (format, b64) = rest
        .split_once(";base64,")
        .ok_or_else(|| PhotoError::InvalidPayload("missing ;base64, marker".to_string()))?;
    if format.is_empty() || !format.chars().all(|c| c.is_ascii_alphanumeric() || c == '+') {
        return Err(PhotoError::InvalidPayload(format!(
            "unexpected image format '{format}'"
        )));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64)
        .map_err(|e| PhotoError::InvalidPayload(format!("bad base64 data: {e}")))?;
    if bytes.is_empty() {
        return Err(PhotoError::InvalidPayload("empty image data".to_string()));
    }
    Ok((format.to_string(), bytes))
}

/// File-backed store: decoded photos are written under a directory next to
/// the database and served from `/photos/`.
pub struct FilePhotoStore {
    photo_dir: PathBuf,
}

impl FilePhotoStore {
    pub fn new(photo_dir: &Path) -> Result<Self, PhotoError> {
        std::fs::create_dir_all(photo_dir)?;
        Ok(Self {
            photo_dir: photo_dir.to_path_buf(),
        })
    }

    pub fn photo_dir(&self) -> &Path {
        &self.photo_dir
    }
}

impl PhotoStore for FilePhotoStore {
    fn store(&self, key: &str, data_url: &str) -> Result<String, PhotoError> {
        let (format, bytes) = parse_data_url(data_url)?;
        let filename = format!("{key}.{format}");
        std::fs::write(self.photo_dir.join(&filename), bytes)?;
        Ok(format!("/photos/{filename}"))
    }
}

/// Remote blob store: posts the payload as JSON to a configured endpoint and
/// returns the URL the endpoint assigns.
pub struct RemotePhotoStore {
    endpoint: String,
}

impl RemotePhotoStore {
    pub fn new(endpoint: String) -> Self {
        Self { endpoint }
    }
}

impl PhotoStore for RemotePhotoStore {
    fn store(&self, key: &str, data_url: &str) -> Result<String, PhotoError> {
        // Validate locally first so a malformed payload never reaches the
        // network as a transport error.
        let (format, _) = parse_data_url(data_url)?;
        let body = serde_json::json!({
            "key": key,
            "content_type": format!("image/{format}"),
            "data": data_url,
        });
        let url = format!("{}/photos", self.endpoint.trim_end_matches('/'));
        let resp = ureq::post(&url)
            .set("Content-Type", "application/json")
            .send_string(&body.to_string())
            .map_err(|e| PhotoError::Transport(e.to_string()))?;
        match resp.status() {
            200 | 201 => {}
            s => return Err(PhotoError::Transport(format!("unexpected status {s}"))),
        }
        let parsed: serde_json::Value = resp
            .into_json()
            .map_err(|e| PhotoError::Transport(format!("bad response body: {e}")))?;
        parsed
            .get("url")
            .and_then(|u| u.as_str())
            .map(str::to_string)
            .ok_or_else(|| PhotoError::Transport("response missing url field".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A 1x1 transparent PNG.
    const TINY_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    fn temp_dir() -> PathBuf {
        let pid = std::process::id();
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!("mingle-photo-test-{pid}-{ts}"))
    }

    #[test]
    fn test_parse_data_url() {
        let (format, bytes) = parse_data_url(TINY_PNG).unwrap();
        assert_eq!(format, "png");
        // PNG magic bytes
        assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_parse_rejects_malformed_payloads() {
        for bad in [
            "not a data url",
            "data:text/plain;base64,aGVsbG8=",
            "data:image/png,raw-no-base64",
            "data:image/png;base64,!!!not-base64!!!",
            "data:image/png;base64,",
        ] {
            assert!(
                matches!(parse_data_url(bad), Err(PhotoError::InvalidPayload(_))),
                "accepted: {bad}"
            );
        }
    }

    #[test]
    fn test_file_store_writes_and_returns_url() {
        let dir = temp_dir();
        let store = FilePhotoStore::new(&dir).unwrap();
        let url = store.store("k1", TINY_PNG).unwrap();
        assert_eq!(url, "/photos/k1.png");
        assert!(dir.join("k1.png").exists());
    }

    #[test]
    fn test_generated_keys_are_distinct() {
        let a = generate_photo_key();
        let b = generate_photo_key();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }
}
