//! Stable device identifier.
//!
//! The id is generated once and persisted; every later call returns the same
//! value. Where it lives is the implementation's business.

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use once_cell::sync::OnceCell;
use tracing::{info, warn};

const DEVICE_ID_FILE: &str = "device_id";

/// Supplies the identifier reported as `DeviceId` to the server
pub trait DeviceIdentity: Send + Sync + Debug {
    /// Returns the persisted id, creating it on first use.
    fn get_or_create(&self) -> String;
}

/// Device id kept in a small text file under the data dir
#[derive(Debug)]
pub struct FileDeviceIdentity {
    path: PathBuf,
    cached: OnceCell<String>,
}

impl FileDeviceIdentity {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: OnceCell::new(),
        }
    }

    /// Identity stored as `device_id` inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(DEVICE_ID_FILE))
    }

    fn load_or_generate(&self) -> String {
        if let Ok(raw) = std::fs::read_to_string(&self.path) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }

        let id = uuid::Uuid::new_v4().simple().to_string();
        // An unwritable location still yields an id that is stable for the
        // lifetime of this process.
        match write_atomic(&self.path, id.as_bytes()) {
            Ok(()) => info!("Generated device id at {}", self.path.display()),
            Err(err) => warn!(
                "Failed to persist device id to {}: {err}",
                self.path.display()
            ),
        }
        id
    }
}

impl DeviceIdentity for FileDeviceIdentity {
    fn get_or_create(&self) -> String {
        self.cached.get_or_init(|| self.load_or_generate()).clone()
    }
}

/// Fixed id, for tests and callers that manage persistence themselves
#[derive(Debug, Clone)]
pub struct StaticDeviceIdentity(pub String);

impl DeviceIdentity for StaticDeviceIdentity {
    fn get_or_create(&self) -> String {
        self.0.clone()
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(parent)?;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let tmp_path = parent.join(format!(
        ".{}.tmp.{}",
        path.file_name().and_then(|v| v.to_str()).unwrap_or("device"),
        nanos
    ));
    std::fs::write(&tmp_path, bytes)?;
    std::fs::rename(tmp_path, path)?;
    Ok(())
}
