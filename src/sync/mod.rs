//! Remote copies of the state and report files.
//!
//! Before a run the snapshot and history are pulled from the remote; after
//! each file is written it is pushed back. Both directions are best effort:
//! failures are logged and reported as `false`.

pub mod github;

use std::path::Path;

use tracing::debug;

pub use github::GithubSync;

pub trait RemoteSync {
    /// Fetches the remote copy of `local_path` over the local file.
    fn download(&self, local_path: &Path) -> bool;

    /// Pushes `local_path` to the remote under `remote_name`.
    fn upload(&self, local_path: &Path, remote_name: &str) -> bool;
}

/// Used for offline runs.
pub struct NoopSync;

impl RemoteSync for NoopSync {
    fn download(&self, local_path: &Path) -> bool {
        debug!(path = %local_path.display(), "offline, skipping download");
        false
    }

    fn upload(&self, local_path: &Path, _remote_name: &str) -> bool {
        debug!(path = %local_path.display(), "offline, skipping upload");
        false
    }
}

/// Remote name for a local file: its file name.
pub fn remote_name(local_path: &Path) -> String {
    local_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| local_path.to_string_lossy().into_owned())
}
