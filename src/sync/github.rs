//! GitHub contents api client.
//!
//! `GET /repos/{repo}/contents/{path}` returns the file base64 encoded along
//! with its blob sha; `PUT` on the same url creates the file, or updates it
//! when the current sha is supplied.
//!
//! Files over 1 MB come back without inline content (`"encoding": "none"`);
//! those are fetched again with the raw media type.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::FixedOffset;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::{remote_name, RemoteSync};
use crate::config::{GithubConfig, Secret};
use crate::error::{PersistenceError, RemoteSyncError};
use crate::store;
use crate::util;

const ACCEPT_V3: &str = "application/vnd.github.v3+json";
const ACCEPT_RAW: &str = "application/vnd.github.raw";

#[derive(Debug, Deserialize)]
struct ContentResponse {
    content: Option<String>,
    encoding: Option<String>,
    size: Option<u64>,
    sha: Option<String>,
}

#[derive(Debug, Serialize)]
struct Committer<'a> {
    name: &'a str,
    email: String,
}

#[derive(Debug, Serialize)]
struct PutContent<'a> {
    message: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    committer: Option<Committer<'a>>,
}

pub struct GithubSync {
    client: Client,
    config: GithubConfig,
    utc_offset: FixedOffset,
}

impl GithubSync {
    pub fn new(config: &GithubConfig, utc_offset: FixedOffset) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("menuwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "falling back to default http client");
                Client::new()
            });

        GithubSync {
            client,
            config: config.clone(),
            utc_offset,
        }
    }

    fn credentials(&self) -> Result<(&str, &str), RemoteSyncError> {
        match (self.config.token.as_ref().map(Secret::expose), self.config.repository.as_deref()) {
            (Some(token), Some(repo)) => Ok((token, repo)),
            _ => Err(RemoteSyncError::MissingCredentials),
        }
    }

    fn contents_url(&self, repo: &str, name: &str) -> String {
        let base = self.config.api_base.trim_end_matches('/');
        match self.config.remote_dir.as_deref().map(|d| d.trim_matches('/')) {
            Some(dir) if !dir.is_empty() => format!("{base}/repos/{repo}/contents/{dir}/{name}"),
            _ => format!("{base}/repos/{repo}/contents/{name}"),
        }
    }

    fn authorized(&self, builder: RequestBuilder, token: &str, accept: &str) -> RequestBuilder {
        builder
            .header(AUTHORIZATION, format!("token {token}"))
            .header(ACCEPT, accept)
    }

    /// Commits are attributed to the workflow actor when one is known.
    fn committer(&self) -> Option<Committer<'_>> {
        self.config.actor.as_deref().map(|name| Committer {
            name,
            email: format!("{name}@users.noreply.github.com"),
        })
    }

    /// Returns `Ok(None)` when the remote file does not exist.
    fn fetch(&self, token: &str, url: &str) -> Result<Option<ContentResponse>, RemoteSyncError> {
        let resp = self.authorized(self.client.get(url), token, ACCEPT_V3).send()?;
        match resp.status() {
            StatusCode::OK => Ok(Some(resp.json()?)),
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(RemoteSyncError::Status {
                status: status.as_u16(),
                body: resp.text().unwrap_or_default(),
            }),
        }
    }

    fn fetch_raw(&self, token: &str, url: &str) -> Result<Vec<u8>, RemoteSyncError> {
        let resp = self.authorized(self.client.get(url), token, ACCEPT_RAW).send()?;
        let status = resp.status();
        if status != StatusCode::OK {
            return Err(RemoteSyncError::Status {
                status: status.as_u16(),
                body: resp.text().unwrap_or_default(),
            });
        }
        Ok(resp.bytes()?.to_vec())
    }

    /// File bytes from a contents response, going back for the raw body
    /// when the api did not inline it.
    fn file_bytes(&self, token: &str, url: &str, found: ContentResponse) -> Result<Vec<u8>, RemoteSyncError> {
        let inline = match (found.encoding.as_deref(), found.content.as_deref()) {
            (Some("base64") | None, Some(content)) if !content.is_empty() || found.size == Some(0) => {
                Some(decode_content(content)?)
            }
            _ => None,
        };

        let bytes = match inline {
            Some(bytes) => bytes,
            None => {
                debug!(size = found.size, encoding = found.encoding.as_deref(), "content not inlined, fetching raw body");
                self.fetch_raw(token, url)?
            }
        };

        match found.size {
            Some(expected) if expected != bytes.len() as u64 => Err(RemoteSyncError::Incomplete {
                expected,
                received: bytes.len(),
            }),
            _ => Ok(bytes),
        }
    }

    fn try_download(&self, local_path: &Path) -> Result<bool, RemoteSyncError> {
        let (token, repo) = self.credentials()?;
        let url = self.contents_url(repo, &remote_name(local_path));

        let Some(found) = self.fetch(token, &url)? else {
            return Ok(false);
        };
        let bytes = self.file_bytes(token, &url, found)?;

        store::replace_file(local_path, &bytes)?;
        Ok(true)
    }

    fn try_upload(&self, local_path: &Path, name: &str) -> Result<StatusCode, RemoteSyncError> {
        let (token, repo) = self.credentials()?;
        if !local_path.exists() {
            return Err(RemoteSyncError::MissingLocalFile(local_path.to_path_buf()));
        }

        let bytes = fs::read(local_path).map_err(|e| PersistenceError::io(local_path, e))?;
        let url = self.contents_url(repo, name);

        let sha = self.fetch(token, &url)?.and_then(|c| c.sha);
        let verb = if sha.is_some() { "Update" } else { "Add" };
        let stamp = util::format_timestamp(&util::now_at(self.utc_offset));

        let body = PutContent {
            message: format!("{verb} {name} - {stamp}"),
            content: BASE64.encode(bytes),
            sha,
            branch: self.config.branch.as_deref(),
            committer: self.committer(),
        };

        let resp = self.authorized(self.client.put(&url), token, ACCEPT_V3).json(&body).send()?;
        let status = resp.status();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            Ok(status)
        } else {
            Err(RemoteSyncError::Status {
                status: status.as_u16(),
                body: resp.text().unwrap_or_default(),
            })
        }
    }
}

impl RemoteSync for GithubSync {
    fn download(&self, local_path: &Path) -> bool {
        match self.try_download(local_path) {
            Ok(true) => {
                info!(path = %local_path.display(), "file downloaded from remote");
                true
            }
            Ok(false) => {
                warn!(path = %local_path.display(), "file not found on remote");
                false
            }
            Err(RemoteSyncError::MissingCredentials) => {
                warn!(path = %local_path.display(), "remote sync not configured, download skipped");
                false
            }
            Err(e) => {
                warn!(path = %local_path.display(), error = %e, "download failed, local copy kept");
                false
            }
        }
    }

    fn upload(&self, local_path: &Path, remote_name: &str) -> bool {
        match self.try_upload(local_path, remote_name) {
            Ok(status) => {
                info!(remote = remote_name, status = status.as_u16(), "file uploaded to remote");
                true
            }
            Err(RemoteSyncError::MissingCredentials) => {
                warn!(path = %local_path.display(), "remote sync not configured, upload skipped");
                false
            }
            Err(e @ RemoteSyncError::MissingLocalFile(_)) => {
                warn!(error = %e, "upload skipped");
                false
            }
            Err(e) => {
                error!(remote = remote_name, error = %e, "upload failed");
                false
            }
        }
    }
}

/// The api wraps base64 bodies at 60 columns.
fn decode_content(encoded: &str) -> Result<Vec<u8>, RemoteSyncError> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(BASE64.decode(compact)?)
}
