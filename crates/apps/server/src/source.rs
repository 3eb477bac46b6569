use std::path::PathBuf;

use formats::{PointSchema, PointSource, PointSourceError, decode_points};
use tracing::info;

use crate::config::SourceLocation;

/// The point source could not be fetched or decoded. Fatal at startup.
#[derive(Debug)]
pub enum SourceUnavailable {
    Fetch(reqwest::Error),
    Status { url: String, status: u16 },
    Read { path: PathBuf, source: std::io::Error },
    Decode(PointSourceError),
}

impl std::fmt::Display for SourceUnavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceUnavailable::Fetch(e) => write!(f, "fetch failed: {e}"),
            SourceUnavailable::Status { url, status } => {
                write!(f, "fetch of {url} returned HTTP {status}")
            }
            SourceUnavailable::Read { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            SourceUnavailable::Decode(e) => write!(f, "decode failed: {e}"),
        }
    }
}

impl std::error::Error for SourceUnavailable {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceUnavailable::Fetch(e) => Some(e),
            SourceUnavailable::Read { source, .. } => Some(source),
            SourceUnavailable::Decode(e) => Some(e),
            SourceUnavailable::Status { .. } => None,
        }
    }
}

pub async fn fetch_bytes(
    location: &SourceLocation,
    http: &reqwest::Client,
) -> Result<Vec<u8>, SourceUnavailable> {
    match location {
        SourceLocation::File(path) => {
            tokio::fs::read(path)
                .await
                .map_err(|source| SourceUnavailable::Read {
                    path: path.clone(),
                    source,
                })
        }
        SourceLocation::Url(url) => {
            let resp = http
                .get(url)
                .send()
                .await
                .map_err(SourceUnavailable::Fetch)?;
            if !resp.status().is_success() {
                return Err(SourceUnavailable::Status {
                    url: url.clone(),
                    status: resp.status().as_u16(),
                });
            }
            let bytes = resp.bytes().await.map_err(SourceUnavailable::Fetch)?;
            Ok(bytes.to_vec())
        }
    }
}

/// Loads the point source once. There is no retry.
pub async fn load(
    location: &SourceLocation,
    schema: &PointSchema,
    http: &reqwest::Client,
) -> Result<PointSource, SourceUnavailable> {
    let bytes = fetch_bytes(location, http).await?;
    info!(bytes = bytes.len(), "point source fetched");
    decode_points(&bytes, schema).map_err(SourceUnavailable::Decode)
}
