//! Binary download of GTFS-RT feeds.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::RealtimeError;

/// Downloads the body at `url`.
///
/// A successful response with no body yields empty [`Bytes`]; that is "no
/// data", not an error. Non-2xx statuses and transport failures are
/// returned as errors and never retried here.
#[tracing::instrument(skip(client))]
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Bytes, RealtimeError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| RealtimeError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(RealtimeError::UpstreamStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let bytes = resp.bytes().await?;
    if bytes.is_empty() {
        warn!("Feed response was empty");
    } else {
        debug!(bytes = bytes.len(), "Feed bytes received");
    }

    Ok(bytes)
}
