use async_trait::async_trait;
use reqwest::{Request, Response};

/// Transport seam for feed downloads.
///
/// [`super::BasicClient`] is the production implementation; anything that can
/// execute a `reqwest::Request` (a proxying or header-injecting wrapper, say)
/// can stand in for it.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
