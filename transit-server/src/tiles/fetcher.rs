//! Tile downloads.

use std::future::Future;
use std::time::Duration;

use super::error::TileError;

/// Downloads raw tile bytes from a URL.
pub trait TileFetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, TileError>> + Send;
}

/// [`TileFetcher`] over HTTP.
///
/// Tile servers reject anonymous clients, so a descriptive user agent is
/// always sent.
#[derive(Debug, Clone)]
pub struct HttpTileFetcher {
    http: reqwest::Client,
}

impl HttpTileFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, TileError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }
}

impl TileFetcher for HttpTileFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TileError> {
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TileError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let fetcher = HttpTileFetcher::new("transit-server/0.1", Duration::from_secs(30));
        assert!(fetcher.is_ok());
    }
}
