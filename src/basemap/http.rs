//! Blocking HTTP tile fetcher with an in-process cache.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;

use super::{TileFetcher, TileProvider};
use crate::error::PlotError;

/// Tiles kept in memory; at typical PNG sizes this is a few tens of MB.
const TILE_CACHE_CAPACITY: u64 = 512;
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TileCacheKey {
    provider: &'static str,
    z: u8,
    x: u32,
    y: u32,
}

/// Fetches tiles over HTTP.
///
/// Repeat requests are served from a moka cache, so one fetcher shared
/// across several figures downloads each tile once.
pub struct HttpTileFetcher {
    client: reqwest::blocking::Client,
    cache: Cache<TileCacheKey, Arc<Vec<u8>>>,
}

impl HttpTileFetcher {
    pub fn new() -> Result<Self, PlotError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("aeroplot/", env!("CARGO_PKG_VERSION")))
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| PlotError::TileFetch {
                url: "(client setup)".to_string(),
                reason: e.to_string(),
            })?;
        Ok(HttpTileFetcher {
            client,
            cache: Cache::builder().max_capacity(TILE_CACHE_CAPACITY).build(),
        })
    }
}

impl TileFetcher for HttpTileFetcher {
    fn fetch_tile(
        &self,
        provider: &TileProvider,
        z: u8,
        x: u32,
        y: u32,
    ) -> Result<Vec<u8>, PlotError> {
        let key = TileCacheKey {
            provider: provider.name,
            z,
            x,
            y,
        };
        if let Some(bytes) = self.cache.get(&key) {
            tracing::trace!(provider = provider.name, z, x, y, "tile cache hit");
            return Ok(bytes.as_ref().clone());
        }

        let url = provider.tile_url(z, x, y);
        tracing::debug!(%url, "fetching tile");
        let response = self
            .client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| PlotError::TileFetch {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        let bytes = response
            .bytes()
            .map_err(|e| PlotError::TileFetch {
                url: url.clone(),
                reason: e.to_string(),
            })?
            .to_vec();

        self.cache.insert(key, Arc::new(bytes.clone()));
        Ok(bytes)
    }
}
