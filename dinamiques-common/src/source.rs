//! Data sources feeding the catalog
//!
//! A source yields the bulk record set and single-record details. Every call
//! is a single attempt; failures are returned to the caller, which keeps its
//! previous snapshot.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::{Settings, SourceKind};
use crate::filter::FilterState;
use crate::record::{parse_document, Dynamic};
use crate::{Error, Result};

const USER_AGENT: &str = concat!("dinamiques/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Bulk and per-record access to a catalog
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Load the record set; sources with server-side filtering honour the
    /// coarse dimensions of `filters`
    async fn load(&self, filters: &FilterState) -> Result<Vec<Dynamic>>;

    /// Full record for the detail view
    async fn fetch_detail(&self, id: i64) -> Result<Dynamic>;

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}

fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}

/// Where a static document lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentLocation {
    Path(PathBuf),
    Url(String),
}

impl DocumentLocation {
    /// `http(s)://` locations are fetched, anything else is a file path
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            DocumentLocation::Url(raw.to_string())
        } else {
            DocumentLocation::Path(PathBuf::from(raw))
        }
    }
}

/// A complete catalog document, filtered client-side
pub struct StaticSource {
    location: DocumentLocation,
    client: reqwest::Client,
    last: RwLock<Option<Vec<Dynamic>>>,
}

impl StaticSource {
    pub fn new(location: DocumentLocation) -> Result<Self> {
        Ok(Self {
            location,
            client: http_client()?,
            last: RwLock::new(None),
        })
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        Self::new(DocumentLocation::Path(path.into()))
    }

    async fn read_document(&self) -> Result<Vec<u8>> {
        match &self.location {
            DocumentLocation::Path(path) => tokio::fs::read(path).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::NotFound(format!("catalog document {}", path.display()))
                } else {
                    Error::Io(e)
                }
            }),
            DocumentLocation::Url(url) => {
                let response = self.client.get(url).send().await?.error_for_status()?;
                Ok(response.bytes().await?.to_vec())
            }
        }
    }
}

#[async_trait]
impl DataSource for StaticSource {
    async fn load(&self, _filters: &FilterState) -> Result<Vec<Dynamic>> {
        let bytes = self.read_document().await?;
        let records = parse_document(&bytes)?;
        info!(source = %self.describe(), records = records.len(), "Catalog document loaded");
        *self.last.write().await = Some(records.clone());
        Ok(records)
    }

    async fn fetch_detail(&self, id: i64) -> Result<Dynamic> {
        if self.last.read().await.is_none() {
            self.load(&FilterState::default()).await?;
        }
        self.last
            .read()
            .await
            .as_ref()
            .and_then(|records| records.iter().find(|d| d.id == id).cloned())
            .ok_or_else(|| Error::NotFound(format!("dynamic {}", id)))
    }

    fn describe(&self) -> String {
        match &self.location {
            DocumentLocation::Path(path) => path.display().to_string(),
            DocumentLocation::Url(url) => url.clone(),
        }
    }
}

/// Response body of the listing endpoint
#[derive(Debug, Deserialize)]
struct ListingResponse {
    dinamiques: Vec<Dynamic>,
    #[serde(default)]
    total: Option<usize>,
}

/// A remote catalog API filtering on the server
pub struct ApiSource {
    base_url: String,
    client: reqwest::Client,
    limit: usize,
}

impl ApiSource {
    pub fn new(base_url: impl Into<String>, limit: usize) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: http_client()?,
            limit,
        })
    }

    /// Query string for the listing endpoint
    ///
    /// Only the dimensions the server filters on are sent; unrestricted ones
    /// are omitted.
    pub fn listing_query(&self, filters: &FilterState) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(track) = filters.track {
            query.push(("target", track.as_str().to_string()));
        }
        if let Some(model) = &filters.model {
            query.push(("model", model.clone()));
        }
        if let Some(category) = &filters.category {
            query.push(("categoria", category.clone()));
        }
        if let Some(activity_type) = &filters.activity_type {
            query.push(("tipus", activity_type.clone()));
        }
        let search = filters.search.trim();
        if !search.is_empty() {
            query.push(("search", search.to_string()));
        }
        query.push(("limit", self.limit.to_string()));
        query
    }
}

#[async_trait]
impl DataSource for ApiSource {
    async fn load(&self, filters: &FilterState) -> Result<Vec<Dynamic>> {
        let url = format!("{}/api/dinamiques", self.base_url);
        let query = self.listing_query(filters);
        debug!(url = %url, params = query.len(), "Querying catalog API");

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await?
            .error_for_status()?;
        let body: ListingResponse = response.json().await?;

        info!(
            records = body.dinamiques.len(),
            total = body.total.unwrap_or(body.dinamiques.len()),
            "Catalog API listing loaded"
        );
        Ok(body.dinamiques)
    }

    async fn fetch_detail(&self, id: i64) -> Result<Dynamic> {
        let url = format!("{}/api/dinamica/{}", self.base_url, id);
        debug!(url = %url, "Fetching dynamic detail");

        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("dynamic {}", id)));
        }
        Ok(response.error_for_status()?.json().await?)
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

/// Fixed in-memory record set
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<Dynamic>,
}

impl MemorySource {
    pub fn new(records: Vec<Dynamic>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn load(&self, _filters: &FilterState) -> Result<Vec<Dynamic>> {
        Ok(self.records.clone())
    }

    async fn fetch_detail(&self, id: i64) -> Result<Dynamic> {
        self.records
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("dynamic {}", id)))
    }

    fn describe(&self) -> String {
        format!("memory ({} records)", self.records.len())
    }
}

/// Build the configured source
pub fn source_from_settings(settings: &Settings) -> Result<Box<dyn DataSource>> {
    match settings.source.kind {
        SourceKind::Static => {
            let location = match &settings.source.url {
                Some(url) => DocumentLocation::parse(url),
                None => DocumentLocation::Path(settings.data_path.clone()),
            };
            Ok(Box::new(StaticSource::new(location)?))
        }
        SourceKind::Api => {
            let url = settings
                .source
                .url
                .clone()
                .ok_or_else(|| Error::Config("api source requires a url".to_string()))?;
            Ok(Box::new(ApiSource::new(url, settings.result_cap)?))
        }
    }
}
