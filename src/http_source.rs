//! REST backend [`RecordSource`].
//!
//! Talks to the herbarium API over HTTP with `reqwest`:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | fetch all | `GET {base}/plants/?page_size=N`, then every `next` link |
//! | categories | `GET {base}/categories/` |
//! | locations | `GET {base}/locations/` |
//! | get / update / delete | `GET` / `PUT` / `DELETE {base}/plants/{id}/` |
//! | create | `POST {base}/plants/` |
//! | add image | `POST {base}/plants/{id}/add_image/` with `{"url": ...}` |
//! | remove image | `DELETE {base}/plants/{id}/remove_image/` with `{"url": ...}` |
//!
//! List endpoints may answer with a paginated envelope
//! (`{count, next, previous, results}`) or a bare JSON array. Failures are
//! returned to the caller without retry.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use flora_catalog_core::models::{Category, Location, PlantInput, PlantRecord};
use flora_catalog_core::store::RecordSource;

use crate::config::SourceConfig;

/// Upper bound on followed `next` links, against servers that loop.
const MAX_PAGES: usize = 10_000;

#[derive(Deserialize)]
#[serde(untagged)]
enum ListResponse<T> {
    Page {
        results: Vec<T>,
        #[serde(default)]
        next: Option<String>,
    },
    Plain(Vec<T>),
}

#[derive(Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    images: Vec<String>,
}

pub struct HttpRecordSource {
    client: Client,
    base_url: String,
    page_size: u32,
    token: Option<String>,
}

impl HttpRecordSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
            token: config.token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder, what: &str) -> Result<Response> {
        let response = self
            .authorize(req)
            .send()
            .await
            .with_context(|| format!("Request failed: {}", what))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("{} returned {}: {}", what, status, body);
        }
        Ok(response)
    }

    /// Collect every item from a list endpoint, following `next` links.
    async fn fetch_list<T: DeserializeOwned>(&self, first_url: String) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(first_url);
        let mut pages = 0usize;
        while let Some(url) = next.take() {
            pages += 1;
            if pages > MAX_PAGES {
                bail!("Pagination exceeded {} pages at {}", MAX_PAGES, url);
            }
            let response = self.send(self.client.get(&url), &url).await?;
            let page: ListResponse<T> = response
                .json()
                .await
                .with_context(|| format!("Invalid list response from {}", url))?;
            match page {
                ListResponse::Page { results, next: n } => {
                    debug!(url = %url, count = results.len(), "fetched page");
                    items.extend(results);
                    next = n.filter(|n| !n.is_empty());
                }
                ListResponse::Plain(results) => items.extend(results),
            }
        }
        Ok(items)
    }

    async fn change_image(&self, id: i64, url: &str, remove: bool) -> Result<Vec<String>> {
        let body = serde_json::json!({ "url": url });
        let (req, what) = if remove {
            let endpoint = self.url(&format!("plants/{}/remove_image/", id));
            (self.client.delete(&endpoint).json(&body), endpoint)
        } else {
            let endpoint = self.url(&format!("plants/{}/add_image/", id));
            (self.client.post(&endpoint).json(&body), endpoint)
        };
        let response = self.send(req, &what).await?;
        let parsed: ImagesResponse = response
            .json()
            .await
            .with_context(|| format!("Invalid image response from {}", what))?;
        Ok(parsed.images)
    }
}

#[async_trait]
impl RecordSource for HttpRecordSource {
    async fn fetch_all_records(&self) -> Result<Vec<PlantRecord>> {
        let first = format!("{}?page_size={}", self.url("plants/"), self.page_size);
        self.fetch_list(first).await
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        self.fetch_list(self.url("categories/")).await
    }

    async fn fetch_locations(&self) -> Result<Vec<Location>> {
        self.fetch_list(self.url("locations/")).await
    }

    async fn get_record(&self, id: i64) -> Result<Option<PlantRecord>> {
        let url = self.url(&format!("plants/{}/", id));
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .with_context(|| format!("Request failed: {}", url))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("{} returned {}: {}", url, status, body);
        }
        let record = response
            .json()
            .await
            .with_context(|| format!("Invalid plant response from {}", url))?;
        Ok(Some(record))
    }

    async fn create_record(&self, input: &PlantInput) -> Result<PlantRecord> {
        input.validate()?;
        let url = self.url("plants/");
        let response = self.send(self.client.post(&url).json(input), &url).await?;
        response
            .json()
            .await
            .with_context(|| format!("Invalid plant response from {}", url))
    }

    async fn update_record(&self, id: i64, input: &PlantInput) -> Result<PlantRecord> {
        input.validate()?;
        let url = self.url(&format!("plants/{}/", id));
        let response = self.send(self.client.put(&url).json(input), &url).await?;
        response
            .json()
            .await
            .with_context(|| format!("Invalid plant response from {}", url))
    }

    async fn delete_record(&self, id: i64) -> Result<()> {
        let url = self.url(&format!("plants/{}/", id));
        self.send(self.client.delete(&url), &url).await?;
        Ok(())
    }

    async fn add_image(&self, id: i64, url: &str) -> Result<Vec<String>> {
        self.change_image(id, url, false).await
    }

    async fn remove_image(&self, id: i64, url: &str) -> Result<Vec<String>> {
        self.change_image(id, url, true).await
    }
}
