//! HTTP client for the store's admin API and storefront.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, LINK, LOCATION};
use reqwest::{RequestBuilder, Response, StatusCode, redirect};
use serde_json::{Value, json};
use url::Url;

use super::asset::{AssetStore, RemoteAsset};
use super::link::next_link;
use super::{RateLimiter, RemoteError};
use crate::config::{StoreConfig, ThrottleConfig};
use crate::debug;
use crate::utils::plural::pluralize;

/// Redirect hops followed by [`RemoteClient::fetch_remote_page_html`].
const MAX_REDIRECTS: usize = 5;
const PAGE_LIMIT: u32 = 250;
const USER_AGENT: &str = concat!("themesync/", env!("CARGO_PKG_VERSION"));

/// Where and as whom to talk to the store.
#[derive(Clone)]
pub struct StoreEndpoint {
    pub api_base: String,
    pub theme_id: u64,
    pub api_key: String,
    pub password: String,
    pub storefront: String,
}

impl StoreEndpoint {
    pub fn from_config(store: &StoreConfig) -> Self {
        Self {
            api_base: store.api_base(),
            theme_id: store.theme_id,
            api_key: store.api_key.clone(),
            password: store.password.clone(),
            storefront: store.storefront_base(),
        }
    }
}

/// Singular resource name, e.g. `product` or `smart_collection`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceType(String);

impl ResourceType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().to_ascii_lowercase())
    }

    pub fn singular(&self) -> &str {
        &self.0
    }

    /// Collection path segment and response envelope key.
    pub fn plural(&self) -> String {
        pluralize(&self.0)
    }
}

/// One page of a resource collection.
#[derive(Debug, Default)]
pub struct ResourcePage {
    pub items: Vec<Value>,
    /// Opaque cursor for the next page; `None` ends pagination.
    pub next: Option<String>,
}

/// Remote store client. Cloning shares the connection pool and the budget.
#[derive(Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    /// Storefront client; redirects are followed by hand.
    pages: reqwest::Client,
    limiter: RateLimiter,
    endpoint: Arc<StoreEndpoint>,
}

impl RemoteClient {
    pub fn new(endpoint: StoreEndpoint, throttle: ThrottleConfig) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()?;
        let pages = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            http,
            pages,
            limiter: RateLimiter::new(throttle),
            endpoint: Arc::new(endpoint),
        })
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Storefront base URL, e.g. `https://my-shop.example.com`.
    pub fn storefront(&self) -> &str {
        &self.endpoint.storefront
    }

    // ========================================================================
    // request plumbing
    // ========================================================================

    fn url(&self, path: &str) -> Result<Url, RemoteError> {
        Ok(Url::parse(&format!("{}/{}", self.endpoint.api_base, path))?)
    }

    fn assets_url(&self) -> Result<Url, RemoteError> {
        self.url(&format!("themes/{}/assets.json", self.endpoint.theme_id))
    }

    fn asset_key_url(&self, key: &str) -> Result<Url, RemoteError> {
        let mut url = self.assets_url()?;
        url.query_pairs_mut().append_pair("asset[key]", key);
        Ok(url)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.endpoint.api_key, Some(&self.endpoint.password))
    }

    /// Send `request` under the shared budget.
    async fn throttled(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let request = self.authed(request).header(ACCEPT, "application/json");
        Ok(self.limiter.submit(request.send()).await??)
    }

    /// Body of a 2xx response, or the status-bearing error built by `reject`.
    async fn expect_success(
        response: Response,
        reject: fn(u16, String) -> RemoteError,
    ) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(reject(status.as_u16(), body))
    }

    async fn read_json(&self, url: Url) -> Result<(Value, Option<String>), RemoteError> {
        let response = self.throttled(self.http.get(url)).await?;
        let response = Self::expect_success(response, |status, body| RemoteError::ReadFailed {
            status,
            body,
        })
        .await?;
        let next = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_link);
        Ok((response.json().await?, next))
    }

    async fn send_json(&self, request: RequestBuilder, body: &Value) -> Result<Value, RemoteError> {
        let response = self.throttled(request.json(body)).await?;
        let response = Self::expect_success(response, |status, body| RemoteError::WriteFailed {
            status,
            body,
        })
        .await?;
        Ok(response.json().await?)
    }

    // ========================================================================
    // assets
    // ========================================================================

    /// Create or replace a theme asset.
    pub async fn write_asset(
        &self,
        key: &str,
        content: &str,
        is_binary: bool,
    ) -> Result<(), RemoteError> {
        let field = if is_binary { "attachment" } else { "value" };
        let body = json!({ "asset": { "key": key, field: content } });

        let response = self
            .throttled(self.http.put(self.assets_url()?).json(&body))
            .await?;
        Self::expect_success(response, |status, body| RemoteError::WriteFailed {
            status,
            body,
        })
        .await?;
        debug!("upload"; "{} ({} bytes)", key, content.len());
        Ok(())
    }

    /// Delete a theme asset by key.
    pub async fn delete_asset(&self, key: &str) -> Result<(), RemoteError> {
        let response = self
            .throttled(self.http.delete(self.asset_key_url(key)?))
            .await?;
        Self::expect_success(response, |status, body| RemoteError::DeleteFailed {
            status,
            body,
        })
        .await?;
        Ok(())
    }

    /// Read a single theme asset back.
    pub async fn read_asset(&self, key: &str) -> Result<RemoteAsset, RemoteError> {
        let (body, _) = self.read_json(self.asset_key_url(key)?).await?;
        RemoteAsset::from_envelope(&body)
    }

    // ========================================================================
    // resources
    // ========================================================================

    /// Fetch one page of a resource collection.
    ///
    /// `cursor` is the `next` value of the previous page; `fields` only
    /// applies to the first request (the cursor URL already carries it).
    pub async fn read_resource_page(
        &self,
        resource: &ResourceType,
        fields: &[String],
        cursor: Option<&str>,
    ) -> Result<ResourcePage, RemoteError> {
        let plural = resource.plural();
        let url = match cursor {
            Some(next) => Url::parse(next)?,
            None => {
                let mut url = self.url(&format!("{plural}.json"))?;
                {
                    let mut query = url.query_pairs_mut();
                    query.append_pair("limit", &PAGE_LIMIT.to_string());
                    if !fields.is_empty() {
                        query.append_pair("fields", &fields.join(","));
                    }
                }
                url
            }
        };

        let (body, next) = self.read_json(url).await?;
        let items = match body.get(&plural) {
            Some(Value::Array(items)) => items.clone(),
            _ => {
                return Err(RemoteError::InvalidResponse(format!(
                    "expected `{plural}` array in response"
                )));
            }
        };
        Ok(ResourcePage { items, next })
    }

    /// Follow `next` cursors until exhausted, keeping page order.
    pub async fn read_all_resources(
        &self,
        resource: &ResourceType,
        fields: &[String],
    ) -> Result<Vec<Value>, RemoteError> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;
        loop {
            let page = self
                .read_resource_page(resource, fields, cursor.as_deref())
                .await?;
            pages += 1;
            items.extend(page.items);
            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        debug!("export"; "{} {} in {} page(s)", items.len(), resource.plural(), pages);
        Ok(items)
    }

    pub async fn create_resource(
        &self,
        resource: &ResourceType,
        body: Value,
    ) -> Result<Value, RemoteError> {
        let url = self.url(&format!("{}.json", resource.plural()))?;
        let envelope = json!({ resource.singular(): body });
        let response = self.send_json(self.http.post(url), &envelope).await?;
        Ok(response.get(resource.singular()).cloned().unwrap_or(response))
    }

    pub async fn update_resource(
        &self,
        resource: &ResourceType,
        id: u64,
        body: Value,
    ) -> Result<Value, RemoteError> {
        let url = self.url(&format!("{}/{id}.json", resource.plural()))?;
        let envelope = json!({ resource.singular(): body });
        let response = self.send_json(self.http.put(url), &envelope).await?;
        Ok(response.get(resource.singular()).cloned().unwrap_or(response))
    }

    pub async fn read_metafields(
        &self,
        resource: &ResourceType,
        id: u64,
    ) -> Result<Vec<Value>, RemoteError> {
        let url = self.url(&format!("{}/{id}/metafields.json", resource.plural()))?;
        let (body, _) = self.read_json(url).await?;
        match body.get("metafields") {
            Some(Value::Array(items)) => Ok(items.clone()),
            _ => Err(RemoteError::InvalidResponse(
                "expected `metafields` array in response".into(),
            )),
        }
    }

    pub async fn write_metafield(
        &self,
        resource: &ResourceType,
        id: u64,
        metafield: Value,
    ) -> Result<Value, RemoteError> {
        let url = self.url(&format!("{}/{id}/metafields.json", resource.plural()))?;
        let response = self
            .send_json(self.http.post(url), &json!({ "metafield": metafield }))
            .await?;
        Ok(response.get("metafield").cloned().unwrap_or(response))
    }

    // ========================================================================
    // storefront
    // ========================================================================

    /// Fetch a storefront page and write its (decoded) body to `output`.
    ///
    /// 301/302 responses are re-issued against the `Location` target. The
    /// storefront is not the admin API, so these requests are not throttled.
    pub async fn fetch_remote_page_html(
        &self,
        path: &str,
        output: &Path,
    ) -> Result<PathBuf, RemoteError> {
        let mut url = Url::parse(&self.endpoint.storefront)?.join(path)?;

        for _ in 0..=MAX_REDIRECTS {
            let response = self.pages.get(url.clone()).header(ACCEPT, "text/html").send().await?;
            let status = response.status();

            if matches!(status, StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND) {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| {
                        RemoteError::InvalidResponse(format!("{status} without Location"))
                    })?;
                url = url.join(location)?;
                debug!("proxy"; "redirected to {}", url);
                continue;
            }

            let response = Self::expect_success(response, |status, body| {
                RemoteError::ReadFailed { status, body }
            })
            .await?;
            let body = response.bytes().await?;

            if let Some(parent) = output.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| RemoteError::Io {
                        path: parent.display().to_string(),
                        source,
                    })?;
            }
            tokio::fs::write(output, &body)
                .await
                .map_err(|source| RemoteError::Io {
                    path: output.display().to_string(),
                    source,
                })?;
            return Ok(output.to_path_buf());
        }

        Err(RemoteError::TooManyRedirects(MAX_REDIRECTS))
    }
}

#[async_trait]
impl AssetStore for RemoteClient {
    async fn write_asset(
        &self,
        key: &str,
        content: &str,
        is_binary: bool,
    ) -> Result<(), RemoteError> {
        RemoteClient::write_asset(self, key, content, is_binary).await
    }

    async fn delete_asset(&self, key: &str) -> Result<(), RemoteError> {
        RemoteClient::delete_asset(self, key).await
    }
}
