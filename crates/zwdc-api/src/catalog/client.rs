// Catalog HTTP client
//
// Wraps `reqwest::Client` with catalog URL construction and response
// checking. Reads go to the repository service, writes to the manager.
// Every call takes the bearer header explicitly; token lifecycle lives in
// `crate::auth`.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};
use url::Url;

use crate::catalog::models::DeviceType;
use crate::error::Error;
use crate::transport::{TransportConfig, join_path};

/// Filter and paging options for listing device types.
#[derive(Debug, Clone)]
pub struct DeviceTypeQuery {
    /// Only return types carrying this attribute key.
    pub attribute: String,
    /// Page size; `0` requests everything in one call.
    pub limit: usize,
    pub offset: usize,
    pub sort: String,
}

impl DeviceTypeQuery {
    pub fn with_attribute(attribute: impl Into<String>, limit: usize) -> Self {
        Self {
            attribute: attribute.into(),
            limit,
            offset: 0,
            sort: "name.asc".into(),
        }
    }
}

/// Raw HTTP client for the device catalog.
pub struct CatalogClient {
    http: reqwest::Client,
    repository_url: Url,
    manager_url: Url,
}

impl CatalogClient {
    pub fn new(
        repository_url: Url,
        manager_url: Url,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Ok(Self::with_client(
            transport.build_client()?,
            repository_url,
            manager_url,
        ))
    }

    /// Create a catalog client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, repository_url: Url, manager_url: Url) -> Self {
        Self {
            http,
            repository_url,
            manager_url,
        }
    }

    pub fn repository_url(&self) -> &Url {
        &self.repository_url
    }

    pub fn manager_url(&self) -> &Url {
        &self.manager_url
    }

    /// Fetch a single page of device types.
    pub async fn list_device_types_page(
        &self,
        token: &str,
        query: &DeviceTypeQuery,
    ) -> Result<Vec<DeviceType>, Error> {
        let url = join_path(&self.repository_url, "/device-types")?;
        debug!("GET {} (offset {})", url, query.offset);

        let mut builder = self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, token)
            .query(&[
                ("attribute", query.attribute.as_str()),
                ("sort", query.sort.as_str()),
            ]);
        if query.limit > 0 {
            builder = builder.query(&[("limit", query.limit), ("offset", query.offset)]);
        }

        let resp = builder.send().await.map_err(Error::Transport)?;
        parse_json(resp).await
    }

    /// Fetch every device type matching `query.attribute`, following pages
    /// until the server returns a short page or a page with no unseen ids.
    pub async fn list_device_types(
        &self,
        token: &str,
        query: &DeviceTypeQuery,
    ) -> Result<Vec<DeviceType>, Error> {
        let mut page_query = query.clone();
        let mut seen = HashSet::new();
        let mut all = Vec::new();
        loop {
            let page = self.list_device_types_page(token, &page_query).await?;
            let count = page.len();
            let before = all.len();
            all.extend(page.into_iter().filter(|dt| seen.insert(dt.id.clone())));
            if page_query.limit == 0 || count < page_query.limit {
                break;
            }
            if all.len() == before {
                warn!(
                    offset = page_query.offset,
                    "catalog page repeated known device types, stop paging"
                );
                break;
            }
            page_query.offset += count;
            trace!(fetched = all.len(), "requesting next device-type page");
        }
        Ok(all)
    }

    /// Create a new device type. Returns the stored type with its
    /// catalog-assigned id.
    pub async fn create_device_type(
        &self,
        token: &str,
        device_type: &DeviceType,
    ) -> Result<DeviceType, Error> {
        let url = join_path(&self.manager_url, "/device-types")?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .header(reqwest::header::AUTHORIZATION, token)
            .json(device_type)
            .send()
            .await
            .map_err(Error::Transport)?;

        parse_json(resp).await
    }
}

/// Check the status and decode the JSON body. A non-2xx response becomes
/// [`Error::Api`] with the body as the message, untouched.
async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Api {
            status: status.as_u16(),
            message: body,
        });
    }

    let body = resp.text().await.map_err(Error::Transport)?;
    serde_json::from_str(&body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.clone(),
        }
    })
}
