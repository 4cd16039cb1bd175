use std::collections::BTreeMap;

use async_trait::async_trait;
use data_schema::BlobHash;
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;

use super::{IndexBackend, RefRecord};
use crate::error::{DataError, Result};
use crate::http::{CONTENT_TYPE_YAML, HttpClient};

/// Ref index served over HTTP.
///
/// `GET <api>/<author>/<name>` returns the YAML [`RefRecord`];
/// `POST <api>/<author>/<name>/<version>` with body `ref: <hash>` publishes.
#[derive(Debug, Clone)]
pub struct HttpIndex {
    client: HttpClient,
    api_url: String,
}

impl HttpIndex {
    pub fn new(client: HttpClient, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl IndexBackend for HttpIndex {
    async fn fetch_refs(&self, path: &str) -> Result<RefRecord> {
        let url = self.url(path);
        let req = self.client.request(Method::GET, &url);
        let body = self.client.send(req, &url, path).await?.text().await?;
        if body.trim().is_empty() {
            return Ok(RefRecord::default());
        }
        serde_yaml::from_str(&body).map_err(|e| DataError::yaml(format!("refs of {path}"), e))
    }

    async fn put_ref(&self, path: &str, version: &str, hash: &BlobHash) -> Result<()> {
        let url = self.url(&format!("{path}/{version}"));
        let body = serde_yaml::to_string(&BTreeMap::from([("ref", hash.as_str())]))
            .map_err(|e| DataError::yaml("ref", e))?;
        let req = self
            .client
            .request(Method::POST, &url)
            .header(CONTENT_TYPE, CONTENT_TYPE_YAML)
            .body(body);

        match self.client.send(req, &url, path).await {
            Ok(_) => Ok(()),
            Err(DataError::Transport { status: 403, .. }) => Err(DataError::Forbidden {
                user: self.client.user().to_string(),
                dataset: path.to_string(),
                owner: path.split('/').next().unwrap_or_default().to_string(),
            }),
            Err(e) => Err(e),
        }
    }
}
