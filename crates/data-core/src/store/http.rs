use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::{Body, Method};
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::debug;

use super::{BlobReader, BlobStore};
use crate::error::{DataError, Result};
use crate::http::HttpClient;

/// Blob store speaking plain HTTP: `HEAD`/`PUT`/`GET` on `<base><key>`.
#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    client: HttpClient,
    base_url: String,
}

impl HttpBlobStore {
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, key: &str) -> String {
        if key.starts_with('/') {
            format!("{}{}", self.base_url, key)
        } else {
            format!("{}/{}", self.base_url, key)
        }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn has(&self, key: &str) -> Result<bool> {
        let url = self.url(key);
        let req = self.client.request(Method::HEAD, &url);
        match self.client.send(req, &url, key).await {
            Ok(_) => Ok(true),
            Err(DataError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn put(&self, key: &str, reader: BlobReader) -> Result<()> {
        let url = self.url(key);
        debug!("uploading {}", key);
        let body = Body::wrap_stream(ReaderStream::new(reader));
        let req = self.client.request(Method::PUT, &url).body(body);
        self.client.send(req, &url, key).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<BlobReader> {
        let url = self.url(key);
        let req = self.client.request(Method::GET, &url);
        let resp = self.client.send(req, &url, key).await?;
        let stream = resp.bytes_stream().map_err(std::io::Error::other);
        Ok(Box::new(StreamReader::new(stream)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    const KEY: &str = "/blob/f572d396fae9206628714fb2ce00f72e94f2258f";

    fn store(url: &str) -> HttpBlobStore {
        HttpBlobStore::new(HttpClient::new("ana", "t0ken").unwrap(), url)
    }

    #[tokio::test]
    async fn has_maps_404_to_false() {
        let mut server = mockito::Server::new_async().await;
        let present = server
            .mock("HEAD", KEY)
            .match_header("X-Data-User", "ana")
            .match_header("X-Data-Token", "t0ken")
            .with_status(200)
            .create_async()
            .await;

        let s = store(&server.url());
        assert!(s.has(KEY).await.unwrap());
        present.assert_async().await;

        let _missing = server
            .mock("HEAD", "/blob/0000000000000000000000000000000000000000")
            .with_status(404)
            .create_async()
            .await;
        assert!(
            !s.has("/blob/0000000000000000000000000000000000000000")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn put_streams_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", KEY)
            .match_body("hello\n")
            .with_status(200)
            .create_async()
            .await;

        let s = store(&format!("{}/", server.url()));
        s.put(KEY, Box::new(std::io::Cursor::new(b"hello\n".to_vec())))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_returns_body_and_maps_errors() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server
            .mock("GET", KEY)
            .with_status(200)
            .with_body("hello\n")
            .create_async()
            .await;
        let _denied = server
            .mock("GET", "/blob/denied")
            .with_status(403)
            .with_body("AccessDenied\n")
            .create_async()
            .await;

        let s = store(&server.url());
        let mut body = String::new();
        s.get(KEY)
            .await
            .unwrap()
            .read_to_string(&mut body)
            .await
            .unwrap();
        assert_eq!(body, "hello\n");

        let err = s.get("/blob/denied").await.err().expect("denied get should fail");
        assert!(matches!(
            err,
            DataError::Transport { status: 403, ref message } if message == "AccessDenied"
        ));
    }

    #[tokio::test]
    async fn unreachable_server_is_network_error() {
        let s = store("http://127.0.0.1:1");
        let err = s.has(KEY).await.unwrap_err();
        assert!(matches!(err, DataError::Network { .. }));
    }
}
