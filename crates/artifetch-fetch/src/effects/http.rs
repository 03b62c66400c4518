use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::data::{BlobReference, Compression, ContentId, ItemKind, RemoteItem};
use crate::effects::transport::{ByteStream, ContainerClient};
use crate::error::TransportError;

const API_VERSION: &str = "4.1-preview.4";

/// File-container client over HTTP.
///
/// Items are listed with
/// `GET {base}/_apis/resources/Containers/{id}?itemPath=..&isShallow=false`
/// and read with the same route plus `$format=OctetStream`.
#[derive(Debug, Clone)]
pub struct ReqwestContainerClient {
    client:   Client,
    base_url: Url,
    token:    Option<String>,
}

impl ReqwestContainerClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: Client::new(),
            base_url,
            token: None,
        }
    }

    /// Use a preconfigured client (proxies, timeouts, TLS roots).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Send `Authorization: Bearer {token}` with every request.
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url { &self.base_url }

    fn container_url(&self, container_id: i64) -> Result<Url, TransportError> {
        self.base_url
            .join(&format!("_apis/resources/Containers/{container_id}"))
            .map_err(|e| TransportError::Rejected {
                status:  0,
                message: format!("invalid container url: {e}"),
            })
    }

    fn request(&self, url: Url) -> RequestBuilder {
        let request = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, format!("application/json;api-version={API_VERSION}"));
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(
        &self,
        request: RequestBuilder,
        what: &str,
        cancel: &CancellationToken,
    ) -> Result<Response, TransportError> {
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(TransportError::Cancelled),
            response = request.send() => response.map_err(|e| self.map_error(e))?,
        };
        check_status(response, what).await
    }

    fn map_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_connect() {
            TransportError::Unreachable {
                endpoint: self.base_url.host_str().unwrap_or_default().to_owned(),
                message:  e.to_string(),
            }
        } else if let Some(status) = e.status() {
            status_error(status, e.to_string())
        } else {
            TransportError::Transient(e.to_string())
        }
    }
}

async fn check_status(response: Response, what: &str) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(TransportError::NotFound(what.to_owned()));
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, format!("{what}: {body}")))
}

fn status_error(status: StatusCode, message: String) -> TransportError {
    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        TransportError::Transient(format!("{status}: {message}"))
    } else if status == StatusCode::NOT_FOUND {
        TransportError::NotFound(message)
    } else {
        TransportError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ItemPage {
    #[serde(default)]
    value: Vec<WireItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireItem {
    item_type:     String,
    path:          String,
    #[serde(default)]
    file_length:   u64,
    #[serde(default)]
    blob_metadata: Option<WireBlob>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBlob {
    artifact_hash:    String,
    #[serde(default)]
    compression_type: Option<String>,
}

impl WireItem {
    fn into_item(self) -> Option<RemoteItem> {
        let kind = match self.item_type.to_ascii_lowercase().as_str() {
            "file" => ItemKind::File,
            "folder" => ItemKind::Folder,
            _ => return None,
        };
        let blob = self.blob_metadata.map(|blob| BlobReference {
            content_id:  ContentId::new(blob.artifact_hash),
            compression: match blob.compression_type.as_deref() {
                Some(kind) if kind.eq_ignore_ascii_case("gzip") => Compression::Gzip,
                _ => Compression::None,
            },
        });
        Some(RemoteItem {
            path: self.path,
            kind,
            length: if kind == ItemKind::File { self.file_length } else { 0 },
            blob,
        })
    }
}

fn parse_listing(body: &[u8]) -> Result<Vec<RemoteItem>, TransportError> {
    let page: ItemPage = serde_json::from_slice(body)
        .map_err(|e| TransportError::Transient(format!("malformed container listing: {e}")))?;
    Ok(page.value.into_iter().filter_map(WireItem::into_item).collect())
}

impl ContainerClient for ReqwestContainerClient {
    async fn list_items(
        &self,
        container_id: i64,
        root: &str,
        include_blob_metadata: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<RemoteItem>, TransportError> {
        let mut url = self.container_url(container_id)?;
        url.query_pairs_mut()
            .append_pair("itemPath", root)
            .append_pair("isShallow", "false")
            .append_pair(
                "includeBlobMetadata",
                if include_blob_metadata { "true" } else { "false" },
            );

        let response = self.send(self.request(url), root, cancel).await?;
        let body: Bytes = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(TransportError::Cancelled),
            body = response.bytes() => body.map_err(|e| self.map_error(e))?,
        };
        parse_listing(&body)
    }

    async fn open_read_stream(
        &self,
        container_id: i64,
        item_path: &str,
        cancel: &CancellationToken,
    ) -> Result<ByteStream, TransportError> {
        let mut url = self.container_url(container_id)?;
        url.query_pairs_mut()
            .append_pair("itemPath", item_path)
            .append_pair("$format", "OctetStream");

        let response = self.send(self.request(url), item_path, cancel).await?;
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::Transient(e.to_string())));
        Ok(Box::pin(stream))
    }
}
