//! Source URI → public URL resolvers.
//!
//! Knowledge-base documents carry their public URL as an object tag named
//! `url`. [`S3TagUrlResolver`] reads that tag from the S3 tagging XML.
//! [`StaticUrlResolver`] serves a fixed table from configuration and
//! [`NoopResolver`] resolves nothing.
//! None of them ever fail: any problem resolves to `""`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use vaxchecker_core::error::InvocationError;
use vaxchecker_core::resolver::UriToUrlResolver;

use crate::http;

/// Split `s3://bucket/key/parts` into `(bucket, key)`.
pub fn parse_s3_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix("s3://")?;
    let (bucket, key) = rest.split_once('/')?;
    let key = key.trim_start_matches('/');
    if bucket.is_empty() || key.is_empty() {
        return None;
    }
    Some((bucket, key))
}

/// `GetObjectTagging` response body.
#[derive(Debug, Deserialize)]
struct Tagging {
    #[serde(rename = "TagSet", default)]
    tag_set: TagSet,
}

#[derive(Debug, Default, Deserialize)]
struct TagSet {
    #[serde(rename = "Tag", default)]
    tags: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
struct Tag {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "Value", default)]
    value: String,
}

impl Tagging {
    /// Value of the first `url` tag (key compared case-insensitively).
    fn url(&self) -> Option<&str> {
        self.tag_set
            .tags
            .iter()
            .find(|t| t.key.eq_ignore_ascii_case("url"))
            .map(|t| t.value.as_str())
    }
}

fn parse_tagging(xml: &str) -> Result<Tagging, quick_xml::DeError> {
    quick_xml::de::from_str(xml)
}

/// Resolves a document URL from its object tags.
///
/// Issues a path-style `GET {base_url}/{bucket}/{key}?tagging` and reads the
/// S3 XML body:
///
/// ```xml
/// <Tagging><TagSet><Tag><Key>url</Key><Value>https://…</Value></Tag></TagSet></Tagging>
/// ```
///
/// Requests are unsigned, so `base_url` must be an endpoint that accepts
/// anonymous tagging reads (a public bucket policy or a signing proxy).
pub struct S3TagUrlResolver {
    base_url: String,
    client: reqwest::Client,
}

impl S3TagUrlResolver {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, InvocationError> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: http::build_client(timeout)?,
        })
    }

    async fn lookup(&self, bucket: &str, key: &str) -> Result<Option<String>, InvocationError> {
        let mut segments = vec![bucket];
        segments.extend(key.split('/'));
        let mut url = http::join_segments(&self.base_url, &segments)?;
        url.set_query(Some("tagging"));

        let response = self
            .client
            .get(url)
            .header("Accept", "application/xml")
            .send()
            .await
            .map_err(http::transport_error)?;
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(http::status_error("tagging", status, body));
        }

        let body = response.text().await.map_err(http::transport_error)?;
        let tagging = parse_tagging(&body).map_err(|e| InvocationError::ApiError {
            status_code: status,
            message: format!("Failed to parse tagging response: {e}"),
        })?;
        Ok(tagging.url().map(str::to_string))
    }
}

#[async_trait]
impl UriToUrlResolver for S3TagUrlResolver {
    fn name(&self) -> &str {
        "s3_tags"
    }

    async fn resolve(&self, uri: &str) -> String {
        let Some((bucket, key)) = parse_s3_uri(uri) else {
            debug!(uri, "Not an S3 URI, leaving unresolved");
            return String::new();
        };

        match self.lookup(bucket, key).await {
            Ok(Some(url)) => url,
            Ok(None) => String::new(),
            Err(e) => {
                warn!(uri, error = %e, "Failed to get object tags");
                String::new()
            }
        }
    }
}

/// Resolves from a fixed URI → URL table.
#[derive(Debug, Default, Clone)]
pub struct StaticUrlResolver {
    urls: HashMap<String, String>,
}

impl StaticUrlResolver {
    pub fn new(urls: HashMap<String, String>) -> Self {
        Self { urls }
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

#[async_trait]
impl UriToUrlResolver for StaticUrlResolver {
    fn name(&self) -> &str {
        "static"
    }

    async fn resolve(&self, uri: &str) -> String {
        self.urls.get(uri).cloned().unwrap_or_default()
    }
}

/// Resolves nothing.
pub struct NoopResolver;

#[async_trait]
impl UriToUrlResolver for NoopResolver {
    fn name(&self) -> &str {
        "none"
    }

    async fn resolve(&self, _uri: &str) -> String {
        String::new()
    }
}
