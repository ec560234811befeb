//! HTTP client for the Highcharts export server.

use std::time::Instant;

use bytes::Bytes;
use mime_guess::mime::{self, Mime};
use reqwest::{
    Client, Response, StatusCode, Url,
    header::{CONTENT_TYPE, HeaderMap, HeaderValue},
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{error::DomainError, request::RenderRequest};

pub const DEFAULT_ENDPOINT: &str = "https://export.highcharts.com/";

/// Suffix identifying a redirect token in a textual response. Matched for every
/// requested format, not only PNG.
const REDIRECT_SUFFIX: &str = ".png";
const DETAIL_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to encode render request: {0}")]
    Encode(#[from] DomainError),
    #[error("unexpected response from export server (status {status}): {detail}")]
    UnexpectedResponse { status: StatusCode, detail: String },
}

/// Image bytes returned by the export server.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub bytes: Bytes,
    /// Location fetched when the server answered with a redirect token.
    pub redirect: Option<Url>,
}

#[derive(Clone, Debug)]
pub struct RenderClient {
    client: Client,
    endpoint: Url,
}

impl RenderClient {
    pub fn new(endpoint: Url, headers: HeaderMap) -> Result<Self, RenderError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .default_headers(headers)
            .build()?;
        Ok(Self { client, endpoint })
    }

    pub fn user_agent() -> &'static str {
        concat!("highchart-export/", env!("CARGO_PKG_VERSION"))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Post the request and return the rendered image bytes.
    pub async fn render_and_fetch(&self, request: &RenderRequest) -> Result<Bytes, RenderError> {
        self.render(request).await.map(|image| image.bytes)
    }

    /// Post the request, following a redirect token when the server returns one.
    pub async fn render(&self, request: &RenderRequest) -> Result<RenderedImage, RenderError> {
        let started_at = Instant::now();
        let body = request.to_json()?;
        debug!(
            target = "infra::client",
            op = "client::render",
            endpoint = %self.endpoint,
            format = %request.format(),
            constr = %request.variant(),
            body_bytes = body.len(),
            "Posting render request"
        );

        let resp = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body)
            .send()
            .await?;
        let status = resp.status();
        let textual = is_textual(&resp);
        let bytes = Self::success_bytes(resp).await?;

        if !textual {
            info!(
                target = "infra::client",
                op = "client::render",
                result = "binary",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                image_bytes = bytes.len(),
                "Export server returned image content"
            );
            return Ok(RenderedImage {
                bytes,
                redirect: None,
            });
        }

        let text = String::from_utf8_lossy(&bytes);
        let token = text.trim();
        if !token.ends_with(REDIRECT_SUFFIX) {
            warn!(
                target = "infra::client",
                op = "client::render",
                result = "error",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                error_code = "unexpected_text",
                status = status.as_u16(),
                "Export server returned text that is not a redirect token"
            );
            return Err(RenderError::UnexpectedResponse {
                status,
                detail: preview(token),
            });
        }

        let location = self.redirect_url(token)?;
        let resp = self.client.get(location.clone()).send().await?;
        let bytes = Self::success_bytes(resp).await?;
        info!(
            target = "infra::client",
            op = "client::render",
            result = "redirect",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            location = %location,
            image_bytes = bytes.len(),
            "Export server image fetched through redirect token"
        );

        Ok(RenderedImage {
            bytes,
            redirect: Some(location),
        })
    }

    /// The token is appended to the endpoint as-is.
    fn redirect_url(&self, token: &str) -> Result<Url, RenderError> {
        Ok(Url::parse(&format!("{}{token}", self.endpoint))?)
    }

    async fn success_bytes(resp: Response) -> Result<Bytes, RenderError> {
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes);
            return Err(RenderError::UnexpectedResponse {
                status,
                detail: preview(text.trim()),
            });
        }
        Ok(bytes)
    }
}

/// Parse an endpoint URL, requiring http(s) and a trailing slash on the path.
pub fn parse_endpoint(raw: &str) -> Result<Url, RenderError> {
    let invalid = |reason: &str| RenderError::InvalidEndpoint {
        endpoint: raw.to_string(),
        reason: reason.to_string(),
    };

    let mut url = Url::parse(raw.trim())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot be used as a base"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query strings and fragments are not supported"));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Responses typed as text (or JSON) are not image content.
fn is_textual(resp: &Response) -> bool {
    resp.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<Mime>().ok())
        .is_some_and(|mime| is_textual_mime(&mime))
}

fn is_textual_mime(mime: &Mime) -> bool {
    mime.type_() == mime::TEXT || mime.essence_str() == mime::APPLICATION_JSON.essence_str()
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(DETAIL_PREVIEW_CHARS).collect();
    if text.chars().count() > DETAIL_PREVIEW_CHARS {
        out.push('…');
    }
    out
}
