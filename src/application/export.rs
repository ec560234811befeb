//! End-to-end export: build a request record, render it remotely, write the file.

use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use bytes::Bytes;
use reqwest::{Url, header::HeaderMap};
use tracing::{info, warn};

use crate::{
    config::ExportSettings,
    domain::{
        request::{ChartConfig, ExportOptions, RenderRequest},
        types::ExportFormat,
    },
    infra::{
        client::{DEFAULT_ENDPOINT, RenderClient, parse_endpoint},
        output::write_output,
    },
};

use super::error::ExportError;

/// Outcome of a successful export.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub path: PathBuf,
    pub format: ExportFormat,
    pub bytes: usize,
    /// Set when the image was fetched through a redirect token.
    pub redirect: Option<Url>,
}

/// Client for rendering chart configurations into files.
///
/// Holds no per-export state; every call builds its own [`RenderRequest`], so a
/// single client can be cloned and shared between concurrent exports.
#[derive(Clone, Debug)]
pub struct ExportClient {
    renderer: RenderClient,
}

impl ExportClient {
    /// Client for the public export server.
    pub fn new() -> Result<Self, ExportError> {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: &str) -> Result<Self, ExportError> {
        let endpoint = parse_endpoint(endpoint)?;
        let renderer = RenderClient::new(endpoint, HeaderMap::new())?;
        Ok(Self { renderer })
    }

    pub fn from_settings(settings: &ExportSettings) -> Result<Self, ExportError> {
        let renderer = RenderClient::new(settings.endpoint.clone(), settings.headers.clone())?;
        Ok(Self { renderer })
    }

    pub fn endpoint(&self) -> &Url {
        self.renderer.endpoint()
    }

    /// Build a fresh request record from a chart configuration, format and options.
    pub fn build_request(
        chart: impl Into<ChartConfig>,
        format: ExportFormat,
        options: &ExportOptions,
    ) -> Result<RenderRequest, ExportError> {
        let mut request = RenderRequest::new();
        request.configure(chart).set_format(format);
        request.apply(options)?;
        Ok(request)
    }

    pub async fn render_and_fetch(&self, request: &RenderRequest) -> Result<Bytes, ExportError> {
        Ok(self.renderer.render_and_fetch(request).await?)
    }

    /// Render an already-built request and write the image to `path`.
    ///
    /// The file is only touched once the image bytes are in hand.
    pub async fn export_request(
        &self,
        request: &RenderRequest,
        path: impl AsRef<Path>,
    ) -> Result<ExportReport, ExportError> {
        let path = path.as_ref();
        let started_at = Instant::now();

        let image = self.renderer.render(request).await.inspect_err(|err| {
            warn!(
                target = "application::export",
                op = "export::export",
                result = "error",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                path = %path.display(),
                error = %err,
                "Export failed before writing output"
            );
        })?;
        write_output(path, &image.bytes).await?;

        info!(
            target = "application::export",
            op = "export::export",
            result = "written",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            path = %path.display(),
            format = %request.format(),
            bytes = image.bytes.len(),
            redirected = image.redirect.is_some(),
            "Chart exported"
        );

        Ok(ExportReport {
            path: path.to_path_buf(),
            format: request.format().clone(),
            bytes: image.bytes.len(),
            redirect: image.redirect,
        })
    }

    /// Export `chart` in `format` to `path`, applying the given options.
    pub async fn export(
        &self,
        chart: impl Into<ChartConfig>,
        path: impl AsRef<Path>,
        format: ExportFormat,
        options: &ExportOptions,
    ) -> Result<ExportReport, ExportError> {
        let request = Self::build_request(chart, format, options)?;
        self.export_request(&request, path).await
    }

    /// Export with the format given by name (`png`, `jpeg`, `svg`, `pdf`) or as a MIME type.
    pub async fn save(
        &self,
        chart: impl Into<ChartConfig>,
        path: impl AsRef<Path>,
        format: &str,
        options: &ExportOptions,
    ) -> Result<ExportReport, ExportError> {
        let format: ExportFormat = format.parse()?;
        self.export(chart, path, format, options).await
    }

    pub async fn save_as_png(
        &self,
        chart: impl Into<ChartConfig>,
        path: impl AsRef<Path>,
        options: &ExportOptions,
    ) -> Result<ExportReport, ExportError> {
        self.export(chart, path, ExportFormat::Png, options).await
    }

    pub async fn save_as_jpeg(
        &self,
        chart: impl Into<ChartConfig>,
        path: impl AsRef<Path>,
        options: &ExportOptions,
    ) -> Result<ExportReport, ExportError> {
        self.export(chart, path, ExportFormat::Jpeg, options).await
    }

    pub async fn save_as_svg(
        &self,
        chart: impl Into<ChartConfig>,
        path: impl AsRef<Path>,
        options: &ExportOptions,
    ) -> Result<ExportReport, ExportError> {
        self.export(chart, path, ExportFormat::Svg, options).await
    }

    pub async fn save_as_pdf(
        &self,
        chart: impl Into<ChartConfig>,
        path: impl AsRef<Path>,
        options: &ExportOptions,
    ) -> Result<ExportReport, ExportError> {
        self.export(chart, path, ExportFormat::Pdf, options).await
    }
}
