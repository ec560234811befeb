//! The render request record posted to the export server.
//!
//! A [`RenderRequest`] is built fresh for every export, adjusted through its
//! setters, serialized once and dropped. Nothing about it is shared between
//! calls.

use serde::{Serialize, Serializer};
use tracing::warn;

use super::{
    error::DomainError,
    types::{ChartVariant, ExportFormat},
};

/// Widest image the export server renders; wider requests are clamped server-side.
pub const MAX_WIDTH: u32 = 2000;
/// Largest scale factor the export server honours.
pub const MAX_SCALE: f64 = 4.0;

/// Chart configuration supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartConfig {
    /// A structured configuration, serialized to JSON before sending.
    Json(serde_json::Value),
    /// An already-serialized configuration, sent verbatim.
    Raw(String),
}

impl ChartConfig {
    /// Capture any serializable chart options as a JSON configuration.
    pub fn from_serialize<T: Serialize + ?Sized>(options: &T) -> Result<Self, DomainError> {
        Ok(Self::Json(serde_json::to_value(options)?))
    }

    fn into_infile(self) -> String {
        match self {
            ChartConfig::Json(value) => value.to_string(),
            ChartConfig::Raw(raw) => raw,
        }
    }
}

impl From<serde_json::Value> for ChartConfig {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<String> for ChartConfig {
    fn from(value: String) -> Self {
        Self::Raw(value)
    }
}

impl From<&str> for ChartConfig {
    fn from(value: &str) -> Self {
        Self::Raw(value.to_string())
    }
}

/// Per-call overrides applied on top of a default request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportOptions {
    pub constr: Option<ChartVariant>,
    pub width: Option<u32>,
    pub scale: Option<f64>,
    pub styled_model: Option<bool>,
}

impl ExportOptions {
    pub fn with_variant(mut self, variant: ChartVariant) -> Self {
        self.constr = Some(variant);
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_styled_model(mut self, styled: bool) -> Self {
        self.styled_model = Some(styled);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    infile: String,
    #[serde(serialize_with = "string_or_false")]
    width: Option<String>,
    #[serde(serialize_with = "string_or_false")]
    scale: Option<String>,
    constr: ChartVariant,
    styled_model: bool,
    #[serde(rename = "type")]
    format: ExportFormat,
    async_rendering: bool,
    #[serde(rename = "async")]
    async_response: bool,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self {
            infile: String::new(),
            width: None,
            scale: None,
            constr: ChartVariant::Chart,
            styled_model: false,
            format: ExportFormat::Png,
            async_rendering: false,
            async_response: false,
        }
    }
}

impl RenderRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore every field to its default value.
    pub fn reset(&mut self) -> &mut Self {
        *self = Self::default();
        self
    }

    pub fn configure(&mut self, chart: impl Into<ChartConfig>) -> &mut Self {
        self.infile = chart.into().into_infile();
        self
    }

    pub fn set_format(&mut self, format: ExportFormat) -> &mut Self {
        self.format = format;
        self
    }

    pub fn png(&mut self) -> &mut Self {
        self.set_format(ExportFormat::Png)
    }

    pub fn jpeg(&mut self) -> &mut Self {
        self.set_format(ExportFormat::Jpeg)
    }

    pub fn svg(&mut self) -> &mut Self {
        self.set_format(ExportFormat::Svg)
    }

    pub fn pdf(&mut self) -> &mut Self {
        self.set_format(ExportFormat::Pdf)
    }

    pub fn set_variant(&mut self, variant: ChartVariant) -> &mut Self {
        self.constr = variant;
        self
    }

    pub fn chart(&mut self) -> &mut Self {
        self.set_variant(ChartVariant::Chart)
    }

    pub fn stock_chart(&mut self) -> &mut Self {
        self.set_variant(ChartVariant::StockChart)
    }

    pub fn map_chart(&mut self) -> &mut Self {
        self.set_variant(ChartVariant::Map)
    }

    /// Exact pixel width of the exported image. Takes precedence over scale on the server.
    pub fn set_width(&mut self, width: u32) -> Result<&mut Self, DomainError> {
        if width == 0 {
            return Err(DomainError::invalid_option(
                "width",
                "must be greater than zero",
            ));
        }
        if width > MAX_WIDTH {
            warn!(
                target = "domain::request",
                op = "request::set_width",
                width,
                max_width = MAX_WIDTH,
                "Requested width exceeds the export server maximum"
            );
        }
        self.width = Some(width.to_string());
        Ok(self)
    }

    /// Scaling factor for a higher resolution image.
    pub fn set_scale(&mut self, scale: f64) -> Result<&mut Self, DomainError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(DomainError::invalid_option(
                "scale",
                format!("must be a positive number, got {scale}"),
            ));
        }
        if scale > MAX_SCALE {
            warn!(
                target = "domain::request",
                op = "request::set_scale",
                scale,
                max_scale = MAX_SCALE,
                "Requested scale exceeds the export server maximum"
            );
        }
        self.scale = Some(scale.to_string());
        Ok(self)
    }

    pub fn set_styled_model(&mut self, styled: bool) -> &mut Self {
        self.styled_model = styled;
        self
    }

    /// Apply the overrides that are present, leaving the rest untouched.
    pub fn apply(&mut self, options: &ExportOptions) -> Result<&mut Self, DomainError> {
        if let Some(variant) = options.constr {
            self.set_variant(variant);
        }
        if let Some(width) = options.width {
            self.set_width(width)?;
        }
        if let Some(scale) = options.scale {
            self.set_scale(scale)?;
        }
        if let Some(styled) = options.styled_model {
            self.set_styled_model(styled);
        }
        Ok(self)
    }

    pub fn infile(&self) -> &str {
        &self.infile
    }

    pub fn width(&self) -> Option<&str> {
        self.width.as_deref()
    }

    pub fn scale(&self) -> Option<&str> {
        self.scale.as_deref()
    }

    pub fn variant(&self) -> ChartVariant {
        self.constr
    }

    pub fn format(&self) -> &ExportFormat {
        &self.format
    }

    pub fn styled_model(&self) -> bool {
        self.styled_model
    }

    pub fn to_json(&self) -> Result<Vec<u8>, DomainError> {
        Ok(serde_json::to_vec(self)?)
    }
}

fn string_or_false<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(text) => serializer.serialize_str(text),
        None => serializer.serialize_bool(false),
    }
}
