//! Output formats and chart constructors understood by the export server.

use std::{fmt, path::Path, str::FromStr};

use serde::{Serialize, Serializer};

use super::error::DomainError;

const MIME_PNG: &str = "image/png";
const MIME_JPEG: &str = "image/jpeg";
const MIME_SVG: &str = "image/svg+xml";
const MIME_PDF: &str = "application/pdf";

/// Requested output format, sent as the `type` field of the render request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
    Svg,
    Pdf,
    /// Any other MIME type, passed through verbatim.
    Other(String),
}

impl ExportFormat {
    pub fn mime(&self) -> &str {
        match self {
            ExportFormat::Png => MIME_PNG,
            ExportFormat::Jpeg => MIME_JPEG,
            ExportFormat::Svg => MIME_SVG,
            ExportFormat::Pdf => MIME_PDF,
            ExportFormat::Other(mime) => mime.as_str(),
        }
    }

    /// Map a MIME string onto a known format, keeping unknown types as [`ExportFormat::Other`].
    pub fn from_mime(mime: &str) -> Self {
        match mime {
            MIME_PNG => ExportFormat::Png,
            MIME_JPEG => ExportFormat::Jpeg,
            MIME_SVG => ExportFormat::Svg,
            MIME_PDF => ExportFormat::Pdf,
            other => ExportFormat::Other(other.to_string()),
        }
    }

    /// Guess the format from a file extension. Only the four named formats are inferred.
    pub fn from_path(path: &Path) -> Option<Self> {
        let guess = mime_guess::from_path(path).first()?;
        match Self::from_mime(guess.essence_str()) {
            ExportFormat::Other(_) => None,
            known => Some(known),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

impl FromStr for ExportFormat {
    type Err = DomainError;

    /// `png`, `jpeg`, `svg` and `pdf` (any case) select the named formats;
    /// anything else is taken as a MIME type.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_option("type", "must not be empty"));
        }

        let format = match trimmed.to_ascii_lowercase().as_str() {
            "png" => ExportFormat::Png,
            "jpeg" | "jpg" => ExportFormat::Jpeg,
            "svg" => ExportFormat::Svg,
            "pdf" => ExportFormat::Pdf,
            _ => ExportFormat::from_mime(trimmed),
        };
        Ok(format)
    }
}

impl Serialize for ExportFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.mime())
    }
}

/// Highcharts constructor used to build the chart (`constr`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ChartVariant {
    #[default]
    Chart,
    StockChart,
    Map,
}

impl ChartVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            ChartVariant::Chart => "Chart",
            ChartVariant::StockChart => "StockChart",
            ChartVariant::Map => "Map",
        }
    }
}

impl fmt::Display for ChartVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
