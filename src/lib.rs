//! Render Highcharts chart configurations to image files through the
//! Highcharts export server.
//!
//! ```no_run
//! use highchart_export::{ExportClient, ExportOptions, ChartVariant};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), highchart_export::ExportError> {
//! let client = ExportClient::new()?;
//! let options = ExportOptions::default()
//!     .with_variant(ChartVariant::StockChart)
//!     .with_scale(2.0);
//! client
//!     .save_as_png(json!({"series": [{"data": [1, 2, 3]}]}), "chart.png", &options)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;

pub use application::{
    error::ExportError,
    export::{ExportClient, ExportReport},
};
pub use domain::{
    ChartConfig, ChartVariant, DomainError, ExportFormat, ExportOptions, RenderRequest,
};
pub use infra::client::{DEFAULT_ENDPOINT, RenderError};
