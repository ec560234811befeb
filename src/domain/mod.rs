//! Domain layer: the render request record and the values that shape it.

pub mod error;
pub mod request;
pub mod types;

pub use error::DomainError;
pub use request::{ChartConfig, ExportOptions, RenderRequest};
pub use types::{ChartVariant, ExportFormat};
