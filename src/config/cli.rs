use std::{fmt, path::PathBuf};

use clap::{Args, Parser, ValueEnum, ValueHint, builder::BoolishValueParser};

use crate::domain::types::ChartVariant;

/// Command-line arguments for the `highchart-export` binary.
#[derive(Debug, Parser)]
#[command(
    name = "highchart-export",
    version,
    about = "Render a Highcharts configuration to an image file via the export server"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "HIGHCHART_EXPORT_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub chart: ChartInput,

    #[command(flatten)]
    pub render: RenderArgs,

    #[command(flatten)]
    pub overrides: SettingsOverrides,

    /// Image file to write; replaced if it already exists.
    #[arg(value_name = "OUTPUT", value_hint = ValueHint::FilePath)]
    pub output: PathBuf,
}

#[derive(Debug, Args, Default, Clone)]
#[group(required = true, multiple = true)]
pub struct ChartInput {
    /// Chart configuration given inline.
    #[arg(long, value_name = "JSON")]
    pub chart: Option<String>,

    /// File holding the chart configuration (takes precedence over --chart).
    #[arg(long = "chart-file", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub chart_file: Option<PathBuf>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RenderArgs {
    /// Output format: png, jpeg, svg, pdf or a MIME type. Inferred from OUTPUT when omitted.
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Highcharts constructor to render with.
    #[arg(long, value_name = "VARIANT")]
    pub variant: Option<VariantArg>,

    /// Exact pixel width of the exported image.
    #[arg(long, value_name = "PX")]
    pub width: Option<u32>,

    /// Scale factor for higher resolution output (the server caps it at 4).
    #[arg(long, value_name = "FACTOR")]
    pub scale: Option<f64>,

    /// Render using styled mode.
    #[arg(long = "styled-model", action = clap::ArgAction::SetTrue)]
    pub styled_model: bool,
}

#[derive(Debug, Args, Default, Clone)]
pub struct SettingsOverrides {
    /// Override the export server endpoint.
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum VariantArg {
    Chart,
    Stock,
    Map,
}

impl From<VariantArg> for ChartVariant {
    fn from(value: VariantArg) -> Self {
        match value {
            VariantArg::Chart => ChartVariant::Chart,
            VariantArg::Stock => ChartVariant::StockChart,
            VariantArg::Map => ChartVariant::Map,
        }
    }
}

impl fmt::Display for VariantArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VariantArg::Chart => "chart",
            VariantArg::Stock => "stock",
            VariantArg::Map => "map",
        };
        f.write_str(s)
    }
}
