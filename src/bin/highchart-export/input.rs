#![deny(clippy::all, clippy::pedantic)]

use std::{fs, path::Path};

use highchart_export::{
    ChartConfig, ChartVariant, ExportFormat, ExportOptions, ExportReport,
    application::error::{AppError, ExportError},
    config::{ChartInput, RenderArgs},
};
use serde_json::json;

/// Read the chart configuration, preferring the file over the inline value.
pub fn read_chart(input: &ChartInput) -> Result<ChartConfig, AppError> {
    let raw = if let Some(path) = &input.chart_file {
        fs::read_to_string(path).map_err(|source| AppError::Input {
            path: path.clone(),
            source,
        })?
    } else if let Some(inline) = &input.chart {
        inline.clone()
    } else {
        return Err(AppError::validation(
            "chart configuration required (use --chart or --chart-file)",
        ));
    };

    if raw.trim().is_empty() {
        return Err(AppError::validation("chart configuration is empty"));
    }
    Ok(ChartConfig::Raw(raw))
}

/// Explicit format wins; otherwise infer from the output extension, falling back to PNG.
pub fn resolve_format(explicit: Option<&str>, output: &Path) -> Result<ExportFormat, AppError> {
    match explicit {
        Some(value) => value
            .parse::<ExportFormat>()
            .map_err(|err| AppError::from(ExportError::from(err))),
        None => Ok(ExportFormat::from_path(output).unwrap_or_default()),
    }
}

pub fn export_options(args: &RenderArgs) -> ExportOptions {
    ExportOptions {
        constr: args.variant.map(ChartVariant::from),
        width: args.width,
        scale: args.scale,
        styled_model: args.styled_model.then_some(true),
    }
}

pub fn print_report(report: &ExportReport) {
    let value = json!({
        "path": report.path.display().to_string(),
        "type": report.format.mime(),
        "bytes": report.bytes,
        "redirect": report.redirect.as_ref().map(ToString::to_string),
    });
    println!("{value:#}");
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use highchart_export::config::VariantArg;
    use tempfile::NamedTempFile;

    use super::*;

    fn tmp_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("tmp file");
        file.write_all(contents.as_bytes()).expect("write tmp");
        file
    }

    #[test]
    fn chart_file_takes_precedence_over_inline() {
        let file = tmp_file("{\"title\":{\"text\":\"from file\"}}");
        let input = ChartInput {
            chart: Some("{}".into()),
            chart_file: Some(file.path().to_path_buf()),
        };

        let chart = read_chart(&input).expect("chart");
        assert_eq!(
            chart,
            ChartConfig::Raw("{\"title\":{\"text\":\"from file\"}}".into())
        );
    }

    #[test]
    fn missing_chart_file_reports_path() {
        let input = ChartInput {
            chart: None,
            chart_file: Some(PathBuf::from("/definitely/not/here.json")),
        };

        let err = read_chart(&input).expect_err("missing file");
        assert!(matches!(err, AppError::Input { .. }));
    }

    #[test]
    fn blank_chart_is_rejected() {
        let input = ChartInput {
            chart: Some("  \n".into()),
            chart_file: None,
        };

        let err = read_chart(&input).expect_err("blank chart");
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn format_is_inferred_then_defaults_to_png() {
        let svg = resolve_format(None, Path::new("out/chart.svg")).expect("svg");
        assert_eq!(svg, ExportFormat::Svg);

        let fallback = resolve_format(None, Path::new("chart")).expect("fallback");
        assert_eq!(fallback, ExportFormat::Png);

        let explicit = resolve_format(Some("pdf"), Path::new("chart.svg")).expect("explicit");
        assert_eq!(explicit, ExportFormat::Pdf);
    }

    #[test]
    fn render_args_become_options() {
        let args = RenderArgs {
            format: None,
            variant: Some(VariantArg::Map),
            width: Some(300),
            scale: None,
            styled_model: false,
        };

        let options = export_options(&args);
        assert_eq!(options.constr, Some(ChartVariant::Map));
        assert_eq!(options.width, Some(300));
        assert_eq!(options.scale, None);
        assert_eq!(options.styled_model, None);
    }
}
