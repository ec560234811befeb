//! highchart-export: render a chart configuration to an image file.
#![deny(clippy::all, clippy::pedantic)]

mod input;

use std::process;

use highchart_export::{
    ExportClient,
    application::error::{AppError, error_chain},
    config,
    infra::telemetry,
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let causes = error_chain(error);
    if dispatcher::has_been_set() {
        error!(error = %error, causes = ?causes, "export failed");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, causes = ?causes, "export failed");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    let chart = input::read_chart(&cli_args.chart)?;
    let format = input::resolve_format(cli_args.render.format.as_deref(), &cli_args.output)?;
    let options = input::export_options(&cli_args.render);
    let client = ExportClient::from_settings(&settings.export)?;

    info!(
        target = "highchart_export::cli",
        endpoint = %client.endpoint(),
        output = %cli_args.output.display(),
        format = %format,
        "Starting export"
    );

    let report = client
        .export(chart, &cli_args.output, format, &options)
        .await?;
    input::print_report(&report);
    Ok(())
}
