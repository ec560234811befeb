#![deny(clippy::all, clippy::pedantic)]

use std::{ffi::OsString, fs};

use assert_cmd::Command;
use httpmock::MockServer;
use predicates::str::contains;
use tempfile::TempDir;

const CHART: &str = r#"{"title":{"text":"Monthly visits"},"series":[{"data":[3,7,4]}]}"#;

fn cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("highchart-export"));
    cmd.current_dir(dir.path()).env_remove("RUST_LOG");
    for key in config_vars(std::env::vars_os().map(|(key, _)| key)) {
        cmd.env_remove(key);
    }
    cmd
}

/// Variables the binary reads its settings from.
fn config_vars(keys: impl Iterator<Item = OsString>) -> Vec<OsString> {
    keys.filter(|key| key.to_string_lossy().starts_with("HIGHCHART_EXPORT"))
        .collect()
}

#[test]
fn inherited_config_vars_are_cleared() {
    let keys = [
        "HIGHCHART_EXPORT_CONFIG_FILE",
        "HIGHCHART_EXPORT__EXPORT__ENDPOINT",
        "HIGHCHART_EXPORT__LOGGING__JSON",
        "HIGHCHART_EXPORT__EXPORT__HEADERS__X_TEAM",
        "PATH",
        "HOME",
    ]
    .map(OsString::from);

    let cleared = config_vars(keys.into_iter());

    assert_eq!(cleared.len(), 4);
    assert!(cleared.iter().all(|key| key != "PATH" && key != "HOME"));
}

#[test]
fn exports_png_end_to_end() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST")
            .path("/")
            .header("content-type", "application/json")
            .json_body_includes(r#"{"type":"image/png","constr":"StockChart","width":"900"}"#);
        then.status(200)
            .header("content-type", "image/png")
            .body(b"\x89PNG");
    });

    let dir = TempDir::new().expect("temp dir");
    let assert = cmd(&dir)
        .arg("--endpoint")
        .arg(server.base_url())
        .arg("--chart")
        .arg(CHART)
        .arg("--variant")
        .arg("stock")
        .arg("--width")
        .arg("900")
        .arg("chart.png")
        .assert()
        .success();

    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("\"bytes\": 4"));
    assert!(output.contains("\"type\": \"image/png\""));
    assert_eq!(
        fs::read(dir.path().join("chart.png")).expect("output file"),
        b"\x89PNG"
    );
    mock.assert();
}

#[test]
fn format_is_inferred_from_output_and_redirect_is_followed() {
    let server = MockServer::start();
    let post = server.mock(|when, then| {
        when.method("POST")
            .path("/")
            .json_body_includes(r#"{"type":"application/pdf"}"#);
        then.status(200)
            .header("content-type", "text/plain")
            .body("charts/chart.77.png");
    });
    let get = server.mock(|when, then| {
        when.method("GET").path("/charts/chart.77.png");
        then.status(200)
            .header("content-type", "application/pdf")
            .body("%PDF-1.7");
    });

    let dir = TempDir::new().expect("temp dir");
    let chart_file = dir.path().join("chart.json");
    fs::write(&chart_file, CHART).expect("chart file");

    cmd(&dir)
        .env("HIGHCHART_EXPORT__EXPORT__ENDPOINT", server.base_url())
        .arg("--chart-file")
        .arg(&chart_file)
        .arg("report.pdf")
        .assert()
        .success()
        .stdout(contains("charts/chart.77.png"));

    assert_eq!(
        fs::read(dir.path().join("report.pdf")).expect("output file"),
        b"%PDF-1.7"
    );
    post.assert();
    get.assert();
}

#[test]
fn unexpected_response_fails_without_output() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/");
        then.status(200)
            .header("content-type", "text/html")
            .body("<html>Something went wrong</html>");
    });

    let dir = TempDir::new().expect("temp dir");
    cmd(&dir)
        .arg("--endpoint")
        .arg(server.base_url())
        .arg("--chart")
        .arg(CHART)
        .arg("chart.svg")
        .assert()
        .failure()
        .stderr(contains("unexpected response"));

    assert!(!dir.path().join("chart.svg").exists());
}

#[test]
fn invalid_width_fails_fast() {
    let dir = TempDir::new().expect("temp dir");
    cmd(&dir)
        .arg("--endpoint")
        .arg("http://127.0.0.1:9")
        .arg("--chart")
        .arg(CHART)
        .arg("--width")
        .arg("0")
        .arg("chart.png")
        .assert()
        .failure()
        .stderr(contains("width"));
}

#[test]
fn missing_chart_is_a_usage_error() {
    let dir = TempDir::new().expect("temp dir");
    cmd(&dir)
        .arg("chart.png")
        .assert()
        .failure()
        .stderr(contains("--chart"));
}
