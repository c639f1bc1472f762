use std::path::Path;
use std::process::{Command, Output};

use serde_json::{json, Value};

const BIN: &str = env!("CARGO_BIN_EXE_conforma");

fn workspace(dir: &Path) -> std::path::PathBuf {
    let fixture = json!({
        "pages": {
            "https://site.com/index.shtm": {
                "requests": [
                    { "url": "https://site.com/index.shtm", "resourceType": "document" },
                    { "url": "https://site.com/logo.svg", "resourceType": "image" },
                    { "url": "https://site.com/fonts/Bradesco-Regular.woff2", "resourceType": "font" }
                ]
            },
            "https://site.com/about.html": {
                "requests": [
                    { "url": "https://site.com/about.html", "resourceType": "document" }
                ]
            }
        },
        "resources": {
            "https://site.com/logo.svg": { "sizeBytes": 1024, "contentType": "image/svg+xml" }
        }
    });
    let fixture_path = dir.join("site.json");
    std::fs::write(&fixture_path, serde_json::to_string_pretty(&fixture).unwrap()).unwrap();

    let config = format!(
        "[browser]\nengine = \"fixture\"\nfixture = '{}'\nsettle_millis = 10\n\n[store]\nresults_path = '{}'\n",
        fixture_path.display(),
        dir.join("results").join("results.json").display(),
    );
    let config_path = dir.join("conforma.toml");
    std::fs::write(&config_path, config).unwrap();
    config_path
}

fn conforma(config: &Path, args: &[&str]) -> Output {
    Command::new(BIN)
        .arg("--config")
        .arg(config)
        .args(args)
        .env("CONFORMA_LOG", "warn")
        .output()
        .unwrap()
}

fn reports(stdout: &[u8]) -> Vec<Value> {
    serde_json::from_slice(stdout).unwrap()
}

#[test]
fn validate_prints_stores_and_clears() {
    let dir = tempfile::tempdir().unwrap();
    let config = workspace(dir.path());

    let output = conforma(&config, &["validate", "https://site.com/index.shtm"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let printed = reports(&output.stdout);
    assert_eq!(printed.len(), 2);
    assert!(printed.iter().all(|report| report["overallPassed"] == true));

    let output = conforma(&config, &["results"]);
    assert!(output.status.success());
    assert_eq!(reports(&output.stdout), printed);

    let output = conforma(&config, &["clear"]);
    assert!(output.status.success());
    let output = conforma(&config, &["results"]);
    assert!(reports(&output.stdout).is_empty());
}

#[test]
fn strict_mode_fails_on_a_failed_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = workspace(dir.path());

    let output = conforma(&config, &["validate", "--no-store", "https://site.com/about.html"]);
    assert!(output.status.success());
    let printed = reports(&output.stdout);
    assert_eq!(printed[0]["htmlExtensionResult"]["testPassed"], false);

    let output = conforma(
        &config,
        &["validate", "--no-store", "--strict", "https://site.com/about.html"],
    );
    assert_eq!(output.status.code(), Some(1));

    let output = conforma(&config, &["results"]);
    assert!(reports(&output.stdout).is_empty());
}

#[test]
fn input_file_and_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = workspace(dir.path());
    let input = dir.path().join("urls.txt");
    std::fs::write(
        &input,
        "# pages to check\nhttps://site.com/index.shtm\n\nhttps://site.com/about.html\n",
    )
    .unwrap();
    let output_path = dir.path().join("out.json");

    let output = conforma(
        &config,
        &[
            "validate",
            "--no-store",
            "--input",
            input.to_str().unwrap(),
            "--output",
            output_path.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(output.stdout.is_empty());

    let written = reports(&std::fs::read(&output_path).unwrap());
    let labels: Vec<_> = written.iter().map(|report| report["label"].clone()).collect();
    assert_eq!(
        labels,
        vec![
            json!("https://site.com/index.shtm - desktop"),
            json!("https://site.com/index.shtm - mobile"),
            json!("https://site.com/about.html - desktop"),
            json!("https://site.com/about.html - mobile"),
        ]
    );
}

#[test]
fn invalid_url_exits_with_input_error_and_keeps_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = workspace(dir.path());

    assert!(conforma(&config, &["validate", "https://site.com/index.shtm"]).status.success());

    let output = conforma(&config, &["validate", "not a url"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());

    let output = conforma(&config, &["results"]);
    assert_eq!(reports(&output.stdout).len(), 2);
}

#[test]
fn malformed_input_file_exits_with_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = workspace(dir.path());

    for (name, contents) in [
        ("numbers.json", "[1, 2]"),
        ("broken.json", "[\"https://site.com/index.shtm\""),
        ("bad-url.json", "[\"not a url\"]"),
    ] {
        let input = dir.path().join(name);
        std::fs::write(&input, contents).unwrap();

        let output = conforma(
            &config,
            &["validate", "--no-store", "--input", input.to_str().unwrap()],
        );
        assert_eq!(output.status.code(), Some(2), "{name}");
        assert!(output.stdout.is_empty(), "{name}");
    }

    let missing = dir.path().join("absent.txt");
    let output = conforma(
        &config,
        &["validate", "--no-store", "--input", missing.to_str().unwrap()],
    );
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn json_input_file_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let config = workspace(dir.path());
    let input = dir.path().join("urls.json");
    std::fs::write(&input, r#"["https://site.com/index.shtm"]"#).unwrap();

    let output = conforma(
        &config,
        &["validate", "--no-store", "--input", input.to_str().unwrap()],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(reports(&output.stdout).len(), 2);
}
