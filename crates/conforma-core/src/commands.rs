use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use conforma_broker::service::{self, validate_and_store};
use conforma_broker::{parse_url_list, BatchError};
use conforma_rules::ValidationReport;

use crate::app::{build_driver, build_store};
use crate::config::Config;
use crate::server;

/// Exit status for rejected input, distinct from processing failures.
pub const EXIT_INVALID_INPUT: u8 = 2;

pub struct ValidateOptions {
    pub urls: Vec<String>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub store: bool,
    pub strict: bool,
}

pub async fn validate(config: &Config, options: ValidateOptions) -> Result<ExitCode> {
    let mut urls = options.urls;
    if let Some(input) = &options.input {
        match read_url_file(input) {
            Ok(listed) => urls.extend(listed),
            Err(error) => return Ok(input_error(&error)),
        }
    }

    let driver = build_driver(config)?;
    let result = if options.store {
        let store = build_store(config);
        validate_and_store(&driver, store.as_ref(), &urls).await
    } else {
        driver.run(&urls).await
    };

    let reports = match result {
        Ok(reports) => reports,
        Err(error @ BatchError::InvalidInput(_)) => return Ok(input_error(&error)),
        Err(BatchError::NotPersisted { source, reports }) => {
            emit(&reports, options.output.as_deref())?;
            return Err(source).context("reports were printed but not stored");
        }
        Err(error) => return Err(error.into()),
    };

    emit(&reports, options.output.as_deref())?;

    let failed = reports.iter().filter(|report| !report.overall_passed()).count();
    tracing::info!(reports = reports.len(), failed, "validation complete");
    if options.strict && failed > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn results(config: &Config) -> Result<()> {
    let reports = build_store(config).list().await?;
    emit(&reports, None)
}

pub async fn clear(config: &Config) -> Result<()> {
    build_store(config).clear().await?;
    tracing::info!(path = %config.store.results_path.display(), "stored reports cleared");
    Ok(())
}

pub async fn serve(config: &Config) -> Result<()> {
    let driver = build_driver(config)?;
    let (handle, service_task) = service::spawn(driver, build_store(config));

    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(addr = %addr, "starting server mode");

    axum::serve(listener, server::build_router(handle.clone()))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await
        .context("serving HTTP")?;

    if let Err(error) = handle.shutdown().await {
        tracing::warn!(error = %error, "validation service already stopped");
    }
    service_task.await?;
    Ok(())
}

/// Accepts a JSON array of strings or one URL per line (`#` starts a
/// comment line). Anything unreadable or malformed is an input error.
pub fn read_url_file(path: &Path) -> Result<Vec<String>, BatchError> {
    let raw = std::fs::read_to_string(path).map_err(|error| {
        BatchError::InvalidInput(format!("reading URL list {}: {error}", path.display()))
    })?;

    if raw.trim_start().starts_with('[') {
        let value: serde_json::Value = serde_json::from_str(&raw).map_err(|error| {
            BatchError::InvalidInput(format!("parsing URL list {}: {error}", path.display()))
        })?;
        let targets = parse_url_list(&value)?;
        return Ok(targets
            .iter()
            .map(|target| target.as_str().to_string())
            .collect());
    }

    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn input_error(error: &BatchError) -> ExitCode {
    tracing::error!("{error}");
    ExitCode::from(EXIT_INVALID_INPUT)
}

fn emit(reports: &[ValidationReport], output: Option<&Path>) -> Result<()> {
    let rendered = serde_json::to_string_pretty(reports)?;
    match output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("writing reports: {}", path.display())),
        None => {
            println!("{rendered}");
            Ok(())
        }
    }
}
