mod config;

use std::process;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use churn_engine::{
    DeploymentRegistry, LogisticModel, ModelLoad, ScoringService, VersionInfo, transport::serve,
};

use crate::config::{Config, USAGE};

/// Initialize tracing with CHURN_LOG and LOG_FORMAT support.
fn init_tracing() {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let base_level = match std::env::var("CHURN_LOG").as_deref() {
            Ok("debug") => "debug",
            Ok("warn") | Ok("warning") => "warn",
            Ok("error") => "error",
            _ => "info",
        };

        EnvFilter::new(format!(
            "churn_engine={level},churn_server={level}",
            level = base_level
        ))
    };

    let use_json = std::env::var("LOG_FORMAT").as_deref() == Ok("json");

    if use_json {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr));
        let _ = subscriber.try_init();
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr));
        let _ = subscriber.try_init();
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let config = match Config::from_env_and_args(&args) {
        Ok(config) => config,
        Err(msg) => {
            if !msg.is_empty() {
                eprintln!("error: {msg}");
                eprintln!();
            }
            eprintln!("{USAGE}");
            process::exit(2);
        }
    };

    init_tracing();

    if let Err(e) = run(config) {
        tracing::error!(error = %format!("{e:#}"), "churn-server failed");
        process::exit(1);
    }
}

#[tokio::main]
async fn run(config: Config) -> anyhow::Result<()> {
    info!("churn-server {}", env!("CARGO_PKG_VERSION"));

    let path = config.model_path.display().to_string();
    let load = ModelLoad::starting(path.clone());
    let model = LogisticModel::load(&config.model_path)
        .with_context(|| format!("could not load model from {path}"))?;
    let load = load.completed(model.name().map(String::from));

    let mut version = VersionInfo::new();
    if let Some(v) = model.version() {
        version = version.with_model(v.to_string());
    }

    info!(
        path = %path,
        name = model.name().unwrap_or("unnamed"),
        features = model.features().len(),
        "Model loaded"
    );

    let service = ScoringService::new(DeploymentRegistry::default(), Arc::new(model))
        .with_model_load(load)
        .with_version(version);

    serve(config.server, Arc::new(service)).await
}
