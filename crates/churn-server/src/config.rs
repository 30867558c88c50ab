//! Command-line and environment configuration.
//!
//! Precedence: flags, then `CHURN_*` environment variables, then defaults.

use std::path::PathBuf;

use churn_engine::transport::ServerConfig;

/// Default location of the model artifact, relative to the working directory.
pub const DEFAULT_MODEL_PATH: &str = "models/churn_model.json";

pub const USAGE: &str = "Usage: churn-server [--host <addr>] [--port <port>] [--model <path>]

Options:
  --host <addr>    Address to bind [env: CHURN_HOST] [default: 0.0.0.0]
  --port <port>    Port to listen on [env: CHURN_PORT] [default: 8000]
  --model <path>   Model artifact to load [env: CHURN_MODEL_PATH] [default: models/churn_model.json]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub server: ServerConfig,
    pub model_path: PathBuf,
}

impl Config {
    /// Resolve configuration from process arguments and environment.
    pub fn from_env_and_args(args: &[String]) -> Result<Self, String> {
        Self::resolve(args, |key| std::env::var(key).ok())
    }

    fn resolve(args: &[String], env: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut host = env("CHURN_HOST");
        let mut port = env("CHURN_PORT");
        let mut model = env("CHURN_MODEL_PATH");

        let mut i = 1; // skip argv[0]
        while i < args.len() {
            let slot = match args[i].as_str() {
                "--host" => &mut host,
                "--port" => &mut port,
                "--model" => &mut model,
                "--help" | "-h" => return Err(String::new()),
                arg if arg.starts_with('-') => return Err(format!("unknown flag: {arg}")),
                arg => return Err(format!("unexpected argument: {arg}")),
            };
            let flag = &args[i];
            i += 1;
            *slot = Some(
                args.get(i)
                    .ok_or_else(|| format!("{flag} requires a value"))?
                    .clone(),
            );
            i += 1;
        }

        let defaults = ServerConfig::default();
        let port = match port {
            Some(p) => p
                .parse::<u16>()
                .map_err(|_| format!("invalid port '{p}'"))?,
            None => defaults.port,
        };

        Ok(Self {
            server: ServerConfig {
                host: host.unwrap_or(defaults.host),
                port,
            },
            model_path: model
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("churn-server")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults() {
        let config = Config::resolve(&args(&[]), no_env).unwrap();
        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
    }

    #[test]
    fn environment_overrides_defaults() {
        let env: HashMap<&str, &str> = [
            ("CHURN_HOST", "127.0.0.1"),
            ("CHURN_PORT", "9100"),
            ("CHURN_MODEL_PATH", "/srv/model.json"),
        ]
        .into();
        let config =
            Config::resolve(&args(&[]), |k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.model_path, PathBuf::from("/srv/model.json"));
    }

    #[test]
    fn flags_override_environment() {
        let env: HashMap<&str, &str> = [("CHURN_PORT", "9100")].into();
        let config = Config::resolve(&args(&["--port", "7000", "--model", "m.json"]), |k| {
            env.get(k).map(|v| v.to_string())
        })
        .unwrap();
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.model_path, PathBuf::from("m.json"));
    }

    #[test]
    fn rejects_bad_arguments() {
        assert_eq!(
            Config::resolve(&args(&["--port"]), no_env).unwrap_err(),
            "--port requires a value"
        );
        assert_eq!(
            Config::resolve(&args(&["--port", "http"]), no_env).unwrap_err(),
            "invalid port 'http'"
        );
        assert_eq!(
            Config::resolve(&args(&["--verbose"]), no_env).unwrap_err(),
            "unknown flag: --verbose"
        );
        assert_eq!(
            Config::resolve(&args(&["serve"]), no_env).unwrap_err(),
            "unexpected argument: serve"
        );
        assert_eq!(Config::resolve(&args(&["-h"]), no_env).unwrap_err(), "");
    }
}
