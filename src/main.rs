//! Entry point for the terminal speed reader.
//!
//! Parses arguments, loads `conf/config.toml` and hands off to the terminal
//! loop on a single-threaded tokio runtime.

mod http;
mod terminal;

use anyhow::{Context, Result, anyhow};
use std::env;
use std::path::{Path, PathBuf};
use swiftleaf_core::config::load_config;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const USAGE: &str = "Usage: swiftleaf <text-or-image> [--wpm N] [--config PATH]";
const DEFAULT_CONFIG_PATH: &str = "conf/config.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub path: PathBuf,
    pub wpm: Option<u32>,
    pub config_path: PathBuf,
}

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let args = parse_args(env::args().skip(1))?;
    if !args.path.exists() {
        return Err(anyhow!("File not found: {}", args.path.display()));
    }
    let config = load_config(Path::new(&args.config_path));
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        path = %args.path.display(),
        level = %config.log_level,
        wpm = config.default_wpm,
        "Starting reader"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(terminal::run(args, config))
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<CliArgs> {
    let mut path = None;
    let mut wpm = None;
    let mut config_path = PathBuf::from(DEFAULT_CONFIG_PATH);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--wpm" => {
                let value = args.next().ok_or_else(|| anyhow!("--wpm needs a value\n{USAGE}"))?;
                let parsed = value
                    .parse()
                    .map_err(|_| anyhow!("invalid --wpm value {value:?}\n{USAGE}"))?;
                wpm = Some(parsed);
            }
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("--config needs a value\n{USAGE}"))?;
                config_path = PathBuf::from(value);
            }
            flag if flag.starts_with("--") => return Err(anyhow!("unknown option {flag}\n{USAGE}")),
            _ if path.is_none() => path = Some(PathBuf::from(&arg)),
            _ => return Err(anyhow!("unexpected argument {arg:?}\n{USAGE}")),
        }
    }

    Ok(CliArgs {
        path: path.ok_or_else(|| anyhow!(USAGE))?,
        wpm,
        config_path,
    })
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<CliArgs> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn path_only_uses_defaults() {
        let parsed = args(&["notes.txt"]).unwrap();
        assert_eq!(parsed.path, PathBuf::from("notes.txt"));
        assert_eq!(parsed.wpm, None);
        assert_eq!(parsed.config_path, PathBuf::from("conf/config.toml"));
    }

    #[test]
    fn options_in_any_order() {
        let parsed = args(&["--wpm", "650", "scan.png", "--config", "alt.toml"]).unwrap();
        assert_eq!(parsed.path, PathBuf::from("scan.png"));
        assert_eq!(parsed.wpm, Some(650));
        assert_eq!(parsed.config_path, PathBuf::from("alt.toml"));
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let config = swiftleaf_core::config::parse_config(include_str!("../conf/config.toml"))
            .unwrap();
        assert_eq!(config, swiftleaf_core::config::AppConfig::default());
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(args(&[]).is_err());
        assert!(args(&["a.txt", "b.txt"]).is_err());
        assert!(args(&["a.txt", "--wpm"]).is_err());
        assert!(args(&["a.txt", "--wpm", "fast"]).is_err());
        assert!(args(&["a.txt", "--verbose"]).is_err());
    }
}
