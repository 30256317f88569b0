//! File logging. The terminal belongs to the UI, so log lines go to a file.

use crate::config::LogConfig;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber writing to `path`.
pub fn init(config: &LogConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(build_filter(std::env::var("RUST_LOG").ok().as_deref(), &config.level))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))?;

    Ok(())
}

/// `RUST_LOG` wins over the configured level; anything unparsable means `info`.
fn build_filter(env: Option<&str>, level: &str) -> EnvFilter {
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_level() {
        assert_eq!(build_filter(None, "debug").to_string(), "debug");
    }

    #[test]
    fn test_env_overrides_config() {
        assert_eq!(build_filter(Some("warn"), "debug").to_string(), "warn");
    }
}
