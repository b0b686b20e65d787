pub mod config;
pub mod pid;

use clap::{Parser, Subcommand};

/// hellosvc: sample HTTP endpoints with sessions, uploads and delays.
#[derive(Debug, Parser)]
#[command(name = "hellosvc", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "HS_CONFIG";

/// Load the configuration from the path in `HS_CONFIG` (or `config.toml`
/// by default).  A missing file yields the built-in defaults.
pub fn load_config() -> anyhow::Result<(hs_domain::config::Config, String)> {
    let config_path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "config.toml".into());
    let config = load_config_from(std::path::Path::new(&config_path))?;
    Ok((config, config_path))
}

pub fn load_config_from(path: &std::path::Path) -> anyhow::Result<hs_domain::config::Config> {
    if !path.exists() {
        return Ok(hs_domain::config::Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.server.port, 8080);
    }

    #[test]
    fn reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 9191\n").unwrap();
        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.server.port, 9191);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().starts_with("parsing "));
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["hellosvc", "config", "validate"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Config(ConfigCommand::Validate))));

        let cli = Cli::try_parse_from(["hellosvc"]).unwrap();
        assert!(cli.command.is_none());
    }
}
