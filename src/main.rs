use anyhow::Result;
use clap::{Parser, Subcommand};
use shell_core::config::{AppConfig, FramingPolicy};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "remote-shell",
    about = "Bridge browser terminals to Android device shells over WebSocket",
    version,
    author
)]
struct Cli {
    /// Path to config file (default: ~/.config/remote-shell/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the adb executable
    #[arg(long, global = true)]
    adb: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the WebSocket server (default)
    Serve {
        /// Bind host
        #[arg(long)]
        host: Option<String>,
        /// Bind port
        #[arg(long)]
        port: Option<u16>,
        /// Force output framing instead of following the host platform
        #[arg(long, value_enum)]
        framing: Option<FramingPolicy>,
    },

    /// Show or manage configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Initialize default configuration file
    Init,
    /// Print config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up tracing.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "remote_shell=info,shell_server=info,warn".into()),
        )
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Load config.
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    // Apply CLI overrides.
    if let Some(adb) = &cli.adb {
        config.shell.adb_path = Some(adb.clone());
    }

    match cli.command {
        Some(Commands::Serve {
            host,
            port,
            framing,
        }) => {
            if let Some(h) = host {
                config.server.host = h;
            }
            if let Some(p) = port {
                config.server.port = p;
            }
            if let Some(f) = framing {
                config.shell.framing = f;
            }
            shell_server::serve(config).await?;
        }
        Some(Commands::Config { action }) => {
            handle_config_command(action, &config)?;
        }
        None => {
            shell_server::serve(config).await?;
        }
    }

    Ok(())
}

fn handle_config_command(action: Option<ConfigAction>, config: &AppConfig) -> Result<()> {
    match action {
        Some(ConfigAction::Show) | None => {
            let toml_str = toml::to_string_pretty(config)?;
            println!("{}", toml_str);
        }
        Some(ConfigAction::Init) => {
            let path = AppConfig::default_path();
            if path.exists() {
                println!("Config already exists at: {}", path.display());
            } else {
                config.save()?;
                println!("Created default config at: {}", path.display());
            }
        }
        Some(ConfigAction::Path) => {
            println!("{}", AppConfig::default_path().display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_serve_overrides() {
        let cli = Cli::parse_from([
            "remote-shell",
            "--adb",
            "/opt/sdk/adb",
            "serve",
            "--port",
            "9000",
            "--framing",
            "text",
        ]);
        assert_eq!(cli.adb, Some(PathBuf::from("/opt/sdk/adb")));
        match cli.command {
            Some(Commands::Serve { port, framing, .. }) => {
                assert_eq!(port, Some(9000));
                assert_eq!(framing, Some(FramingPolicy::Text));
            }
            _ => panic!("Expected serve"),
        }
    }

    #[test]
    fn test_framing_values() {
        for (value, expected) in [
            ("auto", FramingPolicy::Auto),
            ("binary", FramingPolicy::Binary),
        ] {
            let cli = Cli::parse_from(["remote-shell", "serve", "--framing", value]);
            match cli.command {
                Some(Commands::Serve { framing, .. }) => assert_eq!(framing, Some(expected)),
                _ => panic!("Expected serve"),
            }
        }
    }

    #[test]
    fn test_unknown_framing_rejected() {
        assert!(Cli::try_parse_from(["remote-shell", "serve", "--framing", "ascii"]).is_err());
    }
}
