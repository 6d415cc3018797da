//! # kbtree-cli
//!
//! Command-line interface for the KBase tree and alignment service.
//!
//! ## Usage
//!
//! ```bash
//! # Tree manipulation (a literal newick string or @file)
//! kbtree tree leaf-count "((A,B),C);"
//! kbtree tree replace-names @tree.nwk --map A=alpha --map B=beta
//!
//! # Queries
//! kbtree query get-tree "kb|tree.1" --label feature_id
//! kbtree query tree-data "kb|tree.1" "kb|tree.2"
//!
//! # Abundance profiles
//! kbtree abundance filter profiles.json --cutoff-value 0.5
//!
//! # Configuration
//! kbtree config --show
//! kbtree config --set-url http://localhost:7047
//! ```

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod error;
mod output;

pub use config::Config;
pub use error::CliError;
pub use output::Output;

use commands::Credentials;

/// KBase Trees CLI
#[derive(Parser, Debug)]
#[command(name = "kbtree")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Tree service endpoint URL
    #[arg(long, global = true)]
    url: Option<String>,

    /// Auth token sent with every call
    #[arg(long, global = true, env = "KB_AUTH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Log in as this user (password is read from KB_PASSWORD)
    #[arg(long, global = true, env = "KB_USER")]
    user: Option<String>,

    /// Password for --user
    #[arg(long, global = true, env = "KB_PASSWORD", hide = true, hide_env_values = true)]
    password: Option<String>,

    /// Read timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Allow sending credentials over plain http
    #[arg(long, global = true)]
    allow_insecure_auth: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// CLI commands
#[derive(Debug, Subcommand)]
enum Commands {
    /// Newick tree manipulation
    #[command(subcommand)]
    Tree(commands::tree::TreeCommand),
    /// Tree and alignment lookups
    #[command(subcommand)]
    Query(commands::query::QueryCommand),
    /// Abundance profiles
    #[command(subcommand)]
    Abundance(commands::abundance::AbundanceCommand),
    /// Show or edit configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Set service URL
        #[arg(long)]
        set_url: Option<String>,
        /// Set read timeout in milliseconds
        #[arg(long)]
        set_timeout_ms: Option<u64>,
        /// Allow or forbid credentials over plain http
        #[arg(long)]
        set_allow_insecure_auth: Option<bool>,
    },
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // stdout carries command output only
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let overrides = Overrides {
        url: cli.url,
        timeout_ms: cli.timeout_ms,
        allow_insecure_auth: cli.allow_insecure_auth,
        credentials: Credentials {
            token: cli.token,
            user: cli.user,
            password: cli.password,
        },
    };
    let result = run(cli.command, overrides, cli.json).await;

    if let Err(e) = result {
        tracing::debug!(error = ?e, "command failed");
        if cli.json {
            println!(
                "{}",
                serde_json::json!({
                    "error": e.to_string(),
                    "success": false
                })
            );
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

/// Command-line values that take precedence over the config file
struct Overrides {
    url: Option<String>,
    timeout_ms: Option<u64>,
    allow_insecure_auth: bool,
    credentials: Credentials,
}

async fn run(command: Commands, overrides: Overrides, json: bool) -> Result<(), CliError> {
    if let Commands::Config {
        show,
        set_url,
        set_timeout_ms,
        set_allow_insecure_auth,
    } = command
    {
        let editing = set_url.is_some()
            || set_timeout_ms.is_some()
            || set_allow_insecure_auth.is_some();
        // An edit must be able to repair a broken file
        let mut config = match Config::load() {
            Err(e) if editing => {
                tracing::warn!(error = %e, "ignoring unreadable config, starting from defaults");
                Config::default()
            }
            loaded => loaded?,
        };
        return handle_config(
            &mut config,
            show,
            set_url,
            set_timeout_ms,
            set_allow_insecure_auth,
            json,
        );
    }

    let mut config = Config::load()?;
    if let Some(url) = overrides.url {
        config.url = url;
    }
    if let Some(timeout_ms) = overrides.timeout_ms {
        config.read_timeout_ms = Some(timeout_ms);
    }
    if overrides.allow_insecure_auth {
        config.auth_allowed_for_http = true;
    }

    let client = commands::connect(&config, &overrides.credentials).await?;

    match command {
        Commands::Tree(cmd) => cmd.execute(&client, json).await,
        Commands::Query(cmd) => cmd.execute(&client, json).await,
        Commands::Abundance(cmd) => cmd.execute(&client, json).await,
        Commands::Config { .. } => Ok(()),
    }
}

fn handle_config(
    config: &mut Config,
    show: bool,
    set_url: Option<String>,
    set_timeout_ms: Option<u64>,
    set_allow_insecure_auth: Option<bool>,
    json: bool,
) -> Result<(), CliError> {
    let mut modified = false;

    if let Some(url) = set_url {
        config.url = url;
        modified = true;
    }

    if let Some(timeout_ms) = set_timeout_ms {
        config.read_timeout_ms = Some(timeout_ms);
        modified = true;
    }

    if let Some(allowed) = set_allow_insecure_auth {
        config.auth_allowed_for_http = allowed;
        modified = true;
    }

    if modified {
        config.save()?;
        Output::new(json)
            .field("status", "saved")
            .message("Configuration saved")
            .print();
    } else if show {
        let timeout = config
            .read_timeout_ms
            .map(|ms| format!("{} ms", ms))
            .unwrap_or_else(|| "none".to_string());
        Output::new(json)
            .field("url", &config.url)
            .field_value("read_timeout_ms", config.read_timeout_ms)
            .field_value("auth_allowed_for_http", config.auth_allowed_for_http)
            .field("auth_url", &config.auth_url)
            .message(&format!(
                "URL: {}\nRead timeout: {}\nAuth over http: {}\nAuth URL: {}",
                config.url, timeout, config.auth_allowed_for_http, config.auth_url
            ))
            .print();
    } else {
        Output::new(json)
            .message("Use --show to display config, or --set-url/--set-timeout-ms to modify")
            .print();
    }

    Ok(())
}
