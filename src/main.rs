use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

mod config;
mod function;
mod media;
mod server;

use config::{Config, ExtractionMode};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config file
    #[arg(short, long)]
    config: Option<String>,

    /// Address to bind to
    #[arg(long, global = true)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT", global = true)]
    port: Option<u16>,

    /// Answer /download from yt-dlp or with the canned test payload
    #[arg(short, long, value_enum, global = true)]
    mode: Option<ExtractionMode>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Handle a single function event and print the response
    Invoke {
        /// Event JSON file, read from stdin when omitted
        #[arg(short, long)]
        event: Option<PathBuf>,
    },
}

fn get_config_path(args: &Args) -> Option<String> {
    if let Some(path) = &args.config {
        return Some(path.clone());
    }

    if let Ok(path) = std::env::var("CONFIG_FILE") {
        return Some(path);
    }

    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        let config_path = format!("{}/grabby-web/config.toml", xdg_config_home);
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let config_path = format!("{}/.config/grabby-web/config.toml", home.display());
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    None
}

fn init_logging(config: &Config, to_stderr: bool) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);

    match (config.get_logging_format() == "json", to_stderr) {
        (true, true) => builder.json().with_writer(std::io::stderr).init(),
        (true, false) => builder.json().init(),
        (false, true) => builder.with_writer(std::io::stderr).init(),
        (false, false) => builder.init(),
    }
}

fn read_event(path: Option<&PathBuf>) -> Result<function::FunctionEvent> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event from {}", path.display()))?,
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read event from stdin")?;
            raw
        }
    };

    serde_json::from_str(&raw).context("Failed to parse function event")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = get_config_path(&args);
    let mut config = match &config_path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => Config::default(),
    };

    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(mode) = args.mode {
        config.extraction.mode = mode;
    }

    let invoke = matches!(args.command, Some(Command::Invoke { .. }));
    init_logging(&config, invoke);

    match &config_path {
        Some(path) => info!("Loaded config from: {}", path),
        None => info!("No config file found, using defaults"),
    }

    match args.command {
        Some(Command::Invoke { event }) => {
            let event = read_event(event.as_ref())?;
            let context = function::FunctionContext {
                function_name: Some(env!("CARGO_PKG_NAME").to_string()),
                ..Default::default()
            };

            let app = server::router_from_config(&config);
            let response = function::handle(app, event, context).await?;
            println!("{}", serde_json::to_string(&response)?);
        }
        Some(Command::Serve) | None => {
            info!("Starting grabby-web in {:?} mode...", config.extraction.mode);
            server::run(config).await?;
        }
    }

    Ok(())
}
