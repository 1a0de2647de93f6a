use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use recuri::backend::{HttpBackend, QueryBackend};
use recuri::core::config::{self, CliOverrides, GeneralConfig};
use recuri::core::state::App;
use recuri::proxy::ProxyServer;
use recuri::tui;
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};

#[derive(Parser)]
#[command(name = "recuri", about = "Chat with a web research assistant")]
struct Args {
    /// Research backend base URL (e.g. http://localhost:8000)
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Config file to use instead of ~/.recuri/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the chat screen (default)
    Chat {
        /// Milliseconds between revealed characters
        #[arg(long)]
        reveal_ms: Option<u64>,
    },
    /// Serve the HTTP API proxy in front of the backend
    Proxy {
        /// Address to listen on (e.g. 127.0.0.1:3000)
        #[arg(long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let (file_config, config_source) = config::load_config(args.config.as_deref()).map_err(|e| {
        eprintln!("recuri: {e}");
        io::Error::other(e)
    })?;

    let command = args.command.unwrap_or(Command::Chat { reveal_ms: None });

    // The chat screen owns the terminal, so only the proxy logs to stderr
    init_logging(
        &file_config.general,
        matches!(command, Command::Proxy { .. }),
    );
    config_source.log();
    log::debug!("Config: {:?}", file_config);

    let overrides = match &command {
        Command::Chat { reveal_ms } => CliOverrides {
            backend_url: args.backend.clone(),
            reveal_ms: *reveal_ms,
            proxy_bind: None,
        },
        Command::Proxy { bind } => CliOverrides {
            backend_url: args.backend.clone(),
            reveal_ms: None,
            proxy_bind: bind.clone(),
        },
    };
    let resolved = config::resolve(&file_config, &overrides);

    let backend = HttpBackend::new(&resolved.backend_url).map_err(|e| {
        log::error!("{e}");
        eprintln!("recuri: {e}");
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;
    let backend: Arc<dyn QueryBackend> = Arc::new(backend);

    match command {
        Command::Chat { .. } => {
            log::info!(
                "Recuri starting up against {} (reveal every {:?})",
                resolved.backend_url,
                resolved.reveal_interval
            );
            let app = App::new(backend, resolved.greeting.as_deref());
            tui::run(app, resolved.reveal_interval)
        }
        Command::Proxy { .. } => {
            log::info!("Recuri proxy forwarding to {}", resolved.backend_url);
            let server = ProxyServer::start(backend, &resolved.proxy_bind).await?;
            log::info!("Proxy ready on {}", server.addr());
            tokio::signal::ctrl_c().await?;
            log::info!("Shutting down proxy");
            server.shutdown();
            Ok(())
        }
    }
}

fn init_logging(config: &GeneralConfig, to_terminal: bool) {
    let level = LevelFilter::from_str(config.log_level()).unwrap_or(LevelFilter::Debug);
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    if to_terminal {
        loggers.push(TermLogger::new(
            level,
            log_config.clone(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ));
    }
    if let Ok(log_file) = File::create(config.log_file()) {
        loggers.push(WriteLogger::new(level, log_config, log_file));
    }
    let _ = CombinedLogger::init(loggers);

    if !config.log_level().eq_ignore_ascii_case(&level.to_string()) {
        log::warn!("Unknown log level {:?}, using {}", config.log_level(), level);
    }
}
