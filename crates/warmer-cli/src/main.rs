use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::WarmerArgs;

#[derive(Parser)]
#[command(
    name = "warmer",
    about = "Keep-warm pings with self-describing fan-out",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value = "text", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one event (or a JSON array of events) through the warmer.
    ///
    /// Prints `true` if any event was a warming ping, `false` otherwise.
    Handle {
        /// Path to the event JSON, or `-` for stdin.
        #[arg(short, long, default_value = "-")]
        event: String,
        /// Invoke endpoint (host:port) fan-out requests are sent to.
        #[arg(long, default_value = "127.0.0.1:9001")]
        endpoint: String,
        /// Record fan-out requests and print them instead of sending them.
        #[arg(long)]
        dry_run: bool,
        #[command(flatten)]
        warmer: WarmerArgs,
    },
    /// Host the warmer as a local function behind the invoke API.
    Serve {
        /// Address to listen on.
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on.
        #[arg(short, long, default_value = "9001")]
        port: u16,
        /// Invoke endpoint for fan-out (default: this server).
        #[arg(long)]
        endpoint: Option<String>,
        #[command(flatten)]
        warmer: WarmerArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Commands::Handle {
            event,
            endpoint,
            dry_run,
            warmer,
        } => commands::handle::handle(&warmer, &event, &endpoint, dry_run).await,
        Commands::Serve {
            bind,
            port,
            endpoint,
            warmer,
        } => commands::serve::serve(&warmer, &bind, port, endpoint).await,
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,warmer=info"));

    // Logs go to stderr; stdout carries command output.
    match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}
