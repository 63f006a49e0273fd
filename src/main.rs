use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bucketlog")]
#[command(about = "Write log record batches to object storage as JSON Lines", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flush one batch of `[time, record]` JSON lines
    Flush {
        /// Routing tag for the batch
        #[arg(long)]
        tag: String,
        /// Read the batch from this file instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,
        /// Override the configured bucket
        #[arg(long)]
        bucket: Option<String>,
        /// Override the configured prefix
        #[arg(long)]
        prefix: Option<String>,
    },
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Init {
        #[arg(long)]
        stdout: bool,
    },
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bucketlog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config_path = bucketlog::config::resolve_config_path(cli.config.as_deref());

    match cli.command {
        Commands::Flush {
            tag,
            input,
            bucket,
            prefix,
        } => {
            let args = bucketlog::cli::flush::FlushArgs {
                tag,
                input,
                bucket,
                prefix,
            };
            let code = bucketlog::cli::flush::run(config_path, args).await?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { stdout } => bucketlog::cli::config::init(stdout)?,
            ConfigAction::Validate => bucketlog::cli::config::validate(config_path)?,
        },
    }

    Ok(())
}
