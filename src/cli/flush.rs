use crate::config::parse::load_config;
use crate::flush::{FlushOutcome, Routing};
use crate::host::decoder::JsonLinesDecoder;
use crate::host::plugin::{BucketOutput, OutputPlugin, PluginError};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Exit status for a batch the caller should send again later (EX_TEMPFAIL).
pub const EXIT_RETRY: i32 = 75;

/// Exit status when the object was written but the input had an undecodable
/// line, so everything from that line on was left out (EX_DATAERR).
pub const EXIT_INCOMPLETE: i32 = 65;

#[derive(Debug, Error)]
pub enum FlushCommandError {
    #[error("config error: {0}")]
    Config(#[from] crate::config::parse::ConfigError),

    #[error("failed to read input: {0}")]
    Input(#[from] std::io::Error),

    #[error("output error: {0}")]
    Plugin(#[from] PluginError),
}

#[derive(Debug, Clone)]
pub struct FlushArgs {
    pub tag: String,
    pub input: Option<PathBuf>,
    pub bucket: Option<String>,
    pub prefix: Option<String>,
}

/// Flush one batch read from a file or stdin and print the object key.
/// Returns the process exit status for the outcome.
pub async fn run(config_path: Option<PathBuf>, args: FlushArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config_path = match config_path {
        Some(path) => path,
        None => {
            eprintln!("Error: config not found");
            eprintln!("Searched locations:");
            eprintln!("  ~/{}", crate::config::USER_CONFIG_PATH);
            eprintln!("  {}", crate::config::SYSTEM_CONFIG_PATH);
            eprintln!("\nUse --config <path> to specify a config file, or run 'bucketlog config init' to generate one.");
            return Ok(1);
        }
    };

    Ok(flush_once(&config_path, args).await?)
}

async fn flush_once(config_path: &Path, args: FlushArgs) -> Result<i32, FlushCommandError> {
    info!(config_path = %config_path.display(), "Loading configuration");
    let config = load_config(config_path)?;

    let input = read_input(args.input.as_deref())?;
    let mut decoder = JsonLinesDecoder::new(Cursor::new(input));

    let output = BucketOutput::init(config).await?;
    let defaults = output.flusher().defaults();
    let routing = Routing {
        bucket: args.bucket.unwrap_or_else(|| defaults.bucket.clone()),
        prefix: args.prefix.unwrap_or_else(|| defaults.prefix.clone()),
    };

    let code = match output.flusher().try_flush(&routing, &args.tag, &mut decoder).await {
        Ok(report) => {
            println!("{}", report.key);
            match report.decode_error {
                Some(error) => {
                    eprintln!(
                        "Warning: input stopped decoding at {}; only the {} record(s) before it were written",
                        error, report.records
                    );
                    EXIT_INCOMPLETE
                }
                None => exit_code(FlushOutcome::Processed),
            }
        }
        Err(e) => {
            let outcome = e.outcome();
            warn!(tag = %args.tag, outcome = %outcome, error = %e, "Flush failed");
            eprintln!("Error: {}", e);
            exit_code(outcome)
        }
    };

    output.shutdown().await;

    Ok(code)
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>, std::io::Error> {
    match path {
        Some(path) => std::fs::read(path).map_err(|e| {
            std::io::Error::new(e.kind(), format!("'{}': {}", path.display(), e))
        }),
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

pub fn exit_code(outcome: FlushOutcome) -> i32 {
    match outcome {
        FlushOutcome::Processed => 0,
        FlushOutcome::Retry => EXIT_RETRY,
        FlushOutcome::Error => 1,
    }
}
