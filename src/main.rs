//! streampump - chunked stream reader and subprocess output pump.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use streampump::config::{ConfigError, ConfigLoader, PumpConfig};
use streampump::display;
use streampump::process::{LaunchError, ProcessPump};
use streampump::reader::{event_stream, Listener, ReadMode, ReaderError, ReaderEvent, Termination};
use streampump::util::{copy_file, CopyError, SeriesStats};

#[derive(Parser)]
#[command(
    name = "streampump",
    about = "Chunked stream reader and subprocess output pump",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a config file (default: .streampump.toml, then the user config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch a program and print its merged stdout/stderr line by line.
    Run {
        /// Do not truncate long lines.
        #[arg(long)]
        raw: bool,
        /// Program followed by its arguments.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        argv: Vec<String>,
    },
    /// Read a file in chunks and print each chunk.
    Read {
        /// File to read.
        path: PathBuf,
        /// Chunking mode (overrides config).
        #[arg(short, long, value_enum)]
        mode: Option<ReadMode>,
        /// Block size in bytes (overrides config).
        #[arg(short, long)]
        block_size: Option<usize>,
        /// Print one JSON object per reader event.
        #[arg(long)]
        json: bool,
        /// Do not truncate long chunks.
        #[arg(long)]
        raw: bool,
    },
    /// Copy a file.
    Copy {
        /// Source file.
        from: PathBuf,
        /// Destination file.
        to: PathBuf,
    },
}

/// Errors surfaced by the command line.
#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Launch(#[from] LaunchError),
    #[error(transparent)]
    Reader(#[from] ReaderError),
    #[error(transparent)]
    Copy(#[from] CopyError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[allow(clippy::cast_precision_loss)]
fn chunk_size(chunk: &[u8]) -> f64 {
    chunk.len() as f64
}

/// Prints process output and tracks line lengths.
struct PrintingListener {
    raw: bool,
    sizes: Arc<Mutex<SeriesStats>>,
}

impl Listener for PrintingListener {
    fn on_read(&mut self, chunk: Vec<u8>) {
        display::print_line(&chunk, self.raw);
        if let Ok(mut sizes) = self.sizes.lock() {
            *sizes = sizes.with(chunk_size(&chunk));
        }
    }

    fn on_fault(&mut self, error: &ReaderError) {
        display::print_fault(error);
    }
}

async fn run_command(
    config: &PumpConfig,
    argv: Vec<String>,
    raw: bool,
) -> Result<ExitCode, CliError> {
    let mut pump = ProcessPump::new(argv);
    if let Some(ref dir) = config.process.working_dir {
        pump = pump.working_dir(dir);
    }

    let sizes = Arc::new(Mutex::new(SeriesStats::new()));
    let listener = PrintingListener {
        raw,
        sizes: Arc::clone(&sizes),
    };

    let mut process = pump.try_launch(listener)?;
    display::print_launch(&pump.command_line(), process.id());

    let status = tokio::select! {
        status = process.wait() => status?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(program = %process.program(), "Interrupted, terminating process");
            process
                .graceful_terminate(config.process.terminate_timeout())
                .await?;
            process.wait().await?
        }
    };

    if let Some(reader) = process.take_reader() {
        let summary = reader.join().await?;
        let sizes = sizes.lock().map(|s| *s).unwrap_or_default();
        display::print_summary(&summary, &sizes);
    }
    display::print_exit(status);

    let code = status.code().and_then(|c| u8::try_from(c).ok()).unwrap_or(1);
    Ok(ExitCode::from(code))
}

async fn read_command(
    config: &PumpConfig,
    path: PathBuf,
    mode: Option<ReadMode>,
    block_size: Option<usize>,
    json: bool,
    raw: bool,
) -> Result<ExitCode, CliError> {
    let mut reader_config = config.reader.clone();
    if let Some(mode) = mode {
        reader_config.mode = mode;
    }
    if let Some(size) = block_size {
        reader_config.block_size = size;
    }
    let policy = reader_config.policy()?;

    let file = tokio::fs::File::open(&path).await?;
    tracing::info!(path = %path.display(), mode = ?policy.mode(), "Reading file");
    let (handle, mut events) = event_stream(file, policy, reader_config.channel_capacity);

    let mut sizes = SeriesStats::new();
    let mut index = 0;
    while let Some(event) = events.next().await {
        if json {
            display::print_json(&display::event_json(index, &event));
        }
        match &event {
            ReaderEvent::Chunk(chunk) => {
                if !json {
                    display::print_chunk(index, chunk, policy.mode(), raw);
                }
                sizes = sizes.with(chunk_size(chunk));
                index += 1;
            }
            ReaderEvent::Fault(error) if !json => display::print_fault(error),
            _ => {}
        }
    }

    let summary = handle.join().await?;
    if !json {
        display::print_summary(&summary, &sizes);
    }

    Ok(match summary.termination {
        Termination::Fault(_) => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}

async fn dispatch(cli: Cli) -> Result<ExitCode, CliError> {
    let loader = cli
        .config
        .map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let config = loader.load()?;

    match cli.command {
        Commands::Run { raw, argv } => run_command(&config, argv, raw).await,
        Commands::Read {
            path,
            mode,
            block_size,
            json,
            raw,
        } => read_command(&config, path, mode, block_size, json, raw).await,
        Commands::Copy { from, to } => {
            let bytes = copy_file(&from, &to).await?;
            tracing::info!(bytes, "Copy complete");
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            display::print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
