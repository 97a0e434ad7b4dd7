use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use robo_writer::driver::{InterruptWatcher, ProgressRenderer};
use robo_writer::{
    CancelToken, CommandStreamer, ConfigError, EchoTransport, Endpoint, FileSink, LineTransport,
    Logger, Result, WriterConfig, job,
};

/// Rotated once the log file would pass this size.
const LOG_FILE_MAX_BYTES: u64 = 4 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(author, version, about = "Write text with a pen-plotting robot", long_about = None)]
struct Cli {
    /// Glyph definition file (overrides `font` in the config file)
    #[arg(long)]
    font: Option<PathBuf>,

    /// Text file to write, or `-` for standard input
    #[arg(long)]
    text: PathBuf,

    /// Glyph height in millimetres, 4 to 10
    #[arg(long)]
    height: Option<f32>,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serial device node of the robot
    #[arg(long, conflicts_with = "tcp", required_unless_present_any = ["tcp", "dry_run"])]
    device: Option<PathBuf>,

    /// `host:port` of a serial bridge or emulator
    #[arg(long)]
    tcp: Option<String>,

    /// Print the program to stdout instead of streaming it
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Append JSON-lines logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("robo-writer: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => WriterConfig::from_file(path)?,
        None => WriterConfig::default(),
    };
    if let Some(height) = cli.height {
        config.height_mm = height;
    }
    if let Some(font) = cli.font {
        config.font = Some(font);
    }
    config.validate()?;

    let logger = match &cli.log_file {
        Some(path) => Some(Logger::new(FileSink::new(path, LOG_FILE_MAX_BYTES)?)),
        None => None,
    };

    let font = config.font.clone().ok_or(ConfigError::InvalidSetting {
        name: "font",
        reason: "pass --font or set `font` in the config file".to_string(),
    })?;
    let glyphs = job::load_font(&font, logger.as_ref())?;
    let text = job::read_text(&cli.text)?;
    let compiled = job::compile(&glyphs, &text, &config, logger.as_ref())?;
    for miss in &compiled.misses {
        eprintln!(
            "warning: no glyph for {:?} at position {}, skipped",
            miss.ch, miss.position
        );
    }

    let mut streamer_config = config.streamer_config();
    streamer_config.logger = logger;
    let cancel = CancelToken::new();

    if cli.dry_run {
        streamer_config.settle_delay = Duration::ZERO;
        let mut transport = EchoTransport::new(io::stdout().lock());
        CommandStreamer::new(streamer_config).stream(&mut transport, &compiled.program, &cancel)?;
        return Ok(());
    }

    let endpoint = match (cli.device, cli.tcp) {
        (Some(path), _) => Endpoint::Device(path),
        (None, Some(addr)) => Endpoint::Tcp(addr),
        (None, None) => {
            return Err(ConfigError::InvalidSetting {
                name: "endpoint",
                reason: "pass --device or --tcp".to_string(),
            }
            .into());
        }
    };
    streamer_config.audit = Arc::new(ProgressRenderer::stderr());

    let watcher = InterruptWatcher::spawn(cancel.clone())?;
    let mut transport = LineTransport::new(endpoint);
    let outcome =
        CommandStreamer::new(streamer_config).stream(&mut transport, &compiled.program, &cancel);
    watcher.stop();
    outcome?;
    Ok(())
}
