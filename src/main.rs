use std::{cell::RefCell, path::PathBuf};

use anyhow::Context;
use bytes::Bytes;
use clap::Parser;
use stream_translate::{
    EmissionState, Renderer, StreamController, TransportError,
    config::{ConfigResult, DelimiterPair, DelimiterPreset, StreamConfig, StreamConfigBuilder},
    drive_stream,
    logging::{self, LoggingConfig},
};
use tokio::io::AsyncReadExt;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "stream-translate")]
#[command(about = "Replay a captured translation stream, separating thoughts from the answer")]
#[command(long_about = r#"
Replay a captured translation stream, separating thoughts from the answer

The input is the raw body of an OpenAI-compatible streaming chat completion
(`data: {...}` lines terminated by `data: [DONE]`). It is fed through the
decoder in fixed-size byte chunks to mimic network delivery.

Examples:
  # Prompted <<<THOUGHT>>> ... <<<END>>> markers, show thoughts
  stream-translate capture.sse --show-thoughts

  # Native <think> tags, tiny chunks, print every intermediate snapshot
  stream-translate capture.sse --delimiters think_tags --chunk-size 3 --progress

  # Read from stdin
  curl -sN ... | stream-translate -
"#)]
struct CliArgs {
    /// SSE capture to replay, or "-" for stdin
    input: PathBuf,

    /// Number of bytes delivered per simulated network chunk
    #[arg(long, default_value_t = 64, value_parser = clap::value_parser!(u64).range(1..))]
    chunk_size: u64,

    /// JSON configuration file; command line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Delimiter convention for inline thoughts
    #[arg(long, value_parser = ["bracketed", "think_tags"])]
    delimiters: Option<String>,

    /// Custom open marker (requires --close)
    #[arg(long, requires = "close", conflicts_with = "delimiters")]
    open: Option<String>,

    /// Custom close marker (requires --open)
    #[arg(long, requires = "open", conflicts_with = "delimiters")]
    close: Option<String>,

    /// Print thought content alongside the answer
    #[arg(long, default_value_t = false)]
    show_thoughts: bool,

    /// Print every intermediate snapshot to stderr
    #[arg(long, default_value_t = false)]
    progress: bool,

    /// Maximum bytes buffered while a thought is open
    #[arg(long)]
    max_buffer_size: Option<usize>,

    /// Set the logging level
    #[arg(long, default_value = "warn", value_parser = ["trace", "debug", "info", "warn", "error"])]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Directory to store log files
    #[arg(long)]
    log_dir: Option<String>,
}

impl CliArgs {
    fn to_stream_config(&self) -> ConfigResult<StreamConfig> {
        let base = match &self.config {
            Some(path) => StreamConfig::from_file(path)?,
            None => StreamConfig::default(),
        };
        let show_thoughts = base.show_thoughts || self.show_thoughts;
        let mut builder = StreamConfigBuilder::from_config(base).show_thoughts(show_thoughts);

        if let Some(name) = &self.delimiters {
            builder = builder.preset(name.parse::<DelimiterPreset>()?);
        }
        if let (Some(open), Some(close)) = (&self.open, &self.close) {
            builder = builder.delimiters(DelimiterPair::new(open, close));
        }
        if let Some(size) = self.max_buffer_size {
            builder = builder.max_buffer_size(size);
        }

        builder.build()
    }

    fn to_logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            level: logging::parse_level(&self.log_level).unwrap_or(tracing::Level::WARN),
            json_format: self.json_logs,
            log_dir: self.log_dir.clone(),
            ..Default::default()
        }
    }

    async fn read_input(&self) -> anyhow::Result<Vec<u8>> {
        let mut data = Vec::new();
        if self.input.as_os_str() == "-" {
            tokio::io::stdin()
                .read_to_end(&mut data)
                .await
                .context("Failed to read stdin")?;
        } else {
            data = tokio::fs::read(&self.input)
                .await
                .with_context(|| format!("Failed to read {}", self.input.display()))?;
        }
        Ok(data)
    }
}

struct TerminalRenderer {
    progress: bool,
    updates: usize,
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, state: &EmissionState) {
        self.updates += 1;
        if self.progress {
            eprintln!("[{:>4}] {}", self.updates, state);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let _log_guard = logging::init_logging(args.to_logging_config());

    let config = args.to_stream_config()?;
    info!(delimiters = %config.delimiters, "Starting replay");

    let data = args.read_input().await?;
    let chunks: Vec<Result<Bytes, TransportError>> = data
        .chunks(args.chunk_size as usize)
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
        .collect();

    let controller = RefCell::new(StreamController::new(&config)?);
    let id = controller.borrow_mut().begin();
    let mut renderer = TerminalRenderer {
        progress: args.progress,
        updates: 0,
    };

    let final_state = drive_stream(
        &controller,
        id,
        futures::stream::iter(chunks),
        &mut renderer,
    )
    .await?
    .context("Stream was cancelled before it finished")?;

    info!(updates = renderer.updates, %final_state, "Replay finished");

    if let Some(thought) = final_state.visible_thought(config.show_thoughts) {
        println!("--- thoughts ---");
        println!("{thought}");
        println!("--- answer ---");
    }
    println!("{}", final_state.answer_text);

    Ok(())
}
