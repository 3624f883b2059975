//! CLI binary for aethercanvas.
//!
//! A thin shim over the library crate: it plays the part of the upload
//! widget, the control panel and the download button, and leaves every
//! workflow decision to [`aethercanvas::Workflow`].

use anyhow::{Context, Result};
use aethercanvas::{
    CreativityLevel, EnhanceConfig, Observer, Phase, SubmitOutcome, UpscaleFactor, Workflow,
    WorkflowObserver,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Terminal observer: a spinner while the request is in flight, then a
/// one-line verdict.
struct CliObserver {
    bar: ProgressBar,
    started: Mutex<Option<Instant>>,
}

impl CliObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.magenta} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);

        Arc::new(Self {
            bar,
            started: Mutex::new(None),
        })
    }

    fn elapsed(&self) -> String {
        let secs = self
            .started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        format!("{secs:.1}s")
    }
}

impl WorkflowObserver for CliObserver {
    fn on_upload(&self, display_name: &str, media_type: &str, payload_len: usize) {
        self.bar.println(format!(
            "  {} {}  {}",
            green("✓"),
            bold(display_name),
            dim(&format!("{media_type}, {payload_len} bytes base64")),
        ));
    }

    fn on_submit_start(&self, _sequence: u64, display_name: &str) {
        if let Ok(mut t) = self.started.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_prefix("Enhancing");
        self.bar.set_message(format!("{display_name} — processing magic…"));
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_submit_complete(&self, _sequence: u64, media_type: &str, payload_len: usize) {
        let elapsed = self.elapsed();
        self.bar.finish_and_clear();
        eprintln!(
            "{} enhanced image received  {}  {}",
            green("✔"),
            dim(&format!("{media_type}, {payload_len} bytes base64")),
            dim(&elapsed),
        );
    }

    fn on_submit_error(&self, _sequence: u64, error: &str) {
        let elapsed = self.elapsed();
        self.bar.finish_and_clear();
        eprintln!("{} {}  {}", red("✘"), red(error), dim(&elapsed));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Enhance with defaults (4x, creativity 75) → photo-aethercanvas.jpg
  aethercanvas photo.jpg

  # Custom instruction, 8x upscale, stay close to the source
  aethercanvas photo.jpg --prompt "restore this old scan" --upscale 8 --creativity 30

  # Choose the output location
  aethercanvas photo.png -o out/
  aethercanvas photo.png -o result.png

  # Machine-readable summary
  aethercanvas photo.png --json

ENVIRONMENT VARIABLES:
  API_KEY                 Gemini API key
  GEMINI_API_KEY          Gemini API key (used when API_KEY is unset)
  AETHERCANVAS_MODEL      Override the model ID
  AETHERCANVAS_BASE_URL   Override the REST endpoint root

SETUP:
  1. Set API key:     export GEMINI_API_KEY=...
  2. Enhance:         aethercanvas photo.jpg
"#;

/// Enhance and upscale images with a generative image model.
#[derive(Parser, Debug)]
#[command(
    name = "aethercanvas",
    version,
    about = "Enhance and upscale images with a generative image model",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image file to enhance (PNG, JPEG or WebP).
    input: PathBuf,

    /// Output file or directory. Default: next to the input, with a suffix.
    #[arg(short, long, env = "AETHERCANVAS_OUTPUT")]
    output: Option<PathBuf>,

    /// What the model should do with the image.
    #[arg(short, long, env = "AETHERCANVAS_PROMPT")]
    prompt: Option<String>,

    /// Upscale factor: 2, 4, 8 or 16.
    #[arg(long, env = "AETHERCANVAS_UPSCALE", default_value_t = 4,
          value_parser = parse_upscale)]
    upscale: u32,

    /// Creativity level (0–100). Higher invents more detail.
    #[arg(long, env = "AETHERCANVAS_CREATIVITY", default_value_t = 75,
          value_parser = clap::value_parser!(u8).range(0..=100))]
    creativity: u8,

    /// Gemini API key. Falls back to API_KEY, then GEMINI_API_KEY.
    #[arg(long)]
    api_key: Option<String>,

    /// Model ID.
    #[arg(long, env = "AETHERCANVAS_MODEL")]
    model: Option<String>,

    /// REST endpoint root.
    #[arg(long, env = "AETHERCANVAS_BASE_URL")]
    base_url: Option<String>,

    /// Suffix added to the output file name.
    #[arg(long, env = "AETHERCANVAS_SUFFIX")]
    suffix: Option<String>,

    /// Print a JSON summary instead of human-readable output.
    #[arg(long)]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "AETHERCANVAS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "AETHERCANVAS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "AETHERCANVAS_QUIET")]
    quiet: bool,
}

fn parse_upscale(s: &str) -> Result<u32, String> {
    let n: u32 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    UpscaleFactor::try_from(n)
        .map(u32::from)
        .map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build workflow ───────────────────────────────────────────────────
    let config = build_config(&cli)?;
    let mut workflow = Workflow::from_config(&config).context("Cannot start enhancement")?;
    if show_progress {
        let observer: Observer = CliObserver::new();
        workflow = workflow.with_observer(observer);
    }

    if let Some(ref prompt) = cli.prompt {
        workflow.set_instruction(prompt.clone());
    }
    workflow.set_upscale_factor(UpscaleFactor::try_from(cli.upscale)?);
    workflow.set_creativity_level(CreativityLevel::new(cli.creativity)?);

    // ── Upload ───────────────────────────────────────────────────────────
    if workflow.upload(&cli.input).await.is_err() {
        let msg = workflow.state().last_error.unwrap_or_default();
        anyhow::bail!("{msg} ({})", cli.input.display());
    }
    let source = workflow.state();
    if let Some(ref img) = source.source_image {
        if !aethercanvas::pipeline::input::is_accepted_media_type(&img.media_type) && !cli.quiet {
            eprintln!(
                "{} {} is not PNG, JPEG or WebP; sending it anyway",
                dim("note:"),
                img.display_name
            );
        }
    }

    // ── Submit ───────────────────────────────────────────────────────────
    let outcome = workflow.submit().await;
    let state = workflow.state();

    let saved = match (outcome, state.phase()) {
        (SubmitOutcome::Completed, Phase::ReadyWithResult) => {
            let target = output_target(&cli.input, cli.output.as_deref());
            Some(
                workflow
                    .save_result(&target)
                    .context("Failed to save enhanced image")?,
            )
        }
        _ => None,
    };

    // ── Report ───────────────────────────────────────────────────────────
    if cli.json {
        let summary = serde_json::json!({
            "phase": state.phase(),
            "input": cli.input,
            "output": saved,
            "parameters": state.parameters,
            "result_media_type": state.result.as_ref().map(|r| r.media_type.clone()),
            "error": state.last_error,
            "error_kind": state.last_error_kind,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    }

    match saved {
        Some(path) => {
            if !cli.quiet && !cli.json {
                eprintln!("{}  →  {}", green("✔"), bold(&path.display().to_string()));
            }
            Ok(())
        }
        None => {
            let msg = state
                .last_error
                .unwrap_or_else(|| "Enhancement did not complete".to_string());
            anyhow::bail!(msg)
        }
    }
}

/// Map CLI args to `EnhanceConfig`.
fn build_config(cli: &Cli) -> Result<EnhanceConfig> {
    let env = EnhanceConfig::from_env();

    let mut builder = EnhanceConfig::builder();
    if let Some(key) = cli.api_key.clone().or(env.api_key) {
        builder = builder.api_key(key);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref url) = cli.base_url {
        builder = builder.base_url(url.clone());
    }
    if let Some(ref suffix) = cli.suffix {
        builder = builder.result_suffix(suffix.clone());
    }

    builder.build().context("Invalid configuration")
}

/// Where to write the result: the `--output` path, else the input's directory.
fn output_target(input: &Path, output: Option<&Path>) -> PathBuf {
    match output {
        Some(p) => p.to_path_buf(),
        None => input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}
