//! CLI binary for docsend-dl.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `DeckConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use docsend_dl::{
    download_deck, DeckConfig, DeckDownloadResult, DeckProgressCallback, OutputMode,
    ProgressCallback, UrlGrammar,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Exit status after Ctrl-C (128 + SIGINT).
const EXIT_INTERRUPTED: u8 = 130;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

/// `1536` → `1.5 KB`.
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

// ── CLI progress callback using indicatif ────────────────────────────────────

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Terminal progress: a spinner while the browser works, then a bar with one
/// log line per slide. Slides complete out of order, so lines are printed as
/// they land.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    /// Spinner-only until `on_download_start` tells us the slide count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Starting…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} slides  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Downloading");
        self.bar.reset_eta();
    }
}

impl DeckProgressCallback for CliProgressCallback {
    fn on_status(&self, message: &str) {
        if self.bar.is_finished() {
            eprintln!("{} {}", cyan("◆"), message);
        } else {
            self.bar.set_message(message.to_string());
        }
    }

    fn on_discovery_batch(&self, discovered: usize, total: usize) {
        self.bar.set_prefix("Extracting");
        self.bar
            .set_message(format!("{discovered}/{total} slide URLs"));
    }

    fn on_download_start(&self, total: usize) {
        self.activate_bar(total);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Downloading {total} slides…"))
        ));
    }

    fn on_slide_complete(&self, filename: &str, bytes: u64) {
        self.bar.println(format!(
            "  {} {:<14}  {}",
            green("✓"),
            filename,
            dim(&format_size(bytes)),
        ));
        self.bar.inc(1);
    }

    fn on_slide_error(&self, filename: &str, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!("  {} {:<14}  {}", red("✗"), filename, red(&msg)));
        self.bar.inc(1);
    }

    fn on_download_complete(&self, successes: usize, failures: usize) {
        self.bar.finish_and_clear();

        let total = successes + failures;
        if failures == 0 {
            eprintln!(
                "{} {} slides downloaded",
                green("✔"),
                bold(&successes.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} slides downloaded  ({} failed)",
                if successes == 0 { red("✘") } else { yellow("⚠") },
                bold(&successes.to_string()),
                total,
                red(&failures.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Download a deck as a PDF in the current directory
  docsend-dl https://docsend.com/view/abc123

  # Choose the PDF file name
  docsend-dl https://docsend.com/view/abc123 -o pitch.pdf

  # Put the PDF in a directory (named after the deck)
  docsend-dl https://docsend.com/view/abc123 -o ~/decks/

  # Keep individual slide images instead of a PDF
  docsend-dl https://docsend.com/view/abc123 --images -o ./slides

  # Watch the browser work
  docsend-dl https://docsend.com/view/abc123 --no-headless

  # Accept space links (docsend.com/v/{space}/{name})
  docsend-dl https://docsend.com/v/abc12/my-deck --allow-space-links

LIMITATIONS:
  Only public decks are supported. Decks that ask for an email address or a
  passcode before showing slides are rejected.

ENVIRONMENT VARIABLES:
  DOCSEND_DL_OUTPUT        Same as --output
  DOCSEND_DL_IMAGES        Same as --images
  DOCSEND_DL_NO_HEADLESS   Same as --no-headless
  DOCSEND_DL_CONCURRENCY   Same as --concurrency
  DOCSEND_DL_MAX_RETRIES   Same as --max-retries
  DOCSEND_DL_TIMEOUT       Same as --timeout
  RUST_LOG                 Override log filtering (e.g. docsend_dl=debug)

EXIT STATUS:
  0    every slide downloaded
  1    some slides failed, or the deck could not be downloaded
  130  interrupted
"#;

/// Download slides from public DocSend decks.
#[derive(Parser, Debug)]
#[command(
    name = "docsend-dl",
    version,
    about = "Download slides from public DocSend decks as a PDF or PNG images",
    long_about = "Download every slide of a public DocSend deck. A headless Chromium loads the \
deck, the signed slide image URLs are read from inside the page, and the images are downloaded \
concurrently and assembled into a single PDF (or kept as PNG files with --images).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// DocSend deck URL (https://docsend.com/view/XXXXXX).
    url: String,

    /// PDF file, or directory for the PDF / slide images.
    #[arg(short, long, env = "DOCSEND_DL_OUTPUT")]
    output: Option<PathBuf>,

    /// Save individual PNG images instead of a PDF.
    #[arg(long, env = "DOCSEND_DL_IMAGES")]
    images: bool,

    /// Run the browser without a window (default).
    #[arg(long, overrides_with = "no_headless")]
    headless: bool,

    /// Show the browser window.
    #[arg(long, env = "DOCSEND_DL_NO_HEADLESS", overrides_with = "headless")]
    no_headless: bool,

    /// Number of slide images downloaded at once.
    #[arg(short, long, env = "DOCSEND_DL_CONCURRENCY", default_value_t = 10)]
    concurrency: usize,

    /// Attempts per slide image (including the first).
    #[arg(long, env = "DOCSEND_DL_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Per-request HTTP timeout in seconds (fractions allowed).
    #[arg(long, env = "DOCSEND_DL_TIMEOUT", default_value_t = 30.0,
          value_parser = parse_timeout_secs)]
    timeout: f64,

    /// Also accept docsend.com/v/{space}/{name} links.
    #[arg(long, env = "DOCSEND_DL_ALLOW_SPACE_LINKS")]
    allow_space_links: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOCSEND_DL_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCSEND_DL_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCSEND_DL_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress;
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

    // ── Build config ─────────────────────────────────────────────────────
    let progress = show_progress.then(CliProgressCallback::new_dynamic);
    let config = build_config(
        &cli,
        progress
            .clone()
            .map(|cb| cb as Arc<dyn DeckProgressCallback>),
    )?;

    // ── Run ──────────────────────────────────────────────────────────────
    let outcome = tokio::select! {
        r = download_deck(&cli.url, cli.output.as_deref(), &config) => r,
        _ = tokio::signal::ctrl_c() => {
            if let Some(ref cb) = progress {
                cb.bar.finish_and_clear();
            }
            eprintln!("{} Interrupted", yellow("⚠"));
            return Ok(ExitCode::from(EXIT_INTERRUPTED));
        }
    };

    if let Some(ref cb) = progress {
        if !cb.bar.is_finished() {
            cb.bar.finish_and_clear();
        }
    }

    let result = outcome.context("Download failed")?;

    if !cli.quiet {
        print_summary(&result);
    }

    Ok(if result.failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Accept finite, strictly positive seconds.
fn parse_timeout_secs(s: &str) -> std::result::Result<f64, String> {
    let secs: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{s}' is not a number of seconds"))?;
    if secs.is_finite() && secs > 0.0 {
        Ok(secs)
    } else {
        Err(format!("timeout must be a positive number of seconds, got '{s}'"))
    }
}

/// Map CLI args to `DeckConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<DeckConfig> {
    let grammar = if cli.allow_space_links {
        UrlGrammar::AllowSpaceLinks
    } else {
        UrlGrammar::Strict
    };

    let mut builder = DeckConfig::builder()
        .concurrency(cli.concurrency)
        .max_retries(cli.max_retries)
        .request_timeout(Duration::from_secs_f64(cli.timeout))
        .headless(cli.headless || !cli.no_headless)
        .images_only(cli.images)
        .url_grammar(grammar);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(result: &DeckDownloadResult) {
    for warning in &result.warnings {
        eprintln!("  {} {}", yellow("⚠"), dim(warning));
    }
    if !result.failed_slides.is_empty() {
        eprintln!(
            "  {} failed: {}",
            red("✗"),
            result.failed_slides.join(", ")
        );
    }

    let what = match result.mode {
        OutputMode::Pdf if result.total_bytes == 0 => {
            eprintln!("{} No slides downloaded; no PDF written", red("✘"));
            return;
        }
        OutputMode::Pdf => "PDF",
        OutputMode::Images => "images",
    };

    eprintln!(
        "{}  {}  {}/{} slides  {}  →  {}",
        if result.failures == 0 { green("✔") } else { yellow("⚠") },
        bold(&result.deck_title),
        result.successes,
        result.slide_count,
        dim(&format!("{what}, {}", format_size(result.total_bytes))),
        bold(&result.output_path.display().to_string()),
    );
}
