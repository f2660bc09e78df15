//! CLI binary for labelcrop.
//!
//! A thin shim over the library crate that maps CLI flags to `Settings`,
//! runs the pipeline and writes the output PDF.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use labelcrop::{
    process_to_file, MarginSetting, PageIssue, Platform, ProcessOptions, ProcessProgressCallback,
    ProgressCallback, Settings, Stage,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner that names the running stage and prints one line per
/// finished stage and per absorbed page issue.
struct CliProgressCallback {
    bar: ProgressBar,
    issues: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Reading");
        bar.set_message("input PDFs…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            issues: AtomicUsize::new(0),
        })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProcessProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_prefix("Processing");
        self.bar.set_message(stage.to_string());
    }

    fn on_stage_complete(&self, stage: Stage, pages: usize) {
        self.bar.println(format!(
            "  {} {:<12} {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{pages} pages")),
        ));
    }

    fn on_page_issue(&self, issue: &PageIssue) {
        self.issues.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!("  {} {}", yellow("⚠"), issue));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Crop Flipkart labels to the label area
  labelcrop --platform flipkart labels.pdf -o cropped.pdf

  # Merge Meesho sheets, 20pt margin, sort by SKU, stamp print time
  labelcrop --merge --platform meesho --margin 20 --sort-sku --date-time a.pdf b.pdf

  # Stamp a note on every label
  labelcrop --text "HANDLE WITH CARE" labels.pdf

  # Drive from the upload form's JSON record; flags override it
  labelcrop --settings settings.json --sort-sku *.pdf --report

PLATFORMS:
  flipkart   fixed label box (margin ignored)
  meesho     margin preset 20
  amazon     margin preset 30
  citymall   margin preset 25
  custom     margin preset 50 (also used for unknown platforms)

  Margin cropping only runs when --margin is given and non-zero. A margin
  that isn't a number falls back to the platform preset.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Override the log filter
"#;

/// Merge, crop, SKU-sort and stamp shipping-label PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "labelcrop",
    version,
    about = "Merge, crop, SKU-sort and stamp shipping-label PDFs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input PDF files, in merge order.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output PDF path.
    #[arg(short, long, env = "LABELCROP_OUTPUT", default_value = "output.pdf")]
    output: PathBuf,

    /// JSON settings record (mergePdf, platform, margin, sortSku, …).
    #[arg(long, env = "LABELCROP_SETTINGS")]
    settings: Option<PathBuf>,

    /// Merge all inputs instead of processing only the first.
    #[arg(long, env = "LABELCROP_MERGE")]
    merge: bool,

    /// Platform: flipkart, meesho, amazon, citymall, custom.
    #[arg(long, env = "LABELCROP_PLATFORM")]
    platform: Option<String>,

    /// Margin in points (ignored for flipkart).
    #[arg(long, env = "LABELCROP_MARGIN")]
    margin: Option<String>,

    /// Reorder pages by the SKU printed on each label.
    #[arg(long, env = "LABELCROP_SORT_SKU")]
    sort_sku: bool,

    /// Stamp the current date/time bottom-right.
    #[arg(long, env = "LABELCROP_DATE_TIME")]
    date_time: bool,

    /// Stamp this text top-centre on every page.
    #[arg(long, env = "LABELCROP_TEXT")]
    text: Option<String>,

    /// Print the JSON run report to stdout.
    #[arg(long, env = "LABELCROP_REPORT")]
    report: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "LABELCROP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "LABELCROP_QUIET")]
    quiet: bool,

    /// Disable the progress spinner and show INFO logs instead.
    #[arg(long, env = "LABELCROP_NO_PROGRESS")]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let (show_progress, filter) = output_mode(&cli);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let settings = build_settings(&cli).await?;

    let progress = show_progress.then(CliProgressCallback::new);
    let options = ProcessOptions {
        progress: progress
            .clone()
            .map(|cb| cb as ProgressCallback),
        ..Default::default()
    };

    let inputs = cli.inputs.iter().cloned().map(Into::into).collect();
    let result = process_to_file(inputs, &cli.output, &settings, &options).await;
    if let Some(ref cb) = progress {
        cb.finish();
    }
    let report = result.context("Processing failed")?;

    if cli.report {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    }

    if !cli.quiet {
        let issues = report.issues.len();
        eprintln!(
            "{}  {} pages  {}ms  →  {}",
            if issues == 0 { green("✔") } else { yellow("⚠") },
            report.output_pages,
            report.total_duration_ms,
            bold(&cli.output.display().to_string()),
        );
        if !report.sort_keys.is_empty() {
            eprintln!(
                "   {} of {} pages sorted by SKU",
                dim(&report.sku_pages().to_string()),
                report.output_pages
            );
        }
        if issues > 0 {
            eprintln!("   {} page issue(s)", yellow(&issues.to_string()));
        }
    }

    Ok(())
}

/// Whether to show the spinner, and the default log filter.
///
/// The spinner and INFO logs would interleave on stderr, so library logs drop
/// to ERROR while the spinner runs.
fn output_mode(cli: &Cli) -> (bool, &'static str) {
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    (show_progress, if cli.verbose { "debug" } else { filter })
}

/// Settings file first (if any), then CLI flags on top.
async fn build_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match cli.settings {
        Some(ref path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read settings from {:?}", path))?;
            Settings::from_json(&json).context("Invalid settings file")?
        }
        None => Settings::default(),
    };

    if cli.merge {
        settings.merge_pdf = true;
    }
    if let Some(ref key) = cli.platform {
        settings.platform = Platform::from_key(key);
    }
    if let Some(ref margin) = cli.margin {
        settings.margin = Some(MarginSetting::Text(margin.clone()));
    }
    if cli.sort_sku {
        settings.sort_sku = true;
    }
    if cli.date_time {
        settings.add_date_time = true;
    }
    if let Some(ref text) = cli.text {
        settings.add_text = true;
        settings.custom_text = text.clone();
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(["labelcrop"].iter().chain(args).chain(&["in.pdf"])).unwrap()
    }

    #[test]
    fn spinner_by_default_with_error_logs() {
        assert_eq!(output_mode(&parse(&[])), (true, "error"));
    }

    #[test]
    fn no_progress_shows_info_logs() {
        assert_eq!(output_mode(&parse(&["--no-progress"])), (false, "info"));
    }

    #[test]
    fn quiet_and_verbose() {
        assert_eq!(output_mode(&parse(&["-q"])), (false, "error"));
        assert_eq!(output_mode(&parse(&["-v", "--no-progress"])), (false, "debug"));
    }

    #[tokio::test]
    async fn flags_override_settings_defaults() {
        let cli = parse(&["--platform", "Flipkart", "--margin", "12", "--text", "Hi"]);
        let settings = build_settings(&cli).await.unwrap();
        assert_eq!(settings.platform, Platform::Flipkart);
        assert_eq!(settings.margin, Some(MarginSetting::Text("12".into())));
        assert_eq!(settings.stamp_text(), Some("Hi"));
    }
}
