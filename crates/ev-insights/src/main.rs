//! CLI entry point for the EV market insights dashboard.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use ev_insights::{
    Dashboard, DashboardConfig, DashboardSnapshot, Datasets, RegionFilter, RegionOptions,
    Selection, WILDCARD, format_thousands, write_top_zips,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    author = "EV Insights Team",
    version,
    about = "EV market insights: predicted sales by ZIP, buyer concerns and recommendations",
    long_about = "Loads ZIP-level EV sales predictions and buyer concern samples, filters them\n\
                  by state and city, and prints metrics, the top ZIP codes, concern sentiment\n\
                  and rule-based recommendations.\n\n\
                  EXAMPLES:\n  \
                  # Default selection (TX / Austin when present)\n  \
                  ev-insights --geo ev_geo_data.csv --concerns ev_concerns_sample.csv\n\n  \
                  # Whole state, top 8, with CSV export\n  \
                  ev-insights -s CA -c ALL -k 8 --export\n\n  \
                  # Machine-readable snapshot\n  \
                  ev-insights --json | jq .recommendations"
)]
struct Args {
    /// Path to the geographic predictions CSV
    #[arg(long)]
    geo: Option<PathBuf>,

    /// Path to the buyer concerns CSV
    #[arg(long)]
    concerns: Option<PathBuf>,

    /// JSON configuration file
    ///
    /// Command line flags override values from the file
    #[arg(long)]
    config: Option<PathBuf>,

    /// State to filter by, or ALL
    ///
    /// If not specified, the preferred state is used when present
    #[arg(short, long)]
    state: Option<String>,

    /// City to filter by, or ALL
    ///
    /// If not specified, the preferred city is used when it belongs to the state
    #[arg(short, long)]
    city: Option<String>,

    /// Number of top ZIP codes to rank (3 - 10)
    #[arg(short = 'k', long)]
    top_k: Option<usize>,

    /// Output directory for the CSV export
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the Top-K table to <output>/top_zips.csv
    #[arg(long)]
    export: bool,

    /// Print the state and city choices for the selection and exit
    ///
    /// Combined with --json, the choices are printed as JSON.
    #[arg(long)]
    list_options: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all logs; only the snapshot is written.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let config = build_config(&args)?;

    let datasets = Datasets::load(&config).context("Failed to load datasets")?;
    let dashboard = Dashboard::new(Arc::new(datasets));

    let selection =
        dashboard.resolve_selection(&config, args.state.as_deref(), args.city.as_deref())?;
    info!("Selection: {}", selection);

    if args.list_options {
        let options = dashboard.options(&selection.state)?;
        println!("{}", render_options(&options, &selection.state, args.json)?);
        return Ok(());
    }

    let snapshot = dashboard.snapshot(&selection, config.top_k)?;

    if args.export {
        let top = dashboard.top_k_frame(&selection, config.top_k)?;
        write_top_zips(&top, &config.output_dir, &config.export_file_name)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    print_human_readable_summary(&snapshot);
    Ok(())
}

/// Layer CLI flags over the config file (or the defaults).
fn build_config(args: &Args) -> Result<DashboardConfig> {
    let base = match &args.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str::<DashboardConfig>(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        }
        None => DashboardConfig::default(),
    };

    let mut builder = base.to_builder();
    if let Some(ref geo) = args.geo {
        builder = builder.geo_path(geo);
    }
    if let Some(ref concerns) = args.concerns {
        builder = builder.concerns_path(concerns);
    }
    if let Some(k) = args.top_k {
        builder = builder.top_k(k);
    }
    if let Some(ref output) = args.output {
        builder = builder.output_dir(output);
    }

    builder.build().map_err(|e| anyhow!("Invalid configuration: {}", e))
}

/// Selector choices as JSON, or as two text lines with the wildcard first.
fn render_options(options: &RegionOptions, state: &RegionFilter, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(options)?);
    }

    Ok(format!(
        "States: {wildcard}, {}\nCities ({}): {wildcard}, {}",
        options.states.join(", "),
        state,
        options.cities.join(", "),
        wildcard = WILDCARD,
    ))
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn optional_whole(value: Option<i64>) -> String {
    value.map_or_else(|| "n/a".to_string(), format_thousands)
}

/// Print the snapshot as a human-readable report.
fn print_human_readable_summary(snapshot: &DashboardSnapshot) {
    let Selection { state, city } = &snapshot.selection;

    println!();
    println!("{}", "=".repeat(80));
    println!("EV MARKET INSIGHTS  ({} / {})", state, city);
    println!("{}", "=".repeat(80));
    println!();

    for (label, value) in snapshot.metrics.display_rows() {
        println!("  {:<32} {}", label, value);
    }
    println!("  {:<32} {}", "ZIP codes in selection", snapshot.metrics.zip_count);
    println!();

    println!("TOP ZIP CODES BY PREDICTED EV SALES");
    println!("{}", "-".repeat(40));
    if snapshot.top_zips.is_empty() {
        println!("  No ZIP codes match the selection");
    } else {
        println!(
            "{:<8} {:<18} {:<6} {:>11} {:>14} {:>9} {:>10}",
            "ZIP", "City", "State", "Population", "Median income", "Stations", "Predicted"
        );
        println!("{}", "-".repeat(82));
        for zip in &snapshot.top_zips {
            println!(
                "{:<8} {:<18} {:<6} {:>11} {:>14} {:>9} {:>10}",
                zip.zip,
                truncate_str(&zip.city, 18),
                zip.state,
                optional_whole(zip.population),
                optional_whole(zip.median_income),
                optional_whole(zip.charging_stations),
                zip.predicted_sales_display()
            );
        }
    }
    println!();

    println!("BUYER CONCERNS & SENTIMENT (-1 to +1)");
    println!("{}", "-".repeat(40));
    if snapshot.concerns.is_empty() {
        println!("  No concern data for the selection");
    } else {
        println!("{:<32} {:>10} {:>10}", "Concern", "Mentions", "Sentiment");
        for concern in &snapshot.concerns {
            let sentiment = concern
                .avg_sentiment
                .map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v));
            println!(
                "{:<32} {:>10} {:>10}",
                truncate_str(&concern.concern, 32),
                concern.mention_count,
                sentiment
            );
        }
    }
    println!();

    println!("MAP");
    println!("{}", "-".repeat(40));
    println!(
        "  {} points centred at ({:.4}, {:.4}), zoom {}",
        snapshot.map.points.len(),
        snapshot.map.view.latitude,
        snapshot.map.view.longitude,
        snapshot.map.view.zoom
    );
    println!();

    println!("BUSINESS RECOMMENDATIONS");
    println!("{}", "-".repeat(40));
    for rec in &snapshot.recommendations {
        println!("  - {}", rec.message);
    }
    println!();

    println!("Use --json for machine-readable output");
    println!("Use --export to save the Top-K table as CSV");
    println!("{}", "=".repeat(80));
}
