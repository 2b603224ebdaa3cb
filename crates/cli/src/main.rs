mod renew;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use renewal_core::{diff, render_digest, suggest_window_from, summary_lines};
use renewal_workflow::RenewalConfig;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "RENEWAL_LOG";

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Agreement renewal toolkit.
#[derive(Parser)]
#[command(name = "renewal", version, about = "Agreement renewal toolkit")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest the validity window of a renewal
    Window {
        /// Current validity start (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        start: Option<Date>,
        /// Current validity end (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        end: Option<Date>,
        /// Reference date, defaults to the current UTC date
        #[arg(long, value_parser = parse_date)]
        today: Option<Date>,
    },

    /// Diff two term snapshot JSON documents
    Diff {
        /// Snapshot before the change
        before: PathBuf,
        /// Snapshot after the change
        after: PathBuf,
        /// Print the HTML change digest instead of the summary
        #[arg(long)]
        html: bool,
    },

    /// Renew an agreement from a JSON fixture
    Renew {
        /// Fixture file: {"agreements": [...]}
        fixture: PathBuf,
        /// Id of the agreement to renew
        #[arg(long)]
        source: u64,
        /// Reference date, defaults to the current UTC date
        #[arg(long, value_parser = parse_date)]
        today: Option<Date>,
        /// Acting user id recorded on messages and the change log
        #[arg(long)]
        actor: Option<u64>,
        /// Workflow configuration (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the effective workflow configuration
    Config {
        /// Workflow configuration (TOML)
        file: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    if !cli.quiet {
        init_logging();
    }

    match cli.command {
        Commands::Window { start, end, today } => {
            cmd_window(start, end, today, cli.output, cli.quiet);
        }
        Commands::Diff {
            before,
            after,
            html,
        } => {
            cmd_diff(&before, &after, html, cli.output, cli.quiet);
        }
        Commands::Renew {
            fixture,
            source,
            today,
            actor,
            config,
        } => {
            renew::cmd_renew(renew::RenewOptions {
                fixture: &fixture,
                source_id: source,
                today: today.unwrap_or_else(today_utc),
                actor_id: actor,
                config: config.as_deref(),
                output: cli.output,
                quiet: cli.quiet,
            });
        }
        Commands::Config { file } => {
            cmd_config(file.as_deref(), cli.output, cli.quiet);
        }
    }
}

/// Log to stderr, filtered by `RENEWAL_LOG` (default `warn`).
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn parse_date(s: &str) -> Result<Date, String> {
    Date::parse(s, format_description!("[year]-[month]-[day]"))
        .map_err(|e| format!("invalid date '{}' (expected YYYY-MM-DD): {}", s, e))
}

fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

fn cmd_window(
    start: Option<Date>,
    end: Option<Date>,
    today: Option<Date>,
    output: OutputFormat,
    quiet: bool,
) {
    let today = today.unwrap_or_else(today_utc);
    let (new_start, new_end) = suggest_window_from(start, end, today);
    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "validity_start": new_start.to_string(),
                "validity_end": new_end.to_string(),
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&value).unwrap_or_default()
            );
        }
        OutputFormat::Text => {
            println!("{} → {}", new_start, new_end);
        }
    }
}

fn read_json(path: &Path, output: OutputFormat, quiet: bool) -> serde_json::Value {
    let content = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            let msg = format!("error parsing JSON in '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

fn cmd_diff(before_path: &Path, after_path: &Path, html: bool, output: OutputFormat, quiet: bool) {
    let before = read_json(before_path, output, quiet);
    let after = read_json(after_path, output, quiet);

    let delta = diff(&before, &after);
    if quiet {
        return;
    }

    if html {
        println!("{}", render_digest(&before, &after, &delta));
        return;
    }

    let summary = summary_lines(&before, &after);
    match output {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "summary": summary,
                "delta": delta.to_json(),
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&value).unwrap_or_default()
            );
        }
        OutputFormat::Text => {
            for line in &summary {
                println!("{}", line);
            }
            if !delta.is_empty() {
                println!();
                println!("{}", delta.to_text());
            }
        }
    }
}

/// Load the workflow configuration, or the defaults when no file is given.
pub(crate) fn load_config(path: Option<&Path>, output: OutputFormat, quiet: bool) -> RenewalConfig {
    let Some(path) = path else {
        return RenewalConfig::default();
    };
    match RenewalConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            report_error(&format!("configuration error: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

fn cmd_config(path: Option<&Path>, output: OutputFormat, quiet: bool) {
    let config = load_config(path, output, quiet);
    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&config).unwrap_or_default()
            );
        }
        OutputFormat::Text => match toml::to_string_pretty(&config) {
            Ok(s) => print!("{}", s),
            Err(e) => {
                report_error(&format!("serialization error: {}", e), output, quiet);
                process::exit(1);
            }
        },
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
