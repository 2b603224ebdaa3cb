//! `renewal renew`: run the renewal wizard against a JSON fixture.
//!
//! The fixture seeds an in-memory store:
//!
//! ```json
//! { "agreements": [ { "id": 1, "name": "AGR/00001", "state": "active", ... } ] }
//! ```

use std::path::Path;
use std::process;

use renewal_core::Agreement;
use renewal_storage::MemoryStore;
use renewal_workflow::{NoActions, RenewalError, RenewalOutcome, RenewalService, WizardStep};
use serde::Deserialize;
use time::{Date, OffsetDateTime};

use crate::{load_config, report_error, OutputFormat};

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    agreements: Vec<Agreement>,
}

pub(crate) struct RenewOptions<'a> {
    pub fixture: &'a Path,
    pub source_id: u64,
    pub today: Date,
    pub actor_id: Option<u64>,
    pub config: Option<&'a Path>,
    pub output: OutputFormat,
    pub quiet: bool,
}

pub(crate) fn cmd_renew(opts: RenewOptions<'_>) {
    let RenewOptions {
        fixture,
        source_id,
        today,
        actor_id,
        config,
        output,
        quiet,
    } = opts;

    let fixture = read_fixture(fixture, output, quiet);
    let config = load_config(config, output, quiet);
    tracing::debug!(
        agreements = fixture.agreements.len(),
        source_id,
        "fixture loaded"
    );

    let store = MemoryStore::with_agreements(fixture.agreements);
    let service = match RenewalService::new(store, NoActions, config) {
        Ok(s) => s,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            report_error(&format!("failed to start runtime: {}", e), output, quiet);
            process::exit(1);
        }
    };

    let result = rt.block_on(renew(&service, source_id, today, actor_id));
    let outcome = match result {
        Ok(Some(outcome)) => outcome,
        Ok(None) => {
            let msg = format!("agreement {} not found in fixture", source_id);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    };

    if !quiet {
        print_outcome(&outcome, output);
    }
}

/// Open a wizard on `source_id` and confirm it unchanged. `None` when the
/// source does not exist.
async fn renew(
    service: &RenewalService<MemoryStore, NoActions>,
    source_id: u64,
    today: Date,
    actor_id: Option<u64>,
) -> Result<Option<RenewalOutcome>, RenewalError> {
    let mut wizard = service.open(Some(source_id), today).await?;
    if wizard.step() == WizardStep::Select {
        return Ok(None);
    }
    let outcome = service
        .confirm(&mut wizard, actor_id, OffsetDateTime::now_utc())
        .await?;
    Ok(Some(outcome))
}

fn read_fixture(path: &Path, output: OutputFormat, quiet: bool) -> Fixture {
    let content = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    match serde_json::from_str(&content) {
        Ok(f) => f,
        Err(e) => {
            let msg = format!("error parsing fixture '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

fn print_outcome(outcome: &RenewalOutcome, output: OutputFormat) {
    match output {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(outcome).unwrap_or_default()
            );
        }
        OutputFormat::Text => {
            let a = &outcome.agreement;
            println!(
                "Created {} (id {}, Rev {}) from agreement {}",
                a.name,
                a.id,
                a.revision_no(),
                outcome.navigation.context.default_previous_agreement_id
            );
            if let (Some(start), Some(end)) = (a.validity_start, a.validity_end) {
                println!("Validity: {} → {}", start, end);
            }
            println!("{}", outcome.change_log.name());
            for line in &outcome.summary {
                println!("  - {}", line);
            }
        }
    }
}
