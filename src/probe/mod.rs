//! The connectivity smoke test.
//!
//! Phases run strictly in order: preflight, client initialisation, the authentication probe,
//! then the database probe. Every phase writes human-readable lines to the report sink.
//! Failures inside the two probes are reported per operation and never stop the run; a bad
//! configuration stops it once, with a list of likely causes.

pub mod auth;
pub mod crud;
pub mod preflight;
pub mod records;


use std::fmt::Display;
use std::io::Write;

use chrono::Utc;

use self::auth::{run_auth_probe, throwaway_email, AuthOutcome};
use self::crud::{run_crud_probe, StepReport};
use self::preflight::{check_service_account, Preflight};
use crate::config::{ConfigError, Settings};
use crate::FirebaseApp;

const LIKELY_CAUSES: &[&str] = &[
    "1. The FIREBASE_* values (API key, database URL, project id) are wrong or incomplete.",
    "2. SERVICE_ACCOUNT_KEY_PATH is wrong, or the file is not a valid service account key.",
    "3. There is no Internet connection.",
    "4. A required system dependency is missing or broken (e.g. the TLS root certificates).",
];

/// Writes report lines. Write errors are logged, not propagated.
pub struct Reporter<W: Write> {
    out: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn line(&mut self, message: impl Display) {
        if let Err(e) = writeln!(self.out, "{}", message) {
            tracing::warn!(error = %e, "failed to write report line");
        }
    }

    pub fn section(&mut self, title: impl Display) {
        self.line(format_args!("\n--- {} ---", title));
    }
}

/// What happened during one run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub preflight: Option<Preflight>,
    pub auth: Option<AuthOutcome>,
    pub steps: Vec<StepReport>,
    /// Set when configuration or initialisation failed.
    pub critical: Option<String>,
}

/// Loads [`Settings`] from the environment and runs the smoke test against them.
pub async fn run_from_env<W: Write>(out: W) -> RunSummary {
    run(Settings::from_env(), out).await
}

/// Runs the smoke test, reporting to `out`.
pub async fn run<W: Write>(settings: Result<Settings, ConfigError>, out: W) -> RunSummary {
    let mut reporter = Reporter::new(out);
    let mut summary = RunSummary::default();

    reporter.section("Starting Firebase connection test");

    let result = match settings {
        Ok(settings) => execute(&settings, &mut reporter, &mut summary).await,
        Err(err) => Err(err),
    };

    if let Err(err) = result {
        tracing::error!(error = %err, "smoke test aborted");
        report_critical(&mut reporter, &err);
        summary.critical = Some(err.to_string());
    }

    reporter.section("Firebase connection and CRUD test finished");
    summary
}

async fn execute<W: Write>(
    settings: &Settings,
    reporter: &mut Reporter<W>,
    summary: &mut RunSummary,
) -> Result<(), ConfigError> {
    let path = &settings.service_account_key_path;
    reporter.line(format!("Checking service account key file at: {}", path.display()));

    let preflight = check_service_account(path);
    match &preflight {
        Preflight::Found(_) => reporter.line("Service account key file found."),
        Preflight::Missing { absolute } => {
            reporter.line("WARNING: service account key file NOT found at the configured path!");
            reporter.line("Check SERVICE_ACCOUNT_KEY_PATH and where the file lives.");
            reporter.line(format!("Expected absolute path: {}", absolute.display()));
        }
    }
    let found = preflight.is_found();
    summary.preflight = Some(preflight);
    if !found {
        return Ok(());
    }

    let mut config = settings.firebase.clone();
    config.service_account_key_path = Some(path.clone());
    let app = FirebaseApp::initialize(config).await?;
    reporter.line("Firebase app initialised from the configuration.");

    let email = throwaway_email(Utc::now().timestamp(), &settings.probe.email_domain);
    summary.auth = Some(run_auth_probe(&app.auth(), &email, &settings.probe, reporter).await);

    summary.steps = run_crud_probe(&app.database(), &settings.probe, reporter).await;
    Ok(())
}

fn report_critical<W: Write>(reporter: &mut Reporter<W>, err: &ConfigError) {
    reporter.section("CRITICAL ERROR IN THE FIREBASE CONFIGURATION");
    reporter.line(format!(
        "The Firebase client could not be initialised: {}",
        err
    ));
    reporter.line("Review the messages above and your configuration.");
    reporter.line("Possible causes:");
    for cause in LIKELY_CAUSES {
        reporter.line(cause);
    }
}
