use std::{io, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    config::normalize_api_base, load_settings, load_settings_from, ControllerOptions,
    FormSnapshot, HttpBackend, ScoringBackend, Settings, SubmissionController, SubmitEvent,
};
use shared::{
    domain::CompanyForm,
    error::ErrorNormalization,
    signals::{SignalNaming, SIGNAL_CATALOG},
};
use tracing_subscriber::EnvFilter;

mod terminal;

use terminal::{signals_from_flags, OutputFormat, Prompter, TerminalForm};

#[derive(Parser, Debug)]
#[command(
    name = "findability",
    version,
    about = "Score how findable a company is from a checklist of signals"
)]
struct Cli {
    #[arg(long, global = true, help = "Scoring backend base URL")]
    api_base: Option<String>,
    #[arg(long, global = true, help = "Settings file (defaults to ./findability.toml)")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Send signal keys without translating them")]
    raw_signals: bool,
    #[arg(long, global = true, help = "Reuse a company with the same name if one exists")]
    reuse_existing: bool,
    #[arg(long, global = true, help = "Error detail policy: basic or rich")]
    error_detail: Option<ErrorNormalization>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the company and evaluate its signals. Prompts when --name is absent.
    Evaluate(EvaluateArgs),
    /// List companies known to the backend.
    Companies,
    /// Check that the backend is up.
    Health,
    /// Show the signal keys accepted by --signal.
    Signals,
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    website: Option<String>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    state: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    industry: Option<String>,
    #[arg(long)]
    niche: Option<String>,
    #[arg(long = "signal", value_name = "KEY", help = "Mark a signal as present (repeatable)")]
    signals: Vec<String>,
    #[arg(long, help = "Print the result as an HTML fragment")]
    html: bool,
}

impl EvaluateArgs {
    fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            company: CompanyForm {
                name: self.name.clone(),
                website: self.website.clone(),
                country: self.country.clone(),
                state: self.state.clone(),
                city: self.city.clone(),
                industry: self.industry.clone(),
                niche: self.niche.clone(),
            },
            signals: signals_from_flags(&self.signals),
        }
    }
}

fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => load_settings_from(path)?,
        None => load_settings()?,
    };
    if let Some(api_base) = &cli.api_base {
        settings.api_base = normalize_api_base(api_base)?;
    }
    if cli.raw_signals {
        settings.signal_naming = SignalNaming::Raw;
    }
    if cli.reuse_existing {
        settings.reuse_existing_company = true;
    }
    if let Some(policy) = cli.error_detail {
        settings.error_normalization = policy;
    }
    Ok(settings)
}

async fn run_evaluate(settings: &Settings, args: &EvaluateArgs) -> Result<ExitCode> {
    let snapshot = if args.name.is_some() {
        args.snapshot()
    } else {
        let stdin = io::stdin();
        Prompter::new(stdin.lock(), io::stderr())
            .collect_form()
            .context("failed to collect the company form")?
    };
    let format = if args.html {
        OutputFormat::Html
    } else {
        OutputFormat::Text
    };

    let mut controller = SubmissionController::new(
        HttpBackend::from_settings(settings),
        TerminalForm::new(snapshot, format),
        ControllerOptions::from(settings),
    );
    let outcome = controller.submit(&mut SubmitEvent::new()).await;

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn run_companies(backend: &HttpBackend) -> Result<ExitCode> {
    match backend.list_companies().await {
        Ok(companies) => {
            for company in companies {
                println!("{}\t{}", company.id, company.name);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("error: {}", err.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run_health(backend: &HttpBackend) -> Result<ExitCode> {
    match backend.health().await {
        Ok(health) if health.is_ok() => {
            println!("{}: ok", backend.api_base());
            Ok(ExitCode::SUCCESS)
        }
        Ok(health) => {
            eprintln!("{}: {}", backend.api_base(), health.status);
            Ok(ExitCode::FAILURE)
        }
        Err(err) => {
            eprintln!("error: {}", err.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;
    tracing::debug!(?settings, "resolved settings");

    match &cli.command {
        Command::Evaluate(args) => run_evaluate(&settings, args).await,
        Command::Companies => run_companies(&HttpBackend::from_settings(&settings)).await,
        Command::Health => run_health(&HttpBackend::from_settings(&settings)).await,
        Command::Signals => {
            for spec in SIGNAL_CATALOG {
                println!("{:<24}{:<26}{}", spec.ui_key, spec.label, spec.backend_field);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
