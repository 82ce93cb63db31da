mod config;
mod terminal;
mod wizard;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{ArgAction, Parser, Subcommand};
use config::{AppConfig, ConfigLoader, RenderFormat};
use qa_flow::Session;
use qa_spec::{
    AnswerStore, FormSpec, ValidationResult, answers_schema, scholarship_form, validate_json,
};
use serde_json::Value;
use terminal::LineSurface;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use wizard::{Verbosity, WizardPresenter};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Step-by-step scholarship questionnaire",
    long_about = "Walks through the scholarship intake one question at a time, validates each answer and submits the completed set"
)]
struct Cli {
    /// Log verbosity on stderr (-v info, -vv debug, -vvv trace); RUST_LOG overrides.
    #[arg(short = 'v', long = "log", action = ArgAction::Count, global = true)]
    log: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer the questionnaire interactively, one line per input.
    Run {
        /// FormSpec JSON to use instead of the built-in scholarship form.
        #[arg(long, value_name = "SPEC")]
        spec: Option<PathBuf>,
        /// JSON object of answers to start from.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        /// Extra TOML configuration file.
        #[arg(long, value_name = "CONFIG")]
        config: Option<PathBuf>,
        /// Render output mode for the wizard display.
        #[arg(long, value_enum)]
        format: Option<RenderFormat>,
        /// Show verbose output (status line and question ids).
        #[arg(long, alias = "debug")]
        verbose: bool,
        /// Also emit answer JSON on completion.
        #[arg(long)]
        answers_json: bool,
        /// Keep select answers on screen until confirmed.
        #[arg(long)]
        no_auto_advance: bool,
    },
    /// Validate an answers JSON file against the form.
    Validate {
        #[arg(long, value_name = "SPEC")]
        spec: Option<PathBuf>,
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
    },
    /// Print the form definition as JSON.
    Describe {
        #[arg(long, value_name = "SPEC")]
        spec: Option<PathBuf>,
    },
    /// Print the JSON schema of the answers object.
    Schema {
        #[arg(long, value_name = "SPEC")]
        spec: Option<PathBuf>,
        /// Print the schema of the FormSpec document itself instead.
        #[arg(long)]
        spec_schema: bool,
    },
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.log);

    match cli.command {
        Command::Run {
            spec,
            answers,
            config,
            format,
            verbose,
            answers_json,
            no_auto_advance,
        } => {
            let mut app = load_config(config.as_deref())?;
            if let Some(format) = format {
                app.output.format = format;
            }
            app.output.verbose |= verbose;
            app.output.answers_json |= answers_json;
            if no_auto_advance {
                app.flow = app.flow.without_auto_advance();
            }
            run_wizard(spec.as_deref(), answers.as_deref(), app).await
        }
        Command::Validate { spec, answers } => run_validate(spec.as_deref(), &answers),
        Command::Describe { spec } => {
            let spec = load_spec(spec.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&spec)?);
            Ok(())
        }
        Command::Schema { spec, spec_schema } => {
            let schema = if spec_schema {
                serde_json::to_value(schemars::schema_for!(FormSpec))?
            } else {
                answers_schema(&load_spec(spec.as_deref())?)
            };
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
    }
}

fn init_tracing(level: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match level {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> CliResult<AppConfig> {
    if let Some(path) = path
        && !path.exists()
    {
        return Err(format!("config file '{}' does not exist", path.display()).into());
    }
    let config = ConfigLoader::load(path)?;
    debug!(?config, "configuration loaded");
    Ok(config)
}

fn load_spec(path: Option<&Path>) -> CliResult<FormSpec> {
    let spec = match path {
        Some(path) => serde_json::from_str::<FormSpec>(&fs::read_to_string(path)?)?,
        None => scholarship_form(),
    };
    spec.check()?;
    Ok(spec)
}

fn read_json(path: &Path) -> CliResult<Value> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

async fn run_wizard(
    spec_path: Option<&Path>,
    answers_path: Option<&Path>,
    config: AppConfig,
) -> CliResult<()> {
    let spec = Arc::new(load_spec(spec_path)?);
    let answers = match answers_path {
        Some(path) => AnswerStore::from_json(&spec, &read_json(path)?)?,
        None => AnswerStore::new(),
    };
    info!(form = %spec.id, prefilled = answers.len(), "starting questionnaire");

    let (key_tx, key_rx) = mpsc::unbounded_channel();
    let auto_advance = config.flow.auto_advance_ms.is_some();
    let session = Session::builder(Arc::clone(&spec))
        .config(config.flow.clone())
        .answers(answers)
        .submitter(Arc::new(config.submission.submitter()))
        .keys(key_rx)
        .spawn()?;

    let mut presenter = WizardPresenter::new(
        Verbosity::from_verbose(config.output.verbose),
        config.output.format,
        config.output.answers_json,
    );
    let report = LineSurface::new(session, key_tx, auto_advance)
        .drive(&mut presenter)
        .await?;
    presenter.show_outcome(&report);
    Ok(())
}

fn run_validate(spec_path: Option<&Path>, answers_path: &Path) -> CliResult<()> {
    let spec = load_spec(spec_path)?;
    let result = validate_json(&spec, &read_json(answers_path)?)?;
    println!(
        "Validation result: {}",
        if result.valid { "valid" } else { "invalid" }
    );
    describe_validation(&result);

    if result.valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_validation(result: &ValidationResult) {
    if !result.errors.is_empty() {
        println!("Errors:");
        for error in &result.errors {
            println!("  {} - {} ({})", error.question_id(), error, error.code());
        }
    }
    if !result.missing_required.is_empty() {
        println!(
            "Missing required answers: {}",
            result.missing_required.join(", ")
        );
    }
    if !result.unknown_fields.is_empty() {
        println!(
            "Unknown answer fields: {}",
            result.unknown_fields.join(", ")
        );
    }
}
