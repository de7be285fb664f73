//! Command-line front end: render stored analysis text to PDF, inspect its
//! sections, and push finished reports to the configured CRM.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dental_report_core::export::{connect, HttpTransport, ReportExporter};
use dental_report_core::report::generate_document;
use dental_report_core::{parse_sections, AppConfig, PatientInfo, ReportVariant, SessionSettings};

#[derive(Parser)]
#[command(name = "dental-report", about = "Dental AI report generator", version)]
struct Cli {
    /// Session settings JSON (defaults come from the environment)
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render analysis text to a PDF report
    Render {
        /// File holding the model's analysis text
        #[arg(short, long)]
        input: PathBuf,
        /// Patient details as JSON
        #[arg(short, long)]
        patient: PathBuf,
        /// `summary` or `detailed`
        #[arg(long, default_value = "summary")]
        variant: ReportVariant,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// Print the parsed sections of analysis text as JSON
    Sections {
        /// File holding the model's analysis text
        input: PathBuf,
    },
    /// Render a report and push it to the configured CRM
    Export {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        patient: PathBuf,
        /// Patient identifier in the CRM
        #[arg(long)]
        patient_id: String,
        #[arg(long, default_value = "summary")]
        variant: ReportVariant,
        /// Reviewing clinician
        #[arg(long)]
        reviewed_by: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env().context("reading environment config")?;

    let default_level = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let settings = match &cli.settings {
        Some(path) => SessionSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => SessionSettings::from_app_config(&config),
    };

    match cli.command {
        Commands::Render {
            input,
            patient,
            variant,
            out,
        } => {
            let raw = read_text(&input)?;
            let patient = read_patient(&patient)?;
            let document = generate_document(
                &patient,
                &raw,
                &settings.branding(),
                &settings.document_options(variant),
            )?;

            fs::create_dir_all(&out)?;
            let path = out.join(document.file_name());
            fs::write(&path, document.bytes())
                .with_context(|| format!("writing {}", path.display()))?;
            println!("{}", path.display());
        }
        Commands::Sections { input } => {
            let sections = parse_sections(&read_text(&input)?);
            let sections: Vec<_> = sections.iter().collect();
            println!("{}", serde_json::to_string_pretty(&sections)?);
        }
        Commands::Export {
            input,
            patient,
            patient_id,
            variant,
            reviewed_by,
        } => {
            let raw = read_text(&input)?;
            let patient = read_patient(&patient)?;

            let Some(mut system) = connect(
                &settings.crm.kind,
                settings.crm_credentials(),
                HttpTransport::new()?,
            )?
            else {
                bail!("no CRM configured");
            };
            system.authenticate()?;

            let document = generate_document(
                &patient,
                &raw,
                &settings.branding(),
                &settings.document_options(variant),
            )?;
            let export = ReportExporter::new(system.as_ref()).export(
                &patient_id,
                &parse_sections(&raw),
                &document,
                reviewed_by.as_deref(),
            )?;
            println!("{}", export.metadata.report_id);
        }
    }

    Ok(())
}

fn read_text(path: &PathBuf) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn read_patient(path: &PathBuf) -> Result<PatientInfo> {
    let json = read_text(path)?;
    serde_json::from_str(&json).with_context(|| format!("parsing patient {}", path.display()))
}
