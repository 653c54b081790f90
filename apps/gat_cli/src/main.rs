use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use authoring_core::{
    load_settings,
    naming::{self, TrainingAppNames},
    pipeline::StepOutcome,
    quadrants::{make_data_valid_for_view, QuadrantDefaults},
    validation::{
        set_attribute, validate_content, validate_practice_application, EditorState, LoadedContent,
    },
    GenerationPipeline, HttpDispatchService, ServiceClient,
};
use clap::{Parser, Subcommand};
use shared::{
    domain::{DkfRef, MerrillQuadrant, MerrillsBranchPoint, TrainingApplication},
    metadata::{Metadata, MetadataAttribute, MetadataConcept, MetadataContent, PresentAt},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gat", about = "Course authoring helpers")]
struct Cli {
    /// Overrides the dispatch server from gat.toml / GAT__SERVER_URL.
    #[arg(long)]
    server_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fill in the quadrant defaults of a branch point document and print it.
    Normalize { file: PathBuf },
    /// Check a metadata document the way the add-content dialog does.
    Validate { file: PathBuf },
    /// Generate a practice training-app reference and its metadata for a DKF.
    GenerateTrainingApp {
        #[arg(long)]
        dkf: String,
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long = "concept")]
        concepts: Vec<String>,
        /// Practice attribute applied to every concept, e.g. `realistic`.
        #[arg(long = "attribute", value_parser = parse_practice_attribute)]
        attributes: Vec<MetadataAttribute>,
    },
}

fn parse_practice_attribute(raw: &str) -> Result<MetadataAttribute, String> {
    let attribute: MetadataAttribute = serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| format!("unknown metadata attribute '{raw}'"))?;
    if !attribute.is_practice_attribute() {
        return Err(format!("'{raw}' cannot describe a practice application"));
    }
    Ok(attribute)
}

/// Reference and metadata for a practice training application, refused
/// unless the metadata would pass the practice application dialog.
fn training_app_request(
    course_folder_path: &str,
    dkf: String,
    display_name: Option<String>,
    concepts: Vec<String>,
    attributes: &[MetadataAttribute],
) -> Result<(TrainingApplication, Metadata, TrainingAppNames)> {
    let names = naming::training_app_names(course_folder_path, &dkf);
    let transition_name = display_name.unwrap_or_else(|| naming::file_name(&names.base).to_string());
    let app = TrainingApplication {
        transition_name: Some(transition_name.clone()),
        dkf_ref: Some(DkfRef { file: dkf }),
        ..TrainingApplication::default()
    };
    let concepts = concepts
        .into_iter()
        .map(|name| {
            let mut concept = MetadataConcept::new(name);
            for &attribute in attributes {
                set_attribute(&mut concept, attribute, true);
            }
            concept
        })
        .collect();
    let metadata = Metadata {
        display_name: Some(transition_name),
        content: Some(MetadataContent::TrainingApp(names.reference_file_name.clone())),
        present_at: PresentAt {
            merrill_quadrant: Some(MerrillQuadrant::Practice),
            remediation_only: false,
        },
        concepts,
    };

    let editor = EditorState::with_loaded(LoadedContent::TrainingApp(Box::new(app.clone())));
    let report = validate_practice_application(Some(&metadata), &editor);
    if !report.can_submit() {
        bail!("{}", report.messages().join("\n"));
    }
    Ok((app, metadata, names))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(server_url) = cli.server_url {
        settings.server_url = server_url;
    }

    match cli.command {
        Command::Normalize { file } => {
            let raw = fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
            let mut mbp: MerrillsBranchPoint = serde_json::from_str(&raw)?;
            make_data_valid_for_view(&mut mbp, QuadrantDefaults::from(&settings));
            println!("{}", serde_json::to_string_pretty(&mbp)?);
        }
        Command::Validate { file } => {
            let raw = fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
            let metadata: Metadata = serde_json::from_str(&raw)?;
            let report = validate_content(Some(&metadata), &EditorState::default());
            if report.can_submit() {
                println!("ok");
            } else {
                for message in report.messages() {
                    println!("{message}");
                }
                bail!("{} is not valid", file.display());
            }
        }
        Command::GenerateTrainingApp {
            dkf,
            display_name,
            concepts,
            attributes,
        } => {
            if settings.course_folder_path.is_empty() {
                bail!("course_folder_path is not configured");
            }
            let (app, metadata, names) =
                training_app_request(&settings.course_folder_path, dkf, display_name, concepts, &attributes)?;

            let service = HttpDispatchService::new(&settings.server_url)?;
            let client = ServiceClient::new(Arc::new(service), settings.username.clone());
            let outcomes = GenerationPipeline::new(client)
                .then_training_app_reference(app, names.reference_path)
                .then_metadata(metadata, names.metadata_path)
                .run()
                .await?;

            for outcome in outcomes {
                match outcome {
                    StepOutcome::ReferenceWritten { step, target } => info!(step, target = %target, "written"),
                    StepOutcome::MetadataWritten { target, .. } => info!(target = %target, "metadata written"),
                }
            }
        }
    }

    Ok(())
}
