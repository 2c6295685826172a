//! Sectioner CLI
//!
//! Cut a paper, a book chapter, or a transcript into concept sections and
//! print them as JSON.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sectioner::{
    arxiv_resource_id, youtube_resource_id, Caption, Config, DocumentPipeline, Layout, OpenAiCompatClassifier, Report,
    TemplatePipeline, TranscriptPipeline,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "sectioner")]
#[command(about = "Concept-level sectioning for papers, chapters, and transcripts")]
struct Args {
    /// JSON configuration file (vocabularies, templates, chunking, remote)
    #[arg(short, long, global = true, env = "SECTIONER_CONFIG")]
    config: Option<PathBuf>,

    /// Write sections here instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Section an extracted research paper by its headings
    Paper {
        /// Extracted markdown or text
        input: PathBuf,

        /// Vocabulary to classify against
        #[arg(long, default_value = sectioner::BUILTIN_DDIA_CHAPTER_ONE)]
        doc_type: String,

        /// arXiv id or URL; derives the resource id
        #[arg(long, conflicts_with = "resource_id")]
        arxiv: Option<String>,

        /// Explicit resource id
        #[arg(long)]
        resource_id: Option<String>,

        /// One section per heading instead of one per concept
        #[arg(long)]
        per_span: bool,

        /// Ask a remote model about headings no keyword matches
        #[arg(long)]
        remote: bool,
    },

    /// Section a book chapter with a known table of contents
    Chapter {
        /// Extracted chapter markdown
        input: PathBuf,

        /// Template name
        #[arg(long, default_value = sectioner::BUILTIN_DDIA_CHAPTER_ONE)]
        template: String,

        /// Resource id (defaults to the template name)
        #[arg(long)]
        resource_id: Option<String>,
    },

    /// Chunk a caption list ([{"text", "start", "duration"}, ...])
    Transcript {
        /// Caption JSON file
        input: PathBuf,

        /// YouTube URL or video id; derives the resource id
        #[arg(long, conflicts_with = "resource_id")]
        video: Option<String>,

        /// Explicit resource id
        #[arg(long)]
        resource_id: Option<String>,

        /// Target words per chunk (overrides the configuration)
        #[arg(long)]
        target_words: Option<usize>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load_or_builtin(args.config.as_deref()).context("loading configuration")?;

    let report = match args.command {
        Command::Paper {
            input,
            doc_type,
            arxiv,
            resource_id,
            per_span,
            remote,
        } => {
            let vocabulary = config.vocabulary(&doc_type)?.clone();
            let resource_id = match (resource_id, arxiv) {
                (Some(id), _) => id,
                (None, Some(arxiv)) => arxiv_resource_id(&arxiv),
                (None, None) => bail!("pass --resource-id or --arxiv"),
            };
            // Credentials are checked before any input is read.
            let classifier = if remote {
                Some(OpenAiCompatClassifier::from_settings(&config.remote).context("configuring remote classifier")?)
            } else {
                None
            };

            let text = read_input(&input)?;
            let layout = if per_span { Layout::PerSpan } else { Layout::ByConcept };
            let mut pipeline = DocumentPipeline::new(vocabulary)
                .with_segmenter(config.segment.segmenter())
                .with_layout(layout);
            if let Some(classifier) = classifier {
                pipeline = pipeline.with_remote(classifier, config.remote.batch());
            }
            pipeline.run(&resource_id, &text)
        }

        Command::Chapter {
            input,
            template,
            resource_id,
        } => {
            let pipeline = TemplatePipeline::new(config.template(&template)?)?;
            let text = read_input(&input)?;
            pipeline.run(resource_id.as_deref().unwrap_or(&template), &text)
        }

        Command::Transcript {
            input,
            video,
            resource_id,
            target_words,
        } => {
            let mut settings = config.transcript.clone();
            if let Some(target) = target_words {
                settings.target_words = target;
            }
            let resource_id = match (resource_id, video) {
                (Some(id), _) => id,
                (None, Some(video)) => youtube_resource_id(&video)?,
                (None, None) => bail!("pass --resource-id or --video"),
            };
            let pipeline = TranscriptPipeline::new(settings.chunker()?, &settings.concept_id);

            let json = read_input(&input)?;
            let captions: Vec<Caption> =
                serde_json::from_str(&json).with_context(|| format!("parsing captions in {}", input.display()))?;
            pipeline.run(&resource_id, &captions)
        }
    };

    write_report(&report, args.output.as_deref())
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn write_report(report: &Report, output: Option<&Path>) -> Result<()> {
    if !report.is_clean() {
        info!(warnings = report.warnings.len(), "finished with degraded results");
    }
    let json = serde_json::to_string_pretty(&report.sections)?;
    match output {
        Some(path) => {
            std::fs::write(path, json + "\n").with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), sections = report.sections.len(), "wrote sections");
        }
        None => println!("{json}"),
    }
    Ok(())
}
