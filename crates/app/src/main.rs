//! Command-line front end for the science tutor: browse the curriculum, submit
//! answers and track progress. Every command prints JSON to stdout.

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use services::{AppServices, AppServicesError, Clock, ServiceError};
use tracing_subscriber::EnvFilter;
use tutor_core::model::{ExerciseId, LessonId, Level, Subject, TopicId};

mod config;

#[derive(Parser)]
#[command(
    name = "science-tutor",
    version,
    about = "Science curriculum browser with progress tracking"
)]
struct Cli {
    /// SQLite database URL or path
    #[arg(long, global = true, env = config::DB_URL_ENV)]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List topics in catalog order
    Topics {
        /// Only topics of this subject (biology, chemistry, physics)
        #[arg(long, conflicts_with = "level")]
        subject: Option<String>,

        /// Only topics of this level (ks3, gcse, a-level)
        #[arg(long)]
        level: Option<String>,
    },

    /// Show one topic
    Topic { id: String },

    /// List the lessons of a topic
    Lessons { topic_id: String },

    /// Show one lesson
    Lesson { id: String },

    /// List the exercises of a lesson
    Exercises { lesson_id: String },

    /// Submit an answer to an exercise
    Submit { exercise_id: String, answer: String },

    /// Mark a lesson complete
    Complete { lesson_id: String, topic_id: String },

    /// Show whether a lesson is complete
    Status { lesson_id: String },

    /// Show a topic's progress summary, or every completion record
    Progress { topic_id: Option<String> },

    /// Load curriculum JSON documents
    Seed {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Debug)]
enum CliError {
    Invalid(String),
    NotFound(String),
    Config(config::ConfigError),
    Bootstrap(AppServicesError),
    Service(ServiceError),
    Read { path: PathBuf, source: std::io::Error },
    Output(serde_json::Error),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::NotFound(_) | CliError::Service(ServiceError::NotFound { .. }) => 3,
            CliError::Invalid(_)
            | CliError::Service(ServiceError::InvalidInput(_) | ServiceError::Curriculum(_)) => 4,
            _ => 2,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Invalid(msg) => write!(f, "invalid input: {msg}"),
            CliError::NotFound(what) => write!(f, "{what} not found"),
            CliError::Config(e) => write!(f, "{e}"),
            CliError::Bootstrap(e) => write!(f, "cannot open database: {e}"),
            CliError::Service(e) => write!(f, "{e}"),
            CliError::Read { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
            CliError::Output(e) => write!(f, "cannot encode output: {e}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ServiceError> for CliError {
    fn from(e: ServiceError) -> Self {
        CliError::Service(e)
    }
}

fn parse_arg<T>(raw: &str) -> Result<T, CliError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    raw.parse().map_err(|e: T::Err| CliError::Invalid(e.to_string()))
}

fn found<T>(value: Option<T>, kind: &str) -> Result<T, CliError> {
    value.ok_or_else(|| CliError::NotFound(kind.to_string()))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let out = serde_json::to_string_pretty(value).map_err(CliError::Output)?;
    println!("{out}");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("services=info,science_tutor=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn open_services(db: Option<String>) -> Result<AppServices, CliError> {
    let db_url = config::resolve_db_url(db).map_err(CliError::Config)?;
    // Open + migrate SQLite at startup.
    config::prepare_sqlite_file(&db_url).map_err(CliError::Config)?;
    tracing::debug!(%db_url, "opening database");
    AppServices::new_sqlite(&db_url, Clock::system())
        .await
        .map_err(CliError::Bootstrap)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let app = open_services(cli.db).await?;
    let catalog = app.catalog();

    match cli.command {
        Commands::Topics { subject, level } => {
            let topics = match (subject, level) {
                (Some(subject), _) => {
                    catalog
                        .list_topics_by_subject(parse_arg::<Subject>(&subject)?)
                        .await?
                }
                (None, Some(level)) => {
                    catalog
                        .list_topics_by_level(parse_arg::<Level>(&level)?)
                        .await?
                }
                (None, None) => catalog.list_topics().await?,
            };
            print_json(&topics)
        }
        Commands::Topic { id } => {
            let id: TopicId = parse_arg(&id)?;
            print_json(&found(catalog.get_topic(&id).await?, "topic")?)
        }
        Commands::Lessons { topic_id } => {
            let topic_id: TopicId = parse_arg(&topic_id)?;
            print_json(&catalog.list_lessons_by_topic(&topic_id).await?)
        }
        Commands::Lesson { id } => {
            let id: LessonId = parse_arg(&id)?;
            print_json(&found(catalog.get_lesson(&id).await?, "lesson")?)
        }
        Commands::Exercises { lesson_id } => {
            let lesson_id: LessonId = parse_arg(&lesson_id)?;
            print_json(&catalog.list_exercises_by_lesson(&lesson_id).await?)
        }
        Commands::Submit {
            exercise_id,
            answer,
        } => {
            let exercise_id: ExerciseId = parse_arg(&exercise_id)?;
            let feedback = app.exercises().submit_answer(&exercise_id, &answer).await?;
            print_json(&feedback)
        }
        Commands::Complete {
            lesson_id,
            topic_id,
        } => {
            let lesson_id: LessonId = parse_arg(&lesson_id)?;
            let topic_id: TopicId = parse_arg(&topic_id)?;
            app.progress()
                .mark_lesson_complete(&lesson_id, &topic_id)
                .await?;
            print_json(&json!({ "success": true }))
        }
        Commands::Status { lesson_id } => {
            let lesson_id: LessonId = parse_arg(&lesson_id)?;
            let completed = app.progress().is_lesson_complete(&lesson_id).await?;
            print_json(&json!({ "completed": completed }))
        }
        Commands::Progress {
            topic_id: Some(topic_id),
        } => {
            let topic_id: TopicId = parse_arg(&topic_id)?;
            print_json(&app.progress().topic_progress(&topic_id).await?)
        }
        Commands::Progress { topic_id: None } => print_json(&app.progress().all_progress().await?),
        Commands::Seed { files } => {
            let mut documents = Vec::with_capacity(files.len());
            for path in files {
                let doc = std::fs::read_to_string(&path)
                    .map_err(|source| CliError::Read { path, source })?;
                documents.push(doc);
            }
            print_json(&catalog.load_documents(&documents).await?)
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        process::exit(err.exit_code());
    }
}
