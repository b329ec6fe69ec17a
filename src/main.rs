use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use jobmatch::config::{LoggingSettings, Settings};
use jobmatch::models::JobSource;
use jobmatch::pipeline::{EmailMonitor, Pipeline, RunOptions};
use jobmatch::routes::{self, AppState};
use jobmatch::services::GmailClient;

#[derive(Debug, Parser)]
#[command(name = "jobmatch", version, about = "Fetch, rank and track job postings")]
struct Cli {
    /// Configuration file; defaults to config/default.toml and config/local.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the HTTP API (default)
    Serve,
    /// Run the pipeline once and print the summary
    Run {
        #[arg(long, value_enum, default_value_t = SourceArg::JobBoards)]
        source: SourceArg,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        min_match_score: Option<f64>,
        #[arg(long)]
        max_jobs: Option<usize>,
        #[arg(long)]
        no_documents: bool,
        #[arg(long)]
        no_tracker: bool,
    },
    /// Generate documents for tracked applications still marked New
    ProcessPending,
    /// Poll the inbox once and update application statuses
    MonitorEmail,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceArg {
    JobBoards,
    CompanyCareers,
}

impl From<SourceArg> for JobSource {
    fn from(value: SourceArg) -> Self {
        match value {
            SourceArg::JobBoards => JobSource::JobBoards,
            SourceArg::CompanyCareers => JobSource::CompanyCareers,
        }
    }
}

/// JSON error response for JSON payload errors
#[derive(Debug, Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

/// `RUST_LOG` wins over the configured level
fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match logging.format.as_str() {
        "pretty" => subscriber.pretty().init(),
        "compact" => subscriber.compact().init(),
        _ => subscriber.init(),
    }
}

fn io_error(e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
}

fn print_json<T: Serialize>(value: &T) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(io_error)?;
    println!("{}", json);
    Ok(())
}

fn email_monitor(settings: &Settings, pipeline: &Pipeline) -> std::io::Result<Option<Arc<EmailMonitor>>> {
    if settings.email.access_token.is_empty() {
        return Ok(None);
    }

    let mailbox = GmailClient::new(&settings.email).map_err(io_error)?;
    Ok(Some(Arc::new(EmailMonitor::new(
        Arc::new(mailbox),
        pipeline.tracker(),
        settings.email.keywords.clone(),
    ))))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .map_err(|e| {
        eprintln!("Configuration error: {}", e);
        io_error(e)
    })?;

    init_logging(&settings.logging);
    info!("Configuration loaded successfully");

    let pipeline = Pipeline::from_settings(&settings).await.map_err(|e| {
        error!("Failed to initialise pipeline: {}", e);
        io_error(e)
    })?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(settings, pipeline).await,
        Command::Run {
            source,
            location,
            min_match_score,
            max_jobs,
            no_documents,
            no_tracker,
        } => {
            let options = RunOptions {
                source: source.into(),
                location,
                min_match_score,
                max_jobs,
                generate_documents: !no_documents,
                update_tracker: !no_tracker,
            };
            let summary = pipeline.run(options).await.map_err(io_error)?;
            print_json(&summary)
        }
        Command::ProcessPending => {
            let summary = pipeline.process_pending().await.map_err(io_error)?;
            print_json(&summary)
        }
        Command::MonitorEmail => {
            let monitor = email_monitor(&settings, &pipeline)?
                .ok_or_else(|| io_error("GMAIL_ACCESS_TOKEN is not set"))?;
            let summary = monitor.poll().await.map_err(io_error)?;
            print_json(&summary)
        }
    }
}

async fn serve(settings: Settings, pipeline: Pipeline) -> std::io::Result<()> {
    info!("Starting jobmatch service...");

    let monitor = email_monitor(&settings, &pipeline)?;
    if monitor.is_none() {
        info!("Email monitoring disabled: no Gmail access token configured");
    }

    let app_state = AppState {
        pipeline: Arc::new(pipeline),
        monitor,
        email_keywords: settings.email.keywords.clone(),
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
