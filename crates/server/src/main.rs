//! # Blueprint Server
//!
//! REST API and CLI for the Blueprint design workflow. Design runs execute
//! in background tasks tracked in an in-memory registry; lessons and chunk
//! data persist under the data directory.

use anyhow::Context;
use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};

use blueprint_core::catalog::{self, USE_CASES};
use blueprint_core::memory::{JsonLessonStore, LessonMemory};
use blueprint_core::models::{LlmProvider, ModelConfig};
use blueprint_core::retrieval::SqliteChunkStore;
use blueprint_core::skills::tools::WebResearchTool;
use blueprint_core::workflow::{Workflow, WorkflowConfig, WorkflowServices, WorkflowState};

// =============================================================================
// CLI
// =============================================================================

#[derive(Parser)]
#[command(name = "blueprint")]
#[command(about = "AI multi-agent design workflow for telecom use cases")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 8000)]
        port: u16,
    },
    /// Run one design workflow in the terminal
    Run {
        /// What to design, e.g. "Design a system for the smart life use case"
        query: String,
        /// Maximum feedback loop iterations
        #[arg(short, long, default_value_t = 3)]
        max_iterations: u32,
    },
}

// =============================================================================
// API Models
// =============================================================================

/// Status of a design task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Request to start a design workflow
#[derive(Debug, Deserialize, ToSchema)]
struct DesignRequest {
    /// User query describing what to design
    query: String,
    /// Maximum feedback loop iterations (1-5)
    #[serde(default = "default_max_iterations")]
    max_iterations: u32,
}

fn default_max_iterations() -> u32 {
    3
}

/// Response when starting a design task
#[derive(Debug, Serialize, ToSchema)]
struct DesignTaskResponse {
    task_id: String,
    status: TaskStatus,
    message: String,
}

/// Terminal outcome of a design run
#[derive(Debug, Clone, Serialize, ToSchema)]
struct DesignResult {
    use_case_id: Option<String>,
    use_case_name: Option<String>,
    description_summary: Option<String>,
    requirement_list: Option<String>,
    system_design: Option<String>,
    feedback: Option<String>,
    is_approved: bool,
    iteration: u32,
    final_response: Option<String>,
    error: Option<String>,
}

impl From<&WorkflowState> for DesignResult {
    fn from(state: &WorkflowState) -> Self {
        Self {
            use_case_id: state.use_case_id.clone(),
            use_case_name: state.use_case_name.clone(),
            description_summary: state.description_summary.clone(),
            requirement_list: state.requirement_list.clone(),
            system_design: state.system_design.clone(),
            feedback: state.feedback.clone(),
            is_approved: state.is_approved,
            iteration: state.iteration,
            final_response: state.final_response.clone(),
            error: state.error.clone(),
        }
    }
}

/// Status of a design task, with the result once finished
#[derive(Debug, Serialize, ToSchema)]
struct DesignStatusResponse {
    task_id: String,
    status: TaskStatus,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    result: Option<DesignResult>,
    error: Option<String>,
}

/// Information about a use case
#[derive(Debug, Serialize, ToSchema)]
struct UseCaseInfo {
    use_case_id: String,
    name: String,
    category: String,
}

/// List of available use cases
#[derive(Debug, Serialize, ToSchema)]
struct UseCaseListResponse {
    use_cases: Vec<UseCaseInfo>,
    total: usize,
}

/// One stored lesson
#[derive(Debug, Serialize, ToSchema)]
struct LessonInfo {
    lesson: String,
    created_at: DateTime<Utc>,
}

/// Lessons for one use case
#[derive(Debug, Serialize, ToSchema)]
struct UseCaseLessonsResponse {
    use_case_id: String,
    use_case_name: String,
    lessons: Vec<LessonInfo>,
}

/// All stored lessons
#[derive(Debug, Serialize, ToSchema)]
struct AllLessonsResponse {
    use_cases: Vec<UseCaseLessonsResponse>,
    total_lessons: usize,
}

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    chunk_count: i64,
    lessons_count: usize,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        list_use_cases,
        start_design,
        get_design_status,
        get_all_lessons,
        get_use_case_lessons,
        clear_all_lessons,
    ),
    components(schemas(
        TaskStatus,
        DesignRequest,
        DesignTaskResponse,
        DesignResult,
        DesignStatusResponse,
        UseCaseInfo,
        UseCaseListResponse,
        LessonInfo,
        UseCaseLessonsResponse,
        AllLessonsResponse,
        HealthResponse,
    )),
    info(
        title = "Blueprint Design System API",
        description = "Designs AI multi-agent systems for ETSI telecom use cases"
    )
)]
struct ApiDoc;

// =============================================================================
// App State
// =============================================================================

/// One entry in the task registry
#[derive(Debug, Clone)]
struct TaskRecord {
    status: TaskStatus,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    result: Option<DesignResult>,
    error: Option<String>,
}

#[derive(Clone)]
struct AppState {
    tasks: Arc<RwLock<HashMap<String, TaskRecord>>>,
    services: WorkflowServices,
    memory: Arc<JsonLessonStore>,
    chunks: Arc<SqliteChunkStore>,
}

fn data_dir() -> PathBuf {
    std::env::var("BLUEPRINT_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./data"))
}

/// Wire up every workflow collaborator.
///
/// Classification, embedding, and research summarization run on the local
/// Ollama endpoint; design and critique run on Groq.
fn build_state() -> anyhow::Result<AppState> {
    let dir = data_dir();

    let memory = Arc::new(
        JsonLessonStore::new(dir.join("lessons.json")).context("failed to open lesson store")?,
    );
    let chunks = Arc::new(
        SqliteChunkStore::open_at(dir.join("chunks.db")).context("failed to open chunk store")?,
    );

    let local = ModelConfig::with_provider(LlmProvider::Ollama);
    let classifier_llm = Arc::new(local.client()?);
    let embedder = Arc::new(local.client()?);
    let research_summarizer = Arc::new(local.client()?);

    let designer_llm = Arc::new(
        ModelConfig::with_provider(LlmProvider::Groq)
            .with_temperature(0.3)
            .client()?,
    );
    let critic_llm = Arc::new(ModelConfig::with_provider(LlmProvider::Groq).client()?);

    let brave_key = std::env::var("BRAVE_API_KEY").unwrap_or_default();
    let researcher = Arc::new(WebResearchTool::new(brave_key, research_summarizer));

    let services = WorkflowServices {
        embedder,
        retriever: chunks.clone(),
        classifier_llm,
        designer_llm,
        critic_llm,
        researcher,
        memory: memory.clone(),
    };

    Ok(AppState {
        tasks: Arc::new(RwLock::new(HashMap::new())),
        services,
        memory,
        chunks,
    })
}

// =============================================================================
// Handlers
// =============================================================================

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, detail: &str) -> ApiError {
    (status, Json(serde_json::json!({ "detail": detail })))
}

/// Health check
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses((status = 200, description = "Service health", body = HealthResponse))
)]
async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let chunk_count = state.chunks.count().unwrap_or(0);
    let lessons_count = state
        .memory
        .all()
        .await
        .map(|entries| entries.iter().map(|e| e.lessons.len()).sum())
        .unwrap_or(0);

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        chunk_count,
        lessons_count,
    }))
}

/// List all available use cases
#[utoipa::path(
    get,
    path = "/api/v1/use-cases",
    responses((status = 200, description = "Catalog of use cases", body = UseCaseListResponse))
)]
async fn list_use_cases() -> Json<UseCaseListResponse> {
    let use_cases: Vec<UseCaseInfo> = USE_CASES
        .iter()
        .map(|uc| UseCaseInfo {
            use_case_id: uc.id.to_string(),
            name: uc.name.to_string(),
            category: uc.category.as_str().to_string(),
        })
        .collect();
    let total = use_cases.len();

    Json(UseCaseListResponse { use_cases, total })
}

/// Start a new design workflow
#[utoipa::path(
    post,
    path = "/api/v1/design",
    request_body = DesignRequest,
    responses(
        (status = 200, description = "Design task accepted", body = DesignTaskResponse),
        (status = 400, description = "Invalid request")
    )
)]
async fn start_design(
    State(state): State<AppState>,
    Json(request): Json<DesignRequest>,
) -> Result<Json<DesignTaskResponse>, ApiError> {
    if request.query.trim().len() < 5 {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "query must be at least 5 characters",
        ));
    }
    if !(1..=5).contains(&request.max_iterations) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "max_iterations must be between 1 and 5",
        ));
    }

    let task_id = uuid_v4();
    state.tasks.write().await.insert(
        task_id.clone(),
        TaskRecord {
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
            result: None,
            error: None,
        },
    );

    let task_state = state.clone();
    let query = request.query.clone();
    let max_iterations = request.max_iterations;
    let spawned_task_id = task_id.clone();
    tokio::spawn(async move {
        run_design_task(task_state, spawned_task_id, query, max_iterations).await;
    });

    info!(task_id, "design task accepted");
    Ok(Json(DesignTaskResponse {
        task_id,
        status: TaskStatus::Pending,
        message: "Design workflow started".to_string(),
    }))
}

/// Drive one workflow run and record its outcome in the task registry.
async fn run_design_task(state: AppState, task_id: String, query: String, max_iterations: u32) {
    if let Some(task) = state.tasks.write().await.get_mut(&task_id) {
        task.status = TaskStatus::Running;
    }

    let workflow = Workflow::new(WorkflowConfig { max_iterations }, state.services.clone());
    let terminal = workflow.run(&query).await;

    let mut tasks = state.tasks.write().await;
    if let Some(task) = tasks.get_mut(&task_id) {
        task.completed_at = Some(Utc::now());
        task.result = Some(DesignResult::from(&terminal));
        if let Some(err) = &terminal.error {
            task.status = TaskStatus::Failed;
            task.error = Some(err.clone());
            error!(task_id, error = %err, "design task failed");
        } else {
            task.status = TaskStatus::Completed;
        }
    }
}

/// Get the status of a design task
#[utoipa::path(
    get,
    path = "/api/v1/design/{task_id}",
    params(("task_id" = String, Path, description = "Task identifier")),
    responses(
        (status = 200, description = "Task status", body = DesignStatusResponse),
        (status = 404, description = "Task not found")
    )
)]
async fn get_design_status(
    State(state): State<AppState>,
    AxumPath(task_id): AxumPath<String>,
) -> Result<Json<DesignStatusResponse>, ApiError> {
    let tasks = state.tasks.read().await;
    let task = tasks
        .get(&task_id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Task not found"))?;

    Ok(Json(DesignStatusResponse {
        task_id,
        status: task.status,
        created_at: task.created_at,
        completed_at: task.completed_at,
        result: task.result.clone(),
        error: task.error.clone(),
    }))
}

/// Get all learned lessons
#[utoipa::path(
    get,
    path = "/api/v1/lessons",
    responses((status = 200, description = "All stored lessons", body = AllLessonsResponse))
)]
async fn get_all_lessons(
    State(state): State<AppState>,
) -> Result<Json<AllLessonsResponse>, ApiError> {
    let entries = state
        .memory
        .all()
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()))?;

    let mut total_lessons = 0;
    let use_cases: Vec<UseCaseLessonsResponse> = entries
        .into_iter()
        .filter(|e| !e.lessons.is_empty())
        .map(|e| {
            total_lessons += e.lessons.len();
            UseCaseLessonsResponse {
                use_case_id: e.use_case_id,
                use_case_name: e.use_case_name,
                lessons: e
                    .lessons
                    .into_iter()
                    .map(|l| LessonInfo {
                        lesson: l.lesson,
                        created_at: l.created_at,
                    })
                    .collect(),
            }
        })
        .collect();

    Ok(Json(AllLessonsResponse {
        use_cases,
        total_lessons,
    }))
}

/// Get lessons for a specific use case
#[utoipa::path(
    get,
    path = "/api/v1/lessons/{use_case_id}",
    params(("use_case_id" = String, Path, description = "Use case identifier, e.g. 5.1.1")),
    responses(
        (status = 200, description = "Lessons for the use case", body = UseCaseLessonsResponse),
        (status = 404, description = "Use case not found")
    )
)]
async fn get_use_case_lessons(
    State(state): State<AppState>,
    AxumPath(use_case_id): AxumPath<String>,
) -> Result<Json<UseCaseLessonsResponse>, ApiError> {
    let use_case = catalog::find_by_id(&use_case_id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Use case not found"))?;

    let lessons = state
        .memory
        .get_lessons(&use_case_id)
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()))?;

    Ok(Json(UseCaseLessonsResponse {
        use_case_id: use_case.id.to_string(),
        use_case_name: use_case.name.to_string(),
        lessons: lessons
            .into_iter()
            .map(|l| LessonInfo {
                lesson: l.lesson,
                created_at: l.created_at,
            })
            .collect(),
    }))
}

/// Clear all learned lessons
#[utoipa::path(
    delete,
    path = "/api/v1/lessons",
    responses((status = 200, description = "All lessons cleared"))
)]
async fn clear_all_lessons(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .memory
        .clear()
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()))?;

    Ok(Json(serde_json::json!({ "message": "All lessons cleared" })))
}

/// OpenAPI document
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

// =============================================================================
// Server
// =============================================================================

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_check))
        .route("/api/v1/use-cases", get(list_use_cases))
        .route("/api/v1/design", post(start_design))
        .route("/api/v1/design/:task_id", get(get_design_status))
        .route("/api/v1/lessons", get(get_all_lessons))
        .route("/api/v1/lessons", delete(clear_all_lessons))
        .route("/api/v1/lessons/:use_case_id", get(get_use_case_lessons))
        .route("/api/v1/openapi.json", get(openapi_json))
        .with_state(state)
}

async fn run_server(port: u16) -> anyhow::Result<()> {
    let state = build_state()?;
    let app = router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(addr, "blueprint server listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

/// Run one workflow in the terminal and print the outcome.
async fn run_once(query: &str, max_iterations: u32) -> anyhow::Result<()> {
    let state = build_state()?;
    let workflow = Workflow::new(WorkflowConfig { max_iterations }, state.services.clone());

    println!("Running design workflow for: {}", query);
    let terminal = workflow.run(query).await;

    if let Some(err) = &terminal.error {
        println!("\nWorkflow error: {}", err);
        if let Some(design) = &terminal.system_design {
            println!("\nPartial design (not finalized):\n{}", design);
        }
        return Ok(());
    }

    match &terminal.final_response {
        Some(report) => println!("\n{}", report),
        None => {
            println!("\nNo final response produced.");
            if let Some(design) = &terminal.system_design {
                println!("\nPartial design:\n{}", design);
            }
        }
    }
    Ok(())
}

/// Generate a simple UUID v4
fn uuid_v4() -> String {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_nanos();
    let rand = RandomState::new().build_hasher().finish() as u32;
    format!("{:x}-{:x}", nanos, rand)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { port } => run_server(port).await,
        Commands::Run {
            query,
            max_iterations,
        } => run_once(&query, max_iterations).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_design_result_from_state() {
        let mut state = WorkflowState::new("q", 3);
        state.use_case_id = Some("5.1.1".to_string());
        state.is_approved = true;
        state.iteration = 2;

        let result = DesignResult::from(&state);
        assert_eq!(result.use_case_id.as_deref(), Some("5.1.1"));
        assert!(result.is_approved);
        assert_eq!(result.iteration, 2);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_uuid_v4_is_unique() {
        assert_ne!(uuid_v4(), uuid_v4());
    }

    #[test]
    fn test_openapi_document_builds() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("/api/v1/design"));
        assert!(json.contains("/api/v1/lessons"));
    }
}
