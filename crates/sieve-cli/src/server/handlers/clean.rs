//! Cleaning handlers.
//!
//! Sources and providers are blocking; each request runs on the blocking pool.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use sieve::{
    fetch_table, DatabaseConnection, Record, RunReport, Source, SourceMetadata, Table,
};

use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Multipart field holding the uploaded file.
const FILE_FIELD: &str = "file";

/// Request to clean the result of a SQL query.
#[derive(Debug, Deserialize)]
pub struct CleanDbRequest {
    /// Database URL (e.g., `sqlite:///data/app.db`).
    pub db_url: String,
    /// Query whose rows are cleaned.
    pub query: String,
}

/// Request to clean records fetched from an HTTP API.
#[derive(Debug, Deserialize)]
pub struct CleanApiRequest {
    /// URL returning a JSON array of records.
    pub api_url: String,
    /// Optional query parameters.
    #[serde(default)]
    pub params: Vec<(String, String)>,
}

/// Response for every cleaning endpoint.
#[derive(Debug, Serialize)]
pub struct CleanResponse {
    /// Cleaned rows as records keyed by column name.
    pub cleaned_data: Vec<Record>,
    /// What the run did.
    pub report: RunReport,
    /// Where the data came from.
    pub source: SourceMetadata,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub provider: String,
    pub model: String,
}

/// Liveness check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        provider: state.generator.name().to_string(),
        model: state.generator.config().model.clone(),
    })
}

/// Clean an uploaded CSV, TSV or JSON file.
pub async fn clean_data(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CleanResponse>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload.csv").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }

    let (file_name, bytes) = upload
        .ok_or_else(|| ApiError::BadRequest(format!("Missing '{}' field", FILE_FIELD)))?;
    tracing::info!(file = %file_name, bytes = bytes.len(), "clean-data request");

    run_blocking(state, move || fetch_table(Source::upload(file_name, bytes))).await
}

/// Clean the rows returned by a SQL query.
pub async fn clean_db(
    State(state): State<AppState>,
    Json(request): Json<CleanDbRequest>,
) -> Result<Json<CleanResponse>, ApiError> {
    tracing::info!(query = %request.query, "clean-db request");

    run_blocking(state, move || {
        let connection = DatabaseConnection::open(&request.db_url)?;
        fetch_table(Source::query(&connection, request.query))
    })
    .await
}

/// Clean JSON records fetched from an HTTP API.
pub async fn clean_api(
    State(state): State<AppState>,
    Json(request): Json<CleanApiRequest>,
) -> Result<Json<CleanResponse>, ApiError> {
    tracing::info!(url = %request.api_url, "clean-api request");

    run_blocking(state, move || {
        let source = request
            .params
            .into_iter()
            .fold(Source::api(request.api_url), |source, (key, value)| {
                source.with_param(key, value)
            });
        fetch_table(source)
    })
    .await
}

/// Load and clean on the blocking pool.
async fn run_blocking<F>(state: AppState, load: F) -> Result<Json<CleanResponse>, ApiError>
where
    F: FnOnce() -> Result<(Table, SourceMetadata), sieve::FetchError> + Send + 'static,
{
    let response = tokio::task::spawn_blocking(move || -> Result<CleanResponse, ApiError> {
        let (table, source) = load()?;
        let result = state.pipeline().run(table)?;
        Ok(CleanResponse {
            cleaned_data: result.table.to_records(),
            report: result.report,
            source,
        })
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Cleaning task failed: {}", e)))??;

    Ok(Json(response))
}
