//! Lead management endpoints.
//!
//! - `GET    /api/leads`                    — list leads, newest-created first
//!   (optional `q`, `sort`, `dir` query parameters)
//! - `POST   /api/leads`                    — create a lead
//! - `GET    /api/leads/{id}`               — fetch one lead
//! - `PATCH  /api/leads/{id}`               — sparse merge-update
//! - `DELETE /api/leads/{id}`               — delete a lead
//! - `POST   /api/leads/{id}/conversation`  — append one conversation entry
//! - `GET    /api/leads/{id}/suggestions`   — AI follow-up suggestions
//!
//! A malformed identifier maps to 400, a missing lead to 404, and a store
//! failure to 503. Merge updates are last-write-wins; the conversation
//! append goes through the repository's atomic append, so the log is never
//! replaced wholesale through this surface.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use leadflow_ai::FollowUpSuggester;
use leadflow_core::domain::lead::{ConversationEntry, Lead, LeadId, LeadPatch, NewLead};
use leadflow_core::listing::{filter_leads, sort_leads, SortDirection};
use leadflow_db::repositories::{LeadRepository, RepositoryError, SqlLeadRepository};
use leadflow_db::DbPool;

#[derive(Clone)]
pub struct LeadsState {
    repo: Arc<dyn LeadRepository>,
    suggester: Arc<FollowUpSuggester>,
}

impl LeadsState {
    pub fn new(repo: Arc<dyn LeadRepository>, suggester: Arc<FollowUpSuggester>) -> Self {
        Self { repo, suggester }
    }
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub dir: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateLeadResponse {
    pub success: bool,
    pub id: LeadId,
}

#[derive(Debug, Serialize)]
pub struct DeleteLeadResponse {
    pub deleted: u64,
}

/// Wire form of a PATCH body. The identifier is rejected if present rather
/// than silently stripped, and the conversation log has its own endpoint.
#[derive(Debug, Deserialize)]
pub struct UpdateLeadBody {
    #[serde(default, alias = "_id")]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub conversation: Option<serde_json::Value>,
    #[serde(flatten)]
    pub patch: LeadPatch,
}

#[derive(Debug, Deserialize)]
pub struct LogConversationRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub lead_id: LeadId,
    pub suggestions: Vec<String>,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(db_pool: DbPool, suggester: Arc<FollowUpSuggester>) -> Router {
    let state = LeadsState::new(Arc::new(SqlLeadRepository::new(db_pool)), suggester);

    Router::new()
        .route("/api/leads", get(list_leads).post(create_lead))
        .route(
            "/api/leads/{id}",
            get(get_lead).patch(update_lead).delete(delete_lead),
        )
        .route("/api/leads/{id}/conversation", post(log_conversation))
        .route("/api/leads/{id}/suggestions", get(lead_suggestions))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn bad_request(message: &str) -> (StatusCode, Json<ApiError>) {
    (StatusCode::BAD_REQUEST, Json(ApiError { error: message.to_string() }))
}

fn not_found() -> (StatusCode, Json<ApiError>) {
    (StatusCode::NOT_FOUND, Json(ApiError { error: "Lead not found".to_string() }))
}

fn store_failure(operation: &'static str, error: RepositoryError) -> (StatusCode, Json<ApiError>) {
    error!(
        event_name = "leads.store_failure",
        operation,
        error = %error,
        "lead store operation failed"
    );
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiError { error: format!("Failed to {operation}") }),
    )
}

fn parse_id(raw: &str) -> ApiResult<LeadId> {
    LeadId::parse(raw).map_err(|_| bad_request("Invalid lead ID"))
}

pub async fn list_leads(
    State(state): State<LeadsState>,
    Query(params): Query<ListQuery>,
) -> ApiResult<Json<Vec<Lead>>> {
    let mut leads =
        state.repo.list().await.map_err(|error| store_failure("fetch leads", error))?;

    if let Some(query) = params.q.as_deref() {
        leads = filter_leads(&leads, query);
    }
    if let Some(sort_key) = params.sort.as_deref() {
        let direction = params
            .dir
            .as_deref()
            .and_then(SortDirection::parse)
            .unwrap_or_default();
        leads = sort_leads(&leads, sort_key, direction);
    }

    Ok(Json(leads))
}

pub async fn create_lead(
    State(state): State<LeadsState>,
    Json(new_lead): Json<NewLead>,
) -> ApiResult<(StatusCode, Json<CreateLeadResponse>)> {
    let lead = Lead::create(LeadId::generate(), new_lead, Utc::now())
        .map_err(|error| bad_request(&error.to_string()))?;
    let id = lead.id;

    state.repo.create(lead).await.map_err(|error| store_failure("create lead", error))?;

    info!(event_name = "leads.created", lead_id = %id, "lead created");
    Ok((StatusCode::CREATED, Json(CreateLeadResponse { success: true, id })))
}

pub async fn get_lead(
    State(state): State<LeadsState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Lead>> {
    let id = parse_id(&id)?;

    let lead = state
        .repo
        .find_by_id(&id)
        .await
        .map_err(|error| store_failure("fetch lead", error))?;

    lead.map(Json).ok_or_else(not_found)
}

pub async fn update_lead(
    State(state): State<LeadsState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateLeadBody>,
) -> ApiResult<Json<Lead>> {
    let id = parse_id(&id)?;

    if body.id.is_some() {
        return Err(bad_request("Lead ID cannot be updated"));
    }
    if body.conversation.is_some() {
        return Err(bad_request(
            "Conversation entries are appended via /api/leads/{id}/conversation",
        ));
    }

    let updated = state
        .repo
        .update(&id, &body.patch)
        .await
        .map_err(|error| store_failure("update lead", error))?;

    match updated {
        Some(lead) => {
            info!(event_name = "leads.updated", lead_id = %id, "lead updated");
            Ok(Json(lead))
        }
        None => {
            warn!(event_name = "leads.update_missing", lead_id = %id, "update hit no record");
            Err(not_found())
        }
    }
}

pub async fn delete_lead(
    State(state): State<LeadsState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteLeadResponse>> {
    let id = parse_id(&id)?;

    let deleted = state
        .repo
        .delete(&id)
        .await
        .map_err(|error| store_failure("delete lead", error))?;

    if !deleted {
        return Err(not_found());
    }

    info!(event_name = "leads.deleted", lead_id = %id, "lead deleted");
    Ok(Json(DeleteLeadResponse { deleted: 1 }))
}

pub async fn log_conversation(
    State(state): State<LeadsState>,
    Path(id): Path<String>,
    Json(request): Json<LogConversationRequest>,
) -> ApiResult<Json<Lead>> {
    let id = parse_id(&id)?;

    if request.message.trim().is_empty() {
        return Err(bad_request("Conversation message must not be blank"));
    }

    let entry = ConversationEntry { message: request.message, timestamp: Utc::now() };
    let updated = state
        .repo
        .append_conversation(&id, entry)
        .await
        .map_err(|error| store_failure("log conversation", error))?;

    updated.map(Json).ok_or_else(not_found)
}

pub async fn lead_suggestions(
    State(state): State<LeadsState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuggestionsResponse>> {
    let id = parse_id(&id)?;

    let lead = state
        .repo
        .find_by_id(&id)
        .await
        .map_err(|error| store_failure("fetch lead", error))?
        .ok_or_else(not_found)?;

    // The suggester absorbs AI failures into a fallback line, so this
    // response is always 200 once the lead resolves.
    let suggestions = state.suggester.suggest(&lead).await;
    Ok(Json(SuggestionsResponse { lead_id: id, suggestions }))
}
