//! Web server for the inventory UI
//!
//! Serves the single-page UI, a JSON API per category and the converted
//! item images. Store calls are synchronous file I/O on small tables and
//! run directly inside the handlers, except multipart writes, which may
//! convert an image and go to the blocking pool.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::category::CategoryType;
use crate::error::{StoreError, StoreResult};
use crate::image_processor::ImageUpload;
use crate::inventory::{Inventory, InventorySummary};
use crate::item::Item;
use crate::stats::{CategoryStats, TotalStats};
use crate::store::{ItemFields, ItemStore};

/// Upper bound for request bodies (multipart image uploads)
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Shared application state
#[derive(Clone)]
struct AppState {
    inventory: Arc<Inventory>,
}

/// API response wrapper for read endpoints
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

/// Result of a create or update request
#[derive(Debug, Serialize)]
struct MutationResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
}

type MutationResult = (StatusCode, Json<MutationResponse>);

/// Price statistics payload
#[derive(Serialize)]
struct StatsData {
    total: TotalStats,
    categories: BTreeMap<String, CategoryStats>,
}

impl AppState {
    fn store(&self, slug: &str) -> Result<&ItemStore, StatusCode> {
        CategoryType::parse(slug)
            .map(|category| self.inventory.store(category))
            .ok_or(StatusCode::NOT_FOUND)
    }
}

/// Run store work that may decode and encode images off the async workers
async fn run_blocking<T, F>(task: F) -> StoreResult<T>
where
    F: FnOnce() -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
}

fn status_for(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn internal_error(err: StoreError) -> StatusCode {
    log::error!("Store error: {}", err);
    StatusCode::INTERNAL_SERVER_ERROR
}

fn mutation_ok(message: &str, id: Option<u64>) -> MutationResult {
    (
        StatusCode::OK,
        Json(MutationResponse {
            success: true,
            message: message.to_string(),
            id,
        }),
    )
}

fn mutation_failed(status: StatusCode, message: String) -> MutationResult {
    (
        status,
        Json(MutationResponse {
            success: false,
            message,
            id: None,
        }),
    )
}

fn mutation_error(action: &str, err: StoreError) -> MutationResult {
    if err.is_client_error() {
        log::warn!("{} rejected: {}", action, err);
    } else {
        log::error!("{} failed: {}", action, err);
    }
    mutation_failed(status_for(&err), format!("{} failed: {}", action, err))
}

/// GET / - Serve the web UI (single HTML page)
async fn index_handler() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

/// GET /api/summary
async fn summary_handler(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<InventorySummary>>, StatusCode> {
    let summary = state.inventory.summary().map_err(internal_error)?;
    Ok(ApiResponse::ok(summary))
}

/// GET /api/{category}/items
async fn list_items_handler(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<ApiResponse<Vec<Item>>>, StatusCode> {
    let items = state.store(&category)?.load().map_err(internal_error)?;
    Ok(ApiResponse::ok(items))
}

/// GET /api/{category}/items/{id}
async fn item_handler(
    State(state): State<AppState>,
    Path((category, id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Item>>, StatusCode> {
    match state.store(&category)?.get_by_id(&id) {
        Ok(Some(item)) => Ok(ApiResponse::ok(item)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => Err(internal_error(e)),
    }
}

/// GET /api/{category}/categories
async fn categories_handler(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<ApiResponse<Vec<String>>>, StatusCode> {
    let categories = state.store(&category)?.categories().map_err(internal_error)?;
    Ok(ApiResponse::ok(categories))
}

/// GET /api/{category}/stats
async fn stats_handler(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<ApiResponse<StatsData>>, StatusCode> {
    let (total, categories) = state.store(&category)?.price_stats().map_err(internal_error)?;
    Ok(ApiResponse::ok(StatsData { total, categories }))
}

/// Split a multipart form into text fields and the optional `image` file
async fn read_multipart(
    mut multipart: Multipart,
) -> Result<(ItemFields, Option<ImageUpload>), String> {
    let mut fields = ItemFields::new();
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(|e| e.to_string())?;
            image = Some(ImageUpload::new(filename, bytes.to_vec()));
        } else if !name.is_empty() {
            let value = field.text().await.map_err(|e| e.to_string())?;
            fields.insert(name, value);
        }
    }

    Ok((fields, image))
}

/// POST /api/{category}/items (multipart form, optional `image` file)
async fn create_item_handler(
    State(state): State<AppState>,
    Path(category): Path<String>,
    multipart: Multipart,
) -> MutationResult {
    let Some(category_type) = CategoryType::parse(&category) else {
        return mutation_failed(StatusCode::NOT_FOUND, format!("Unknown category: {}", category));
    };
    let (fields, image) = match read_multipart(multipart).await {
        Ok(parts) => parts,
        Err(e) => return mutation_failed(StatusCode::BAD_REQUEST, format!("Invalid form: {}", e)),
    };

    let inventory = state.inventory.clone();
    let result = run_blocking(move || {
        inventory
            .store(category_type)
            .create(&fields, image.as_ref())
    })
    .await;

    match result {
        Ok(id) => mutation_ok("Created", Some(id)),
        Err(e) => mutation_error("Create", e),
    }
}

/// POST /api/{category}/items/{id} (multipart form, optional `image` file)
async fn update_item_handler(
    State(state): State<AppState>,
    Path((category, id)): Path<(String, String)>,
    multipart: Multipart,
) -> MutationResult {
    let Some(category_type) = CategoryType::parse(&category) else {
        return mutation_failed(StatusCode::NOT_FOUND, format!("Unknown category: {}", category));
    };
    let (fields, image) = match read_multipart(multipart).await {
        Ok(parts) => parts,
        Err(e) => return mutation_failed(StatusCode::BAD_REQUEST, format!("Invalid form: {}", e)),
    };

    let inventory = state.inventory.clone();
    let result = run_blocking(move || {
        inventory
            .store(category_type)
            .update(&id, &fields, image.as_ref())
    })
    .await;

    match result {
        Ok(()) => mutation_ok("Updated", None),
        Err(e) => mutation_error("Update", e),
    }
}

/// Convert a JSON scalar to the raw string stored in the table
fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_fields(body: &Map<String, Value>) -> ItemFields {
    body.iter()
        .map(|(key, value)| (key.clone(), value_to_string(value)))
        .collect()
}

fn store_for_body<'a>(state: &'a AppState, body: &Map<String, Value>) -> Result<&'a ItemStore, MutationResult> {
    let slug = body.get("item_type").map(value_to_string).unwrap_or_default();
    CategoryType::parse(&slug)
        .map(|category| state.inventory.store(category))
        .ok_or_else(|| {
            mutation_failed(
                StatusCode::BAD_REQUEST,
                format!("Unknown item_type: '{}'", slug),
            )
        })
}

/// POST /create_item - JSON body `{ item_type, ...fields }`
async fn create_item_json_handler(
    State(state): State<AppState>,
    Json(body): Json<Map<String, Value>>,
) -> MutationResult {
    let store = match store_for_body(&state, &body) {
        Ok(store) => store,
        Err(response) => return response,
    };

    match store.create(&json_fields(&body), None) {
        Ok(id) => mutation_ok("Created", Some(id)),
        Err(e) => mutation_error("Create", e),
    }
}

/// POST /update_properties - JSON body `{ item_type, item_id, ...fields }`
async fn update_properties_handler(
    State(state): State<AppState>,
    Json(body): Json<Map<String, Value>>,
) -> MutationResult {
    let store = match store_for_body(&state, &body) {
        Ok(store) => store,
        Err(response) => return response,
    };
    let id = body.get("item_id").map(value_to_string).unwrap_or_default();
    if id.trim().is_empty() {
        return mutation_failed(StatusCode::BAD_REQUEST, "Missing item_id".to_string());
    }

    match store.update(&id, &json_fields(&body), None) {
        Ok(()) => mutation_ok("Updated", None),
        Err(e) => mutation_error("Update", e),
    }
}

/// Build the web server router
pub fn create_router(inventory: Arc<Inventory>, image_dir: &std::path::Path) -> Router {
    let state = AppState { inventory };

    Router::new()
        .route("/", get(index_handler))
        .route("/api/summary", get(summary_handler))
        .route(
            "/api/{category}/items",
            get(list_items_handler).post(create_item_handler),
        )
        .route(
            "/api/{category}/items/{id}",
            get(item_handler).post(update_item_handler),
        )
        .route("/api/{category}/categories", get(categories_handler))
        .route("/api/{category}/stats", get(stats_handler))
        .route("/create_item", post(create_item_json_handler))
        .route("/update_properties", post(update_properties_handler))
        .nest_service("/images", ServeDir::new(image_dir))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Start the web server and run until Ctrl-C
pub async fn serve(
    inventory: Arc<Inventory>,
    image_dir: &std::path::Path,
    addr: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(inventory, image_dir);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Web UI listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("Shutdown signal received"),
        Err(e) => {
            log::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
#[path = "web_tests.rs"]
mod tests;
