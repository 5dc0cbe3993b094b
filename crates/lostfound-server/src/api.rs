use std::sync::Arc;

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Path, Query, Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use lostfound_store::{Database, Floor, ImageRef, Item, ItemPatch, StoreError};

use crate::auth;
use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::upload_store::UploadStore;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub uploads: Arc<UploadStore>,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    // Mutating routes sit behind the admin-token middleware; reads are public.
    let admin_routes = Router::new()
        .route("/api/items", post(create_item))
        .route("/api/items/:id", put(update_item).delete(delete_item))
        .route("/api/notices", post(create_notice))
        .route("/api/notices/:index", delete(delete_notice))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    Router::new()
        .route("/", get(health_check))
        .route("/api/auth/login", post(login))
        .route("/api/items", get(list_items))
        .route("/api/items/:id", get(get_item))
        .route("/api/notices", get(list_notices))
        .merge(admin_routes)
        .nest_service(
            crate::upload_store::UPLOADS_PREFIX,
            ServeDir::new(state.uploads.base_path()),
        )
        .fallback(fallback_404)
        .layer(DefaultBodyLimit::max(
            state.config.max_upload_size.saturating_add(1024 * 1024),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if config.cors_allow_all {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
    time: String,
}

#[derive(Deserialize)]
struct LoginRequest {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
}

#[derive(Deserialize)]
struct ListItemsQuery {
    floor: Option<i64>,
    q: Option<String>,
}

#[derive(Serialize)]
struct ItemsResponse {
    items: Vec<Item>,
}

#[derive(Serialize)]
struct CreatedResponse {
    id: String,
}

#[derive(Serialize)]
struct OkResponse {
    ok: bool,
}

#[derive(Deserialize)]
struct NoticeRequest {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize)]
struct NoticesResponse {
    items: Vec<String>,
}

// ---------------------------------------------------------------------------
// Item request payload (JSON or multipart)
// ---------------------------------------------------------------------------

/// Fields of a create/update item request.
///
/// The admin frontend posts `multipart/form-data` when an image file is
/// attached and JSON otherwise; a single extractor accepts both.
#[derive(Default)]
struct ItemPayload {
    title: Option<String>,
    desc: Option<String>,
    floor: Option<i64>,
    /// Uploaded file: declared MIME type plus raw bytes.
    upload: Option<(Option<String>, axum::body::Bytes)>,
    /// Inline image payload (data URL) supplied in the body.
    image: Option<String>,
    /// Image URL supplied in the body.
    image_url: Option<String>,
}

#[derive(Deserialize)]
struct ItemBody {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    desc: Option<String>,
    #[serde(default)]
    floor: Option<i64>,
    #[serde(default)]
    image: Option<String>,
    #[serde(rename = "imageUrl", default)]
    image_url: Option<String>,
}

#[async_trait]
impl FromRequest<AppState> for ItemPayload {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("multipart/form-data") {
            let Json(body): Json<ItemBody> = Json::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(format!("Invalid body: {e}")))?;
            return Ok(ItemPayload {
                title: body.title,
                desc: body.desc,
                floor: body.floor,
                upload: None,
                image: body.image,
                image_url: body.image_url,
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(format!("Multipart error: {e}")))?;
        let mut payload = ItemPayload::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Multipart error: {e}")))?
        {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "title" => payload.title = Some(field_text(field).await?),
                "desc" => payload.desc = Some(field_text(field).await?),
                "floor" => {
                    let text = field_text(field).await?;
                    let floor = text
                        .trim()
                        .parse::<i64>()
                        .map_err(|_| ApiError::BadRequest("floor must be a number".into()))?;
                    payload.floor = Some(floor);
                }
                // a file part carries a content type, a plain text part is an
                // inline data URL
                "image" => {
                    if field.content_type().is_some() {
                        let mime = field.content_type().map(str::to_string);
                        let data = field.bytes().await.map_err(|e| {
                            ApiError::BadRequest(format!("Failed to read field: {e}"))
                        })?;
                        if !data.is_empty() {
                            payload.upload = Some((mime, data));
                        }
                    } else {
                        payload.image = Some(field_text(field).await?);
                    }
                }
                "imageUrl" => payload.image_url = Some(field_text(field).await?),
                _ => {}
            }
        }

        Ok(payload)
    }
}

async fn field_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read field: {e}")))
}

/// Resolve the image channels of a request in priority order: uploaded file,
/// then inline payload, then URL.  `None` means no image field was supplied
/// at all (update keeps the stored image in that case).
async fn resolve_image(
    payload: &ItemPayload,
    state: &AppState,
) -> Result<Option<ImageRef>, ApiError> {
    if let Some((mime, data)) = &payload.upload {
        let path = state.uploads.store_image(data, mime.as_deref()).await?;
        return Ok(Some(ImageRef::StoredPath(path)));
    }

    if payload.image.is_some() || payload.image_url.is_some() {
        return Ok(Some(ImageRef::classify(
            payload.image.clone(),
            payload.image_url.clone(),
        )));
    }

    Ok(None)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn fallback_404() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Not found" })),
    )
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        service: "lostfound-api",
        time: chrono::Utc::now().to_rfc3339(),
    })
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let id = req.id.unwrap_or_default();
    let password = req.password.unwrap_or_default();
    if id.is_empty() || password.is_empty() {
        return Err(ApiError::BadRequest("id/password required".to_string()));
    }

    // Evaluate both comparisons; no early exit on a wrong id.
    let id_ok = constant_time_eq(&id, &state.config.admin_id);
    let password_ok = constant_time_eq(&password, &state.config.admin_password);
    if !(id_ok & password_ok) {
        return Err(ApiError::Unauthorized("Invalid credentials"));
    }

    let token = auth::sign_admin_token(&state.config.jwt_secret, &id)?;

    info!(admin = %id, "Admin logged in");
    Ok(Json(LoginResponse { token }))
}

/// Constant-time string comparison to prevent timing attacks on the static
/// credential pair.
fn constant_time_eq(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;
    a.len() == b.len() && a.as_bytes().ct_eq(b.as_bytes()).unwrap_u8() == 1
}

async fn list_items(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListItemsQuery>,
) -> Result<Json<ItemsResponse>, ApiError> {
    let mut items = {
        let db = state.db.lock().await;
        match query.floor {
            Some(floor) => db.list_floor_items(floor)?,
            None => db.list_all_items()?,
        }
    };

    if let Some(q) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let needle = q.to_lowercase();
        items.retain(|item| matches_query(item, &needle));
    }

    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let base = request_base_url(&headers);
    let items = items
        .into_iter()
        .map(|item| normalize_image(item, &base))
        .collect();

    Ok(Json(ItemsResponse { items }))
}

async fn get_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Item>, ApiError> {
    let (_, item) = state.db.lock().await.find_item(&id)?;
    Ok(Json(normalize_image(item, &request_base_url(&headers))))
}

async fn create_item(
    State(state): State<AppState>,
    payload: ItemPayload,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let floor = payload
        .floor
        .ok_or_else(|| ApiError::BadRequest("floor required".to_string()))?;

    // Reject invalid requests before the image is resolved, so a refused
    // create never leaves an orphaned file in the upload directory.
    Floor::new(floor)?;
    let title = payload.title.as_deref().unwrap_or("");
    if title.trim().is_empty() {
        return Err(StoreError::InvalidInput("title required").into());
    }

    let image = resolve_image(&payload, &state).await?.unwrap_or_default();

    let id = state.db.lock().await.create_item(
        floor,
        title,
        payload.desc.as_deref().unwrap_or(""),
        image,
    )?;

    info!(id = %id, floor, "Item registered");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: ItemPayload,
) -> Result<Json<OkResponse>, ApiError> {
    if let Some(floor) = payload.floor {
        Floor::new(floor)?;
    }

    // Locate first for the same reason: an unknown id must 404 without
    // persisting the upload.  The lock is held across the whole update so
    // the item cannot disappear between the check and the write.
    let db = state.db.lock().await;
    db.find_item(&id)?;

    let image = resolve_image(&payload, &state).await?;
    let patch = ItemPatch {
        title: payload.title.clone(),
        desc: payload.desc.clone(),
        floor: payload.floor,
        image,
    };

    db.update_item(&id, &patch)?;

    info!(id = %id, moved = patch.floor.is_some(), "Item updated");
    Ok(Json(OkResponse { ok: true }))
}

async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    state.db.lock().await.delete_item(&id)?;

    info!(id = %id, "Item deleted");
    Ok(Json(OkResponse { ok: true }))
}

async fn list_notices(State(state): State<AppState>) -> Result<Json<NoticesResponse>, ApiError> {
    let items = state.db.lock().await.list_notices()?;
    Ok(Json(NoticesResponse { items }))
}

async fn create_notice(
    State(state): State<AppState>,
    Json(req): Json<NoticeRequest>,
) -> Result<(StatusCode, Json<OkResponse>), ApiError> {
    let text = req.text.unwrap_or_default();
    state.db.lock().await.append_notice(&text)?;

    info!("Notice appended");
    Ok((StatusCode::CREATED, Json(OkResponse { ok: true })))
}

async fn delete_notice(
    State(state): State<AppState>,
    Path(index): Path<i64>,
) -> Result<Json<OkResponse>, ApiError> {
    state.db.lock().await.remove_notice_at(index)?;

    info!(index, "Notice removed");
    Ok(Json(OkResponse { ok: true }))
}

// ---------------------------------------------------------------------------
// Response shaping helpers
// ---------------------------------------------------------------------------

/// Case-insensitive substring match over title and description.  The needle
/// must already be lowercased.
fn matches_query(item: &Item, needle: &str) -> bool {
    item.title.to_lowercase().contains(needle) || item.desc.to_lowercase().contains(needle)
}

/// Base URL of the current request, honoring a reverse proxy's
/// `X-Forwarded-Proto`.
fn request_base_url(headers: &HeaderMap) -> String {
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{proto}://{host}")
}

/// Rewrite a locally stored upload path into an absolute URL for display.
/// Read-time normalization only; the stored record keeps the relative path.
fn normalize_image(mut item: Item, base: &str) -> Item {
    if let ImageRef::StoredPath(path) = &item.image {
        item.image = ImageRef::External(format!("{base}{path}"));
    }
    item
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
