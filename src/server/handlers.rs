//! Request handlers
//!
//! Every file-manager route checks, in order: credentials (401), request
//! parameters such as the render size (400), the superuser capability (403),
//! and only then the path (404). Request bodies are parsed after the
//! capability check. Filesystem and image work runs on the blocking pool.

use axum::Json;
use axum::body::Body;
use axum::extract::{Form, FromRequest, Multipart, Path, Query, Request, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use log::info;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::SystemTime;
use tokio::task;
use tokio_util::io::ReaderStream;

use crate::auth::{Principal, authenticate, require_superuser};
use crate::error::{ServerError, StorageError};
use crate::server::responses::{attachment_disposition, http_date};
use crate::server::state::AppState;
use crate::storage::{self, FolderListing, clean};

/// Resolves the caller from the `Authorization` header.
fn principal(state: &AppState, headers: &HeaderMap) -> Result<Principal, ServerError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    Ok(authenticate(&state.credentials, header)?)
}

/// Resolves the caller and requires the superuser capability.
fn manager(state: &AppState, headers: &HeaderMap) -> Result<Principal, ServerError> {
    let principal = principal(state, headers)?;
    require_superuser(&principal)?;
    Ok(principal)
}

/// GET /
pub async fn home(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ServerError> {
    let principal = principal(&state, &headers)?;
    Ok(Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "user": principal.username,
        "can_manage": principal.can_manage(),
        "render_sizes": state.renditions.sizes(),
    })))
}

/// Any other GET outside `/images/`
///
/// Folder URLs belong to the browser application, which routes them after
/// `#`: `/holiday/` is answered with a redirect to `/#/holiday/`.
pub async fn browse(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    principal(&state, &headers)?;

    let path = uri.path();
    if method != Method::GET || path.starts_with("/images/") {
        return Err(StorageError::NotFound(path.to_string()).into());
    }

    let location = format!("/#{path}");
    Ok((StatusCode::FOUND, [(header::LOCATION, header_value(&location))]).into_response())
}

/// GET /images/contents/
pub async fn contents_root(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<FolderListing>, ServerError> {
    list_contents(state, &headers, "").await
}

/// GET /images/contents/<path>
pub async fn contents(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw): Path<String>,
) -> Result<Json<FolderListing>, ServerError> {
    list_contents(state, &headers, &raw).await
}

async fn list_contents(
    state: AppState,
    headers: &HeaderMap,
    raw: &str,
) -> Result<Json<FolderListing>, ServerError> {
    let principal = manager(&state, headers)?;
    let path = clean(raw)?;

    let data_root = state.data_root.clone();
    let listing = task::spawn_blocking(move || {
        storage::list_directory(&data_root, &path, principal.can_manage())
    })
    .await??;

    Ok(Json(listing))
}

#[derive(Debug, Deserialize)]
pub struct AddFolderForm {
    #[serde(default)]
    pub parent: String,
    #[serde(default)]
    pub name: String,
}

/// POST /images/add_folder/
pub async fn add_folder(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<FolderListing>, ServerError> {
    let principal = manager(&state, request.headers())?;
    let Form(form) = Form::<AddFolderForm>::from_request(request, &state)
        .await
        .map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let parent = clean(&form.parent)?;

    let data_root = state.data_root.clone();
    let listing = task::spawn_blocking(move || {
        storage::create_folder(&data_root, &parent, &form.name, principal.can_manage())
    })
    .await??;

    Ok(Json(listing))
}

/// POST /images/add_file/
///
/// Multipart fields: optional `parent`, and `upload` carrying the file. The
/// body is buffered by the HTTP layer up to the configured upload limit.
pub async fn add_file(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<FolderListing>, ServerError> {
    let principal = manager(&state, request.headers())?;
    let mut multipart = Multipart::from_request(request, &state)
        .await
        .map_err(|e| ServerError::BadRequest(e.body_text()))?;

    let mut parent = String::new();
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(e.body_text()))?
    {
        match field.name() {
            Some("parent") => {
                parent = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(e.body_text()))?;
            }
            Some("upload") => {
                let filename = field.file_name().map(base_name).unwrap_or_default();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(e.body_text()))?;
                upload = Some((filename, data));
            }
            _ => {}
        }
    }

    let (filename, data) =
        upload.ok_or_else(|| ServerError::BadRequest("missing upload field".into()))?;
    let parent = clean(&parent)?;

    let data_root = state.data_root.clone();
    let listing = task::spawn_blocking(move || {
        let mut content: &[u8] = &data;
        storage::store_file(
            &data_root,
            &parent,
            &filename,
            &mut content,
            principal.can_manage(),
        )
    })
    .await??;

    Ok(Json(listing))
}

/// Strips any client-side directory from an uploaded file name.
fn base_name(filename: &str) -> String {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .to_string()
}

/// POST /images/delete/<path>
pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw): Path<String>,
) -> Result<Json<FolderListing>, ServerError> {
    let principal = manager(&state, &headers)?;
    let path = clean(&raw)?;

    let data_root = state.data_root.clone();
    let listing = task::spawn_blocking(move || {
        storage::delete_entry(&data_root, &path, principal.can_manage())
    })
    .await??;

    Ok(Json(listing))
}

/// GET /images/download/<path>
///
/// The file is streamed from disk in chunks.
pub async fn download(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw): Path<String>,
) -> Result<Response, ServerError> {
    manager(&state, &headers)?;
    let path = clean(&raw)?;

    let data_root = state.data_root.clone();
    let target = path.clone();
    let download =
        task::spawn_blocking(move || storage::prepare_download(&data_root, &target)).await??;

    let file = tokio::fs::File::open(&download.real_path)
        .await
        .map_err(|e| StorageError::from_io(e, &path.file_string()))?;

    info!("Serving download {} ({} bytes)", path.file_string(), download.size);

    Ok((
        [
            (header::CONTENT_TYPE, header_value(&download.mimetype)),
            (header::CONTENT_LENGTH, HeaderValue::from(download.size)),
            (header::CONTENT_DISPOSITION, attachment_disposition(&download.name)),
            (header::LAST_MODIFIED, header_value(&http_date(download.modified))),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct RenderQuery {
    pub size: Option<String>,
}

/// GET /images/render/<path>?size=<n>
pub async fn render(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw): Path<String>,
    Query(query): Query<RenderQuery>,
) -> Result<Response, ServerError> {
    let principal = principal(&state, &headers)?;
    let size = state.renditions.validate_size(query.size.as_deref())?;
    require_superuser(&principal)?;
    let path = clean(&raw)?;

    let renditions = state.renditions.clone();
    let rendition = task::spawn_blocking(move || renditions.render(&path, size)).await??;

    let expires = SystemTime::now() + state.render_max_age;
    let cache_control = format!("max-age={}", state.render_max_age.as_secs());

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/jpeg")),
            (header::LAST_MODIFIED, header_value(&http_date(rendition.modified))),
            (header::EXPIRES, header_value(&http_date(expires))),
            (header::CACHE_CONTROL, header_value(&cache_control)),
        ],
        Body::from(rendition.bytes),
    )
        .into_response())
}

fn header_value(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap_or_else(|_| HeaderValue::from_static(""))
}
