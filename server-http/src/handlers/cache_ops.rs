use crate::models::{HashResponse, ListResponse};
use crate::state::AppState;
use crate::validation::validate_key;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use shared::Error;
use tracing::{info, warn};

/// PUT /cache/:key
pub async fn put_blob(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, &'static str), (StatusCode, &'static str)> {
    if let Err(reason) = validate_key(&key) {
        warn!("PUT /cache/{} - rejected: {}", key, reason);
        return Err((StatusCode::BAD_REQUEST, "Invalid key"));
    }

    let written = state.store.put(&key, body).await.map_err(|e| {
        warn!("PUT /cache/{} - failed to store: {}", key, e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to store file")
    })?;

    // The blob is durable at this point; a ledger failure only costs this
    // entry its age-based eviction, so the client still sees success.
    if let Err(e) = state.ledger.save(&key, written).await {
        warn!("PUT /cache/{} - failed to save metadata: {}", key, e);
    }

    info!(
        "PUT /cache/{} - stored and compressed successfully ({} bytes)",
        key, written
    );
    Ok((StatusCode::CREATED, "File stored successfully"))
}

/// GET /cache/:key
pub async fn get_blob(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Vec<u8>, (StatusCode, &'static str)> {
    if validate_key(&key).is_err() {
        return Err((StatusCode::NOT_FOUND, "File not found"));
    }

    match state.store.get(&key).await {
        Ok(payload) => {
            info!("GET /cache/{} - retrieved and decompressed successfully", key);
            Ok(payload)
        }
        Err(Error::NotFound) => {
            info!("GET /cache/{} - not found", key);
            Err((StatusCode::NOT_FOUND, "File not found"))
        }
        Err(e) => {
            warn!("GET /cache/{} - failed to decompress: {}", key, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to decompress file",
            ))
        }
    }
}

/// HEAD /cache/:key
pub async fn head_blob(State(state): State<AppState>, Path(key): Path<String>) -> StatusCode {
    if validate_key(&key).is_ok() && state.store.exists(&key).await {
        info!("HEAD /cache/{} - exists", key);
        StatusCode::OK
    } else {
        info!("HEAD /cache/{} - not found", key);
        StatusCode::NOT_FOUND
    }
}

/// DELETE /cache/:key
pub async fn delete_blob(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<(StatusCode, &'static str), (StatusCode, &'static str)> {
    if validate_key(&key).is_err() {
        return Err((StatusCode::NOT_FOUND, "File not found"));
    }

    match state.store.delete(&key).await {
        Ok(()) => {
            info!("DELETE /cache/{} - deleted successfully", key);
            Ok((StatusCode::OK, "File deleted successfully"))
        }
        Err(Error::NotFound) => {
            info!("DELETE /cache/{} - not found", key);
            Err((StatusCode::NOT_FOUND, "File not found"))
        }
        Err(e) => {
            warn!("DELETE /cache/{} - failed to delete: {}", key, e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete file"))
        }
    }
}

/// GET /cache
pub async fn list_keys(
    State(state): State<AppState>,
) -> Result<Json<ListResponse>, (StatusCode, &'static str)> {
    match state.store.list().await {
        Ok(keys) => {
            info!("LIST /cache - returned {} keys", keys.len());
            let count = keys.len();
            Ok(Json(ListResponse { keys, count }))
        }
        Err(e) => {
            warn!("LIST /cache - failed to read directory: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read cache directory",
            ))
        }
    }
}

/// POST /cache
pub async fn hash_and_store(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<HashResponse>, (StatusCode, &'static str)> {
    let (hash, written) = state.store.put_hashed(body).await.map_err(|e| {
        warn!("POST /cache - failed to store: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to store file")
    })?;

    // Same asymmetry as PUT: the stored blob wins over its bookkeeping.
    if let Err(e) = state.ledger.save(&hash, written).await {
        warn!("POST /cache - failed to save metadata for {}: {}", hash, e);
    }

    info!("POST /cache - stored with hash: {} ({} bytes)", hash, written);
    Ok(Json(HashResponse {
        hash,
        message: "File stored successfully".to_string(),
    }))
}
