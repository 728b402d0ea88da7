use super::{ApiError, Message, MISSING_PAYLOAD};
use crate::store::{to_body, Collection, DocumentStore, Stored};
use axum::{
    extract::{Extension, Path},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;

const INVALID_ID: &str = "Invalid composerId";

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Composer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_name: Option<String>,
}

#[utoipa::path(
    get,
    path= "/api/composers",
    responses (
        (status = 200, description = "Array of composer documents", body = [Composer]),
        (status = 501, description = "Database Exception", body = Message),
    ),
    tag= "composers"
)]
#[instrument(skip(store))]
pub async fn find_all_composers(
    store: Extension<Arc<dyn DocumentStore>>,
) -> Result<Json<Vec<Stored<Composer>>>, ApiError> {
    let composers = store
        .find_all(Collection::Composers)
        .await?
        .iter()
        .map(|doc| doc.decode())
        .collect::<Result<Vec<_>, _>>()?;

    debug!(count = composers.len(), "composers");

    Ok(Json(composers))
}

#[utoipa::path(
    get,
    path= "/api/composers/{id}",
    params(("id" = String, Path, description = "Composer document id")),
    responses (
        (status = 200, description = "Composer document", body = Composer),
        (status = 401, description = "Invalid composerId", body = Message),
        (status = 501, description = "Database Exception", body = Message),
    ),
    tag= "composers"
)]
#[instrument(skip(store))]
pub async fn find_composer_by_id(
    store: Extension<Arc<dyn DocumentStore>>,
    Path(id): Path<String>,
) -> Result<Json<Stored<Composer>>, ApiError> {
    let doc = store
        .find_by_id(Collection::Composers, &id)
        .await?
        .ok_or(ApiError::Unauthorized(INVALID_ID))?;

    Ok(Json(doc.decode()?))
}

#[utoipa::path(
    post,
    path= "/api/composers",
    request_body = Composer,
    responses (
        (status = 200, description = "Composer added", body = Composer),
        (status = 400, description = "Missing payload", body = Message),
        (status = 501, description = "Database Exception", body = Message),
    ),
    tag= "composers"
)]
#[instrument(skip_all)]
pub async fn create_composer(
    store: Extension<Arc<dyn DocumentStore>>,
    payload: Option<Json<Composer>>,
) -> Result<Json<Stored<Composer>>, ApiError> {
    let Some(Json(composer)) = payload else {
        return Err(MISSING_PAYLOAD);
    };

    let doc = store
        .insert(Collection::Composers, to_body(&composer)?)
        .await?;

    debug!(id = %doc.id, "composer created");

    Ok(Json(Stored {
        id: doc.id,
        record: composer,
    }))
}

#[utoipa::path(
    put,
    path= "/api/composers/{id}",
    params(("id" = String, Path, description = "Composer document id")),
    request_body = Composer,
    responses (
        (status = 200, description = "Updated composer document", body = Composer),
        (status = 401, description = "Invalid composerId", body = Message),
        (status = 501, description = "Database Exception", body = Message),
    ),
    tag= "composers"
)]
#[instrument(skip(store, payload))]
pub async fn update_composer_by_id(
    store: Extension<Arc<dyn DocumentStore>>,
    Path(id): Path<String>,
    payload: Option<Json<Composer>>,
) -> Result<Json<Stored<Composer>>, ApiError> {
    let Some(Json(update)) = payload else {
        return Err(MISSING_PAYLOAD);
    };

    // only the names are replaced; other fields on the document survive
    let mut doc = store
        .find_by_id(Collection::Composers, &id)
        .await?
        .ok_or(ApiError::Unauthorized(INVALID_ID))?;
    let update = to_body(&update)?;
    doc.body.remove("firstName");
    doc.body.remove("lastName");
    if let Some(fields) = update.as_object() {
        doc.body.extend(fields.clone());
    }

    let doc = store
        .replace(Collection::Composers, &id, serde_json::Value::Object(doc.body))
        .await?
        .ok_or(ApiError::Unauthorized(INVALID_ID))?;

    Ok(Json(doc.decode()?))
}

#[utoipa::path(
    delete,
    path= "/api/composers/{id}",
    params(("id" = String, Path, description = "Composer document id")),
    responses (
        (status = 200, description = "Deleted composer document", body = Composer),
        (status = 401, description = "Invalid composerId", body = Message),
        (status = 501, description = "Database Exception", body = Message),
    ),
    tag= "composers"
)]
#[instrument(skip(store))]
pub async fn delete_composer_by_id(
    store: Extension<Arc<dyn DocumentStore>>,
    Path(id): Path<String>,
) -> Result<Json<Stored<Composer>>, ApiError> {
    let doc = store
        .delete(Collection::Composers, &id)
        .await?
        .ok_or(ApiError::Unauthorized(INVALID_ID))?;

    Ok(Json(doc.decode()?))
}
