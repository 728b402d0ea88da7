use super::{ApiError, Message, MISSING_PAYLOAD};
use crate::store::{to_body, Collection, DocumentStore, Stored};
use axum::{extract::Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Role {
    #[serde(default)]
    text: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Dependent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_name: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_name: Option<String>,
    #[serde(default)]
    roles: Vec<Role>,
    #[serde(default)]
    dependents: Vec<Dependent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    birth_date: Option<String>,
}

#[utoipa::path(
    get,
    path= "/api/persons",
    responses (
        (status = 200, description = "Array of person documents", body = [Person]),
        (status = 501, description = "Database Exception", body = Message),
    ),
    tag= "persons"
)]
#[instrument(skip(store))]
pub async fn find_all_persons(
    store: Extension<Arc<dyn DocumentStore>>,
) -> Result<Json<Vec<Stored<Person>>>, ApiError> {
    let persons = store
        .find_all(Collection::Persons)
        .await?
        .iter()
        .map(|doc| doc.decode())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(persons))
}

#[utoipa::path(
    post,
    path= "/api/persons",
    request_body = Person,
    responses (
        (status = 200, description = "Person added", body = Person),
        (status = 400, description = "Missing payload", body = Message),
        (status = 501, description = "Database Exception", body = Message),
    ),
    tag= "persons"
)]
#[instrument(skip_all)]
pub async fn create_person(
    store: Extension<Arc<dyn DocumentStore>>,
    payload: Option<Json<Person>>,
) -> Result<Json<Stored<Person>>, ApiError> {
    let Some(Json(person)) = payload else {
        return Err(MISSING_PAYLOAD);
    };

    let doc = store.insert(Collection::Persons, to_body(&person)?).await?;

    debug!(id = %doc.id, "person created");

    Ok(Json(Stored {
        id: doc.id,
        record: person,
    }))
}
