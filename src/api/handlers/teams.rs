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

const INVALID_ID: &str = "Invalid teamId";

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    salary: Option<f64>,
}

/// Fields accepted when creating a team; players are added separately.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTeam {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mascot: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Team {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mascot: Option<String>,
    #[serde(default)]
    players: Vec<Player>,
}

impl From<NewTeam> for Team {
    fn from(team: NewTeam) -> Self {
        Self {
            name: team.name,
            mascot: team.mascot,
            players: Vec::new(),
        }
    }
}

#[utoipa::path(
    post,
    path= "/api/teams",
    request_body = NewTeam,
    responses (
        (status = 200, description = "Team added", body = Team),
        (status = 400, description = "Missing payload", body = Message),
        (status = 501, description = "Database Exception", body = Message),
    ),
    tag= "teams"
)]
#[instrument(skip_all)]
pub async fn create_team(
    store: Extension<Arc<dyn DocumentStore>>,
    payload: Option<Json<NewTeam>>,
) -> Result<Json<Stored<Team>>, ApiError> {
    let Some(Json(team)) = payload else {
        return Err(MISSING_PAYLOAD);
    };

    let team = Team::from(team);
    let doc = store.insert(Collection::Teams, to_body(&team)?).await?;

    debug!(id = %doc.id, "team created");

    Ok(Json(Stored {
        id: doc.id,
        record: team,
    }))
}

#[utoipa::path(
    get,
    path= "/api/teams",
    responses (
        (status = 200, description = "Array of team documents", body = [Team]),
        (status = 501, description = "Database Exception", body = Message),
    ),
    tag= "teams"
)]
#[instrument(skip(store))]
pub async fn find_all_teams(
    store: Extension<Arc<dyn DocumentStore>>,
) -> Result<Json<Vec<Stored<Team>>>, ApiError> {
    let teams = store
        .find_all(Collection::Teams)
        .await?
        .iter()
        .map(|doc| doc.decode())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(teams))
}

#[utoipa::path(
    post,
    path= "/api/teams/{id}/players",
    params(("id" = String, Path, description = "Team document id")),
    request_body = Player,
    responses (
        (status = 200, description = "Player document", body = Player),
        (status = 401, description = "Invalid teamId", body = Message),
        (status = 501, description = "Database Exception", body = Message),
    ),
    tag= "teams"
)]
#[instrument(skip(store, payload))]
pub async fn assign_player_to_team(
    store: Extension<Arc<dyn DocumentStore>>,
    Path(id): Path<String>,
    payload: Option<Json<Player>>,
) -> Result<Json<Player>, ApiError> {
    let Some(Json(player)) = payload else {
        return Err(MISSING_PAYLOAD);
    };

    let doc = store
        .push(Collection::Teams, &id, "players", to_body(&player)?)
        .await?
        .ok_or(ApiError::Unauthorized(INVALID_ID))?;

    let team: Stored<Team> = doc.decode()?;

    debug!(players = team.record.players.len(), "player assigned");

    Ok(Json(player))
}

#[utoipa::path(
    get,
    path= "/api/teams/{id}/players",
    params(("id" = String, Path, description = "Team document id")),
    responses (
        (status = 200, description = "Array of player documents", body = [Player]),
        (status = 401, description = "Invalid teamId", body = Message),
        (status = 501, description = "Database Exception", body = Message),
    ),
    tag= "teams"
)]
#[instrument(skip(store))]
pub async fn find_all_players_by_team_id(
    store: Extension<Arc<dyn DocumentStore>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Player>>, ApiError> {
    let doc = store
        .find_by_id(Collection::Teams, &id)
        .await?
        .ok_or(ApiError::Unauthorized(INVALID_ID))?;

    let team: Stored<Team> = doc.decode()?;

    Ok(Json(team.record.players))
}

#[utoipa::path(
    delete,
    path= "/api/teams/{id}",
    params(("id" = String, Path, description = "Team document id")),
    responses (
        (status = 200, description = "Deleted team document", body = Team),
        (status = 401, description = "Invalid teamId", body = Message),
        (status = 501, description = "Database Exception", body = Message),
    ),
    tag= "teams"
)]
#[instrument(skip(store))]
pub async fn delete_team_by_id(
    store: Extension<Arc<dyn DocumentStore>>,
    Path(id): Path<String>,
) -> Result<Json<Stored<Team>>, ApiError> {
    let doc = store
        .delete(Collection::Teams, &id)
        .await?
        .ok_or(ApiError::Unauthorized(INVALID_ID))?;

    Ok(Json(doc.decode()?))
}
