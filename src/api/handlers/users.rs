use super::{ApiError, Message, MISSING_PAYLOAD};
use crate::{
    cli::globals::GlobalArgs,
    credentials::{Credentials, EmailAddress, Registration, UserCredential},
    store::Stored,
};
use axum::{extract::Extension, Json};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signup {
    username: String,
    password: String,
    #[serde(default, alias = "emailAddress")]
    email_addresses: Vec<EmailAddress>,
}

#[derive(ToSchema, Deserialize)]
pub struct Login {
    username: String,
    password: String,
}

/// Registered user as returned to the client.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    #[serde(rename = "_id")]
    id: String,
    username: String,
    /// bcrypt hash; only present when the server runs with `--expose-password-hash`.
    #[serde(rename = "password", skip_serializing_if = "Option::is_none")]
    password_hash: Option<String>,
    email_addresses: Vec<EmailAddress>,
}

impl SignupResponse {
    fn new(user: Stored<UserCredential>, expose_password_hash: bool) -> Self {
        Self {
            id: user.id,
            username: user.record.username,
            password_hash: expose_password_hash.then_some(user.record.password_hash),
            email_addresses: user.record.email_addresses,
        }
    }
}

#[utoipa::path(
    post,
    path= "/api/signup",
    request_body = Signup,
    responses (
        (status = 200, description = "User added", body = SignupResponse, content_type = "application/json"),
        (status = 400, description = "Missing username or password", body = Message),
        (status = 401, description = "Username is already in use", body = Message),
        (status = 500, description = "Server Exception", body = Message),
        (status = 501, description = "Database Exception", body = Message),
    ),
    tag= "users"
)]
#[instrument(skip_all)]
pub async fn signup(
    credentials: Extension<Credentials>,
    globals: Extension<GlobalArgs>,
    payload: Option<Json<Signup>>,
) -> Result<Json<SignupResponse>, ApiError> {
    let Some(Json(signup)) = payload else {
        return Err(MISSING_PAYLOAD);
    };

    if signup.username.is_empty() || signup.password.is_empty() {
        return Err(ApiError::BadRequest("Missing username or password"));
    }

    debug!(username = %signup.username, "signup");

    let user = credentials
        .register(Registration {
            username: signup.username,
            password: SecretString::from(signup.password),
            email_addresses: signup.email_addresses,
        })
        .await?;

    Ok(Json(SignupResponse::new(user, globals.expose_password_hash)))
}

#[utoipa::path(
    post,
    path= "/api/login",
    request_body = Login,
    responses (
        (status = 200, description = "User logged in", body = Message, content_type = "application/json"),
        (status = 400, description = "Missing username or password", body = Message),
        (status = 401, description = "Invalid username and/or password", body = Message),
        (status = 500, description = "Server Exception", body = Message),
        (status = 501, description = "Database Exception", body = Message),
    ),
    tag= "users"
)]
#[instrument(skip_all)]
pub async fn login(
    credentials: Extension<Credentials>,
    payload: Option<Json<Login>>,
) -> Result<Json<Message>, ApiError> {
    let Some(Json(login)) = payload else {
        return Err(MISSING_PAYLOAD);
    };

    if login.username.is_empty() || login.password.is_empty() {
        return Err(ApiError::BadRequest("Missing username or password"));
    }

    credentials
        .authenticate(&login.username, SecretString::from(login.password))
        .await?;

    debug!(username = %login.username, "User logged in");

    Ok(Json(Message::new("User logged in")))
}
