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

const INVALID_USERNAME: &str = "Invalid username";

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct LineItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    quantity: Option<f64>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subtotal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tax: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date_created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date_shipped: Option<String>,
    #[serde(default)]
    line_items: Vec<LineItem>,
}

/// Fields accepted when creating a customer; invoices are added separately.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_name: Option<String>,
    #[serde(default)]
    username: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_name: Option<String>,
    #[serde(default)]
    username: String,
    #[serde(default)]
    invoices: Vec<Invoice>,
}

impl From<NewCustomer> for Customer {
    fn from(customer: NewCustomer) -> Self {
        Self {
            first_name: customer.first_name,
            last_name: customer.last_name,
            username: customer.username,
            invoices: Vec::new(),
        }
    }
}

async fn find_customer(
    store: &dyn DocumentStore,
    username: &str,
) -> Result<Stored<Customer>, ApiError> {
    let doc = store
        .find_one(Collection::Customers, "username", username)
        .await?
        .ok_or(ApiError::Unauthorized(INVALID_USERNAME))?;

    Ok(doc.decode()?)
}

#[utoipa::path(
    post,
    path= "/api/customers",
    request_body = NewCustomer,
    responses (
        (status = 200, description = "Customer added", body = Customer),
        (status = 400, description = "Missing payload", body = Message),
        (status = 501, description = "Database Exception", body = Message),
    ),
    tag= "customers"
)]
#[instrument(skip_all)]
pub async fn create_customer(
    store: Extension<Arc<dyn DocumentStore>>,
    payload: Option<Json<NewCustomer>>,
) -> Result<Json<Stored<Customer>>, ApiError> {
    let Some(Json(customer)) = payload else {
        return Err(MISSING_PAYLOAD);
    };

    let customer = Customer::from(customer);
    let doc = store
        .insert(Collection::Customers, to_body(&customer)?)
        .await?;

    debug!(id = %doc.id, username = %customer.username, "customer created");

    Ok(Json(Stored {
        id: doc.id,
        record: customer,
    }))
}

#[utoipa::path(
    post,
    path= "/api/customers/{username}/invoices",
    params(("username" = String, Path, description = "Customer username")),
    request_body = Invoice,
    responses (
        (status = 200, description = "Customer with the new invoice", body = Customer),
        (status = 401, description = "Invalid username", body = Message),
        (status = 501, description = "Database Exception", body = Message),
    ),
    tag= "customers"
)]
#[instrument(skip(store, payload))]
pub async fn create_invoice_by_username(
    store: Extension<Arc<dyn DocumentStore>>,
    Path(username): Path<String>,
    payload: Option<Json<Invoice>>,
) -> Result<Json<Stored<Customer>>, ApiError> {
    let Some(Json(invoice)) = payload else {
        return Err(MISSING_PAYLOAD);
    };

    let customer = find_customer(store.0.as_ref(), &username).await?;

    let customer: Stored<Customer> = store
        .push(Collection::Customers, &customer.id, "invoices", to_body(&invoice)?)
        .await?
        .ok_or(ApiError::Unauthorized(INVALID_USERNAME))?
        .decode()?;

    debug!(invoices = customer.record.invoices.len(), "invoice added");

    Ok(Json(customer))
}

#[utoipa::path(
    get,
    path= "/api/customers/{username}/invoices",
    params(("username" = String, Path, description = "Customer username")),
    responses (
        (status = 200, description = "Array of invoices", body = [Invoice]),
        (status = 401, description = "Invalid username", body = Message),
        (status = 501, description = "Database Exception", body = Message),
    ),
    tag= "customers"
)]
#[instrument(skip(store))]
pub async fn find_all_invoices_by_username(
    store: Extension<Arc<dyn DocumentStore>>,
    Path(username): Path<String>,
) -> Result<Json<Vec<Invoice>>, ApiError> {
    let customer = find_customer(store.0.as_ref(), &username).await?;

    Ok(Json(customer.record.invoices))
}
