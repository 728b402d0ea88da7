#![allow(clippy::needless_for_each)]

use super::handlers::{composers, customers, health, persons, teams, users, Message};
use crate::credentials::EmailAddress;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        users::signup,
        users::login,
        composers::find_all_composers,
        composers::find_composer_by_id,
        composers::create_composer,
        composers::update_composer_by_id,
        composers::delete_composer_by_id,
        persons::find_all_persons,
        persons::create_person,
        teams::create_team,
        teams::find_all_teams,
        teams::assign_player_to_team,
        teams::find_all_players_by_team_id,
        teams::delete_team_by_id,
        customers::create_customer,
        customers::create_invoice_by_username,
        customers::find_all_invoices_by_username,
    ),
    components(schemas(
        Message,
        EmailAddress,
        health::Health,
        users::Signup,
        users::Login,
        users::SignupResponse,
        composers::Composer,
        persons::Person,
        persons::Role,
        persons::Dependent,
        teams::NewTeam,
        teams::Team,
        teams::Player,
        customers::NewCustomer,
        customers::Customer,
        customers::Invoice,
        customers::LineItem,
    )),
    tags(
        (name = "users", description = "Signup and login"),
        (name = "composers", description = "Composer documents"),
        (name = "persons", description = "Person documents"),
        (name = "teams", description = "Teams and their players"),
        (name = "customers", description = "Customers and their invoices"),
        (name = "health", description = "Service and database health"),
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
