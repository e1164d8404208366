//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every account endpoint together with the request and
//! response schemas. The generated document is served by Swagger UI in debug
//! builds.

use utoipa::OpenApi;

use crate::domain::Error;
use crate::inbound::http::accounts::{
    AccountView, AvailabilityResponse, ChangePasswordRequest, LoginRequest, RegisterRequest,
    UpdateProfileRequest,
};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Accounts API",
        description = "Registration, login, profile maintenance and engagement counters."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::accounts::register,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::list_active,
        crate::inbound::http::accounts::find_by_username,
        crate::inbound::http::accounts::check_username,
        crate::inbound::http::accounts::check_email,
        crate::inbound::http::accounts::find_account,
        crate::inbound::http::accounts::update_profile,
        crate::inbound::http::accounts::change_password,
        crate::inbound::http::accounts::record_view,
        crate::inbound::http::accounts::like,
        crate::inbound::http::accounts::unlike,
        crate::inbound::http::accounts::deactivate,
        crate::inbound::http::accounts::activate,
    ),
    components(schemas(
        Error,
        AccountView,
        RegisterRequest,
        LoginRequest,
        UpdateProfileRequest,
        ChangePasswordRequest,
        AvailabilityResponse
    )),
    tags(
        (name = "accounts", description = "Account lifecycle and engagement")
    )
)]
pub struct ApiDoc;
