//! Account API handlers.
//!
//! ```text
//! POST   /api/users/register              {"username","email","password",...}
//! POST   /api/users/login                 {"username","password"}
//! GET    /api/users/active
//! GET    /api/users/username/{username}
//! GET    /api/users/check/username/{username}
//! GET    /api/users/check/email/{email}
//! GET    /api/users/{id}
//! PUT    /api/users/{id}                  profile patch
//! PUT    /api/users/{id}/password         {"oldPassword","newPassword"}
//! POST   /api/users/{id}/view
//! POST   /api/users/{id}/like
//! DELETE /api/users/{id}/like
//! PUT    /api/users/{id}/deactivate
//! PUT    /api/users/{id}/activate
//! ```
//!
//! Field validation happens here; the service only sees validated types.

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Account, AccountValidationError, AvatarUrl, DisplayName, Email, Error, NewAccount,
    ProfilePatch, RawPassword, SocialLinks, SocialUrl, Username,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::{
    json_error_handler, path_error_handler, query_error_handler, unmatched_route,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{account_id, non_blank, optional, validation_error};

/// Public account representation. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub github_url: Option<String>,
    pub twitter_url: Option<String>,
    pub website_url: Option<String>,
    pub note_count: u32,
    pub view_count: u32,
    pub like_count: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn opt_string<T: AsRef<str>>(value: Option<&T>) -> Option<String> {
    value.map(|v| v.as_ref().to_owned())
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        let profile = account.profile();
        let counters = account.counters();
        Self {
            id: account.id().get(),
            username: account.username().to_string(),
            email: account.email().to_string(),
            display_name: profile.display_name.to_string(),
            avatar_url: opt_string(profile.avatar_url.as_ref()),
            bio: profile.bio.clone(),
            github_url: opt_string(profile.links.github_url.as_ref()),
            twitter_url: opt_string(profile.links.twitter_url.as_ref()),
            website_url: opt_string(profile.links.website_url.as_ref()),
            note_count: counters.note_count,
            view_count: counters.view_count,
            like_count: counters.like_count,
            is_active: account.is_active(),
            created_at: account.created_at(),
            updated_at: account.updated_at(),
        }
    }
}

/// Registration body for `POST /api/users/register`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "secret1")]
    pub password: String,
    /// Defaults to the username when blank.
    #[serde(alias = "nickname")]
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub github_url: Option<String>,
    pub twitter_url: Option<String>,
    pub website_url: Option<String>,
}

impl RegisterRequest {
    fn into_candidate(self) -> Result<NewAccount, Error> {
        Ok(NewAccount {
            username: Username::new(self.username).map_err(validation_error)?,
            email: Email::new(self.email).map_err(validation_error)?,
            password: RawPassword::for_storage(&self.password).map_err(validation_error)?,
            display_name: optional(non_blank(self.display_name), DisplayName::new)?,
            avatar_url: optional(non_blank(self.avatar_url), AvatarUrl::new)?,
            bio: non_blank(self.bio),
            links: SocialLinks {
                github_url: optional(non_blank(self.github_url), |v| {
                    SocialUrl::new("githubUrl", v)
                })?,
                twitter_url: optional(non_blank(self.twitter_url), |v| {
                    SocialUrl::new("twitterUrl", v)
                })?,
                website_url: optional(non_blank(self.website_url), |v| {
                    SocialUrl::new("websiteUrl", v)
                })?,
            },
        })
    }
}

/// Login body for `POST /api/users/login`. `username` also accepts an email.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginRequest {
    #[serde(alias = "identifier")]
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "secret1")]
    pub password: String,
}

/// Profile patch body for `PUT /api/users/{id}`.
///
/// Only these fields are read. Identity fields such as `username`, `email`,
/// `password` or counters are accepted and ignored.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateProfileRequest {
    #[serde(alias = "nickname")]
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub github_url: Option<String>,
    pub twitter_url: Option<String>,
    pub website_url: Option<String>,
}

impl UpdateProfileRequest {
    fn into_patch(self) -> Result<ProfilePatch, Error> {
        Ok(ProfilePatch {
            display_name: optional(self.display_name, DisplayName::new)?,
            avatar_url: optional(self.avatar_url, AvatarUrl::new)?,
            bio: self.bio,
            github_url: optional(self.github_url, |v| SocialUrl::new("githubUrl", v))?,
            twitter_url: optional(self.twitter_url, |v| SocialUrl::new("twitterUrl", v))?,
            website_url: optional(self.website_url, |v| SocialUrl::new("websiteUrl", v))?,
        })
    }
}

/// Body for `PUT /api/users/{id}/password`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Result of an availability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AvailabilityResponse {
    pub available: bool,
}

/// Register a new account.
#[utoipa::path(
    post,
    path = "/api/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AccountView),
        (status = 400, description = "Validation failure or identity taken", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "register"
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let candidate = payload.into_inner().into_candidate()?;
    let account = state.accounts.register(candidate).await?;
    Ok(HttpResponse::Created().json(AccountView::from(&account)))
}

/// Authenticate by username or email.
#[utoipa::path(
    post,
    path = "/api/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated account", body = AccountView),
        (status = 400, description = "Wrong password or invalid request", body = Error),
        (status = 403, description = "Account disabled", body = Error),
        (status = 404, description = "Unknown account", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "login"
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<AccountView>> {
    let LoginRequest { username, password } = payload.into_inner();
    let identifier = username.trim();
    if identifier.is_empty() {
        return Err(validation_error(AccountValidationError::Required {
            field: "username",
        }));
    }
    let password = RawPassword::new(&password).map_err(validation_error)?;
    let account = state.login.login(identifier, &password).await?;
    Ok(web::Json(AccountView::from(&account)))
}

/// List active accounts, newest first.
#[utoipa::path(
    get,
    path = "/api/users/active",
    responses((status = 200, description = "Active accounts", body = [AccountView])),
    tags = ["accounts"],
    operation_id = "listActiveAccounts"
)]
#[get("/active")]
pub async fn list_active(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<AccountView>>> {
    let accounts = state.accounts_query.list_active_accounts().await?;
    Ok(web::Json(accounts.iter().map(AccountView::from).collect()))
}

/// Fetch an account by username.
#[utoipa::path(
    get,
    path = "/api/users/username/{username}",
    params(("username" = String, Path, description = "Account username")),
    responses(
        (status = 200, description = "Account", body = AccountView),
        (status = 404, description = "Unknown account", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "findByUsername"
)]
#[get("/username/{username}")]
pub async fn find_by_username(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<AccountView>> {
    let username = Username::new(path.into_inner()).map_err(validation_error)?;
    let account = state.accounts_query.find_by_username(&username).await?;
    Ok(web::Json(AccountView::from(&account)))
}

/// Check whether a username is free.
#[utoipa::path(
    get,
    path = "/api/users/check/username/{username}",
    params(("username" = String, Path, description = "Candidate username")),
    responses(
        (status = 200, description = "Availability", body = AvailabilityResponse),
        (status = 400, description = "Malformed username", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "checkUsername"
)]
#[get("/check/username/{username}")]
pub async fn check_username(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<AvailabilityResponse>> {
    let username = Username::new(path.into_inner()).map_err(validation_error)?;
    let available = state.accounts_query.is_username_available(&username).await?;
    Ok(web::Json(AvailabilityResponse { available }))
}

/// Check whether an email is free.
#[utoipa::path(
    get,
    path = "/api/users/check/email/{email}",
    params(("email" = String, Path, description = "Candidate email")),
    responses(
        (status = 200, description = "Availability", body = AvailabilityResponse),
        (status = 400, description = "Malformed email", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "checkEmail"
)]
#[get("/check/email/{email}")]
pub async fn check_email(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<AvailabilityResponse>> {
    let email = Email::new(path.into_inner()).map_err(validation_error)?;
    let available = state.accounts_query.is_email_available(&email).await?;
    Ok(web::Json(AvailabilityResponse { available }))
}

/// Fetch an account by id.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account", body = AccountView),
        (status = 404, description = "Unknown account", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "findAccount"
)]
#[get("/{id}")]
pub async fn find_account(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<AccountView>> {
    let id = account_id(path.into_inner())?;
    let account = state.accounts_query.find_account(id).await?;
    Ok(web::Json(AccountView::from(&account)))
}

/// Patch profile fields.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "Account id")),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated account", body = AccountView),
        (status = 400, description = "Invalid field", body = Error),
        (status = 404, description = "Unknown account", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "updateProfile"
)]
#[put("/{id}")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
    payload: web::Json<UpdateProfileRequest>,
) -> ApiResult<web::Json<AccountView>> {
    let id = account_id(path.into_inner())?;
    let patch = payload.into_inner().into_patch()?;
    let account = state.accounts.update_profile(id, patch).await?;
    Ok(web::Json(AccountView::from(&account)))
}

/// Rotate the password after verifying the old one.
#[utoipa::path(
    put,
    path = "/api/users/{id}/password",
    params(("id" = i64, Path, description = "Account id")),
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Wrong old password or weak new password", body = Error),
        (status = 404, description = "Unknown account", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "changePassword"
)]
#[put("/{id}/password")]
pub async fn change_password(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
    payload: web::Json<ChangePasswordRequest>,
) -> ApiResult<HttpResponse> {
    let id = account_id(path.into_inner())?;
    let ChangePasswordRequest {
        old_password,
        new_password,
    } = payload.into_inner();
    let old_password = RawPassword::new(&old_password).map_err(validation_error)?;
    let new_password = RawPassword::for_storage(&new_password).map_err(validation_error)?;
    state
        .accounts
        .change_password(id, &old_password, &new_password)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Record a profile view.
#[utoipa::path(
    post,
    path = "/api/users/{id}/view",
    params(("id" = i64, Path, description = "Account id")),
    responses((status = 204, description = "Recorded")),
    tags = ["accounts"],
    operation_id = "recordView"
)]
#[post("/{id}/view")]
pub async fn record_view(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let id = account_id(path.into_inner())?;
    state.accounts.increment_view_count(id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Add a like.
#[utoipa::path(
    post,
    path = "/api/users/{id}/like",
    params(("id" = i64, Path, description = "Account id")),
    responses((status = 204, description = "Recorded")),
    tags = ["accounts"],
    operation_id = "like"
)]
#[post("/{id}/like")]
pub async fn like(state: web::Data<HttpState>, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let id = account_id(path.into_inner())?;
    state.accounts.increment_like_count(id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Remove a like; a zero count stays at zero.
#[utoipa::path(
    delete,
    path = "/api/users/{id}/like",
    params(("id" = i64, Path, description = "Account id")),
    responses((status = 204, description = "Recorded")),
    tags = ["accounts"],
    operation_id = "unlike"
)]
#[delete("/{id}/like")]
pub async fn unlike(state: web::Data<HttpState>, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let id = account_id(path.into_inner())?;
    state.accounts.decrement_like_count(id).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn set_active(state: &HttpState, raw_id: i64, active: bool) -> ApiResult<HttpResponse> {
    let id = account_id(raw_id)?;
    state.accounts.set_active(id, active).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Disable an account; it can no longer log in.
#[utoipa::path(
    put,
    path = "/api/users/{id}/deactivate",
    params(("id" = i64, Path, description = "Account id")),
    responses(
        (status = 204, description = "Deactivated"),
        (status = 404, description = "Unknown account", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "deactivate"
)]
#[put("/{id}/deactivate")]
pub async fn deactivate(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    set_active(&state, path.into_inner(), false).await
}

/// Re-enable an account.
#[utoipa::path(
    put,
    path = "/api/users/{id}/activate",
    params(("id" = i64, Path, description = "Account id")),
    responses(
        (status = 204, description = "Activated"),
        (status = 404, description = "Unknown account", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "activate"
)]
#[put("/{id}/activate")]
pub async fn activate(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    set_active(&state, path.into_inner(), true).await
}

/// Mount the account routes under `/api/users`.
///
/// Fixed segments are registered before `/{id}` so they are never parsed as
/// ids.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/users")
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .service(register)
            .service(login)
            .service(list_active)
            .service(find_by_username)
            .service(check_username)
            .service(check_email)
            .service(find_account)
            .service(update_profile)
            .service(change_password)
            .service(record_view)
            .service(like)
            .service(unlike)
            .service(deactivate)
            .service(activate)
            .default_service(web::to(unmatched_route)),
    );
}
