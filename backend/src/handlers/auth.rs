use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::constants::{DASHBOARD_ROUTE, LOGIN_ROUTE, MIN_PASSWORD_LENGTH, SIGNUP_ROUTE};
use crate::db::profiles;
use crate::error::{AppError, AppResult, Notice};
use crate::models::SkillLevel;
use crate::services::{AuthSession, Identity, SignUpMetadata};
use crate::session::Session;
use crate::state::SharedIdentity;

use super::forms::{require_filled, validate_email, validate_password, FormField};
use super::nav::Navbar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    Login,
    Signup,
}

impl AuthMode {
    /// Anything but an explicit `signup` means login.
    pub fn from_query(mode: Option<&str>) -> Self {
        match mode {
            Some("signup") => AuthMode::Signup,
            _ => AuthMode::Login,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    pub mode: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ModeToggle {
    pub prompt: &'static str,
    pub label: &'static str,
    pub href: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AuthPage {
    pub nav: Navbar,
    pub mode: AuthMode,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub action: &'static str,
    pub fields: Vec<FormField>,
    pub submit_label: &'static str,
    pub loading_label: &'static str,
    pub toggle: ModeToggle,
}

impl AuthPage {
    pub fn new(mode: AuthMode) -> Self {
        let mut fields = Vec::new();
        if mode == AuthMode::Signup {
            fields.push(FormField::text("name", "Name").placeholder("Your name"));
            fields.push(FormField::text("city", "City").placeholder("Your city"));
            fields.push(FormField::skill_level(SkillLevel::default()));
        }
        fields.push(
            FormField::text("email", "Email")
                .of_kind("email")
                .placeholder("you@example.com"),
        );
        fields.push(
            FormField::text("password", "Password")
                .of_kind("password")
                .min_length(MIN_PASSWORD_LENGTH),
        );

        match mode {
            AuthMode::Login => Self {
                nav: Navbar::anonymous(),
                mode,
                title: "Welcome Back",
                subtitle: "Log in to connect with players",
                action: "/api/auth/login",
                fields,
                submit_label: "Log In",
                loading_label: "Loading...",
                toggle: ModeToggle {
                    prompt: "Don't have an account? ",
                    label: "Sign up",
                    href: SIGNUP_ROUTE,
                },
            },
            AuthMode::Signup => Self {
                nav: Navbar::anonymous(),
                mode,
                title: "Join SpinSync",
                subtitle: "Create an account to start playing",
                action: "/api/auth/signup",
                fields,
                submit_label: "Sign Up",
                loading_label: "Loading...",
                toggle: ModeToggle {
                    prompt: "Already have an account? ",
                    label: "Log in",
                    href: LOGIN_ROUTE,
                },
            },
        }
    }
}

/// Signed-in visitors are sent straight to their dashboard.
pub async fn auth_page(
    session: Option<Session>,
    Query(AuthQuery { mode }): Query<AuthQuery>,
) -> Response {
    if session.is_some() {
        return Redirect::to(DASHBOARD_ROUTE).into_response();
    }
    Json(AuthPage::new(AuthMode::from_query(mode.as_deref()))).into_response()
}

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub city: String,
    #[serde(default)]
    pub skill_level: SkillLevel,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub access_token: Option<String>,
    pub notice: Notice,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<&'static str>,
}

impl AuthResponse {
    fn new(session: AuthSession, notice: Notice) -> Self {
        let redirect = session.access_token.as_ref().map(|_| DASHBOARD_ROUTE);
        Self {
            user_id: session.identity.id,
            access_token: session.access_token,
            notice,
            redirect,
        }
    }
}

pub async fn sign_up(
    State(identity): State<SharedIdentity>,
    State(db_pool): State<SqlitePool>,
    Json(req): Json<SignUpRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    require_filled(&[("Name", req.name.as_str()), ("City", req.city.as_str()), ("Email", req.email.as_str())])?;
    validate_email(&req.email)?;
    validate_password(&req.password)?;

    let metadata = SignUpMetadata {
        name: req.name.trim().to_string(),
        city: req.city.trim().to_string(),
        skill_level: req.skill_level,
    };
    let session = identity
        .sign_up(req.email.trim(), &req.password, &metadata)
        .await?;

    // The account exists from here on; a missing profile is restored from
    // the account's metadata at the next login.
    if let Err(err) = profiles::create_profile(
        &db_pool,
        session.identity.id,
        &metadata.name,
        &metadata.city,
        metadata.skill_level,
    )
    .await
    {
        tracing::error!(user_id = %session.identity.id, error = %err, "account created without a profile");
        return Err(err.into());
    }

    tracing::info!(user_id = %session.identity.id, "account created");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::new(
            session,
            Notice::success("Welcome to SpinSync!", "Account created successfully"),
        )),
    ))
}

/// Recreates the profile of an account whose sign-up stopped after the
/// provider step. Accounts without usable metadata are left alone.
async fn restore_profile(db_pool: &SqlitePool, identity: &Identity) -> AppResult<()> {
    if profiles::get_profile(db_pool, identity.id).await?.is_some() {
        return Ok(());
    }
    let Some(metadata) = &identity.metadata else {
        tracing::warn!(user_id = %identity.id, "signed-in account has no profile");
        return Ok(());
    };

    profiles::create_profile(db_pool, identity.id, &metadata.name, &metadata.city, metadata.skill_level)
        .await?;
    tracing::warn!(user_id = %identity.id, "restored missing profile");
    Ok(())
}

pub async fn login(
    State(identity): State<SharedIdentity>,
    State(db_pool): State<SqlitePool>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    require_filled(&[("Email", req.email.as_str()), ("Password", req.password.as_str())])?;

    let session = identity.sign_in(req.email.trim(), &req.password).await?;
    restore_profile(&db_pool, &session.identity).await?;

    tracing::info!(user_id = %session.identity.id, "signed in");
    Ok(Json(AuthResponse::new(
        session,
        Notice::success("Success!", "Logged in successfully"),
    )))
}

pub async fn logout(
    State(identity): State<SharedIdentity>,
    session: Session,
) -> AppResult<Json<Notice>> {
    if let Err(err) = identity.sign_out(&session.access_token).await {
        tracing::warn!(user_id = %session.user_id, error = %err, "sign out failed");
        return Err(AppError::Identity("Failed to log out".to_string()));
    }

    Ok(Json(
        Notice::success("Success", "Logged out successfully").redirect_to("/"),
    ))
}
