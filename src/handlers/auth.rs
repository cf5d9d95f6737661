// src/handlers/auth.rs
use astra::Request;
use serde::Deserialize;
use serde_json::json;

use crate::auth::passwords::{hash_password, verify_password};
use crate::auth::sessions::{create_session, revoke_sessions_for_user};
use crate::auth::verification::{VerificationConfig, VerificationService};
use crate::db::users::{self, NewUser};
use crate::errors::ServerError;
use crate::handlers::{authenticate, now_unix, read_json, AppState};
use crate::responses::{json_created, json_ok, ResultResp};

#[derive(Deserialize)]
struct RegisterRequest {
    name: String,
    surname: String,
    neighborhood: String,
    email: String,
    password: String,
    role: Option<String>,
}

#[derive(Deserialize)]
struct VerifyRequest {
    email: String,
    code: String,
}

#[derive(Deserialize)]
struct ResendRequest {
    email: String,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

pub fn register(req: &mut Request, state: &AppState) -> ResultResp {
    let body: RegisterRequest = read_json(req)?;
    let now = now_unix();

    let email = VerificationService::normalize_email(&body.email)?;
    if body.name.trim().is_empty() || body.surname.trim().is_empty() {
        return Err(ServerError::BadRequest("name and surname are required".into()));
    }
    if body.neighborhood.trim().is_empty() {
        return Err(ServerError::BadRequest("neighborhood is required".into()));
    }
    let role = match body.role.as_deref() {
        None | Some("user") => "user",
        Some("admin") => "admin",
        Some(other) => {
            return Err(ServerError::BadRequest(format!("unknown role: {other}")));
        }
    };

    let password_hash = hash_password(&body.password)?;
    let user = NewUser {
        name: body.name.trim().to_string(),
        surname: body.surname.trim().to_string(),
        neighborhood: body.neighborhood.trim().to_string(),
        email: email.clone(),
        password_hash,
        role: role.to_string(),
    };

    let issued = state.db.with_conn(|conn| {
        users::create_user(conn, &user, now)?;
        VerificationService::new(VerificationConfig::default()).issue(conn, &email, now)
    })?;

    state.mailer.send_verification_code(&issued.email, &issued.code)?;

    json_created(json!({
        "message": "Registration successful. Check your inbox for the verification code."
    }))
}

pub fn verify(req: &mut Request, state: &AppState) -> ResultResp {
    let body: VerifyRequest = read_json(req)?;
    let now = now_unix();

    state.db.with_conn(|conn| {
        VerificationService::new(VerificationConfig::default())
            .redeem(conn, &body.email, &body.code, now)
    })?;

    json_ok(json!({
        "message": "Email verified. You can log in now."
    }))
}

pub fn resend(req: &mut Request, state: &AppState) -> ResultResp {
    let body: ResendRequest = read_json(req)?;
    let now = now_unix();

    let issued = state.db.with_conn(|conn| {
        VerificationService::new(VerificationConfig::default()).issue(conn, &body.email, now)
    })?;

    state.mailer.send_verification_code(&issued.email, &issued.code)?;

    json_ok(json!({ "message": "Verification code sent." }))
}

pub fn login(req: &mut Request, state: &AppState) -> ResultResp {
    let body: LoginRequest = read_json(req)?;
    let now = now_unix();

    let email = VerificationService::normalize_email(&body.email)?;

    let (token, user) = state.db.with_conn(|conn| {
        let user = users::find_by_email(conn, &email)?
            .ok_or_else(|| ServerError::Unauthorized("invalid credentials".into()))?;

        if !verify_password(&user.password_hash, &body.password) {
            return Err(ServerError::Unauthorized("invalid credentials".into()));
        }
        if !user.is_verified {
            return Err(ServerError::Unauthorized("account is not verified".into()));
        }

        let token = create_session(conn, user.id, now)?;
        users::record_login(conn, user.id, now)?;
        Ok((token, user))
    })?;

    json_ok(json!({
        "token": token,
        "user": {
            "id": user.id,
            "name": user.name,
            "surname": user.surname,
            "neighborhood": user.neighborhood,
            "email": user.email,
            "role": user.role,
        }
    }))
}

/// Revoke every live session of the caller.
pub fn logout(req: &Request, state: &AppState) -> ResultResp {
    let now = now_unix();
    let user = authenticate(req, state, now)?;

    state
        .db
        .with_conn(|conn| revoke_sessions_for_user(conn, user.id, now))?;

    json_ok(json!({ "message": "Logged out." }))
}
