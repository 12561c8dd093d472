//! Accounts, sessions, per-user settings, the admin view and team colour rules.

use crate::auth::{AuthUser, hash_password_blocking, verify_password_blocking};
use crate::{AppState, error::AppError};
use analytics::FieldColorSettings;
use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Duration, Utc};
use core_types::{UserSettings, UserSettingsUpdate};
use database::{ActivityLogEntry, TeamColorSetting};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

const RECENT_ACTIVITY_LIMIT: i64 = 50;
const MAX_USERNAME_LEN: usize = 64;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    fn validated(self) -> Result<(String, String), AppError> {
        let username = self.username.trim().to_string();
        if username.is_empty() || self.password.is_empty() {
            return Err(AppError::BadRequest(
                "Username and password are required.".to_string(),
            ));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(AppError::BadRequest(format!(
                "Username must be at most {} characters.",
                MAX_USERNAME_LEN
            )));
        }
        Ok((username, self.password))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: Uuid,
    pub expires_at: DateTime<Utc>,
    pub username: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatus {
    pub username: String,
    pub last_seen: Option<DateTime<Utc>>,
    pub online: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOverview {
    pub all_users: Vec<UserStatus>,
    pub activity_logs: Vec<ActivityLogEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveColorSettingsRequest {
    pub team_names: Vec<String>,
    pub settings: BTreeMap<String, FieldColorSettings>,
}

/// When a session opened at `now` stops being valid.
pub(crate) fn session_expiry(now: DateTime<Utc>, ttl_days: i64) -> Result<DateTime<Utc>, AppError> {
    if ttl_days <= 0 {
        return Err(AppError::Internal(format!(
            "session.ttl_days must be positive, got {}",
            ttl_days
        )));
    }
    Duration::try_days(ttl_days)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| AppError::Internal(format!("session.ttl_days {} is out of range", ttl_days)))
}

/// Online means a heartbeat within `window` of `now`.
pub(crate) fn is_online(
    last_seen: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    window: Duration,
) -> bool {
    last_seen.is_some_and(|seen| now.signed_duration_since(seen) <= window)
}

/// # POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<Credentials>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let (username, password) = credentials.validated()?;
    let password_hash = hash_password_blocking(password).await?;
    let user_id = state.db_repo.create_user(&username, &password_hash).await?;
    tracing::info!(user_id, %username, "Registered new user.");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created successfully." })),
    ))
}

/// # POST /api/auth/login
/// Verifies the password and opens a session. The token goes in
/// `Authorization: Bearer <token>` on later requests.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<LoginResponse>, AppError> {
    let (username, password) = credentials.validated()?;
    let invalid = || AppError::Unauthorized("Invalid username or password".to_string());

    let user = state
        .db_repo
        .find_user_by_username(&username)
        .await?
        .ok_or_else(invalid)?;
    if !verify_password_blocking(password, user.password_hash.clone()).await? {
        tracing::warn!(%username, "Failed login attempt.");
        return Err(invalid());
    }

    let now = Utc::now();
    let token = Uuid::new_v4();
    let expires_at = session_expiry(now, state.config.session.ttl_days)?;
    state.db_repo.create_session(user.id, token, expires_at).await?;
    state.db_repo.log_activity(user.id, "login").await?;
    state.db_repo.touch_last_seen(user.id, now).await?;

    match state.db_repo.delete_expired_sessions(now).await {
        Ok(0) => {}
        Ok(removed) => tracing::debug!(removed, "Removed expired sessions."),
        Err(e) => tracing::warn!(error = ?e, "Failed to remove expired sessions."),
    }

    tracing::info!(user_id = user.id, %username, "User logged in.");
    Ok(Json(LoginResponse {
        token,
        expires_at,
        username: user.username,
    }))
}

/// # GET /api/user/settings
pub async fn get_user_settings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<UserSettings>, AppError> {
    let settings = state.db_repo.get_user_settings(user.id).await?;
    Ok(Json(settings))
}

/// # PUT /api/user/settings
/// Partial update. Unknown fields and values outside the schema are rejected.
pub async fn update_user_settings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(update): Json<UserSettingsUpdate>,
) -> Result<Json<UserSettings>, AppError> {
    update.validate()?;
    let settings = state.db_repo.update_user_settings(user.id, &update).await?;
    Ok(Json(settings))
}

/// # POST /api/user/change-password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    if request.new_password.is_empty() {
        return Err(AppError::BadRequest("New password is required.".to_string()));
    }
    let stored = state.db_repo.find_user_by_id(user.id).await?;
    if !verify_password_blocking(request.current_password, stored.password_hash).await? {
        return Err(AppError::BadRequest(
            "Current password is incorrect.".to_string(),
        ));
    }

    let new_hash = hash_password_blocking(request.new_password).await?;
    state.db_repo.update_password(user.id, &new_hash).await?;
    state.db_repo.log_activity(user.id, "change_password").await?;
    tracing::info!(user_id = user.id, "Password changed.");
    Ok(Json(json!({ "message": "Password changed successfully." })))
}

/// # POST /api/heartbeat
pub async fn heartbeat(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Value>, AppError> {
    state.db_repo.touch_last_seen(user.id, Utc::now()).await?;
    Ok(Json(json!({ "success": true })))
}

/// # GET /api/admin/users
/// Every user with an online flag, plus the latest activity log entries.
pub async fn get_admin_overview(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<Json<AdminOverview>, AppError> {
    let now = Utc::now();
    let window = Duration::try_seconds(state.config.session.online_window_secs).ok_or_else(|| {
        AppError::Internal("session.online_window_secs is out of range".to_string())
    })?;

    let all_users = state
        .db_repo
        .get_user_presence()
        .await?
        .into_iter()
        .map(|u| UserStatus {
            online: is_online(u.last_seen, now, window),
            username: u.username,
            last_seen: u.last_seen,
        })
        .collect();
    let activity_logs = state.db_repo.get_recent_activity(RECENT_ACTIVITY_LIMIT).await?;

    Ok(Json(AdminOverview {
        all_users,
        activity_logs,
    }))
}

/// # GET /api/team-color-settings
pub async fn get_team_color_settings(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<Json<Vec<TeamColorSetting>>, AppError> {
    let settings = state.db_repo.get_team_color_settings().await?;
    Ok(Json(settings))
}

/// # POST /api/team-color-settings
/// Saves the same field rules for every listed team.
pub async fn save_team_color_settings(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Json(request): Json<SaveColorSettingsRequest>,
) -> Result<Json<Value>, AppError> {
    if request.team_names.is_empty() || request.team_names.iter().any(|t| t.trim().is_empty()) {
        return Err(AppError::BadRequest(
            "Team names array and settings object are required".to_string(),
        ));
    }
    state
        .db_repo
        .save_team_color_settings(&request.team_names, &request.settings)
        .await?;
    tracing::info!(
        teams = request.team_names.len(),
        fields = request.settings.len(),
        "Saved team colour settings."
    );
    Ok(Json(json!({ "message": "Settings saved successfully for the group" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn online_window_is_inclusive() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let window = Duration::seconds(120);
        assert!(is_online(Some(now - Duration::seconds(120)), now, window));
        assert!(!is_online(Some(now - Duration::seconds(121)), now, window));
        assert!(!is_online(None, now, window));
    }

    #[test]
    fn session_expiry_rejects_unusable_ttls() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(session_expiry(now, 30).unwrap(), now + Duration::days(30));
        assert!(session_expiry(now, 0).is_err());
        assert!(session_expiry(now, -1).is_err());
        assert!(session_expiry(now, i64::MAX).is_err());
    }

    #[test]
    fn credentials_are_trimmed_and_required() {
        let ok = Credentials {
            username: "  alice ".to_string(),
            password: "pw".to_string(),
        };
        assert_eq!(ok.validated().unwrap().0, "alice");

        let blank = Credentials {
            username: "   ".to_string(),
            password: "pw".to_string(),
        };
        assert!(blank.validated().is_err());
    }

    #[test]
    fn color_request_uses_camel_case() {
        let request: SaveColorSettingsRequest = serde_json::from_value(json!({
            "teamNames": ["Alpha", "Beta"],
            "settings": {
                "cpm_cost_per_inquiry": {
                    "textColorRules": [
                        { "id": "r1", "operator": ">", "threshold": 2.5, "color": "#ef4444" }
                    ],
                    "backgroundColorRules": []
                }
            }
        }))
        .unwrap();
        assert_eq!(request.team_names.len(), 2);
        assert_eq!(request.settings["cpm_cost_per_inquiry"].text_color_rules.len(), 1);
    }
}
