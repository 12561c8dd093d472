use crate::DbError;
use analytics::{FieldColorSettings, ThresholdRule};
use chrono::{DateTime, NaiveDate, Utc};
use core_types::{DailyMetricRow, FontSize, UserSettings, UserSettingsUpdate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use std::collections::BTreeMap;
use uuid::Uuid;

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

/// One row of `daily_ad_metrics`, as shown on the monitor page.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AdMetricsRow {
    pub record_date: NaiveDate,
    pub team_name: String,
    pub adser: String,
    pub ad_id: String,
    pub page_id: String,
    pub content: String,
    pub facebook_account: String,
    pub target_audience: String,
    pub exclude_audience: String,
    pub status: String,
    pub budget: Option<Decimal>,
    pub note: String,
    pub one_dollar_per_cover: Option<Decimal>,
    pub cpm_cost_per_inquiry: Option<Decimal>,
    pub facebook_cost_per_inquiry: Option<Decimal>,
    pub cost_per_deposit: Option<Decimal>,
    pub total_inquiries: Option<Decimal>,
    pub wasted_inquiries: Option<Decimal>,
    pub net_inquiries: Option<Decimal>,
    pub actual_spend: Option<Decimal>,
    pub registrations: Option<Decimal>,
    pub deposits_count: Option<Decimal>,
    pub new_player_value_thb: Option<Decimal>,
    pub existing_users: Option<Decimal>,
    pub avg_player_value: Option<Decimal>,
    pub silent_inquiries: Option<Decimal>,
    pub repeat_inquiries: Option<Decimal>,
    pub existing_user_inquiries: Option<Decimal>,
    pub spam_inquiries: Option<Decimal>,
    pub blocked_inquiries: Option<Decimal>,
    pub under_18_inquiries: Option<Decimal>,
    pub over_50_inquiries: Option<Decimal>,
    pub foreigner_inquiries: Option<Decimal>,
}

/// Filters for the monitor query. `None` means "all".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorFilter {
    pub team: Option<String>,
    pub adser: Option<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

/// A user and when they were last seen, for the admin view.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserPresence {
    pub username: String,
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub username: String,
    pub action: String,
    pub created_at: DateTime<Utc>,
}

/// Colour rules for one team's table field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamColorSetting {
    pub team_name: String,
    pub field_name: String,
    #[serde(flatten)]
    pub rules: FieldColorSettings,
}

// The settings columns of `users`, as stored.
#[derive(Debug, FromRow)]
struct DbUserSettings {
    sidebar_collapsed: bool,
    theme: String,
    color_theme: String,
    last_filter_range: String,
    background_style: String,
    font_size: String,
}

impl TryFrom<DbUserSettings> for UserSettings {
    type Error = DbError;

    fn try_from(row: DbUserSettings) -> Result<Self, Self::Error> {
        let invalid = |e: core_types::CoreError| DbError::InvalidData(e.to_string());
        Ok(UserSettings {
            sidebar_collapsed: row.sidebar_collapsed,
            theme: row.theme.parse().map_err(invalid)?,
            color_theme: row.color_theme.parse().map_err(invalid)?,
            last_filter_range: row.last_filter_range.parse().map_err(invalid)?,
            background_style: row.background_style,
            font_size: row.font_size.parse::<FontSize>().map_err(invalid)?,
        })
    }
}

#[derive(Debug, FromRow)]
struct DbTeamColorSetting {
    team_name: String,
    field_name: String,
    text_color_rules: Json<Vec<ThresholdRule>>,
    background_color_rules: Json<Vec<ThresholdRule>>,
}

impl From<DbTeamColorSetting> for TeamColorSetting {
    fn from(row: DbTeamColorSetting) -> Self {
        Self {
            team_name: row.team_name,
            field_name: row.field_name,
            rules: FieldColorSettings {
                text_color_rules: row.text_color_rules.0,
                background_color_rules: row.background_color_rules.0,
            },
        }
    }
}

const USER_SETTINGS_COLUMNS: &str =
    "sidebar_collapsed, theme, color_theme, last_filter_range, background_style, font_size";

/// `SELECT` list for `daily_metrics`, in `DailyMetricRow` field order.
fn daily_metric_columns() -> String {
    let mut columns = vec!["record_date", "team_name"];
    columns.extend(DailyMetricRow::METRIC_COLUMNS);
    columns.join(", ")
}

/// The upsert for one `daily_metrics` row. Bind `record_date`, `team_name`,
/// then the metric values in `METRIC_COLUMNS` order. A later write to the same
/// day and team replaces every metric column.
fn upsert_daily_metrics_sql() -> String {
    let column_count = DailyMetricRow::METRIC_COLUMNS.len() + 2;
    let placeholders: Vec<String> = (1..=column_count).map(|i| format!("${}", i)).collect();
    let updates: Vec<String> = DailyMetricRow::METRIC_COLUMNS
        .iter()
        .map(|c| format!("{c} = EXCLUDED.{c}"))
        .collect();
    format!(
        "INSERT INTO daily_metrics ({}) VALUES ({}) \
         ON CONFLICT (record_date, team_name) DO UPDATE SET {}, updated_at = NOW()",
        daily_metric_columns(),
        placeholders.join(", "),
        updates.join(", ")
    )
}

fn map_unique_violation(e: sqlx::Error, what: &str) -> DbError {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DbError::Conflict(what.to_string())
        }
        other => other.into(),
    }
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Cheap round trip used by the health endpoint.
    pub async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Daily metrics
    // ---------------------------------------------------------------------

    /// Fetches every `daily_metrics` row, oldest day first.
    pub async fn get_all_daily_metrics(&self) -> Result<Vec<DailyMetricRow>, DbError> {
        let sql = format!(
            "SELECT {} FROM daily_metrics ORDER BY record_date ASC, team_name ASC",
            daily_metric_columns()
        );
        let rows = sqlx::query_as::<_, DailyMetricRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Fetches the `daily_metrics` rows with `start <= record_date <= end`.
    pub async fn get_daily_metrics_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyMetricRow>, DbError> {
        let sql = format!(
            "SELECT {} FROM daily_metrics WHERE record_date BETWEEN $1 AND $2 \
             ORDER BY record_date ASC, team_name ASC",
            daily_metric_columns()
        );
        let rows = sqlx::query_as::<_, DailyMetricRow>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Upserts a batch of metric rows within a single transaction for atomicity.
    /// Either every row is written or none is.
    pub async fn upsert_daily_metrics(&self, rows: &[DailyMetricRow]) -> Result<u64, DbError> {
        let sql = upsert_daily_metrics_sql();
        let mut tx = self.pool.begin().await?;
        let mut affected = 0;

        for row in rows {
            let mut query = sqlx::query(&sql).bind(row.record_date).bind(&row.team_name);
            for value in row.metric_values() {
                query = query.bind(value);
            }
            affected += query.execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(affected)
    }

    // ---------------------------------------------------------------------
    // Monitor
    // ---------------------------------------------------------------------

    /// Per-ad rows in the filter's window, newest day first, then by team.
    pub async fn get_ad_metrics(
        &self,
        filter: &MonitorFilter,
    ) -> Result<Vec<AdMetricsRow>, DbError> {
        let rows = sqlx::query_as::<_, AdMetricsRow>(
            r#"
            SELECT
                record_date, team_name, adser, ad_id, page_id, content, facebook_account,
                target_audience, exclude_audience, status, budget, note, one_dollar_per_cover,
                cpm_cost_per_inquiry, facebook_cost_per_inquiry, cost_per_deposit, total_inquiries,
                wasted_inquiries, net_inquiries, actual_spend, registrations, deposits_count,
                new_player_value_thb, existing_users, avg_player_value, silent_inquiries,
                repeat_inquiries, existing_user_inquiries, spam_inquiries, blocked_inquiries,
                under_18_inquiries, over_50_inquiries, foreigner_inquiries
            FROM daily_ad_metrics
            WHERE record_date BETWEEN $1 AND $2
              AND ($3::text IS NULL OR team_name = $3)
              AND ($4::text IS NULL OR adser = $4)
            ORDER BY record_date DESC, team_name ASC
            "#,
        )
        .bind(filter.start)
        .bind(filter.end)
        .bind(filter.team.as_deref())
        .bind(filter.adser.as_deref())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ---------------------------------------------------------------------
    // Users & sessions
    // ---------------------------------------------------------------------

    /// Inserts a user and returns its id. A taken username is a `Conflict`.
    pub async fn create_user(&self, username: &str, password_hash: &str) -> Result<i64, DbError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2) RETURNING id",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "username already exists"))?;
        Ok(id)
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<DbUser>, DbError> {
        let user = sqlx::query_as::<_, DbUser>(
            "SELECT id, username, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_user_by_id(&self, user_id: i64) -> Result<DbUser, DbError> {
        sqlx::query_as::<_, DbUser>("SELECT id, username, password_hash FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)
    }

    pub async fn update_password(&self, user_id: i64, password_hash: &str) -> Result<(), DbError> {
        let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    /// Appends an entry such as `login` or `change_password` to the activity log.
    pub async fn log_activity(&self, user_id: i64, action: &str) -> Result<(), DbError> {
        sqlx::query("INSERT INTO activity_logs (user_id, action) VALUES ($1, $2)")
            .bind(user_id)
            .bind(action)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn touch_last_seen(&self, user_id: i64, now: DateTime<Utc>) -> Result<(), DbError> {
        sqlx::query("UPDATE users SET last_seen = $1 WHERE id = $2")
            .bind(now)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn create_session(
        &self,
        user_id: i64,
        token: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// The owner of `token`, if the session exists and has not expired at `now`.
    pub async fn find_session_user(
        &self,
        token: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<DbUser>, DbError> {
        let user = sqlx::query_as::<_, DbUser>(
            r#"
            SELECT u.id, u.username, u.password_hash
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = $1 AND s.expires_at > $2
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ---------------------------------------------------------------------
    // User settings
    // ---------------------------------------------------------------------

    pub async fn get_user_settings(&self, user_id: i64) -> Result<UserSettings, DbError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_SETTINGS_COLUMNS);
        let row = sqlx::query_as::<_, DbUserSettings>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)?;
        row.try_into()
    }

    /// Writes the provided fields and keeps the rest. Returns the stored result.
    pub async fn update_user_settings(
        &self,
        user_id: i64,
        update: &UserSettingsUpdate,
    ) -> Result<UserSettings, DbError> {
        let sql = format!(
            r#"
            UPDATE users SET
                sidebar_collapsed = COALESCE($2, sidebar_collapsed),
                theme             = COALESCE($3, theme),
                color_theme       = COALESCE($4, color_theme),
                last_filter_range = COALESCE($5, last_filter_range),
                background_style  = COALESCE($6, background_style),
                font_size         = COALESCE($7, font_size)
            WHERE id = $1
            RETURNING {}
            "#,
            USER_SETTINGS_COLUMNS
        );
        let row = sqlx::query_as::<_, DbUserSettings>(&sql)
            .bind(user_id)
            .bind(update.sidebar_collapsed)
            .bind(update.theme.map(|t| t.as_str()))
            .bind(update.color_theme.map(|t| t.as_str()))
            .bind(update.last_filter_range.map(|r| r.as_str()))
            .bind(update.background_style.as_deref())
            .bind(update.font_size.map(String::from))
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)?;
        row.try_into()
    }

    // ---------------------------------------------------------------------
    // Admin
    // ---------------------------------------------------------------------

    /// Every user with their last heartbeat, most recently seen first.
    pub async fn get_user_presence(&self) -> Result<Vec<UserPresence>, DbError> {
        let users = sqlx::query_as::<_, UserPresence>(
            "SELECT username, last_seen FROM users \
             ORDER BY last_seen DESC NULLS LAST, username ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn get_recent_activity(&self, limit: i64) -> Result<Vec<ActivityLogEntry>, DbError> {
        let entries = sqlx::query_as::<_, ActivityLogEntry>(
            r#"
            SELECT u.username, a.action, a.created_at
            FROM activity_logs a
            JOIN users u ON a.user_id = u.id
            ORDER BY a.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    // ---------------------------------------------------------------------
    // Team colour settings
    // ---------------------------------------------------------------------

    pub async fn get_team_color_settings(&self) -> Result<Vec<TeamColorSetting>, DbError> {
        let rows = sqlx::query_as::<_, DbTeamColorSetting>(
            r#"
            SELECT team_name, field_name, text_color_rules, background_color_rules
            FROM team_color_settings
            ORDER BY team_name ASC, field_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TeamColorSetting::from).collect())
    }

    /// Applies the same per-field rules to every team in `team_names`, in one
    /// transaction.
    pub async fn save_team_color_settings(
        &self,
        team_names: &[String],
        settings: &BTreeMap<String, FieldColorSettings>,
    ) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        for team_name in team_names {
            for (field_name, field) in settings {
                sqlx::query(
                    r#"
                    INSERT INTO team_color_settings
                        (team_name, field_name, text_color_rules, background_color_rules)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (team_name, field_name) DO UPDATE SET
                        text_color_rules = EXCLUDED.text_color_rules,
                        background_color_rules = EXCLUDED.background_color_rules
                    "#,
                )
                .bind(team_name)
                .bind(field_name)
                .bind(Json(&field.text_color_rules))
                .bind(Json(&field.background_color_rules))
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_binds_every_column_and_updates_every_metric() {
        let sql = upsert_daily_metrics_sql();
        assert!(sql.contains("$28)"));
        assert!(!sql.contains("$29"));
        assert!(sql.contains("ON CONFLICT (record_date, team_name) DO UPDATE SET"));
        for column in DailyMetricRow::METRIC_COLUMNS {
            assert!(sql.contains(&format!("{column} = EXCLUDED.{column}")), "{column}");
        }
        assert!(!sql.contains("team_name = EXCLUDED"));
    }

    #[test]
    fn select_list_starts_with_the_key() {
        assert!(daily_metric_columns().starts_with("record_date, team_name, kpi_budget_used_pct"));
        assert!(daily_metric_columns().ends_with("foreigner_inquiries"));
    }

    #[test]
    fn stored_settings_are_parsed_into_the_closed_schema() {
        let row = DbUserSettings {
            sidebar_collapsed: true,
            theme: "dark".to_string(),
            color_theme: "theme-rose".to_string(),
            last_filter_range: "this_month".to_string(),
            background_style: "bg-gradient-default".to_string(),
            font_size: "14px".to_string(),
        };
        let settings = UserSettings::try_from(row).unwrap();
        assert_eq!(settings.theme, core_types::Theme::Dark);
        assert_eq!(settings.font_size.px(), 14);
    }

    #[test]
    fn corrupt_stored_settings_are_invalid_data() {
        let row = DbUserSettings {
            sidebar_collapsed: false,
            theme: "neon".to_string(),
            color_theme: "theme-blue".to_string(),
            last_filter_range: "today".to_string(),
            background_style: "bg-gradient-default".to_string(),
            font_size: "16px".to_string(),
        };
        assert!(matches!(UserSettings::try_from(row), Err(DbError::InvalidData(_))));
    }

    #[test]
    fn color_setting_serializes_flat_in_camel_case() {
        let setting = TeamColorSetting {
            team_name: "Alpha".to_string(),
            field_name: "cpm".to_string(),
            rules: FieldColorSettings::default(),
        };
        let json = serde_json::to_value(&setting).unwrap();
        assert_eq!(json["teamName"], "Alpha");
        assert_eq!(json["fieldName"], "cpm");
        assert!(json["textColorRules"].as_array().unwrap().is_empty());
    }
}
