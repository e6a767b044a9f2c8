use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::db::repositories::SettingsRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::user::{User, UserRole};
use crate::services::gateway::GatewayClient;

const KEY_SESSION_USER: &str = "session.user";

/// Owns the persisted session record. Every mutation recomputes the
/// derived xp and level fields before the user is written back, so
/// stored values are never trusted.
#[derive(Clone)]
pub struct SessionService {
    db_pool: DbPool,
    gateway: Arc<GatewayClient>,
}

impl SessionService {
    pub fn new(db_pool: DbPool, gateway: Arc<GatewayClient>) -> Self {
        Self { db_pool, gateway }
    }

    pub fn current_user(&self) -> AppResult<Option<User>> {
        let conn = self.db_pool.get_connection()?;
        match SettingsRepository::get_json::<User>(&conn, KEY_SESSION_USER) {
            Ok(user) => Ok(user.map(User::with_derived)),
            Err(AppError::Serialization(err)) => {
                // A corrupted session record is dropped rather than
                // wedging every later call.
                warn!(target: "app::session", error = %err, "discarding unreadable session");
                SettingsRepository::delete(&conn, KEY_SESSION_USER)?;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn login(&self, school_id: &str) -> AppResult<User> {
        let school_id = school_id.trim();
        if school_id.is_empty() {
            return Err(AppError::validation("school id must not be empty"));
        }

        if let Some(existing) = self.current_user()? {
            if existing.school_id.eq_ignore_ascii_case(school_id) {
                return Ok(existing);
            }
        }

        let user = match self.gateway.login(school_id).await {
            Ok(user) => user,
            Err(err) => {
                warn!(
                    target: "app::session",
                    error = %err,
                    "remote login failed, starting offline session"
                );
                Self::offline_user(None, school_id)
            }
        };

        self.store(&user)?;
        info!(target: "app::session", user_id = %user.id, role = user.role.as_str(), "session started");
        Ok(user)
    }

    pub async fn register(&self, name: &str, school_id: &str) -> AppResult<User> {
        let name = name.trim();
        let school_id = school_id.trim();
        if name.is_empty() {
            return Err(AppError::validation("name must not be empty"));
        }
        if school_id.is_empty() {
            return Err(AppError::validation("school id must not be empty"));
        }

        let user = match self.gateway.register(name, school_id).await {
            Ok(user) => user,
            Err(err) => {
                warn!(
                    target: "app::session",
                    error = %err,
                    "remote registration failed, starting offline session"
                );
                Self::offline_user(Some(name), school_id)
            }
        };

        self.store(&user)?;
        info!(target: "app::session", user_id = %user.id, "account registered");
        Ok(user)
    }

    pub fn logout(&self) -> AppResult<()> {
        let conn = self.db_pool.get_connection()?;
        SettingsRepository::delete(&conn, KEY_SESSION_USER)?;
        info!(target: "app::session", "session cleared");
        Ok(())
    }

    /// Adds a signed point delta to the session user and re-derives
    /// level and xp. Used by the local fallback path and redemptions.
    pub fn apply_points_delta(&self, delta: i64) -> AppResult<User> {
        let mut user = self.current_user()?.ok_or(AppError::NoSession)?;
        user.points += delta;
        user.recompute_derived();
        self.store(&user)?;
        Ok(user)
    }

    /// Replaces the local counter with the remote's authoritative total.
    pub fn adopt_remote_total(&self, total: i64) -> AppResult<User> {
        let mut user = self.current_user()?.ok_or(AppError::NoSession)?;
        user.points = total;
        user.recompute_derived();
        self.store(&user)?;
        Ok(user)
    }

    fn store(&self, user: &User) -> AppResult<()> {
        let conn = self.db_pool.get_connection()?;
        SettingsRepository::upsert_json(&conn, KEY_SESSION_USER, user)
    }

    fn offline_user(name: Option<&str>, school_id: &str) -> User {
        let role = UserRole::from_school_id(school_id);
        let name = name.map(str::to_string).unwrap_or_else(|| match role {
            UserRole::Admin => "School Administrator".to_string(),
            UserRole::Student => "Demo Student".to_string(),
        });

        User {
            id: format!("local-{}", Uuid::new_v4()),
            name,
            school_id: school_id.to_string(),
            class_room: None,
            role,
            points: 0,
            xp: 0,
            level: 1,
        }
    }
}
