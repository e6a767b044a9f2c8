use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::repositories::ActivityRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::activity::{ActivityDetails, ActivityEntry};
use crate::models::user::User;
use crate::services::gateway::{Envelope, GatewayClient};
use crate::services::session_service::SessionService;

/// Result of logging an eco-action. `remote_acknowledged` tells the
/// caller whether the points shown came from the remote total or the
/// local fallback.
#[derive(Debug, Clone)]
pub struct ActivityOutcome {
    pub entry: ActivityEntry,
    pub user: User,
    pub remote_acknowledged: bool,
}

/// Records eco-actions. The remote is the authority on point totals;
/// when it cannot answer, the declared point value of the action (and
/// nothing more) is applied to the local session so the user never
/// loses credit for what they just did.
#[derive(Clone)]
pub struct ActivityService {
    db_pool: DbPool,
    gateway: Arc<GatewayClient>,
    session: SessionService,
}

impl ActivityService {
    pub fn new(db_pool: DbPool, gateway: Arc<GatewayClient>, session: SessionService) -> Self {
        Self {
            db_pool,
            gateway,
            session,
        }
    }

    pub async fn log(&self, details: ActivityDetails) -> AppResult<ActivityOutcome> {
        let user = self.session.current_user()?.ok_or(AppError::NoSession)?;

        let points = details.points();
        let envelope = Self::build_envelope(&user, &details)?;

        let (user, remote_acknowledged) = match self.gateway.log_activity(&envelope).await {
            Ok(Some(new_total)) => {
                debug!(
                    target: "app::activity",
                    new_total,
                    "remote acknowledged activity"
                );
                (self.session.adopt_remote_total(new_total)?, true)
            }
            Ok(None) => {
                warn!(
                    target: "app::activity",
                    "remote answered without a running total, applying local delta"
                );
                (self.session.apply_points_delta(points)?, false)
            }
            Err(err) => {
                warn!(
                    target: "app::activity",
                    error = %err,
                    "remote unreachable, applying local delta"
                );
                (self.session.apply_points_delta(points)?, false)
            }
        };

        let entry = ActivityEntry {
            id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            kind: details.kind(),
            category: details.category(),
            label: details.label(),
            points,
            mime_type: details.evidence().map(|evidence| evidence.mime_type.clone()),
            has_evidence: details.evidence().is_some(),
            ai_data: details.ai_data(),
            remote_ack: remote_acknowledged,
            created_at: Utc::now().to_rfc3339(),
        };

        let conn = self.db_pool.get_connection()?;
        ActivityRepository::insert(&conn, &entry)?;

        info!(
            target: "app::activity",
            kind = entry.kind.as_str(),
            points,
            remote_acknowledged,
            "activity logged"
        );

        Ok(ActivityOutcome {
            entry,
            user,
            remote_acknowledged,
        })
    }

    pub fn history(&self, limit: usize) -> AppResult<Vec<ActivityEntry>> {
        let user = self.session.current_user()?.ok_or(AppError::NoSession)?;
        let conn = self.db_pool.get_connection()?;
        ActivityRepository::list_for_user(&conn, &user.id, limit)
    }

    /// Points recorded locally that the remote never confirmed. Shown in
    /// the profile so users know part of their total is provisional.
    pub fn pending_points(&self) -> AppResult<i64> {
        let user = self.session.current_user()?.ok_or(AppError::NoSession)?;
        let conn = self.db_pool.get_connection()?;
        ActivityRepository::unacked_points(&conn, &user.id)
    }

    fn build_envelope(user: &User, details: &ActivityDetails) -> AppResult<Envelope> {
        let ai_data = match details.ai_data() {
            Some(value) => serde_json::to_string(&value)?,
            None => "{}".to_string(),
        };

        Ok(Envelope::LogActivity {
            user_id: user.id.clone(),
            category: details.category(),
            label: details.label(),
            points: details.points(),
            file_base64: details
                .evidence()
                .map(|evidence| evidence.file_base64.clone()),
            mime_type: details
                .evidence()
                .map(|evidence| evidence.mime_type.clone())
                .unwrap_or_else(|| "image/jpeg".to_string()),
            ai_data,
        })
    }
}
