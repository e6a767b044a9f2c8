use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::db::repositories::PinRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::pin::{MapPin, PinReportInput, PinStatus};
use crate::models::user::UserRole;
use crate::services::activity_service::{ActivityOutcome, ActivityService};
use crate::services::session_service::SessionService;

#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub pin: MapPin,
    pub activity: ActivityOutcome,
}

/// Campus map issue pins. Reporting a pin earns points through the
/// regular activity path; resolving is an admin action and moves a pin
/// OPEN -> RESOLVED exactly once.
#[derive(Clone)]
pub struct MapService {
    db_pool: DbPool,
    session: SessionService,
    activity: ActivityService,
}

impl MapService {
    pub fn new(db_pool: DbPool, session: SessionService, activity: ActivityService) -> Self {
        Self {
            db_pool,
            session,
            activity,
        }
    }

    pub async fn report(&self, input: PinReportInput) -> AppResult<ReportOutcome> {
        let user = self.session.current_user()?.ok_or(AppError::NoSession)?;

        if input.description.trim().is_empty() {
            return Err(AppError::validation("pin description must not be empty"));
        }
        if !(0.0..=100.0).contains(&input.x) || !(0.0..=100.0).contains(&input.y) {
            return Err(AppError::validation(
                "pin coordinates must be percentages in 0..=100",
            ));
        }

        let pin = MapPin {
            id: Uuid::new_v4().to_string(),
            x: input.x,
            y: input.y,
            kind: input.kind,
            description: input.description.trim().to_string(),
            status: PinStatus::Open,
            reported_by: Some(user.id.clone()),
            created_at: Utc::now().to_rfc3339(),
            resolved_at: None,
        };

        let conn = self.db_pool.get_connection()?;
        PinRepository::insert(&conn, &pin)?;
        drop(conn);

        let activity = self
            .activity
            .log(crate::models::activity::ActivityDetails::PinReport {
                pin: input,
            })
            .await?;

        info!(target: "app::map", pin_id = %pin.id, kind = pin.kind.as_str(), "pin reported");

        Ok(ReportOutcome { pin, activity })
    }

    pub fn pins(&self) -> AppResult<Vec<MapPin>> {
        let conn = self.db_pool.get_connection()?;
        PinRepository::list(&conn)
    }

    pub fn open_pins(&self) -> AppResult<Vec<MapPin>> {
        let conn = self.db_pool.get_connection()?;
        PinRepository::list_open(&conn)
    }

    /// Idempotent; a pin that is already resolved is returned unchanged.
    pub fn resolve(&self, pin_id: &str) -> AppResult<MapPin> {
        let user = self.session.current_user()?.ok_or(AppError::NoSession)?;
        if user.role != UserRole::Admin {
            return Err(AppError::validation("only admins can resolve pins"));
        }

        let conn = self.db_pool.get_connection()?;
        let changed = PinRepository::mark_resolved(&conn, pin_id, &Utc::now().to_rfc3339())?;
        let pin = PinRepository::get(&conn, pin_id)?.ok_or(AppError::NotFound)?;

        if changed {
            info!(target: "app::map", pin_id = %pin.id, "pin resolved");
        }

        Ok(pin)
    }
}
