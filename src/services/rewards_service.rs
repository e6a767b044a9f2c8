use chrono::Utc;
use rand::Rng;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::activity::ActivityDetails;
use crate::models::reward::{default_catalog, Redemption, Reward};
use crate::models::user::User;
use crate::services::activity_service::ActivityService;
use crate::services::session_service::SessionService;

// No 0/O/1/I, the codes get read out loud at a counter.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 6;

#[derive(Debug, Clone)]
pub struct RedemptionOutcome {
    pub redemption: Redemption,
    pub user: User,
}

/// Marketplace redemptions. The balance check happens against the local
/// session before anything is sent; a redemption is recorded as a
/// negative-point activity so it flows through the same reconciliation
/// path as earnings.
#[derive(Clone)]
pub struct RewardsService {
    session: SessionService,
    activity: ActivityService,
    catalog: Vec<Reward>,
}

impl RewardsService {
    pub fn new(session: SessionService, activity: ActivityService) -> Self {
        Self {
            session,
            activity,
            catalog: default_catalog(),
        }
    }

    pub fn catalog(&self) -> &[Reward] {
        &self.catalog
    }

    pub async fn redeem(&self, reward_id: &str) -> AppResult<RedemptionOutcome> {
        let user = self.session.current_user()?.ok_or(AppError::NoSession)?;

        let reward = self
            .catalog
            .iter()
            .find(|reward| reward.id == reward_id)
            .ok_or(AppError::NotFound)?;

        if user.points < reward.cost {
            return Err(AppError::insufficient_points(reward.cost, user.points));
        }

        let outcome = self
            .activity
            .log(ActivityDetails::Redemption {
                reward_id: reward.id.clone(),
                title: reward.title.clone(),
                cost: reward.cost,
            })
            .await?;

        let redemption = Redemption {
            reward_id: reward.id.clone(),
            title: reward.title.clone(),
            cost: reward.cost,
            code: generate_code(),
            redeemed_at: Utc::now().to_rfc3339(),
        };

        info!(
            target: "app::rewards",
            reward_id = %redemption.reward_id,
            cost = redemption.cost,
            "reward redeemed"
        );

        Ok(RedemptionOutcome {
            redemption,
            user: outcome.user,
        })
    }
}

fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..CODE_LENGTH)
        .map(|_| {
            let index = rng.gen_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[index] as char
        })
        .collect();
    format!("SR-{suffix}")
}
