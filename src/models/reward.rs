use serde::{Deserialize, Serialize};

/// A redeemable item in the marketplace catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: String,
    pub title: String,
    pub description: String,
    pub cost: i64,
    pub icon: String,
}

/// Outcome of a successful redemption. The code is shown to staff when
/// the reward is collected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub reward_id: String,
    pub title: String,
    pub cost: i64,
    pub code: String,
    pub redeemed_at: String,
}

/// Built-in catalog. Matches the production marketplace.
pub fn default_catalog() -> Vec<Reward> {
    vec![
        Reward {
            id: "r1".into(),
            title: "Late Pass".into(),
            description: "Come to school late for one day (valid once)".into(),
            cost: 500,
            icon: "clock".into(),
        },
        Reward {
            id: "r2".into(),
            title: "Zero-Waste Snack".into(),
            description: "Free snack from the green canteen".into(),
            cost: 150,
            icon: "cookie".into(),
        },
        Reward {
            id: "r3".into(),
            title: "Library VR Access".into(),
            description: "One hour in the VR learning zone".into(),
            cost: 300,
            icon: "vr".into(),
        },
        Reward {
            id: "r4".into(),
            title: "Eco-Hero Badge".into(),
            description: "Limited edition embroidered badge".into(),
            cost: 1000,
            icon: "badge".into(),
        },
    ]
}
