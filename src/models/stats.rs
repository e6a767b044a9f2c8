use serde::{Deserialize, Serialize};

/// School-wide aggregates shown on the admin dashboard. When the remote
/// is unreachable the caller falls back to the last cached copy, or a
/// zeroed struct if none exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolStats {
    #[serde(default)]
    pub total_students: i64,
    #[serde(default)]
    pub total_points: i64,
    #[serde(default)]
    pub pending_reports: i64,
    #[serde(default)]
    pub carbon_saved: f64,
}

/// One row on the leaderboard, ordered by points descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub name: String,
    #[serde(default)]
    pub class_room: Option<String>,
    pub points: i64,
    #[serde(default)]
    pub level: u32,
}

/// A locally generated feed card. The feed is decorative and never
/// leaves the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub id: String,
    pub user_name: String,
    pub kind: String,
    pub description: String,
    pub likes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroed_stats_are_the_default() {
        let stats = SchoolStats::default();
        assert_eq!(stats.total_students, 0);
        assert_eq!(stats.carbon_saved, 0.0);
    }

    #[test]
    fn leaderboard_entry_tolerates_missing_level() {
        let raw = r#"{"name":"Ploy","classRoom":"M.5/2","points":4210}"#;
        let entry: LeaderboardEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.points, 4210);
        assert_eq!(entry.level, 0);
    }
}
