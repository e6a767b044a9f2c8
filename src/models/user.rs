use serde::{Deserialize, Serialize};

use crate::services::leveling;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    #[serde(rename = "STUDENT")]
    Student,
    #[serde(rename = "ADMIN")]
    Admin,
}

impl UserRole {
    /// School ids issued to staff carry an `ADMIN-` prefix.
    pub fn from_school_id(school_id: &str) -> Self {
        if school_id.to_uppercase().starts_with("ADMIN-") {
            UserRole::Admin
        } else {
            UserRole::Student
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Student => "STUDENT",
            UserRole::Admin => "ADMIN",
        }
    }
}

/// The session user record. Points and XP are the same counter; `level`
/// is derived from `points` and recomputed on every points change, never
/// trusted from storage or the remote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub school_id: String,
    #[serde(default)]
    pub class_room: Option<String>,
    pub role: UserRole,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub xp: i64,
    #[serde(default = "default_level")]
    pub level: u32,
}

fn default_level() -> u32 {
    1
}

impl User {
    /// Re-derive the xp mirror and the level from the points counter.
    pub fn recompute_derived(&mut self) {
        self.xp = self.points;
        self.level = leveling::level_for_points(self.points);
    }

    pub fn with_derived(mut self) -> Self {
        self.recompute_derived();
        self
    }
}
