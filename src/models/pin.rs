use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinKind {
    #[serde(rename = "HAZARD")]
    Hazard,
    #[serde(rename = "FULL_BIN")]
    FullBin,
    #[serde(rename = "MAINTENANCE")]
    Maintenance,
}

impl PinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PinKind::Hazard => "HAZARD",
            PinKind::FullBin => "FULL_BIN",
            PinKind::Maintenance => "MAINTENANCE",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "HAZARD" => Some(PinKind::Hazard),
            "FULL_BIN" => Some(PinKind::FullBin),
            "MAINTENANCE" => Some(PinKind::Maintenance),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinStatus {
    #[serde(rename = "OPEN")]
    Open,
    #[serde(rename = "RESOLVED")]
    Resolved,
}

impl PinStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PinStatus::Open => "OPEN",
            PinStatus::Resolved => "RESOLVED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "OPEN" => Some(PinStatus::Open),
            "RESOLVED" => Some(PinStatus::Resolved),
            _ => None,
        }
    }
}

/// A reported issue on the campus map. Coordinates are percentages
/// relative to the reference map image. Status only ever moves
/// OPEN -> RESOLVED.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapPin {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub kind: PinKind,
    pub description: String,
    pub status: PinStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_by: Option<String>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinReportInput {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub kind: PinKind,
    pub description: String,
}
