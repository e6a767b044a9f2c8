use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::models::pin::PinReportInput;
use crate::models::scan::{BillReading, ScanCategory, ScanResult};

pub const COMMUTE_POINTS: i64 = 15;
pub const PIN_REPORT_POINTS: i64 = 30;
pub const GREEN_EVIDENCE_POINTS: i64 = 50;
pub const ENERGY_BILL_POINTS: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    #[serde(rename = "RECYCLE")]
    Recycle,
    #[serde(rename = "COMMUTE")]
    Commute,
    #[serde(rename = "REPORT")]
    Report,
    #[serde(rename = "GREEN_POINT")]
    GreenPoint,
    #[serde(rename = "ENERGY_POINT")]
    EnergyPoint,
    #[serde(rename = "GREASE_TRAP")]
    GreaseTrap,
    #[serde(rename = "HAZARD_SCAN")]
    HazardScan,
    #[serde(rename = "REDEMPTION")]
    Redemption,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Recycle => "RECYCLE",
            ActionKind::Commute => "COMMUTE",
            ActionKind::Report => "REPORT",
            ActionKind::GreenPoint => "GREEN_POINT",
            ActionKind::EnergyPoint => "ENERGY_POINT",
            ActionKind::GreaseTrap => "GREASE_TRAP",
            ActionKind::HazardScan => "HAZARD_SCAN",
            ActionKind::Redemption => "REDEMPTION",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "RECYCLE" => Some(ActionKind::Recycle),
            "COMMUTE" => Some(ActionKind::Commute),
            "REPORT" => Some(ActionKind::Report),
            "GREEN_POINT" => Some(ActionKind::GreenPoint),
            "ENERGY_POINT" => Some(ActionKind::EnergyPoint),
            "GREASE_TRAP" => Some(ActionKind::GreaseTrap),
            "HAZARD_SCAN" => Some(ActionKind::HazardScan),
            "REDEMPTION" => Some(ActionKind::Redemption),
            _ => None,
        }
    }
}

/// Inline evidence attached to a submission (already compressed by the
/// capture layer, which is outside this crate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub file_base64: String,
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

/// What the user actually did, one variant per action kind. Each variant
/// carries only the fields that kind needs; kind, category, label, point
/// value and AI payload are all derived from it.
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityDetails {
    Commute {
        mode: String,
    },
    GreenEvidence {
        label: String,
        evidence: Evidence,
    },
    EnergyBill {
        reading: BillReading,
        evidence: Option<Evidence>,
    },
    Scan {
        result: ScanResult,
        evidence: Option<Evidence>,
    },
    PinReport {
        pin: PinReportInput,
    },
    Redemption {
        reward_id: String,
        title: String,
        cost: i64,
    },
}

impl ActivityDetails {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActivityDetails::Commute { .. } => ActionKind::Commute,
            ActivityDetails::GreenEvidence { .. } => ActionKind::GreenPoint,
            ActivityDetails::EnergyBill { .. } => ActionKind::EnergyPoint,
            ActivityDetails::Scan { result, .. } => match result.category {
                ScanCategory::GreaseTrap => ActionKind::GreaseTrap,
                ScanCategory::Hazard => ActionKind::HazardScan,
                _ => ActionKind::Recycle,
            },
            ActivityDetails::PinReport { .. } => ActionKind::Report,
            ActivityDetails::Redemption { .. } => ActionKind::Redemption,
        }
    }

    pub fn category(&self) -> String {
        match self {
            ActivityDetails::Commute { .. } => "commute".to_string(),
            ActivityDetails::GreenEvidence { .. } => "green".to_string(),
            ActivityDetails::EnergyBill { .. } => "energy".to_string(),
            ActivityDetails::Scan { result, .. } => result.category.as_str().to_string(),
            ActivityDetails::PinReport { .. } => "report".to_string(),
            ActivityDetails::Redemption { .. } => "redemption".to_string(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            ActivityDetails::Commute { mode } => format!("Travel by {mode}"),
            ActivityDetails::GreenEvidence { label, .. } => label.clone(),
            ActivityDetails::EnergyBill { reading, .. } => {
                format!("Electricity Bill - {}", reading.month)
            }
            ActivityDetails::Scan { result, .. } => result.label.clone(),
            ActivityDetails::PinReport { pin } => pin.description.clone(),
            ActivityDetails::Redemption { title, .. } => format!("Redeemed: {title}"),
        }
    }

    /// Declared point value; negative for redemptions.
    pub fn points(&self) -> i64 {
        match self {
            ActivityDetails::Commute { .. } => COMMUTE_POINTS,
            ActivityDetails::GreenEvidence { .. } => GREEN_EVIDENCE_POINTS,
            ActivityDetails::EnergyBill { .. } => ENERGY_BILL_POINTS,
            ActivityDetails::Scan { result, .. } => result.point_reward,
            ActivityDetails::PinReport { .. } => PIN_REPORT_POINTS,
            ActivityDetails::Redemption { cost, .. } => -cost,
        }
    }

    pub fn evidence(&self) -> Option<&Evidence> {
        match self {
            ActivityDetails::GreenEvidence { evidence, .. } => Some(evidence),
            ActivityDetails::EnergyBill { evidence, .. } => evidence.as_ref(),
            ActivityDetails::Scan { evidence, .. } => evidence.as_ref(),
            _ => None,
        }
    }

    /// Structured AI-extracted payload, forwarded to the remote and kept
    /// on the local log entry.
    pub fn ai_data(&self) -> Option<JsonValue> {
        match self {
            ActivityDetails::EnergyBill { reading, .. } => serde_json::to_value(reading).ok(),
            ActivityDetails::Scan { result, .. } => serde_json::to_value(result).ok(),
            ActivityDetails::PinReport { pin } => serde_json::to_value(pin).ok(),
            ActivityDetails::Redemption {
                reward_id, cost, ..
            } => Some(json!({ "rewardId": reward_id, "cost": cost })),
            _ => None,
        }
    }
}

/// An immutable row in the local activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: String,
    pub user_id: String,
    pub kind: ActionKind,
    pub category: String,
    pub label: String,
    pub points: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub has_evidence: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_data: Option<JsonValue>,
    pub remote_ack: bool,
    pub created_at: String,
}
