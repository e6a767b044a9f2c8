use serde::{Deserialize, Serialize};

/// Classification buckets produced by the environment scanner. Field names
/// stay snake_case to match the JSON the model is instructed to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanCategory {
    Waste,
    GreaseTrap,
    Hazard,
    Unknown,
}

impl ScanCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ScanCategory::Waste => "waste",
            ScanCategory::GreaseTrap => "grease_trap",
            ScanCategory::Hazard => "hazard",
            ScanCategory::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinColor {
    Yellow,
    Green,
    Red,
    Blue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceStatus {
    Clean,
    Dirty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Red,
    Orange,
    Green,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub category: ScanCategory,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin_color: Option<BinColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upcycling_tip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_status: Option<MaintenanceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    pub point_reward: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbon_saved: Option<f64>,
}

/// Extracted figures from an electricity bill photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillReading {
    pub units: f64,
    pub amount: f64,
    pub month: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_result_accepts_minimal_waste_payload() {
        let raw = r#"{"category":"waste","label":"ขวดพลาสติก","bin_color":"Yellow","point_reward":10}"#;
        let result: ScanResult = serde_json::from_str(raw).unwrap();
        assert_eq!(result.category, ScanCategory::Waste);
        assert_eq!(result.bin_color, Some(BinColor::Yellow));
        assert_eq!(result.point_reward, 10);
        assert!(result.risk_level.is_none());
    }

    #[test]
    fn scan_result_accepts_hazard_payload() {
        let raw = r#"{"category":"hazard","label":"พื้นลื่น","risk_level":"Orange","point_reward":20}"#;
        let result: ScanResult = serde_json::from_str(raw).unwrap();
        assert_eq!(result.category, ScanCategory::Hazard);
        assert_eq!(result.risk_level, Some(RiskLevel::Orange));
    }

    #[test]
    fn grease_trap_status_is_lowercase_on_the_wire() {
        let raw = r#"{"category":"grease_trap","label":"บ่อดักไขมัน","maintenance_status":"dirty","point_reward":50}"#;
        let result: ScanResult = serde_json::from_str(raw).unwrap();
        assert_eq!(result.maintenance_status, Some(MaintenanceStatus::Dirty));
    }
}
