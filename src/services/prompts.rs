use serde_json::{json, Value as JsonValue};

/// System instruction for the environment scanner. Labels and tips come
/// back in Thai; the enum-like fields stay in English so they can be
/// validated mechanically.
pub fn environment_system_instruction() -> &'static str {
    r#"You are the SaveRaks Eco-Guardian AI for Surasakmontree School.
Analyze the image and categorize it into EXACTLY ONE of these three lowercase category strings:

1. "waste" (Circular Economy):
   - If it is trash/recyclable.
   - Identify 'bin_color': "Yellow" (Recycle), "Green" (Organic), "Red" (Hazardous), "Blue" (General).
   - Provide 'upcycling_tip' (Thai language) e.g., "แยกฝาขวดไปขายเพื่อเพิ่มมูลค่า".
   - point_reward: 10.

2. "grease_trap" (Water Care):
   - If it is a grease trap or water filter.
   - Identify 'maintenance_status': "clean" or "dirty".
   - "clean" = Clear water surface or well-maintained. "dirty" = Grease layer or food scraps.
   - point_reward: 50.

3. "hazard" (Safety Map):
   - If it is a dangerous spot (flood, broken stairs, construction, exposed wires).
   - Identify 'risk_level': "Red" (Danger), "Orange" (Caution), "Green" (Safe).
   - point_reward: 20.

CRITICAL:
- The 'category' MUST be one of: "waste", "grease_trap", or "hazard".
- Return JSON strictly.
- Use Thai for 'label' and 'upcycling_tip'."#
}

pub fn bill_prompt() -> &'static str {
    "Extract units (kWh), amount (THB), and billing month from this electricity bill. Return JSON."
}

/// Response schema sent with the request, in the provider's own schema
/// dialect (uppercase type names).
pub fn environment_response_schema() -> JsonValue {
    json!({
        "type": "OBJECT",
        "properties": {
            "category": { "type": "STRING", "description": "Must be 'waste', 'grease_trap', or 'hazard'" },
            "label": { "type": "STRING", "description": "Name of the object in Thai" },
            "bin_color": { "type": "STRING", "description": "Yellow, Green, Red, or Blue" },
            "upcycling_tip": { "type": "STRING", "description": "Advice in Thai" },
            "maintenance_status": { "type": "STRING", "description": "clean or dirty" },
            "risk_level": { "type": "STRING", "description": "Red, Orange, or Green" },
            "point_reward": { "type": "INTEGER" }
        },
        "required": ["category", "label", "point_reward"]
    })
}

pub fn bill_response_schema() -> JsonValue {
    json!({
        "type": "OBJECT",
        "properties": {
            "units": { "type": "NUMBER" },
            "amount": { "type": "NUMBER" },
            "month": { "type": "STRING" }
        },
        "required": ["units", "amount", "month"]
    })
}

/// Standard JSON Schema used to validate what actually came back before
/// it is deserialized. Stricter than the request schema: categories and
/// enum fields are pinned to their legal values.
pub fn environment_validation_schema() -> JsonValue {
    json!({
        "type": "object",
        "properties": {
            "category": { "enum": ["waste", "grease_trap", "hazard", "unknown"] },
            "label": { "type": "string", "minLength": 1 },
            "bin_color": { "enum": ["Yellow", "Green", "Red", "Blue"] },
            "upcycling_tip": { "type": "string" },
            "maintenance_status": { "enum": ["clean", "dirty"] },
            "risk_level": { "enum": ["Red", "Orange", "Green"] },
            "point_reward": { "type": "integer", "minimum": 0 },
            "carbon_saved": { "type": "number" }
        },
        "required": ["category", "label", "point_reward"]
    })
}

pub fn bill_validation_schema() -> JsonValue {
    json!({
        "type": "object",
        "properties": {
            "units": { "type": "number", "minimum": 0 },
            "amount": { "type": "number", "minimum": 0 },
            "month": { "type": "string", "minLength": 1 }
        },
        "required": ["units", "amount", "month"]
    })
}
