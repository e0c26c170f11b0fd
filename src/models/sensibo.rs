//! Models for the subset of the Sensibo v2 API used by the scheduler.
//!
//! Notes
//! - Only the `id`, `acState`, `measurements` and `smartMode` pod fields are requested.
//! - Mode, fan level and swing are kept as strings; the set of accepted values
//!   varies per air conditioner model and the loaded values are pushed back as-is.
//! - Temperatures in `measurements` and smart mode thresholds are Celsius.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct PodId(pub String);

impl core::fmt::Display for PodId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

pub mod mode {
    pub const COOL: &str = "cool";
    pub const HEAT: &str = "heat";
}

pub mod fan_level {
    pub const STRONG: &str = "strong";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodList {
    #[serde(default)]
    pub status: String,
    #[serde(rename = "result", default)]
    pub pods: Vec<Pod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Pod {
    pub id: PodId,
    #[serde(default)]
    pub ac_state: AcState,
    #[serde(default)]
    pub measurements: Option<Measurements>,
    #[serde(default)]
    pub smart_mode: Option<SmartMode>,
}

/// Direct, manually set operating state of the air conditioner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AcState {
    pub on: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fan_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_temperature: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swing: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Measurements {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

/// State the device switches to when a smart mode threshold is crossed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TemperatureState {
    pub on: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fan_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_temperature: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

/// Sensibo "climate react": a dual threshold profile run by the device itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SmartMode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_uid: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub enabled: bool,
    pub low_temperature_threshold: f64,
    pub low_temperature_state: TemperatureState,
    pub high_temperature_threshold: f64,
    pub high_temperature_state: TemperatureState,
}

/// Body of `POST pods/{id}/acStates`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcStateUpdate<'a> {
    pub ac_state: &'a AcState,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_fixture() -> PodList {
        let json = std::fs::read_to_string("tests/data/pods.json").expect("fixture present");
        serde_json::from_str(&json).expect("parse pod list")
    }

    #[test]
    fn parses_pod_list_fixture() {
        let list = load_fixture();
        assert_eq!(list.status, "success");
        assert_eq!(list.pods.len(), 1);

        let pod = &list.pods[0];
        assert_eq!(pod.id, PodId("aBcD1234".into()));
        assert!(pod.ac_state.on);
        assert_eq!(pod.ac_state.mode.as_deref(), Some("cool"));
        assert_eq!(pod.ac_state.target_temperature, Some(72));
        assert_eq!(pod.measurements.as_ref().and_then(|m| m.temperature), Some(24.6));

        let sm = pod.smart_mode.as_ref().expect("fixture has smart mode");
        assert_eq!(sm.kind.as_deref(), Some("temperature"));
        assert!(!sm.enabled);
        assert_eq!(sm.low_temperature_threshold, 20.0);
        assert_eq!(sm.high_temperature_state.mode.as_deref(), Some("cool"));
    }

    #[test]
    fn missing_smart_mode_is_none() {
        let json = r#"{"status":"success","result":[{"id":"x","acState":{"on":false}}]}"#;
        let list: PodList = serde_json::from_str(json).expect("parse");
        assert!(list.pods[0].smart_mode.is_none());
        assert!(list.pods[0].measurements.is_none());
        assert_eq!(list.pods[0].ac_state.mode, None);
    }

    #[test]
    fn ac_state_update_wraps_body() {
        let state = AcState {
            on: false,
            mode: Some(mode::HEAT.into()),
            ..Default::default()
        };
        let body = serde_json::to_value(AcStateUpdate { ac_state: &state }).expect("serialize");
        assert_eq!(body["acState"]["on"], serde_json::json!(false));
        assert_eq!(body["acState"]["mode"], serde_json::json!("heat"));
        assert!(body["acState"].get("swing").is_none());
    }

    #[test]
    fn smart_mode_serializes_type_field() {
        let sm = SmartMode {
            kind: Some("temperature".into()),
            ..Default::default()
        };
        let v = serde_json::to_value(&sm).expect("serialize");
        assert_eq!(v["type"], serde_json::json!("temperature"));
        assert!(v.get("lowTemperatureState").is_some());
    }
}
