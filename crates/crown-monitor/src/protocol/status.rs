//! Device status payloads.
//!
//! Status fields come from the backend's device detector and may be
//! missing, a string sentinel, or a number depending on firmware and
//! backend revision. Decoding is deliberately permissive: anything
//! unrecognized collapses to `Unknown`, never an error.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Snapshot of the physical headset as reported by the backend.
///
/// Consumed read-only; the client never fabricates one except for the
/// all-offline [`Default`] used before the first report arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceStatus {
    /// Whether the headset passed detection and is live.
    pub online: bool,

    /// Battery charge, when the device reports one.
    pub battery: BatteryLevel,

    /// Signal quality classification.
    pub signal: SignalQuality,

    /// Outcome of the backend's biological-data validation.
    pub validation: ValidationState,
}

impl DeviceStatus {
    /// Status used after a disconnect: everything back to unknown/offline.
    pub fn offline() -> Self {
        Self {
            signal: SignalQuality::Disconnected,
            ..Self::default()
        }
    }
}

// ─── Battery ────────────────────────────────────────────────────────────

/// Battery charge percentage, or unknown.
///
/// The wire value is a number, a numeric string, the string `"unknown"`,
/// or absent entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatteryLevel {
    /// Charge percentage, clamped to 0..=100.
    Percent(u8),
    /// Not reported by the device.
    #[default]
    Unknown,
}

impl BatteryLevel {
    fn from_percent(value: f64) -> Self {
        if value.is_finite() && value >= 0.0 {
            BatteryLevel::Percent(value.min(100.0).round() as u8)
        } else {
            BatteryLevel::Unknown
        }
    }
}

impl Serialize for BatteryLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BatteryLevel::Percent(p) => serializer.serialize_u8(*p),
            BatteryLevel::Unknown => serializer.serialize_str("unknown"),
        }
    }
}

impl<'de> Deserialize<'de> for BatteryLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::Number(n) => {
                n.as_f64().map_or(BatteryLevel::Unknown, BatteryLevel::from_percent)
            }
            serde_json::Value::String(s) => s
                .parse::<f64>()
                .map_or(BatteryLevel::Unknown, BatteryLevel::from_percent),
            _ => BatteryLevel::Unknown,
        })
    }
}

impl std::fmt::Display for BatteryLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatteryLevel::Percent(p) => write!(f, "{p}%"),
            BatteryLevel::Unknown => write!(f, "unknown"),
        }
    }
}

// ─── Signal quality ─────────────────────────────────────────────────────

/// Signal quality classification reported by the backend detector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SignalQuality {
    Excellent,
    Good,
    Poor,
    Disconnected,
    /// Anything the client does not recognize, kept verbatim.
    #[default]
    Unknown,
}

impl SignalQuality {
    fn from_name(name: &str) -> Self {
        match name {
            "excellent" => SignalQuality::Excellent,
            "good" => SignalQuality::Good,
            "poor" => SignalQuality::Poor,
            "disconnected" => SignalQuality::Disconnected,
            _ => SignalQuality::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalQuality::Excellent => "excellent",
            SignalQuality::Good => "good",
            SignalQuality::Poor => "poor",
            SignalQuality::Disconnected => "disconnected",
            SignalQuality::Unknown => "unknown",
        }
    }
}

impl Serialize for SignalQuality {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SignalQuality {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::String(s) => SignalQuality::from_name(&s),
            _ => SignalQuality::Unknown,
        })
    }
}

// ─── Validation ─────────────────────────────────────────────────────────

/// Outcome of the backend's biological-data validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ValidationState {
    /// Validation has not run yet.
    #[default]
    Pending,
    /// Real biological data confirmed.
    Confirmed,
    /// Any other value, typically a human-readable failure reason.
    Other(String),
}

impl ValidationState {
    fn from_name(name: &str) -> Self {
        match name {
            "pending" => ValidationState::Pending,
            // Both the original and the corrected detector revision.
            "biological_data_confirmed" | "biological_data_confirmed_v2" => {
                ValidationState::Confirmed
            }
            other => ValidationState::Other(other.to_string()),
        }
    }

    /// Whether the device has been confirmed as producing real data.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, ValidationState::Confirmed)
    }
}

impl Serialize for ValidationState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ValidationState::Pending => serializer.serialize_str("pending"),
            ValidationState::Confirmed => serializer.serialize_str("biological_data_confirmed_v2"),
            ValidationState::Other(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for ValidationState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::String(s) => ValidationState::from_name(&s),
            _ => ValidationState::Pending,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_status() {
        let json = r#"{
            "online": true,
            "battery": 82,
            "signal": "excellent",
            "validation": "biological_data_confirmed_v2"
        }"#;

        let status: DeviceStatus = serde_json::from_str(json).unwrap();
        assert!(status.online);
        assert_eq!(status.battery, BatteryLevel::Percent(82));
        assert_eq!(status.signal, SignalQuality::Excellent);
        assert!(status.validation.is_confirmed());
    }

    #[test]
    fn test_deserialize_sentinel_strings() {
        let json = r#"{
            "online": false,
            "battery": "unknown",
            "signal": "no_biological_data",
            "validation": "Données trop constantes"
        }"#;

        let status: DeviceStatus = serde_json::from_str(json).unwrap();
        assert!(!status.online);
        assert_eq!(status.battery, BatteryLevel::Unknown);
        assert_eq!(status.signal, SignalQuality::Unknown);
        assert_eq!(
            status.validation,
            ValidationState::Other("Données trop constantes".into())
        );
    }

    #[test]
    fn test_deserialize_missing_fields_defaults() {
        // Absent optional fields are permissive defaults, never errors.
        let status: DeviceStatus = serde_json::from_str("{}").unwrap();
        assert!(!status.online);
        assert_eq!(status.battery, BatteryLevel::Unknown);
        assert_eq!(status.signal, SignalQuality::Unknown);
        assert_eq!(status.validation, ValidationState::Pending);
    }

    #[test]
    fn test_battery_numeric_string_and_clamp() {
        let status: DeviceStatus = serde_json::from_str(r#"{"battery": "64"}"#).unwrap();
        assert_eq!(status.battery, BatteryLevel::Percent(64));

        let status: DeviceStatus = serde_json::from_str(r#"{"battery": 250}"#).unwrap();
        assert_eq!(status.battery, BatteryLevel::Percent(100));

        let status: DeviceStatus = serde_json::from_str(r#"{"battery": -3}"#).unwrap();
        assert_eq!(status.battery, BatteryLevel::Unknown);
    }

    #[test]
    fn test_offline_reset() {
        let status = DeviceStatus::offline();
        assert!(!status.online);
        assert_eq!(status.signal, SignalQuality::Disconnected);
        assert_eq!(status.battery, BatteryLevel::Unknown);
    }
}
