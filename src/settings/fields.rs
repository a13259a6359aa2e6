//! Field schema.
//!
//! `Fields` holds one value per setting. `FIELDS` is the declarative table that
//! every other component iterates: name, kind, accessors, hook and flags.
//! Defaults live in `DEFAULTS`. Adding a setting means adding a struct member,
//! its default and one table entry.

use std::fmt;
use std::str::FromStr;

use crate::settings::error::{Result, SettingsError};
use crate::settings::hooks::ApplyHooks;

/// Schema layout generation written next to the persisted fields.
///
/// Increase this when a stored key changes name or type in a way older blobs
/// cannot be read back.
pub const FIELDS_ABI_VERSION: u32 = 1;

/// Placeholder written wherever a sensitive value would otherwise be shown.
pub const REDACTED: &str = "<redacted>";

/// When the tray icon shows the battery level.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrayIconBatteryBehavior {
    #[default]
    Disable = 0,
    WhenLowBattery = 1,
    Always = 2,
}

impl TryFrom<u32> for TrayIconBatteryBehavior {
    type Error = u32;

    fn try_from(val: u32) -> std::result::Result<Self, u32> {
        match val {
            0 => Ok(Self::Disable),
            1 => Ok(Self::WhenLowBattery),
            2 => Ok(Self::Always),
            other => Err(other),
        }
    }
}

impl FromStr for TrayIconBatteryBehavior {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s.to_ascii_lowercase().as_str() {
            "disable" | "0" => Ok(Self::Disable),
            "when_low_battery" | "whenlowbattery" | "1" => Ok(Self::WhenLowBattery),
            "always" | "2" => Ok(Self::Always),
            _ => Err(()),
        }
    }
}

impl fmt::Display for TrayIconBatteryBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disable => "disable",
            Self::WhenLowBattery => "when_low_battery",
            Self::Always => "always",
        };
        f.write_str(name)
    }
}

/// Kind of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    I16,
    U32,
    U64,
    String,
    TrayIcon,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::I16 => "i16",
            ValueKind::U32 => "u32",
            ValueKind::U64 => "u64",
            ValueKind::String => "string",
            ValueKind::TrayIcon => "tray_icon_battery_behavior",
        }
    }
}

/// A single field value, detached from `Fields`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    I16(i16),
    U32(u32),
    U64(u64),
    String(String),
    TrayIcon(TrayIconBatteryBehavior),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::I16(_) => ValueKind::I16,
            Value::U32(_) => ValueKind::U32,
            Value::U64(_) => ValueKind::U64,
            Value::String(_) => ValueKind::String,
            Value::TrayIcon(_) => ValueKind::TrayIcon,
        }
    }

    /// Serialized form used in the persisted blob.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(v) => serde_json::Value::from(*v),
            Value::I16(v) => serde_json::Value::from(*v),
            Value::U32(v) => serde_json::Value::from(*v),
            Value::U64(v) => serde_json::Value::from(*v),
            Value::String(v) => serde_json::Value::from(v.as_str()),
            Value::TrayIcon(v) => serde_json::Value::from(*v as u32),
        }
    }

    /// Read a stored value back. Returns `None` when the JSON has the wrong
    /// shape or the number does not fit the field's range.
    pub fn from_json(kind: ValueKind, json: &serde_json::Value) -> Option<Value> {
        match kind {
            ValueKind::Bool => json.as_bool().map(Value::Bool),
            ValueKind::I16 => json
                .as_i64()
                .and_then(|v| i16::try_from(v).ok())
                .map(Value::I16),
            ValueKind::U32 => json
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .map(Value::U32),
            ValueKind::U64 => json.as_u64().map(Value::U64),
            ValueKind::String => json.as_str().map(|s| Value::String(s.to_string())),
            ValueKind::TrayIcon => json
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .and_then(|v| TrayIconBatteryBehavior::try_from(v).ok())
                .map(Value::TrayIcon),
        }
    }

    /// Parse user input (CLI) for a field of the given kind.
    pub fn parse(kind: ValueKind, raw: &str) -> Option<Value> {
        let raw = raw.trim();
        match kind {
            ValueKind::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "on" | "yes" => Some(Value::Bool(true)),
                "false" | "0" | "off" | "no" => Some(Value::Bool(false)),
                _ => None,
            },
            ValueKind::I16 => raw.parse().ok().map(Value::I16),
            ValueKind::U32 => raw.parse().ok().map(Value::U32),
            ValueKind::U64 => parse_u64(raw).map(Value::U64),
            ValueKind::String => Some(Value::String(raw.to_string())),
            ValueKind::TrayIcon => raw.parse().ok().map(Value::TrayIcon),
        }
    }
}

// Device addresses are usually written in hex.
fn parse_u64(raw: &str) -> Option<u64> {
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::U32(v) => write!(f, "{}", v),
            Value::U64(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{:?}", v),
            Value::TrayIcon(v) => write!(f, "{}", v),
        }
    }
}

/// Current value of every setting.
#[derive(Clone, PartialEq, Eq)]
pub struct Fields {
    pub auto_run: bool,
    pub low_audio_latency: bool,
    pub automatic_ear_detection: bool,
    pub skipped_version: String,
    pub rssi_min: i16,
    /// Deprecated: kept so older blobs round-trip.
    pub reduce_loud_sounds: bool,
    /// Deprecated: kept so older blobs round-trip.
    pub loud_volume_level: u32,
    /// Sensitive: never logged or exported.
    pub device_address: u64,
    pub tray_icon_battery: TrayIconBatteryBehavior,
}

/// Schema defaults.
pub const DEFAULTS: Fields = Fields {
    auto_run: false,
    low_audio_latency: false,
    automatic_ear_detection: true,
    skipped_version: String::new(),
    rssi_min: -80,
    reduce_loud_sounds: false,
    loud_volume_level: 40,
    device_address: 0,
    tray_icon_battery: TrayIconBatteryBehavior::Disable,
};

impl Default for Fields {
    fn default() -> Self {
        DEFAULTS
    }
}

impl fmt::Debug for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Fields");
        for desc in FIELDS {
            if desc.sensitive {
                out.field(desc.name, &format_args!("{}", REDACTED));
            } else {
                out.field(desc.name, &format_args!("{}", desc.value(self)));
            }
        }
        out.finish()
    }
}

/// Routes an (old, new) pair of `Fields` to one typed `ApplyHooks` method.
pub type Hook = fn(&dyn ApplyHooks, &Fields, &Fields);

/// Schema metadata for one setting.
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: ValueKind,
    pub get: fn(&Fields) -> Value,
    /// Returns false when the value has the wrong kind.
    pub set: fn(&mut Fields, Value) -> bool,
    pub hook: Option<Hook>,
    /// Excluded from logs and diagnostic export, still persisted.
    pub sensitive: bool,
    /// Persisted but never applied and never shown.
    pub deprecated: bool,
}

impl FieldDescriptor {
    pub fn value(&self, fields: &Fields) -> Value {
        (self.get)(fields)
    }

    pub fn default_value(&self) -> Value {
        (self.get)(&DEFAULTS)
    }

    pub fn assign(&self, fields: &mut Fields, value: Value) -> Result<()> {
        if (self.set)(fields, value) {
            Ok(())
        } else {
            Err(SettingsError::TypeMismatch {
                field: self.name,
                expected: self.kind.as_str(),
            })
        }
    }

    pub fn differs(&self, old: &Fields, new: &Fields) -> bool {
        (self.get)(old) != (self.get)(new)
    }

    /// The hook to run on change, if the field is live and declares one.
    pub fn active_hook(&self) -> Option<Hook> {
        if self.deprecated {
            None
        } else {
            self.hook
        }
    }

    /// Value as it may appear in logs or exports.
    pub fn display_value(&self, fields: &Fields) -> String {
        if self.sensitive {
            REDACTED.to_string()
        } else {
            self.value(fields).to_string()
        }
    }

    /// Same as `display_value` for a detached value.
    pub fn display(&self, value: &Value) -> String {
        if self.sensitive {
            REDACTED.to_string()
        } else {
            value.to_string()
        }
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("has_hook", &self.hook.is_some())
            .field("sensitive", &self.sensitive)
            .field("deprecated", &self.deprecated)
            .finish()
    }
}

/// The schema, in declaration order.
pub static FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        name: "auto_run",
        kind: ValueKind::Bool,
        get: |f| Value::Bool(f.auto_run),
        set: |f, v| match v {
            Value::Bool(v) => {
                f.auto_run = v;
                true
            }
            _ => false,
        },
        hook: Some(|h, old, new| h.auto_run(old.auto_run, new.auto_run)),
        sensitive: false,
        deprecated: false,
    },
    FieldDescriptor {
        name: "low_audio_latency",
        kind: ValueKind::Bool,
        get: |f| Value::Bool(f.low_audio_latency),
        set: |f, v| match v {
            Value::Bool(v) => {
                f.low_audio_latency = v;
                true
            }
            _ => false,
        },
        hook: Some(|h, old, new| h.low_audio_latency(old.low_audio_latency, new.low_audio_latency)),
        sensitive: false,
        deprecated: false,
    },
    FieldDescriptor {
        name: "automatic_ear_detection",
        kind: ValueKind::Bool,
        get: |f| Value::Bool(f.automatic_ear_detection),
        set: |f, v| match v {
            Value::Bool(v) => {
                f.automatic_ear_detection = v;
                true
            }
            _ => false,
        },
        hook: Some(|h, old, new| {
            h.automatic_ear_detection(old.automatic_ear_detection, new.automatic_ear_detection)
        }),
        sensitive: false,
        deprecated: false,
    },
    FieldDescriptor {
        name: "skipped_version",
        kind: ValueKind::String,
        get: |f| Value::String(f.skipped_version.clone()),
        set: |f, v| match v {
            Value::String(v) => {
                f.skipped_version = v;
                true
            }
            _ => false,
        },
        hook: None,
        sensitive: false,
        deprecated: false,
    },
    FieldDescriptor {
        name: "rssi_min",
        kind: ValueKind::I16,
        get: |f| Value::I16(f.rssi_min),
        set: |f, v| match v {
            Value::I16(v) => {
                f.rssi_min = v;
                true
            }
            _ => false,
        },
        hook: Some(|h, old, new| h.rssi_min(old.rssi_min, new.rssi_min)),
        sensitive: false,
        deprecated: false,
    },
    FieldDescriptor {
        name: "reduce_loud_sounds",
        kind: ValueKind::Bool,
        get: |f| Value::Bool(f.reduce_loud_sounds),
        set: |f, v| match v {
            Value::Bool(v) => {
                f.reduce_loud_sounds = v;
                true
            }
            _ => false,
        },
        hook: None,
        sensitive: false,
        deprecated: true,
    },
    FieldDescriptor {
        name: "loud_volume_level",
        kind: ValueKind::U32,
        get: |f| Value::U32(f.loud_volume_level),
        set: |f, v| match v {
            Value::U32(v) => {
                f.loud_volume_level = v;
                true
            }
            _ => false,
        },
        hook: None,
        sensitive: false,
        deprecated: true,
    },
    FieldDescriptor {
        name: "device_address",
        kind: ValueKind::U64,
        get: |f| Value::U64(f.device_address),
        set: |f, v| match v {
            Value::U64(v) => {
                f.device_address = v;
                true
            }
            _ => false,
        },
        hook: Some(|h, old, new| h.device_address(old.device_address, new.device_address)),
        sensitive: true,
        deprecated: false,
    },
    FieldDescriptor {
        name: "tray_icon_battery",
        kind: ValueKind::TrayIcon,
        get: |f| Value::TrayIcon(f.tray_icon_battery),
        set: |f, v| match v {
            Value::TrayIcon(v) => {
                f.tray_icon_battery = v;
                true
            }
            _ => false,
        },
        hook: Some(|h, old, new| h.tray_icon_battery(old.tray_icon_battery, new.tray_icon_battery)),
        sensitive: false,
        deprecated: false,
    },
];

/// Look up a descriptor by name.
pub fn field(name: &str) -> Option<&'static FieldDescriptor> {
    FIELDS.iter().find(|desc| desc.name == name)
}

/// Parse `raw` and assign it to the named field. Deprecated fields are not
/// addressable.
pub fn set_by_name(fields: &mut Fields, name: &str, raw: &str) -> Result<Value> {
    let desc = field(name).ok_or_else(|| SettingsError::UnknownField(name.to_string()))?;
    if desc.deprecated {
        return Err(SettingsError::Deprecated(desc.name));
    }
    let value = Value::parse(desc.kind, raw).ok_or_else(|| SettingsError::InvalidValue {
        field: desc.name,
        value: if desc.sensitive {
            REDACTED.to_string()
        } else {
            raw.to_string()
        },
    })?;
    desc.assign(fields, value.clone())?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_defaults() {
        let fields = Fields::default();
        assert!(!fields.auto_run);
        assert!(fields.automatic_ear_detection);
        assert_eq!(fields.rssi_min, -80);
        assert_eq!(fields.loud_volume_level, 40);
        assert_eq!(fields.tray_icon_battery, TrayIconBatteryBehavior::Disable);
        assert!(fields.skipped_version.is_empty());
    }

    #[test]
    fn test_schema_names_unique() {
        let names: HashSet<_> = FIELDS.iter().map(|d| d.name).collect();
        assert_eq!(names.len(), FIELDS.len());
        assert!(!names.contains(crate::settings::persistence::ABI_VERSION_KEY));
    }

    #[test]
    fn test_descriptor_kinds_match_values() {
        let fields = Fields::default();
        for desc in FIELDS {
            assert_eq!(desc.value(&fields).kind(), desc.kind, "{}", desc.name);
            assert_eq!(desc.default_value(), desc.value(&fields));
        }
    }

    #[test]
    fn test_deprecated_fields_have_no_active_hook() {
        for desc in FIELDS.iter().filter(|d| d.deprecated) {
            assert!(desc.active_hook().is_none(), "{}", desc.name);
        }
        assert!(field("rssi_min").and_then(|d| d.active_hook()).is_some());
    }

    #[test]
    fn test_assign_rejects_wrong_kind() {
        let mut fields = Fields::default();
        let desc = field("rssi_min").unwrap();

        desc.assign(&mut fields, Value::I16(-60)).unwrap();
        assert_eq!(fields.rssi_min, -60);

        let err = desc.assign(&mut fields, Value::Bool(true)).unwrap_err();
        assert!(matches!(err, SettingsError::TypeMismatch { field: "rssi_min", .. }));
        assert_eq!(fields.rssi_min, -60);
    }

    #[test]
    fn test_set_by_name() {
        let mut fields = Fields::default();
        set_by_name(&mut fields, "tray_icon_battery", "always").unwrap();
        assert_eq!(fields.tray_icon_battery, TrayIconBatteryBehavior::Always);

        set_by_name(&mut fields, "device_address", "0xA1B2").unwrap();
        assert_eq!(fields.device_address, 0xA1B2);

        assert!(matches!(
            set_by_name(&mut fields, "volume", "1"),
            Err(SettingsError::UnknownField(_))
        ));
        assert!(matches!(
            set_by_name(&mut fields, "loud_volume_level", "10"),
            Err(SettingsError::Deprecated("loud_volume_level"))
        ));
        assert!(matches!(
            set_by_name(&mut fields, "rssi_min", "-90000"),
            Err(SettingsError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_invalid_sensitive_input_is_redacted() {
        let mut fields = Fields::default();
        let err = set_by_name(&mut fields, "device_address", "0xZZ-secret-9911").unwrap_err();

        let message = err.to_string();
        assert!(message.contains("device_address"));
        assert!(message.contains(REDACTED));
        assert!(!message.contains("secret-9911"));
        assert_eq!(fields.device_address, 0);

        let err = set_by_name(&mut fields, "rssi_min", "loud").unwrap_err();
        assert!(err.to_string().contains("loud"));
    }

    #[test]
    fn test_json_range_checks() {
        let too_big = serde_json::json!(70000);
        assert_eq!(Value::from_json(ValueKind::I16, &too_big), None);
        assert_eq!(
            Value::from_json(ValueKind::I16, &serde_json::json!(-60)),
            Some(Value::I16(-60))
        );
        assert_eq!(Value::from_json(ValueKind::TrayIcon, &serde_json::json!(7)), None);
        assert_eq!(
            Value::from_json(ValueKind::Bool, &serde_json::json!("true")),
            None
        );
    }

    #[test]
    fn test_debug_redacts_sensitive() {
        let fields = Fields {
            device_address: 0xDEAD_BEEF,
            ..Fields::default()
        };
        let out = format!("{:?}", fields);
        assert!(out.contains(REDACTED));
        assert!(!out.contains(&0xDEAD_BEEFu64.to_string()));
        assert!(out.contains("rssi_min: -80"));
    }
}
