//! Request and response bodies for the TTN v3 REST API
//!
//! Only the fields this tool reads or writes are modelled. Optional fields
//! are skipped when `None`, so a serialized payload contains exactly the
//! fields that were populated, and [`FieldMask`] is derived from that.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Paths of the fields a partial update should apply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMask {
    pub paths: Vec<String>,
}

impl FieldMask {
    /// Collect the dotted path of every populated leaf field of `payload`.
    ///
    /// Top-level keys listed in `exclude` are left out of the mask even
    /// though they are sent (e.g. the identifiers of a create request).
    /// Nested objects contribute their leaves, never themselves.
    pub fn from_populated<T: Serialize>(payload: &T, exclude: &[&str]) -> serde_json::Result<Self> {
        let mut paths = Vec::new();
        if let Value::Object(fields) = serde_json::to_value(payload)? {
            for (key, value) in &fields {
                if exclude.contains(&key.as_str()) {
                    continue;
                }
                collect_leaves(key.clone(), value, &mut paths);
            }
        }
        Ok(Self { paths })
    }
}

fn collect_leaves(path: String, value: &Value, paths: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::Object(fields) if !fields.is_empty() => {
            for (key, child) in fields {
                collect_leaves(format!("{}.{}", path, key), child, paths);
            }
        }
        _ => paths.push(path),
    }
}

// --- Applications ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationIdentifiers {
    pub application_id: String,
}

/// `GET /api/v3/applications`
///
/// TTN omits empty repeated fields, so an account without applications
/// answers with `{}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationList {
    #[serde(default)]
    pub applications: Vec<ApplicationSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSummary {
    pub ids: ApplicationIdentifiers,
}

#[derive(Debug, Clone, Serialize)]
pub struct Application {
    pub ids: ApplicationIdentifiers,
    pub name: String,
    pub description: String,
    pub application_server_address: String,
    pub network_server_address: String,
    pub join_server_address: String,
}

/// `POST /api/v3/users/{org}/applications`
#[derive(Debug, Clone, Serialize)]
pub struct CreateApplicationRequest {
    pub application: Application,
}

// --- Application link (payload formatters) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayloadFormatter {
    FormatterNone,
    FormatterJavascript,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessagePayloadFormatters {
    pub up_formatter: PayloadFormatter,
    pub up_formatter_parameter: String,
    pub down_formatter: PayloadFormatter,
    pub down_formatter_parameter: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationLink {
    pub default_formatters: MessagePayloadFormatters,
}

/// `PUT /api/v3/as/applications/{app}/link`
#[derive(Debug, Clone, Serialize)]
pub struct SetLinkRequest {
    pub link: ApplicationLink,
    pub field_mask: FieldMask,
}

impl SetLinkRequest {
    pub fn new(link: ApplicationLink) -> serde_json::Result<Self> {
        let field_mask = FieldMask::from_populated(&link, &[])?;
        Ok(Self { link, field_mask })
    }
}

// --- End devices ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndDeviceIdentifiers {
    pub device_id: String,
    pub application_ids: ApplicationIdentifiers,
    /// Uppercase hex
    pub dev_eui: String,
    /// Uppercase hex
    pub join_eui: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MacSettings {
    pub rx2_data_rate_index: u32,
    /// uint64 fields travel as decimal strings in TTN's JSON mapping
    pub rx2_frequency: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyEnvelope {
    /// Uppercase hex
    pub key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RootKeys {
    pub app_key: KeyEnvelope,
}

/// An end device as seen by one of the TTN components.
///
/// The identity server, network server, application server and join server
/// each store a different slice of the device; populate only the fields the
/// target component owns.
#[derive(Debug, Clone, Serialize)]
pub struct EndDevice {
    pub ids: EndDeviceIdentifiers,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_server_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_server_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join_server_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_plan_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lorawan_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lorawan_phy_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_join: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multicast: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_class_b: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_class_c: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_settings: Option<MacSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_keys: Option<RootKeys>,
}

impl EndDevice {
    /// A device carrying only its identifiers
    pub fn new(ids: EndDeviceIdentifiers) -> Self {
        Self {
            ids,
            network_server_address: None,
            application_server_address: None,
            join_server_address: None,
            frequency_plan_id: None,
            lorawan_version: None,
            lorawan_phy_version: None,
            supports_join: None,
            multicast: None,
            supports_class_b: None,
            supports_class_c: None,
            mac_settings: None,
            root_keys: None,
        }
    }
}

/// Body of the end device create and set calls
#[derive(Debug, Clone, Serialize)]
pub struct EndDeviceRequest {
    pub end_device: EndDevice,
    pub field_mask: FieldMask,
}

impl EndDeviceRequest {
    /// Registry create: the identifiers address the new device and are not
    /// part of the mask.
    pub fn create(end_device: EndDevice) -> serde_json::Result<Self> {
        let field_mask = FieldMask::from_populated(&end_device, &["ids"])?;
        Ok(Self {
            end_device,
            field_mask,
        })
    }

    /// Component set: every populated field, identifiers included.
    pub fn update(end_device: EndDevice) -> serde_json::Result<Self> {
        let field_mask = FieldMask::from_populated(&end_device, &[])?;
        Ok(Self {
            end_device,
            field_mask,
        })
    }
}
