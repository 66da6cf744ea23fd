// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device records and their category-specific details.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::capabilities::Capabilities;
use crate::model::{AttributeValue, StateAttribute};
use crate::types::{AccountId, Brightness, CieXy, ColorMode, ColorTemperature, DeviceId};

// ============================================================================
// Tags and keys
// ============================================================================

/// Which API a device is driven through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VendorTag(String);

impl VendorTag {
    /// Tag of Hue bridges and everything imported from them.
    pub const HUE: &'static str = "philips";

    /// Tag of devices the hub drives itself.
    pub const LOCAL: &'static str = "local";

    /// Creates a tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The Hue tag.
    #[must_use]
    pub fn hue() -> Self {
        Self::new(Self::HUE)
    }

    /// The local tag.
    #[must_use]
    pub fn local() -> Self {
        Self::new(Self::LOCAL)
    }

    /// Returns the tag string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VendorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Device category, derived from the record's details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCategory {
    /// A sensor.
    Sensor,
    /// A light.
    Light,
    /// A bridge or other controller.
    Controller,
    /// A switchable outlet.
    Outlet,
    /// A Wi-Fi access point observation.
    WifiNode,
}

impl DeviceCategory {
    /// Returns the category name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sensor => "sensor",
            Self::Light => "light",
            Self::Controller => "controller",
            Self::Outlet => "outlet",
            Self::WifiNode => "wifi_node",
        }
    }
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A controller and the index it uses for one of its entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControllerRef {
    /// The controlling bridge.
    pub controller: DeviceId,
    /// The bridge's own id for the entity.
    pub index: u16,
}

impl ControllerRef {
    /// Creates a controller reference.
    #[must_use]
    pub const fn new(controller: DeviceId, index: u16) -> Self {
        Self { controller, index }
    }
}

/// The fields an import matches on to find an existing record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReconcileKey {
    /// Owning account.
    pub owner: AccountId,
    /// Vendor tag.
    pub vendor: VendorTag,
    /// Category of the record.
    pub category: DeviceCategory,
    /// Vendor model id.
    pub model_id: String,
    /// Vendor unique id, when the vendor reports one.
    pub unique_id: Option<String>,
    /// Controller and controller-local index.
    pub controller: ControllerRef,
    /// Display name.
    pub name: String,
}

// ============================================================================
// Details
// ============================================================================

/// Light fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Light {
    /// On/off state.
    pub on: bool,
    /// Brightness (0-255).
    pub brightness: Brightness,
    /// Which representation currently drives the light.
    pub color_mode: ColorMode,
    /// Color temperature.
    pub color_temperature: ColorTemperature,
    /// Chromaticity, derived from the temperature when one is known.
    pub color_xy: CieXy,
    /// Alert effect, if any.
    pub alert: Option<String>,
    /// Whether the bridge can reach the light.
    pub reachable: bool,
    /// Vendor light type, e.g. "Extended color light".
    pub light_type: String,
    /// Vendor model id.
    pub model_id: String,
    /// Vendor unique id.
    pub unique_id: String,
    /// Controlling bridge and its index for this light.
    pub controller: ControllerRef,
}

impl Light {
    /// Default light type.
    pub const DEFAULT_TYPE: &'static str = "Color temperature light";

    /// Creates a light in its default state.
    #[must_use]
    pub fn new(
        controller: ControllerRef,
        model_id: impl Into<String>,
        unique_id: impl Into<String>,
    ) -> Self {
        Self {
            on: false,
            brightness: Brightness::MIN,
            color_mode: ColorMode::Temperature,
            color_temperature: ColorTemperature::default(),
            color_xy: CieXy::default(),
            alert: None,
            reachable: false,
            light_type: Self::DEFAULT_TYPE.to_string(),
            model_id: model_id.into(),
            unique_id: unique_id.into(),
            controller,
        }
    }

    /// Returns what this light can do.
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::from_light_type(&self.light_type)
    }

    /// Sets the color temperature and the chromaticity derived from it.
    ///
    /// Returns `true` if anything changed.
    pub fn set_color_temperature(&mut self, ct: ColorTemperature) -> bool {
        let xy = ct.to_cie_xy();
        let changed = self.color_temperature != ct || self.color_xy != xy;
        self.color_temperature = ct;
        self.color_xy = xy;
        changed
    }
}

/// Sensor fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    /// Latest reading; flags are stored as 0/1.
    pub value: f64,
    /// Vendor sensor type, e.g. "ZLLTemperature".
    pub sensor_type: String,
    /// Whether the bridge can reach the sensor.
    pub reachable: bool,
    /// Vendor model id.
    pub model_id: String,
    /// Vendor unique id; virtual sensors have none.
    pub unique_id: Option<String>,
    /// Controlling bridge and its index for this sensor.
    pub controller: ControllerRef,
}

/// Bridge fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bridge {
    /// Auth token issued by the registration handshake.
    pub token: Option<String>,
    /// Bridge-reported hardware id.
    pub bridge_id: Option<String>,
    /// Bridge-reported firmware version.
    pub firmware_version: Option<String>,
}

/// Outlet fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outlet {
    /// On/off state.
    pub on: bool,
    /// Controller and its primary index for this outlet, when controlled.
    pub controller: Option<ControllerRef>,
}

/// Wi-Fi node fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiNode {
    /// Network name.
    pub ssid: Option<String>,
    /// Signal strength.
    pub signal_strength: i32,
    /// Link speed.
    pub speed: i32,
    /// Location as a decimal-degree string.
    pub gps_dd: String,
}

/// Category-specific fields of a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum DeviceDetails {
    /// A light.
    Light(Light),
    /// A sensor.
    Sensor(Sensor),
    /// A bridge.
    Bridge(Bridge),
    /// An outlet.
    Outlet(Outlet),
    /// A Wi-Fi node.
    WifiNode(WifiNode),
}

// ============================================================================
// Device
// ============================================================================

/// A device record.
///
/// # Examples
///
/// ```
/// use homelink::model::{Device, DeviceCategory, DeviceDetails, Outlet, VendorTag};
/// use homelink::types::AccountId;
///
/// let outlet = Device::new(
///     AccountId::new("alice"),
///     "Kettle",
///     "10.0.0.40",
///     VendorTag::local(),
///     DeviceDetails::Outlet(Outlet::default()),
/// );
/// assert_eq!(outlet.category(), DeviceCategory::Outlet);
/// assert!(outlet.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Local identifier.
    pub id: DeviceId,
    /// Owning account.
    pub owner: AccountId,
    /// Display name.
    pub name: String,
    /// Network address.
    pub network_address: String,
    /// Hardware (MAC) address.
    pub hardware_address: Option<String>,
    /// When the record was created.
    pub created: DateTime<Utc>,
    /// When the record last changed.
    pub updated: DateTime<Utc>,
    /// Whether the record takes part in lookups and rules.
    pub enabled: bool,
    /// Which API drives the device.
    pub vendor: VendorTag,
    /// Category-specific fields.
    pub details: DeviceDetails,
}

impl Device {
    /// Creates an enabled device record stamped with the current time.
    #[must_use]
    pub fn new(
        owner: AccountId,
        name: impl Into<String>,
        network_address: impl Into<String>,
        vendor: VendorTag,
        details: DeviceDetails,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: DeviceId::new(),
            owner,
            name: name.into(),
            network_address: network_address.into(),
            hardware_address: None,
            created: now,
            updated: now,
            enabled: true,
            vendor,
            details,
        }
    }

    /// Sets the hardware address.
    #[must_use]
    pub fn with_hardware_address(mut self, address: impl Into<String>) -> Self {
        self.hardware_address = Some(address.into());
        self
    }

    /// Returns the category implied by the details.
    #[must_use]
    pub fn category(&self) -> DeviceCategory {
        match self.details {
            DeviceDetails::Light(_) => DeviceCategory::Light,
            DeviceDetails::Sensor(_) => DeviceCategory::Sensor,
            DeviceDetails::Bridge(_) => DeviceCategory::Controller,
            DeviceDetails::Outlet(_) => DeviceCategory::Outlet,
            DeviceDetails::WifiNode(_) => DeviceCategory::WifiNode,
        }
    }

    /// Marks the record as updated now.
    pub fn touch(&mut self) {
        self.updated = Utc::now();
    }

    /// Returns the controller reference of a controlled device.
    #[must_use]
    pub fn controller(&self) -> Option<ControllerRef> {
        match &self.details {
            DeviceDetails::Light(l) => Some(l.controller),
            DeviceDetails::Sensor(s) => Some(s.controller),
            DeviceDetails::Outlet(o) => o.controller,
            DeviceDetails::Bridge(_) | DeviceDetails::WifiNode(_) => None,
        }
    }

    /// Returns the import key of a light or sensor.
    #[must_use]
    pub fn reconcile_key(&self) -> Option<ReconcileKey> {
        let (model_id, unique_id, controller) = match &self.details {
            DeviceDetails::Light(l) => (&l.model_id, Some(l.unique_id.clone()), l.controller),
            DeviceDetails::Sensor(s) => (&s.model_id, s.unique_id.clone(), s.controller),
            _ => return None,
        };
        Some(ReconcileKey {
            owner: self.owner.clone(),
            vendor: self.vendor.clone(),
            category: self.category(),
            model_id: model_id.clone(),
            unique_id,
            controller,
            name: self.name.clone(),
        })
    }

    /// Reads a state attribute, or `None` if the device has no such attribute.
    #[must_use]
    pub fn attribute(&self, attribute: StateAttribute) -> Option<AttributeValue> {
        use StateAttribute as A;

        if attribute == A::Enabled {
            return Some(self.enabled.into());
        }

        match (&self.details, attribute) {
            (DeviceDetails::Light(l), A::State) => Some(l.on.into()),
            (DeviceDetails::Light(l), A::Brightness) => {
                Some(u16::from(l.brightness.value()).into())
            }
            (DeviceDetails::Light(l), A::ColorTemperature) => {
                Some(l.color_temperature.value().into())
            }
            (DeviceDetails::Light(l), A::Reachable) => Some(l.reachable.into()),
            (DeviceDetails::Sensor(s), A::State) => Some(s.value.into()),
            (DeviceDetails::Sensor(s), A::Reachable) => Some(s.reachable.into()),
            (DeviceDetails::Outlet(o), A::State) => Some(o.on.into()),
            (DeviceDetails::WifiNode(w), A::SignalStrength) => {
                Some(f64::from(w.signal_strength).into())
            }
            (DeviceDetails::WifiNode(w), A::Speed) => Some(f64::from(w.speed).into()),
            _ => None,
        }
    }

    /// Returns the light details.
    #[must_use]
    pub fn as_light(&self) -> Option<&Light> {
        match &self.details {
            DeviceDetails::Light(l) => Some(l),
            _ => None,
        }
    }

    /// Returns the light details mutably.
    pub fn as_light_mut(&mut self) -> Option<&mut Light> {
        match &mut self.details {
            DeviceDetails::Light(l) => Some(l),
            _ => None,
        }
    }

    /// Returns the sensor details.
    #[must_use]
    pub fn as_sensor(&self) -> Option<&Sensor> {
        match &self.details {
            DeviceDetails::Sensor(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the sensor details mutably.
    pub fn as_sensor_mut(&mut self) -> Option<&mut Sensor> {
        match &mut self.details {
            DeviceDetails::Sensor(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the bridge details.
    #[must_use]
    pub fn as_bridge(&self) -> Option<&Bridge> {
        match &self.details {
            DeviceDetails::Bridge(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the bridge details mutably.
    pub fn as_bridge_mut(&mut self) -> Option<&mut Bridge> {
        match &mut self.details {
            DeviceDetails::Bridge(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the outlet details.
    #[must_use]
    pub fn as_outlet(&self) -> Option<&Outlet> {
        match &self.details {
            DeviceDetails::Outlet(o) => Some(o),
            _ => None,
        }
    }

    /// Returns the outlet details mutably.
    pub fn as_outlet_mut(&mut self) -> Option<&mut Outlet> {
        match &mut self.details {
            DeviceDetails::Outlet(o) => Some(o),
            _ => None,
        }
    }

    /// Returns the Wi-Fi node details.
    #[must_use]
    pub fn as_wifi_node(&self) -> Option<&WifiNode> {
        match &self.details {
            DeviceDetails::WifiNode(w) => Some(w),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light_device() -> Device {
        let mut light = Light::new(ControllerRef::new(DeviceId::new(), 1), "LCT015", "00:17:88:01");
        light.on = true;
        light.brightness = Brightness::new(200);
        Device::new(
            AccountId::new("alice"),
            "Desk",
            "10.0.0.5",
            VendorTag::hue(),
            DeviceDetails::Light(light),
        )
    }

    #[test]
    fn light_defaults() {
        let light = Light::new(ControllerRef::new(DeviceId::new(), 1), "m", "u");
        assert_eq!(light.color_temperature.value(), 153);
        assert_eq!(light.color_xy, CieXy::new(0.313_06, 0.323_18));
        assert_eq!(light.light_type, "Color temperature light");
    }

    #[test]
    fn set_color_temperature_derives_xy() {
        let mut light = Light::new(ControllerRef::new(DeviceId::new(), 1), "m", "u");
        let ct = ColorTemperature::new(300).unwrap();
        assert!(light.set_color_temperature(ct));
        assert_eq!(light.color_xy, ct.to_cie_xy());
        assert!(!light.set_color_temperature(ct));
    }

    #[test]
    fn category_follows_details() {
        assert_eq!(light_device().category(), DeviceCategory::Light);
    }

    #[test]
    fn attributes_of_a_light() {
        let device = light_device();
        assert_eq!(
            device.attribute(StateAttribute::State),
            Some(AttributeValue::Bool(true))
        );
        assert_eq!(
            device.attribute(StateAttribute::Brightness),
            Some(AttributeValue::Number(200.0))
        );
        assert_eq!(
            device.attribute(StateAttribute::Enabled),
            Some(AttributeValue::Bool(true))
        );
        assert_eq!(device.attribute(StateAttribute::Speed), None);
    }

    #[test]
    fn reconcile_key_only_for_lights_and_sensors() {
        let device = light_device();
        let key = device.reconcile_key().unwrap();
        assert_eq!(key.model_id, "LCT015");
        assert_eq!(key.controller.index, 1);
        assert_eq!(key.category, DeviceCategory::Light);

        let bridge = Device::new(
            AccountId::new("alice"),
            "Bridge",
            "10.0.0.5",
            VendorTag::hue(),
            DeviceDetails::Bridge(Bridge::default()),
        );
        assert!(bridge.reconcile_key().is_none());
    }

    #[test]
    fn details_serialize_with_category_tag() {
        let json = serde_json::to_value(&light_device()).unwrap();
        assert_eq!(json["details"]["category"], "light");
        assert_eq!(json["details"]["color_xy"][0], 0.313_06);
    }
}
