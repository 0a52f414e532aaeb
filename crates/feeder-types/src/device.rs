//! Device state model: devices and their live sensor/actuator components.

use chrono::Utc;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::VecDeque;

/// Whether a component reports measurements or drives hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Sensor,
    Actuator,
}

/// Concrete component type. Each type belongs to exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    #[serde(rename = "DHT")]
    Dht,
    WaterLevel,
    WaterPump,
    Servo,
}

impl ComponentType {
    pub fn kind(self) -> ComponentKind {
        match self {
            ComponentType::Dht | ComponentType::WaterLevel => ComponentKind::Sensor,
            ComponentType::WaterPump | ComponentType::Servo => ComponentKind::Actuator,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ComponentType::Dht => "DHT",
            ComponentType::WaterLevel => "WaterLevel",
            ComponentType::WaterPump => "WaterPump",
            ComponentType::Servo => "Servo",
        }
    }
}

/// Temperature/humidity sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DhtReading {
    /// Temperature in Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
}

/// Water tank level sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WaterLevelReading {
    /// Water level in percent
    #[serde(rename = "waterLevel")]
    pub water_level: f64,
}

/// Water pump actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WaterPumpState {
    /// Reported by the device.
    pub powered_on: bool,
    /// Set by a client, consumed by the device on its next poll.
    #[serde(rename = "triggerEnableWaterPump", default)]
    pub trigger_enable: bool,
}

impl WaterPumpState {
    pub fn reported(powered_on: bool) -> Self {
        Self {
            powered_on,
            trigger_enable: false,
        }
    }
}

/// Food dispenser servo actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServoState {
    /// Reported by the device.
    #[serde(rename = "isDispensing")]
    pub is_dispensing: bool,
    /// Set by a client, consumed by the device on its next poll.
    #[serde(rename = "triggerDispenseFood", default)]
    pub trigger_dispense: bool,
}

impl ServoState {
    pub fn reported(is_dispensing: bool) -> Self {
        Self {
            is_dispensing,
            trigger_dispense: false,
        }
    }
}

/// A live component entry on a device.
///
/// Serialized with an explicit `type` tag. Inside a [`Device`] the entries are
/// additionally tagged with their `kind` (see [`serialize_components`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DeviceComponent {
    #[serde(rename = "DHT")]
    Dht(DhtReading),
    WaterLevel(WaterLevelReading),
    WaterPump(WaterPumpState),
    Servo(ServoState),
}

impl DeviceComponent {
    pub fn component_type(&self) -> ComponentType {
        match self {
            DeviceComponent::Dht(_) => ComponentType::Dht,
            DeviceComponent::WaterLevel(_) => ComponentType::WaterLevel,
            DeviceComponent::WaterPump(_) => ComponentType::WaterPump,
            DeviceComponent::Servo(_) => ComponentType::Servo,
        }
    }

    pub fn kind(&self) -> ComponentKind {
        self.component_type().kind()
    }

    /// Merge a device report into this entry.
    ///
    /// Reported fields are overwritten; trigger flags are left as they are, since
    /// only clients set them and only the device's poll clears them. Returns
    /// `false` without touching anything if the report is for another type.
    pub fn merge_report(&mut self, report: &DeviceComponent) -> bool {
        match (self, report) {
            (DeviceComponent::Dht(current), DeviceComponent::Dht(new)) => {
                *current = *new;
            }
            (DeviceComponent::WaterLevel(current), DeviceComponent::WaterLevel(new)) => {
                *current = *new;
            }
            (DeviceComponent::WaterPump(current), DeviceComponent::WaterPump(new)) => {
                current.powered_on = new.powered_on;
            }
            (DeviceComponent::Servo(current), DeviceComponent::Servo(new)) => {
                current.is_dispensing = new.is_dispensing;
            }
            _ => return false,
        }
        true
    }
}

#[derive(Serialize)]
struct KindTagged<'a> {
    kind: ComponentKind,
    #[serde(flatten)]
    component: &'a DeviceComponent,
}

/// Serialize components as `{"kind": .., "type": .., ...fields}` objects.
pub fn serialize_components<S>(components: &[DeviceComponent], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(components.iter().map(|component| KindTagged {
        kind: component.kind(),
        component,
    }))
}

/// Point-in-time copy of a device's live components.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(serialize_with = "serialize_components")]
    pub data: Vec<DeviceComponent>,
}

/// A physical feeder, identified by its hardware id.
#[derive(Debug, Clone, Serialize)]
pub struct Device {
    pub hwid: String,
    pub name: String,
    pub online: bool,
    /// Milliseconds since the Unix epoch.
    pub last_seen: i64,
    pub history: VecDeque<Snapshot>,
    #[serde(serialize_with = "serialize_components")]
    pub live: Vec<DeviceComponent>,
}

impl Device {
    /// Create a device record named after its hwid, online as of now.
    pub fn new(hwid: impl Into<String>) -> Self {
        let hwid = hwid.into();
        Self {
            name: hwid.clone(),
            hwid,
            online: true,
            last_seen: now_millis(),
            history: VecDeque::new(),
            live: Vec::new(),
        }
    }

    pub fn component(&self, component_type: ComponentType) -> Option<&DeviceComponent> {
        self.live
            .iter()
            .find(|c| c.component_type() == component_type)
    }

    pub fn water_pump_mut(&mut self) -> Option<&mut WaterPumpState> {
        self.live.iter_mut().find_map(|c| match c {
            DeviceComponent::WaterPump(pump) => Some(pump),
            _ => None,
        })
    }

    pub fn servo_mut(&mut self) -> Option<&mut ServoState> {
        self.live.iter_mut().find_map(|c| match c {
            DeviceComponent::Servo(servo) => Some(servo),
            _ => None,
        })
    }

    /// Merge a report into the live entry of the same type, or append it.
    ///
    /// Keeps at most one live entry per (kind, type).
    pub fn merge_component(&mut self, report: DeviceComponent) {
        let component_type = report.component_type();
        match self
            .live
            .iter_mut()
            .find(|c| c.component_type() == component_type)
        {
            Some(existing) => {
                existing.merge_report(&report);
            }
            None => self.live.push(report),
        }
    }

    /// Append a snapshot of the live list, dropping the oldest beyond `limit`.
    pub fn record_snapshot(&mut self, limit: usize) {
        if limit == 0 {
            return;
        }
        self.history.push_back(Snapshot {
            timestamp: now_millis(),
            data: self.live.clone(),
        });
        while self.history.len() > limit {
            self.history.pop_front();
        }
    }

    /// Mark the device as online and seen now.
    pub fn touch(&mut self) {
        self.online = true;
        self.last_seen = now_millis();
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
