//! In-memory device store keyed by hardware id.

use feeder_types::Device;
use std::collections::HashMap;
use tracing::debug;

/// Default number of history snapshots kept per device.
pub const DEFAULT_HISTORY_LIMIT: usize = 256;

/// Mapping from hardware id to device state.
///
/// Holds no lock of its own; callers serialise access (the server keeps it
/// behind a single mutex that every dispatch goes through).
#[derive(Debug)]
pub struct DeviceStore {
    devices: HashMap<String, Device>,
    history_limit: usize,
}

impl Default for DeviceStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl DeviceStore {
    pub fn new(history_limit: usize) -> Self {
        Self {
            devices: HashMap::new(),
            history_limit,
        }
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    pub fn get(&self, hwid: &str) -> Option<&Device> {
        self.devices.get(hwid)
    }

    pub fn get_mut(&mut self, hwid: &str) -> Option<&mut Device> {
        self.devices.get_mut(hwid)
    }

    /// Get the device, creating it with defaults if absent.
    pub fn upsert(&mut self, hwid: &str) -> &mut Device {
        self.devices.entry(hwid.to_string()).or_insert_with(|| {
            debug!(target: "feeder::store", "Creating device record for {}", hwid);
            Device::new(hwid)
        })
    }

    /// Replace the device record for `hwid`.
    pub fn set(&mut self, hwid: &str, device: Device) {
        self.devices.insert(hwid.to_string(), device);
    }

    /// Mark a device offline. Returns false if the device is unknown.
    pub fn mark_offline(&mut self, hwid: &str) -> bool {
        match self.devices.get_mut(hwid) {
            Some(device) => {
                device.online = false;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_unknown_is_none() {
        let store = DeviceStore::default();
        assert!(store.get("ghost").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_upsert_creates_once() {
        let mut store = DeviceStore::default();
        store.upsert("dev1").name = "Kitchen feeder".to_string();
        let device = store.upsert("dev1");

        assert_eq!(device.name, "Kitchen feeder");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_set_replaces() {
        let mut store = DeviceStore::default();
        store.upsert("dev1");

        let mut replacement = Device::new("dev1");
        replacement.online = false;
        store.set("dev1", replacement);

        assert!(!store.get("dev1").unwrap().online);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_mark_offline() {
        let mut store = DeviceStore::new(8);
        assert!(!store.mark_offline("dev1"));

        store.upsert("dev1");
        assert!(store.mark_offline("dev1"));
        assert!(!store.get("dev1").unwrap().online);
        assert_eq!(store.history_limit(), 8);
    }
}
