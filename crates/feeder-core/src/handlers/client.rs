use super::{device_not_found, hwid_param, require_client};
use crate::router::{Reply, RouteContext, RouteError, RouteResult};
use feeder_types::{Device, Payload};
use serde_json::Value;
use tracing::info;

/// Full snapshot of one device: metadata, live components and history.
pub fn get_data(ctx: &mut RouteContext<'_>, data: &Payload) -> RouteResult {
    require_client(ctx.session)?;
    let hwid = hwid_param(data)?;

    let device = ctx.store.get(hwid).ok_or_else(device_not_found)?;
    let value = serde_json::to_value(device).map_err(|e| RouteError::Internal(e.to_string()))?;

    Ok(Some(Reply::ok(value)))
}

/// Arm or disarm the water pump trigger.
pub fn pump_control(ctx: &mut RouteContext<'_>, data: &Payload) -> RouteResult {
    actuator_control(ctx, data, Actuator::WaterPump)
}

/// Arm or disarm the food dispenser trigger.
pub fn food_control(ctx: &mut RouteContext<'_>, data: &Payload) -> RouteResult {
    actuator_control(ctx, data, Actuator::FoodServo)
}

#[derive(Debug, Clone, Copy)]
enum Actuator {
    WaterPump,
    FoodServo,
}

impl Actuator {
    /// Set the trigger flag. Reported state is left for the device to update.
    fn set_trigger(self, device: &mut Device, enable: bool) -> Result<(), RouteError> {
        match self {
            Actuator::WaterPump => {
                let pump = device.water_pump_mut().ok_or_else(|| {
                    RouteError::NotFound("Water pump not found in the device data".into())
                })?;
                pump.trigger_enable = enable;
            }
            Actuator::FoodServo => {
                let servo = device.servo_mut().ok_or_else(|| {
                    RouteError::NotFound("Food servo not found in the device data".into())
                })?;
                servo.trigger_dispense = enable;
            }
        }
        Ok(())
    }
}

fn actuator_control(ctx: &mut RouteContext<'_>, data: &Payload, actuator: Actuator) -> RouteResult {
    require_client(ctx.session)?;
    let hwid = hwid_param(data)?;

    let device = ctx.store.get_mut(hwid).ok_or_else(device_not_found)?;

    let enable = data
        .get("enable")
        .and_then(Value::as_bool)
        .ok_or_else(|| RouteError::BadRequest("Invalid enable format, expected a boolean".into()))?;

    actuator.set_trigger(device, enable)?;
    info!(
        target: "feeder::store",
        "[{}] {:?} trigger for {} set to {}",
        ctx.session.key(),
        actuator,
        hwid,
        enable
    );

    Ok(None)
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::TestPeer;
    use crate::{DeviceStore, Router};
    use feeder_types::{DeviceComponent, ServoState, WaterPumpState};
    use serde_json::json;

    fn client(router: &Router, store: &mut DeviceStore) -> TestPeer {
        let mut peer = TestPeer::new(2);
        peer.send(router, store, "/login", json!({"kind": "client"}));
        peer
    }

    fn store_with_actuators() -> DeviceStore {
        let mut store = DeviceStore::default();
        let device = store.upsert("dev1");
        device.merge_component(DeviceComponent::WaterPump(WaterPumpState::reported(false)));
        device.merge_component(DeviceComponent::Servo(ServoState::reported(false)));
        store
    }

    #[test]
    fn test_get_data_requires_login() {
        let router = Router::default();
        let mut store = DeviceStore::default();
        let mut peer = TestPeer::new(2);

        let envelope = peer.send(&router, &mut store, "/client/get_data", json!({"iot_hwid": "dev1"}));
        assert_eq!(envelope.code, 401);
    }

    #[test]
    fn test_get_data_rejects_iot_role() {
        let router = Router::default();
        let mut store = DeviceStore::default();
        let mut peer = TestPeer::new(3);
        peer.send(&router, &mut store, "/login", json!({"kind": "iot", "iot_hwid": "dev1"}));

        let envelope = peer.send(&router, &mut store, "/client/get_data", json!({"iot_hwid": "dev1"}));
        assert_eq!(envelope.code, 403);
    }

    #[test]
    fn test_get_data_unknown_device() {
        let router = Router::default();
        let mut store = DeviceStore::default();
        let mut peer = client(&router, &mut store);

        let envelope = peer.send(&router, &mut store, "/client/get_data", json!({"iot_hwid": "ghost"}));
        assert_eq!(envelope.code, 404);
        assert_eq!(
            envelope.error_message.as_deref(),
            Some("This IoT device data is not found")
        );
    }

    #[test]
    fn test_get_data_requires_hwid_string() {
        let router = Router::default();
        let mut store = DeviceStore::default();
        let mut peer = client(&router, &mut store);

        let envelope = peer.send(&router, &mut store, "/client/get_data", json!({}));
        assert_eq!(envelope.code, 400);
        let envelope = peer.send(&router, &mut store, "/client/get_data", json!({"iot_hwid": 1}));
        assert_eq!(envelope.code, 400);
    }

    #[test]
    fn test_get_data_returns_device() {
        let router = Router::default();
        let mut store = store_with_actuators();
        let mut peer = client(&router, &mut store);

        let envelope = peer.send(&router, &mut store, "/client/get_data", json!({"iot_hwid": "dev1"}));
        assert_eq!(envelope.code, 200);
        let data = envelope.data.unwrap();
        assert_eq!(data["hwid"], "dev1");
        assert_eq!(data["name"], "dev1");
        assert_eq!(data["live"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_pump_control_sets_trigger_only() {
        let router = Router::default();
        let mut store = store_with_actuators();
        let mut peer = client(&router, &mut store);

        let envelope = peer.send(
            &router,
            &mut store,
            "/client/pump_control",
            json!({"iot_hwid": "dev1", "enable": true}),
        );
        assert_eq!(envelope.code, 204);
        assert_eq!(envelope.data, Some(json!({})));

        let pump = store.get_mut("dev1").unwrap().water_pump_mut().unwrap();
        assert!(pump.trigger_enable);
        assert!(!pump.powered_on);
    }

    #[test]
    fn test_food_control_sets_trigger() {
        let router = Router::default();
        let mut store = store_with_actuators();
        let mut peer = client(&router, &mut store);

        peer.send(
            &router,
            &mut store,
            "/client/food_control",
            json!({"iot_hwid": "dev1", "enable": true}),
        );

        let servo = store.get_mut("dev1").unwrap().servo_mut().unwrap();
        assert!(servo.trigger_dispense);
        assert!(!servo.is_dispensing);
    }

    #[test]
    fn test_control_missing_component() {
        let router = Router::default();
        let mut store = DeviceStore::default();
        store.upsert("dev1");
        let mut peer = client(&router, &mut store);

        let envelope = peer.send(
            &router,
            &mut store,
            "/client/pump_control",
            json!({"iot_hwid": "dev1", "enable": true}),
        );
        assert_eq!(envelope.code, 404);

        let envelope = peer.send(
            &router,
            &mut store,
            "/client/food_control",
            json!({"iot_hwid": "dev1", "enable": true}),
        );
        assert_eq!(envelope.code, 404);
    }

    #[test]
    fn test_control_validation() {
        let router = Router::default();
        let mut store = store_with_actuators();
        let mut peer = client(&router, &mut store);

        let envelope = peer.send(
            &router,
            &mut store,
            "/client/pump_control",
            json!({"iot_hwid": "dev1", "enable": "yes"}),
        );
        assert_eq!(envelope.code, 400);

        let envelope = peer.send(
            &router,
            &mut store,
            "/client/pump_control",
            json!({"iot_hwid": "ghost", "enable": true}),
        );
        assert_eq!(envelope.code, 404);
    }
}
