use super::{device_not_found, require_auth, require_bound_hwid};
use crate::router::{Reply, RouteContext, RouteError, RouteResult};
use feeder_types::{
    AuthKind, DeviceComponent, DhtReading, Payload, ServoState, WaterLevelReading, WaterPumpState,
};
use serde_json::{Value, json};
use tracing::{debug, warn};

/// Device poll: return pending triggers and clear them.
///
/// A missing actuator reads as `false`.
pub fn get_data(ctx: &mut RouteContext<'_>, data: &Payload) -> RouteResult {
    if require_auth(ctx.session)? != AuthKind::Iot {
        return Err(RouteError::Forbidden(
            "This endpoint is only accessible by IoT devices".into(),
        ));
    }
    let hwid = require_bound_hwid(ctx.session)?;

    if !data.is_empty() {
        return Err(RouteError::BadRequest(
            "You should not send any data to this endpoint".into(),
        ));
    }

    let device = ctx.store.get_mut(&hwid).ok_or_else(device_not_found)?;
    device.touch();

    let should_enable_pump = device
        .water_pump_mut()
        .map(|pump| std::mem::take(&mut pump.trigger_enable))
        .unwrap_or(false);
    let should_dispense = device
        .servo_mut()
        .map(|servo| std::mem::take(&mut servo.trigger_dispense))
        .unwrap_or(false);

    if should_enable_pump || should_dispense {
        debug!(
            target: "feeder::store",
            "Device {} consumed triggers (pump: {}, food: {})",
            hwid, should_enable_pump, should_dispense
        );
    }

    Ok(Some(Reply::ok(json!({
        "shouldEnableWaterPump": should_enable_pump,
        "shouldDispenseFood": should_dispense,
    }))))
}

/// Device report: merge any of `te`+`hu`, `wa`, `PuEn`, `DiFo` into the live list.
///
/// Only a bound hwid is required, not the `iot` role. Reports are validated
/// as a whole before anything is merged.
pub fn post_data(ctx: &mut RouteContext<'_>, data: &Payload) -> RouteResult {
    require_auth(ctx.session)?;
    let hwid = require_bound_hwid(ctx.session)?;

    let history_limit = ctx.store.history_limit();
    let device = ctx.store.get_mut(&hwid).ok_or_else(device_not_found)?;

    let reports = parse_reports(&hwid, data)?;
    for report in reports {
        device.merge_component(report);
    }
    device.touch();
    device.record_snapshot(history_limit);

    Ok(Some(Reply::ok(json!({ "message": "Data received successfully" }))))
}

fn parse_reports(hwid: &str, data: &Payload) -> Result<Vec<DeviceComponent>, RouteError> {
    let mut reports = Vec::new();

    match (number_field(data, "te")?, number_field(data, "hu")?) {
        (Some(temperature), Some(humidity)) => reports.push(DeviceComponent::Dht(DhtReading {
            temperature,
            humidity,
        })),
        (None, None) => {}
        _ => warn!(
            target: "feeder::store",
            "Device {} sent an incomplete DHT reading (te and hu must come together), ignoring it",
            hwid
        ),
    }

    if let Some(water_level) = number_field(data, "wa")? {
        reports.push(DeviceComponent::WaterLevel(WaterLevelReading { water_level }));
    }

    if let Some(powered_on) = flag_field(data, "PuEn")? {
        reports.push(DeviceComponent::WaterPump(WaterPumpState::reported(powered_on)));
    }

    if let Some(is_dispensing) = flag_field(data, "DiFo")? {
        reports.push(DeviceComponent::Servo(ServoState::reported(is_dispensing)));
    }

    Ok(reports)
}

fn number_field(data: &Payload, key: &str) -> Result<Option<f64>, RouteError> {
    match data.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| RouteError::BadRequest(format!("Invalid {} format, expected a number", key))),
    }
}

/// Firmware sends booleans as 0/1. Anything above zero counts as on.
fn flag_field(data: &Payload, key: &str) -> Result<Option<bool>, RouteError> {
    match data.get(key) {
        None => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(*flag)),
        Some(value) => value.as_f64().map(|n| Some(n > 0.0)).ok_or_else(|| {
            RouteError::BadRequest(format!("Invalid {} format, expected a number", key))
        }),
    }
}
