//! Route handlers.
//!
//! | Key | Caller | Effect |
//! |-----|--------|--------|
//! | `/hello` | anyone | greeting, transport smoke test |
//! | `/login` | anyone | binds role (and hwid) to the session |
//! | `/client/get_data` | client | full device dump |
//! | `/client/pump_control` | client | arms the water pump trigger |
//! | `/client/food_control` | client | arms the food servo trigger |
//! | `/iot/get_data` | iot | reads and clears pending triggers |
//! | `/iot/post_data` | bound hwid | merges sensor/actuator reports |

mod client;
mod hello;
mod iot;
mod login;

use crate::router::{RouteError, Router};
use crate::Session;
use feeder_types::{AuthKind, Payload};
use serde_json::Value;

pub use client::{food_control, get_data as client_get_data, pump_control};
pub use hello::hello;
pub use iot::{get_data as iot_get_data, post_data as iot_post_data};
pub use login::login;

pub(crate) fn register(router: &mut Router) {
    router
        .register("/hello", hello)
        .register("/login", login)
        .register("/iot/get_data", iot_get_data)
        .register("/iot/post_data", iot_post_data)
        .register("/client/get_data", client_get_data)
        .register("/client/food_control", food_control)
        .register("/client/pump_control", pump_control);
}

fn require_auth(session: &Session) -> Result<AuthKind, RouteError> {
    session.kind().ok_or_else(|| {
        RouteError::Unauthorized("You must be authenticated to use this endpoint".into())
    })
}

fn require_client(session: &Session) -> Result<(), RouteError> {
    if require_auth(session)? != AuthKind::Client {
        return Err(RouteError::Forbidden(
            "This endpoint is only accessible by client devices".into(),
        ));
    }
    Ok(())
}

/// Hardware id bound to the session at login.
fn require_bound_hwid(session: &Session) -> Result<String, RouteError> {
    session
        .bound_hwid()
        .map(str::to_string)
        .ok_or_else(|| RouteError::Forbidden("IoT device HWID is not set in session".into()))
}

/// The `iot_hwid` request parameter.
fn hwid_param(data: &Payload) -> Result<&str, RouteError> {
    data.get("iot_hwid")
        .and_then(Value::as_str)
        .ok_or_else(|| RouteError::BadRequest("Invalid iot_hwid format, expected a string".into()))
}

fn device_not_found() -> RouteError {
    RouteError::NotFound("This IoT device data is not found".into())
}
