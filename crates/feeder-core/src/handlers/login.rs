use crate::router::{Reply, RouteContext, RouteError, RouteResult};
use feeder_types::{AuthData, AuthKind, Payload};
use serde_json::{Value, json};
use tracing::info;

/// Bind a role, and optionally a hardware id, to the session.
///
/// A session logs in at most once; later attempts are rejected whatever they carry.
pub fn login(ctx: &mut RouteContext<'_>, data: &Payload) -> RouteResult {
    if ctx.session.is_authenticated() {
        return Err(RouteError::BadRequest("You are already logged in".into()));
    }

    let kind = match data.get("kind") {
        None => return Err(RouteError::BadRequest("Missing authentication kind".into())),
        Some(value) => value.as_str().and_then(AuthKind::parse).ok_or_else(|| {
            RouteError::BadRequest(
                "Invalid authentication kind, expected \"client\" or \"iot\"".into(),
            )
        })?,
    };

    let iot_hwid = match data.get("iot_hwid") {
        None if kind == AuthKind::Iot => {
            return Err(RouteError::BadRequest(
                "Missing iot_hwid for iot authentication".into(),
            ));
        }
        None => None,
        Some(Value::String(hwid)) if !hwid.is_empty() => Some(hwid.clone()),
        Some(_) => {
            return Err(RouteError::BadRequest(
                "Invalid iot_hwid format, expected a non-empty string".into(),
            ));
        }
    };

    ctx.session.authenticate(AuthData {
        kind,
        iot_hwid: iot_hwid.clone(),
    });

    let Some(hwid) = iot_hwid else {
        info!(target: "feeder::session", "[{}] Logged in as client", ctx.session.key());
        return Ok(Some(Reply::ok(json!({ "message": "Connected as client" }))));
    };

    let device = ctx.store.upsert(&hwid);
    if kind == AuthKind::Iot {
        device.touch();
    }
    info!(
        target: "feeder::session",
        "[{}] Logged in as {:?} bound to device {}",
        ctx.session.key(),
        kind,
        hwid
    );

    Ok(Some(Reply::ok(json!({
        "message": format!("Connected as IoT device with HWID: {}", hwid)
    }))))
}
