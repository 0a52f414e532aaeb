use crate::router::{Reply, RouteContext, RouteError, RouteResult};
use feeder_types::Payload;
use serde_json::{Value, json};

/// Greeting that works without login.
pub fn hello(_ctx: &mut RouteContext<'_>, data: &Payload) -> RouteResult {
    let message = match data.get("name") {
        None => "Hello, world!".to_string(),
        Some(Value::String(name)) => format!("Hello, {}!", name),
        Some(_) => {
            return Err(RouteError::BadRequest(
                "Invalid name format. Expected a string.".into(),
            ));
        }
    };

    Ok(Some(Reply::ok(json!({ "message": message }))))
}
