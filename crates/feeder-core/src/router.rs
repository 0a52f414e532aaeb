//! Keyed message dispatch.
//!
//! Every inbound frame names a route key. The router looks the key up in its
//! table, runs the handler against the caller's session and the device store,
//! and folds whatever comes back (reply, error, nothing, or a panic) into an
//! [`Envelope`] tagged with the key.

use crate::handlers;
use crate::{DeviceStore, Session};
use feeder_types::{Envelope, Payload};
use serde_json::{Value, json};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;
use tracing::{debug, error, warn};

const UNEXPECTED_ERROR: &str = "An unexpected error occurred while processing the request";
const MALFORMED_REPLY: &str = "Route endpoint did not return a valid object";

/// Everything a handler may touch while serving one request.
pub struct RouteContext<'a> {
    pub session: &'a mut Session,
    pub store: &'a mut DeviceStore,
}

/// Successful handler output.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub code: u16,
    /// Must be a JSON object.
    pub data: Value,
}

impl Reply {
    pub fn ok(data: Value) -> Self {
        Self { code: 200, data }
    }

    pub fn with_code(code: u16, data: Value) -> Self {
        Self { code, data }
    }
}

/// Per-request failure reported back to the peer. The connection stays open.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Logged; the peer only sees a generic message.
    #[error("{0}")]
    Internal(String),
}

impl RouteError {
    pub fn code(&self) -> u16 {
        match self {
            RouteError::BadRequest(_) => 400,
            RouteError::Unauthorized(_) => 401,
            RouteError::Forbidden(_) => 403,
            RouteError::NotFound(_) => 404,
            RouteError::Internal(_) => 500,
        }
    }
}

/// `Ok(None)` means "nothing to say" and becomes a 204.
pub type RouteResult = std::result::Result<Option<Reply>, RouteError>;

pub type RouteHandler = fn(&mut RouteContext<'_>, &Payload) -> RouteResult;

/// Static table of route handlers.
pub struct Router {
    routes: HashMap<&'static str, RouteHandler>,
}

impl Default for Router {
    /// Router with the standard hub routes registered.
    fn default() -> Self {
        let mut router = Self::empty();
        handlers::register(&mut router);
        router
    }
}

impl Router {
    pub fn empty() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Register (or replace) the handler for `key`.
    pub fn register(&mut self, key: &'static str, handler: RouteHandler) -> &mut Self {
        self.routes.insert(key, handler);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.routes.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.routes.keys().copied()
    }

    /// Run the handler for `key` and wrap its outcome.
    ///
    /// Never fails: unknown keys, handler errors and handler panics all come
    /// back as error envelopes.
    pub fn dispatch(
        &self,
        key: &str,
        session: &mut Session,
        store: &mut DeviceStore,
        payload: &Payload,
    ) -> Envelope {
        let session_key = session.key();

        let Some(handler) = self.routes.get(key) else {
            debug!(target: "feeder::dispatch", "[{}] No route for {}", session_key, key);
            return Envelope::error(404, format!("Route \"{}\" not found", key), key);
        };

        let mut ctx = RouteContext { session, store };
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(&mut ctx, payload)));

        match outcome {
            Err(panic) => {
                error!(
                    target: "feeder::dispatch",
                    "[{}] Route {} panicked: {}",
                    session_key,
                    key,
                    panic_message(panic.as_ref())
                );
                Envelope::error(500, UNEXPECTED_ERROR, key)
            }
            Ok(Ok(None)) => Envelope::success(204, json!({}), key),
            Ok(Ok(Some(reply))) => {
                if !reply.data.is_object() {
                    error!(
                        target: "feeder::dispatch",
                        "[{}] Route {} returned non-object data: {}",
                        session_key, key, reply.data
                    );
                    return Envelope::error(500, MALFORMED_REPLY, key);
                }
                if !(200..300).contains(&reply.code) {
                    warn!(
                        target: "feeder::dispatch",
                        "Route \"{}\" returned a success status with a non-2xx code: {}",
                        key, reply.code
                    );
                }
                Envelope::success(reply.code, reply.data, key)
            }
            Ok(Err(RouteError::Internal(message))) => {
                error!(
                    target: "feeder::dispatch",
                    "[{}] Route {} failed: {}",
                    session_key, key, message
                );
                Envelope::error(500, UNEXPECTED_ERROR, key)
            }
            Ok(Err(err)) => {
                let code = err.code();
                if !(400..600).contains(&code) {
                    warn!(
                        target: "feeder::dispatch",
                        "Route \"{}\" returned an error status with a non-4xx/5xx code: {}",
                        key, code
                    );
                }
                debug!(target: "feeder::dispatch", "[{}] Route {} rejected: {} {}", session_key, key, code, err);
                Envelope::error(code, err.to_string(), key)
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
