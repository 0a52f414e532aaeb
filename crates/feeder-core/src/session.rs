//! Per-connection sessions and the registry that owns them.

use crate::{ConnectionHandle, FeederError, Result};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use dashmap::mapref::one::{Ref, RefMut};
use feeder_types::{AuthData, AuthKind};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use tracing::{debug, info};

/// Session identifier derived from the peer's address and port.
///
/// Opaque to everything except the registry. Two peers behind the same NAT
/// egress can collide if the port is reused before the first one is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey(SocketAddr);

impl SessionKey {
    pub fn new(addr: SocketAddr) -> Self {
        Self(addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0.ip(), self.0.port())
    }
}

/// One live connection and its authentication state.
#[derive(Debug)]
pub struct Session {
    key: SessionKey,
    connection: ConnectionHandle,
    auth: Option<AuthData>,
}

impl Session {
    pub fn new(addr: SocketAddr, connection: ConnectionHandle) -> Self {
        Self {
            key: SessionKey::new(addr),
            connection,
            auth: None,
        }
    }

    pub fn key(&self) -> SessionKey {
        self.key
    }

    pub fn address(&self) -> IpAddr {
        self.key.0.ip()
    }

    pub fn port(&self) -> u16 {
        self.key.0.port()
    }

    pub fn connection(&self) -> &ConnectionHandle {
        &self.connection
    }

    pub fn auth(&self) -> Option<&AuthData> {
        self.auth.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    pub fn kind(&self) -> Option<AuthKind> {
        self.auth.as_ref().map(|a| a.kind)
    }

    /// Hardware id bound at login, if any.
    pub fn bound_hwid(&self) -> Option<&str> {
        self.auth.as_ref().and_then(|a| a.iot_hwid.as_deref())
    }

    /// Bind authentication data. Refuses to overwrite an existing login.
    pub fn authenticate(&mut self, auth: AuthData) -> bool {
        if self.auth.is_some() {
            return false;
        }
        self.auth = Some(auth);
        true
    }
}

/// All live sessions, keyed by peer address.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionKey, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection. Fails if the address:port is already registered.
    pub fn create(&self, addr: SocketAddr, connection: ConnectionHandle) -> Result<SessionKey> {
        let key = SessionKey::new(addr);
        match self.sessions.entry(key) {
            Entry::Occupied(_) => Err(FeederError::DuplicateSession(key)),
            Entry::Vacant(slot) => {
                slot.insert(Session::new(addr, connection));
                info!(target: "feeder::session", "[{}] New client connected", key);
                Ok(key)
            }
        }
    }

    pub fn remove(&self, key: &SessionKey) -> Option<Session> {
        let removed = self.sessions.remove(key).map(|(_, session)| session);
        if removed.is_some() {
            debug!(target: "feeder::session", "[{}] Session removed", key);
        }
        removed
    }

    pub fn get(&self, key: &SessionKey) -> Option<Ref<'_, SessionKey, Session>> {
        self.sessions.get(key)
    }

    /// Mutable access to a session. Do not hold the guard across an await point.
    pub fn get_mut(&self, key: &SessionKey) -> Option<RefMut<'_, SessionKey, Session>> {
        self.sessions.get_mut(key)
    }

    /// Snapshot of every registered connection handle.
    pub fn connections(&self) -> Vec<(SessionKey, ConnectionHandle)> {
        self.sessions
            .iter()
            .map(|entry| (*entry.key(), entry.value().connection.clone()))
            .collect()
    }

    /// Whether any live iot session is bound to `hwid`.
    pub fn has_device_session(&self, hwid: &str) -> bool {
        self.sessions.iter().any(|entry| {
            let session = entry.value();
            session.kind() == Some(AuthKind::Iot) && session.bound_hwid() == Some(hwid)
        })
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
