//! Test fixtures
//!
//! Builders for the objects most tests start from. Everything runs on a
//! freshly initialized [`MemoryBackend`].

use parking_lot::Mutex;
use std::sync::Arc;
use ward_acl::{AclService, AuditLogger, WardAclProvider};
use ward_core::{Entry, ObjectIdentity, SecurityIdentity, WardConfig};
use ward_store::{AclBackend, MemoryBackend};

/// Object identity of type `Post`
pub fn post(id: &str) -> ObjectIdentity {
    ObjectIdentity::new(id, "Post").unwrap()
}

/// Object identity of an arbitrary type
pub fn object(id: &str, object_type: &str) -> ObjectIdentity {
    ObjectIdentity::new(id, object_type).unwrap()
}

/// Role identity
pub fn role(name: &str) -> SecurityIdentity {
    SecurityIdentity::role(name).unwrap()
}

/// User identity of class `User`
pub fn user(username: &str) -> SecurityIdentity {
    SecurityIdentity::user(username, "User").unwrap()
}

/// Memory backend with its tables created
pub fn memory_backend() -> MemoryBackend {
    MemoryBackend::initialized().unwrap()
}

/// Provider over a fresh memory backend with default configuration
pub fn memory_provider() -> WardAclProvider<MemoryBackend> {
    WardAclProvider::new(memory_backend(), &WardConfig::default())
}

/// Provider over a shared backend, for tests that simulate restarts
pub fn provider_over(backend: Arc<MemoryBackend>) -> WardAclProvider<Arc<MemoryBackend>> {
    WardAclProvider::new(backend, &WardConfig::default())
}

/// Initialized service over `backend`
pub fn service_over<B: AclBackend>(backend: B, config: WardConfig) -> AclService<B> {
    let service = AclService::new(backend, config).unwrap();
    service.init().unwrap();
    service
}

/// Initialized service over a fresh memory backend
pub fn memory_service() -> AclService<MemoryBackend> {
    let service = AclService::in_memory(WardConfig::default()).unwrap();
    service.init().unwrap();
    service
}

/// One recorded audit event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Decision of the audited entry
    pub granted: bool,
    /// ACL the entry belongs to
    pub object_identity: ObjectIdentity,
    /// The deciding entry
    pub entry: Entry,
}

/// Audit logger keeping every event in memory
#[derive(Debug, Default)]
pub struct RecordingAuditLogger {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAuditLogger {
    /// Create an empty logger
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }
}

impl AuditLogger for RecordingAuditLogger {
    fn log(&self, granted: bool, object_identity: &ObjectIdentity, entry: &Entry) {
        self.events.lock().push(AuditEvent {
            granted,
            object_identity: object_identity.clone(),
            entry: entry.clone(),
        });
    }
}
