//! In-memory reference store.
//!
//! Backs the integration tests and the demo worker. It implements every
//! store trait over plain `HashMap`s behind async mutexes, and can be
//! told to fail specific operations so tests can exercise the `200xxx`
//! error paths without a real database falling over on cue.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tokengate_protocol::{AppId, DeviceId};
use tokio::sync::Mutex;

use crate::documents::{ActionRecord, AppBinding, Device, SessionRecord};
use crate::error::StoreError;
use crate::{ActionStore, ApplicationStore, DeviceStore, HeartbeatStore};

/// A store operation that [`MemoryStore`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    /// Fail [`ApplicationStore::find_application`].
    FindApplication,
    /// Fail [`DeviceStore::app_bindings`].
    FindDevice,
    /// Fail [`DeviceStore::set_session`].
    UpdateDevice,
    /// Fail [`ActionStore::insert_action`].
    InsertAction,
    /// Fail [`HeartbeatStore::record_heartbeat`].
    RecordHeartbeat,
}

/// An in-process document store.
///
/// Not a cache and not a mock framework — a real, if small,
/// implementation of the store contracts with the same observable
/// semantics the pipeline relies on (targeted session updates, no-op
/// update on a missing device, append-only actions).
#[derive(Debug, Default)]
pub struct MemoryStore {
    devices: Mutex<HashMap<String, Device>>,
    applications: Mutex<HashMap<String, Value>>,
    actions: Mutex<Vec<ActionRecord>>,
    heartbeats: Mutex<HashMap<String, u64>>,
    faults: Mutex<HashSet<FaultPoint>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a device document.
    pub async fn insert_device(&self, device: Device) {
        self.devices.lock().await.insert(device.id.clone(), device);
    }

    /// Seeds an application registry record. The record is raw JSON on
    /// purpose: tests need to seed malformed registry entries too.
    pub async fn insert_application(&self, id: &AppId, record: Value) {
        self.applications.lock().await.insert(id.0.clone(), record);
    }

    /// Returns a snapshot of a device document.
    pub async fn device(&self, id: &DeviceId) -> Option<Device> {
        self.devices.lock().await.get(&id.0).cloned()
    }

    /// Returns a snapshot of the action outbox, in insertion order.
    pub async fn actions(&self) -> Vec<ActionRecord> {
        self.actions.lock().await.clone()
    }

    /// Returns the last recorded heartbeat for a process/server pair.
    pub async fn last_heartbeat(
        &self,
        process: &str,
        server: &str,
    ) -> Option<u64> {
        self.heartbeats
            .lock()
            .await
            .get(&heartbeat_key(process, server))
            .copied()
    }

    /// Makes every subsequent call to the given operation fail.
    pub async fn fail_on(&self, point: FaultPoint) {
        self.faults.lock().await.insert(point);
    }

    async fn fault_armed(&self, point: FaultPoint) -> bool {
        self.faults.lock().await.contains(&point)
    }
}

impl ApplicationStore for MemoryStore {
    async fn find_application(
        &self,
        id: &AppId,
    ) -> Result<Option<Value>, StoreError> {
        if self.fault_armed(FaultPoint::FindApplication).await {
            return Err(StoreError::ApplicationLookup(
                "injected fault".into(),
            ));
        }
        Ok(self.applications.lock().await.get(&id.0).cloned())
    }
}

impl DeviceStore for MemoryStore {
    async fn app_bindings(
        &self,
        id: &DeviceId,
    ) -> Result<Option<HashMap<String, AppBinding>>, StoreError> {
        if self.fault_armed(FaultPoint::FindDevice).await {
            return Err(StoreError::DeviceLookup("injected fault".into()));
        }
        Ok(self
            .devices
            .lock()
            .await
            .get(&id.0)
            .and_then(|device| device.apps.clone()))
    }

    async fn set_session(
        &self,
        id: &DeviceId,
        app: &AppId,
        session: SessionRecord,
    ) -> Result<(), StoreError> {
        if self.fault_armed(FaultPoint::UpdateDevice).await {
            return Err(StoreError::DeviceUpdate("injected fault".into()));
        }

        let mut devices = self.devices.lock().await;
        // An update keyed by a missing device id matches nothing and
        // succeeds — same as the real store's update semantics.
        if let Some(device) = devices.get_mut(&id.0) {
            device
                .apps
                .get_or_insert_with(HashMap::new)
                .entry(app.0.clone())
                .or_insert_with(AppBinding::default)
                .session = Some(session);
        }
        Ok(())
    }
}

impl ActionStore for MemoryStore {
    async fn insert_action(
        &self,
        record: ActionRecord,
    ) -> Result<(), StoreError> {
        if self.fault_armed(FaultPoint::InsertAction).await {
            return Err(StoreError::ActionInsert("injected fault".into()));
        }
        self.actions.lock().await.push(record);
        Ok(())
    }
}

impl HeartbeatStore for MemoryStore {
    async fn record_heartbeat(
        &self,
        process: &str,
        server: &str,
        at_ms: u64,
    ) -> Result<(), StoreError> {
        if self.fault_armed(FaultPoint::RecordHeartbeat).await {
            return Err(StoreError::Unavailable("injected fault".into()));
        }
        self.heartbeats
            .lock()
            .await
            .insert(heartbeat_key(process, server), at_ms);
        Ok(())
    }
}

fn heartbeat_key(process: &str, server: &str) -> String {
    format!("{process}@{server}")
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn device_with_binding(id: &str, app: &str) -> Device {
        Device {
            id: id.into(),
            apps: Some(HashMap::from([(
                app.into(),
                AppBinding {
                    status: Some("registered".into()),
                    session: None,
                },
            )])),
        }
    }

    #[tokio::test]
    async fn test_find_application_returns_seeded_record() {
        let store = MemoryStore::new();
        let id = AppId("card-1".into());
        store.insert_application(&id, json!({ "name": "x" })).await;

        let found = store.find_application(&id).await.unwrap();
        assert_eq!(found, Some(json!({ "name": "x" })));
    }

    #[tokio::test]
    async fn test_find_application_unknown_returns_none() {
        let store = MemoryStore::new();
        let found =
            store.find_application(&AppId("ghost".into())).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_app_bindings_projects_apps_map_only() {
        let store = MemoryStore::new();
        store.insert_device(device_with_binding("dev-1", "card-1")).await;

        let bindings = store
            .app_bindings(&DeviceId("dev-1".into()))
            .await
            .unwrap()
            .unwrap();
        assert!(bindings.contains_key("card-1"));
    }

    #[tokio::test]
    async fn test_app_bindings_device_without_apps_returns_none() {
        let store = MemoryStore::new();
        store
            .insert_device(Device { id: "bare".into(), apps: None })
            .await;

        let bindings =
            store.app_bindings(&DeviceId("bare".into())).await.unwrap();
        assert!(bindings.is_none());
    }

    #[tokio::test]
    async fn test_set_session_overwrites_previous_session() {
        let store = MemoryStore::new();
        store.insert_device(device_with_binding("dev-1", "card-1")).await;
        let id = DeviceId("dev-1".into());
        let app = AppId("card-1".into());

        store
            .set_session(
                &id,
                &app,
                SessionRecord { id: "first".into(), timeout_at: 10 },
            )
            .await
            .unwrap();
        store
            .set_session(
                &id,
                &app,
                SessionRecord { id: "second".into(), timeout_at: 20 },
            )
            .await
            .unwrap();

        let device = store.device(&id).await.unwrap();
        let binding = &device.apps.unwrap()["card-1"];
        let session = binding.session.as_ref().unwrap();
        assert_eq!(session.id, "second");
        assert_eq!(session.timeout_at, 20);
    }

    #[tokio::test]
    async fn test_set_session_missing_device_is_noop() {
        let store = MemoryStore::new();
        let result = store
            .set_session(
                &DeviceId("ghost".into()),
                &AppId("card-1".into()),
                SessionRecord { id: "tok".into(), timeout_at: 0 },
            )
            .await;
        assert!(result.is_ok());
        assert!(store.device(&DeviceId("ghost".into())).await.is_none());
    }

    #[tokio::test]
    async fn test_fault_injection_fails_only_armed_operation() {
        let store = MemoryStore::new();
        store.fail_on(FaultPoint::FindApplication).await;

        let err = store
            .find_application(&AppId("card-1".into()))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), 200_002);

        // Other operations are unaffected.
        assert!(
            store.app_bindings(&DeviceId("dev".into())).await.is_ok()
        );
    }

    #[tokio::test]
    async fn test_record_heartbeat_upserts_latest_value() {
        let store = MemoryStore::new();
        store.record_heartbeat("worker", "host-a", 100).await.unwrap();
        store.record_heartbeat("worker", "host-a", 200).await.unwrap();

        assert_eq!(store.last_heartbeat("worker", "host-a").await, Some(200));
        assert_eq!(store.last_heartbeat("worker", "host-b").await, None);
    }
}
