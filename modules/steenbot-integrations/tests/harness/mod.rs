//! Scriptable adapter fake for registry tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use steenbot_common::{Result, SteenBotError};
use steenbot_engine::EventHandler;
use steenbot_events::Event;
use steenbot_integrations::{IntegrationAdapter, IntegrationCapability, IntegrationConfig};
use tokio::sync::{Barrier, Notify};

/// Poll `condition` until it holds, failing the test after five seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("condition never held");
}

/// Records every lifecycle call as "id:step".
#[derive(Clone, Default)]
pub struct Calls(Arc<Mutex<Vec<String>>>);

impl Calls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: String) {
        self.0.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn for_adapter(&self, id: &str) -> Vec<String> {
        let prefix = format!("{id}:");
        self.0
            .lock()
            .iter()
            .filter_map(|e| e.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }
}

pub struct FakeAdapter {
    config: IntegrationConfig,
    calls: Calls,
    pub fail_initialize: AtomicBool,
    pub valid: AtomicBool,
    pub fail_connect: AtomicBool,
    pub fail_disconnect: AtomicBool,
    /// When set, disconnect waits here before returning.
    pub disconnect_barrier: Option<Arc<Barrier>>,
    /// When set, connect parks here until notified.
    pub connect_gate: Option<Arc<Notify>>,
}

impl FakeAdapter {
    pub fn new(id: &str, adapter_type: &str, calls: &Calls) -> Self {
        Self {
            config: IntegrationConfig::new(id, adapter_type),
            calls: calls.clone(),
            fail_initialize: AtomicBool::new(false),
            valid: AtomicBool::new(true),
            fail_connect: AtomicBool::new(false),
            fail_disconnect: AtomicBool::new(false),
            disconnect_barrier: None,
            connect_gate: None,
        }
    }

    pub fn failing_initialize(self) -> Self {
        self.fail_initialize.store(true, Ordering::SeqCst);
        self
    }

    pub fn invalid(self) -> Self {
        self.valid.store(false, Ordering::SeqCst);
        self
    }

    pub fn failing_connect(self) -> Self {
        self.fail_connect.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_disconnect(self) -> Self {
        self.fail_disconnect.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_disconnect_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.disconnect_barrier = Some(barrier);
        self
    }

    pub fn with_connect_gate(mut self, gate: Arc<Notify>) -> Self {
        self.connect_gate = Some(gate);
        self
    }

    fn record(&self, step: &str) {
        self.calls.push(format!("{}:{step}", self.config.id));
    }
}

#[async_trait]
impl IntegrationAdapter for FakeAdapter {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn adapter_type(&self) -> &str {
        &self.config.adapter_type
    }

    fn version(&self) -> &str {
        "0.0.1"
    }

    fn config(&self) -> &IntegrationConfig {
        &self.config
    }

    async fn initialize(&self) -> Result<()> {
        self.record("initialize");
        if self.fail_initialize.load(Ordering::SeqCst) {
            return Err(SteenBotError::Connection("initialize refused".into()));
        }
        Ok(())
    }

    async fn connect(&self) -> Result<()> {
        self.record("connect");
        if let Some(gate) = &self.connect_gate {
            gate.notified().await;
        }
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(SteenBotError::Connection("connection refused".into()));
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.record("disconnect");
        if let Some(barrier) = &self.disconnect_barrier {
            barrier.wait().await;
        }
        if self.fail_disconnect.load(Ordering::SeqCst) {
            return Err(SteenBotError::Connection("disconnect failed".into()));
        }
        Ok(())
    }

    async fn validate(&self) -> Result<bool> {
        self.record("validate");
        Ok(self.valid.load(Ordering::SeqCst))
    }

    async fn subscribe(&self, _handler: Arc<dyn EventHandler>) -> Result<()> {
        Ok(())
    }

    async fn unsubscribe(&self) -> Result<()> {
        Ok(())
    }

    async fn publish(&self, _event: &Event) -> Result<()> {
        Ok(())
    }

    fn capabilities(&self) -> Vec<IntegrationCapability> {
        vec![IntegrationCapability {
            name: "tasks".into(),
            description: "fake tasks".into(),
            operations: vec!["create".into()],
            events: vec![],
        }]
    }

    async fn execute_operation(&self, operation: &str, _params: Value) -> Result<Value> {
        Ok(json!({ "operation": operation }))
    }
}
