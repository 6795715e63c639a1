//! IntegrationRegistry: the single source of truth for which adapters are
//! registered and connected.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use steenbot_common::{with_timeout, Result, SteenBotError};
use tracing::{error, info, warn};

use crate::adapter::IntegrationAdapter;

/// Where a registered adapter is in its lifecycle. Unregistered adapters
/// have no state at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    /// initialize → validate → connect in flight.
    Initializing,
    /// All three lifecycle steps succeeded.
    Active,
    /// disconnect in flight.
    Disconnecting,
}

struct Entry {
    adapter: Arc<dyn IntegrationAdapter>,
    state: AdapterState,
    // Identifies one registration attempt; ids can be reused after removal.
    token: u64,
}

/// Owns adapter lifecycles. Registration is all-or-nothing: an adapter whose
/// initialize, validate or connect fails is removed before the error is
/// returned, so no half-registered adapter is ever observable.
pub struct IntegrationRegistry {
    // Insertion-ordered. Never held across an await.
    entries: Mutex<Vec<Entry>>,
    next_token: AtomicU64,
    call_timeout: Option<Duration>,
}

impl Default for IntegrationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl IntegrationRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_token: AtomicU64::new(0),
            call_timeout: None,
        }
    }

    /// Bound each lifecycle call. Expiry is treated as that step failing.
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub async fn register_adapter(&self, adapter: Arc<dyn IntegrationAdapter>) -> Result<()> {
        let id = adapter.id().to_string();
        if id.is_empty() || adapter.adapter_type().is_empty() {
            return Err(SteenBotError::Validation(
                "Invalid adapter: missing required fields".into(),
            ));
        }

        // Duplicate check and insert under one lock, before any side effect.
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        {
            let mut entries = self.entries.lock();
            if entries.iter().any(|e| e.adapter.id() == id) {
                return Err(SteenBotError::Validation(format!(
                    "Adapter with ID {id} already registered"
                )));
            }
            entries.push(Entry {
                adapter: adapter.clone(),
                state: AdapterState::Initializing,
                token,
            });
        }

        if let Err(e) = self.bring_up(adapter.as_ref()).await {
            self.discard(token);
            warn!(adapter_id = %id, error = %e, "Adapter registration rolled back");
            return Err(e);
        }

        if self.set_state(token, AdapterState::Active) {
            info!(adapter_id = %id, adapter_type = %adapter.adapter_type(), version = %adapter.version(), "Adapter registered");
            return Ok(());
        }

        // Unregistered while initializing: nothing else owns the connection now.
        warn!(adapter_id = %id, "Adapter removed during registration, disconnecting");
        let op = format!("{id} disconnect");
        if let Err(e) = with_timeout(&op, self.call_timeout, adapter.disconnect()).await {
            error!(adapter_id = %id, error = %e, "Disconnect after aborted registration failed");
        }
        Err(SteenBotError::Connection(format!(
            "Adapter {id} was unregistered during registration"
        )))
    }

    async fn bring_up(&self, adapter: &dyn IntegrationAdapter) -> Result<()> {
        let id = adapter.id();
        let limit = self.call_timeout;

        with_timeout(&format!("{id} initialize"), limit, adapter.initialize()).await?;

        let valid = with_timeout(&format!("{id} validate"), limit, adapter.validate()).await?;
        if !valid {
            return Err(SteenBotError::Validation(format!(
                "Adapter {id} validation failed"
            )));
        }

        with_timeout(&format!("{id} connect"), limit, adapter.connect()).await
    }

    /// Disconnect (if connected) and remove. A failed disconnect leaves the
    /// adapter registered and active; retry, or use [`Self::force_remove`].
    pub async fn unregister_adapter(&self, adapter_id: &str) -> Result<()> {
        let (adapter, token, was_active) = {
            let mut entries = self.entries.lock();
            let entry = entries
                .iter_mut()
                .find(|e| e.adapter.id() == adapter_id)
                .ok_or_else(|| SteenBotError::not_found("Adapter", adapter_id))?;
            match entry.state {
                AdapterState::Disconnecting => {
                    return Err(SteenBotError::Validation(format!(
                        "Adapter {adapter_id} is already disconnecting"
                    )))
                }
                AdapterState::Active => {
                    entry.state = AdapterState::Disconnecting;
                    (entry.adapter.clone(), entry.token, true)
                }
                // Registration notices the removal and disconnects on its own.
                AdapterState::Initializing => (entry.adapter.clone(), entry.token, false),
            }
        };

        if was_active {
            let op = format!("{adapter_id} disconnect");
            if let Err(e) = with_timeout(&op, self.call_timeout, adapter.disconnect()).await {
                self.set_state(token, AdapterState::Active);
                error!(adapter_id, error = %e, "Error unregistering adapter");
                return Err(e);
            }
        }

        self.discard(token);
        info!(adapter_id, "Adapter unregistered");
        Ok(())
    }

    /// Evict without calling `disconnect`. For adapters stuck after a failed
    /// disconnect; the caller owns whatever connection may still be open.
    pub fn force_remove(&self, adapter_id: &str) -> Result<Arc<dyn IntegrationAdapter>> {
        let adapter = self
            .remove_entry(adapter_id)
            .ok_or_else(|| SteenBotError::not_found("Adapter", adapter_id))?;
        warn!(adapter_id, "Adapter force-removed without disconnect");
        Ok(adapter)
    }

    pub fn get_adapter(&self, adapter_id: &str) -> Result<Arc<dyn IntegrationAdapter>> {
        self.entries
            .lock()
            .iter()
            .find(|e| e.adapter.id() == adapter_id)
            .map(|e| e.adapter.clone())
            .ok_or_else(|| SteenBotError::not_found("Adapter", adapter_id))
    }

    pub fn get_adapters(&self) -> Vec<Arc<dyn IntegrationAdapter>> {
        self.entries.lock().iter().map(|e| e.adapter.clone()).collect()
    }

    pub fn get_adapters_by_type(&self, adapter_type: &str) -> Vec<Arc<dyn IntegrationAdapter>> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.adapter.adapter_type() == adapter_type)
            .map(|e| e.adapter.clone())
            .collect()
    }

    pub fn state(&self, adapter_id: &str) -> Option<AdapterState> {
        self.entries
            .lock()
            .iter()
            .find(|e| e.adapter.id() == adapter_id)
            .map(|e| e.state)
    }

    /// True once initialize, validate and connect have all succeeded, until
    /// a disconnect succeeds.
    pub fn is_initialized(&self, adapter_id: &str) -> bool {
        matches!(
            self.state(adapter_id),
            Some(AdapterState::Active | AdapterState::Disconnecting)
        )
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Disconnect every active adapter concurrently, wait for all of them,
    /// then clear the registry whatever the outcomes. Failures come back as
    /// one aggregated `Connection` error.
    pub async fn shutdown(&self) -> Result<()> {
        let active: Vec<Arc<dyn IntegrationAdapter>> = self
            .entries
            .lock()
            .iter()
            .filter(|e| e.state == AdapterState::Active)
            .map(|e| e.adapter.clone())
            .collect();

        info!(adapters = active.len(), "Shutting down integrations");

        let limit = self.call_timeout;
        let outcomes = join_all(active.iter().map(|adapter| async move {
            let id = adapter.id().to_string();
            let op = format!("{id} disconnect");
            let result = with_timeout(&op, limit, adapter.disconnect()).await;
            (id, result)
        }))
        .await;

        self.entries.lock().clear();

        let failures: Vec<String> = outcomes
            .into_iter()
            .filter_map(|(id, result)| result.err().map(|e| format!("{id}: {e}")))
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            error!(failed = failures.len(), "Adapters failed to disconnect during shutdown");
            Err(SteenBotError::Connection(format!(
                "{} adapter(s) failed to disconnect: {}",
                failures.len(),
                failures.join("; ")
            )))
        }
    }

    /// Update the entry created by one registration. False if it is gone.
    fn set_state(&self, token: u64, state: AdapterState) -> bool {
        match self.entries.lock().iter_mut().find(|e| e.token == token) {
            Some(entry) => {
                entry.state = state;
                true
            }
            None => false,
        }
    }

    fn discard(&self, token: u64) {
        self.entries.lock().retain(|e| e.token != token);
    }

    fn remove_entry(&self, adapter_id: &str) -> Option<Arc<dyn IntegrationAdapter>> {
        let mut entries = self.entries.lock();
        let pos = entries.iter().position(|e| e.adapter.id() == adapter_id)?;
        Some(entries.remove(pos).adapter)
    }
}
