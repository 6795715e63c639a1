use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use steenbot_common::{Config, Result, SteenBotError};
use steenbot_engine::EventPipeline;
use steenbot_events::{Event, EventSource, EventType};
use tokio::sync::{oneshot, watch};
use tokio::time::{interval_at, MissedTickBehavior};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub id: String,
    pub name: String,
    pub poll_interval: Duration,
}

impl From<&Config> for BotConfig {
    fn from(config: &Config) -> Self {
        Self {
            id: config.bot_id.clone(),
            name: config.bot_name.clone(),
            poll_interval: config.poll_interval,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BotState {
    Initializing,
    Initialized,
    Running,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BotMetrics {
    pub events_processed: u64,
    pub errors: u64,
    /// Time since the bot was constructed.
    pub uptime: Duration,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BotStatus {
    pub id: String,
    pub state: BotState,
    pub last_poll: Option<DateTime<Utc>>,
    pub next_poll: Option<DateTime<Utc>>,
    pub metrics: BotMetrics,
    /// Message of the most recent failed poll, cleared on the next transition.
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Shared status
// ---------------------------------------------------------------------------

struct Shared {
    status: Mutex<BotStatus>,
    changes: watch::Sender<BotStatus>,
    started: Instant,
}

impl Shared {
    fn snapshot(&self) -> BotStatus {
        let mut status = self.status.lock().clone();
        status.metrics.uptime = self.started.elapsed();
        status
    }

    fn state(&self) -> BotState {
        self.status.lock().state
    }

    /// Subscribers only hear about actual transitions.
    fn set_state(&self, state: BotState) {
        let changed = {
            let mut status = self.status.lock();
            let previous = status.state;
            status.state = state;
            status.error = None;
            previous != state
        };
        if changed {
            self.changes.send_replace(self.snapshot());
        }
    }

    fn record_poll(&self, at: DateTime<Utc>, period: Duration) {
        let mut status = self.status.lock();
        status.last_poll = Some(at);
        status.next_poll = chrono::Duration::from_std(period).ok().map(|d| at + d);
    }

    fn record_processed(&self) {
        self.status.lock().metrics.events_processed += 1;
    }

    fn record_error(&self, error: &SteenBotError) {
        let mut status = self.status.lock();
        status.metrics.errors += 1;
        status.metrics.last_error = Some(error.to_string());
        status.error = Some(error.to_string());
    }
}

struct Poller {
    stop: oneshot::Sender<()>,
}

// ---------------------------------------------------------------------------
// SteenBot
// ---------------------------------------------------------------------------

/// Emits a `system` / `integration.event` heartbeat into the pipeline every
/// poll interval while running.
///
/// Lifecycle calls are idempotent: starting a running bot, stopping a stopped
/// one, pausing a paused one and resuming anything but a paused one are
/// no-ops. A failed poll is counted in the metrics and the loop keeps going.
pub struct SteenBot {
    config: BotConfig,
    pipeline: Arc<EventPipeline>,
    shared: Arc<Shared>,
    poller: Mutex<Option<Poller>>,
    initialized: AtomicBool,
}

impl SteenBot {
    pub fn new(config: BotConfig, pipeline: Arc<EventPipeline>) -> Self {
        let status = BotStatus {
            id: config.id.clone(),
            state: BotState::Initializing,
            last_poll: None,
            next_poll: None,
            metrics: BotMetrics::default(),
            error: None,
        };
        let (changes, _) = watch::channel(status.clone());
        Self {
            config,
            pipeline,
            shared: Arc::new(Shared {
                status: Mutex::new(status),
                changes,
                started: Instant::now(),
            }),
            poller: Mutex::new(None),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn status(&self) -> BotStatus {
        self.shared.snapshot()
    }

    /// Receives a fresh status on every state transition.
    pub fn subscribe_status(&self) -> watch::Receiver<BotStatus> {
        self.shared.changes.subscribe()
    }

    pub async fn initialize(&self) -> Result<()> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.shared.set_state(BotState::Initializing);
        self.shared.set_state(BotState::Initialized);
        info!(bot_id = %self.config.id, name = %self.config.name, "Bot initialized");
        Ok(())
    }

    pub async fn start(&self) -> Result<()> {
        if !self.initialized.load(Ordering::SeqCst) {
            self.initialize().await?;
        }
        if self.shared.state() == BotState::Running {
            return Ok(());
        }
        self.shared.set_state(BotState::Running);
        self.start_polling();
        info!(bot_id = %self.config.id, poll_interval_ms = self.config.poll_interval.as_millis() as u64, "Bot started");
        Ok(())
    }

    pub async fn stop(&self) -> Result<()> {
        if self.shared.state() == BotState::Stopped {
            return Ok(());
        }
        self.stop_polling();
        self.shared.set_state(BotState::Stopped);
        info!(bot_id = %self.config.id, "Bot stopped");
        Ok(())
    }

    pub async fn pause(&self) -> Result<()> {
        if self.shared.state() == BotState::Paused {
            return Ok(());
        }
        self.stop_polling();
        self.shared.set_state(BotState::Paused);
        info!(bot_id = %self.config.id, "Bot paused");
        Ok(())
    }

    pub async fn resume(&self) -> Result<()> {
        if self.shared.state() != BotState::Paused {
            return Ok(());
        }
        self.start_polling();
        self.shared.set_state(BotState::Running);
        info!(bot_id = %self.config.id, "Bot resumed");
        Ok(())
    }

    fn start_polling(&self) {
        let mut poller = self.poller.lock();
        if poller.is_some() {
            return;
        }
        let (stop, stopped) = oneshot::channel();
        tokio::spawn(poll_loop(
            self.shared.clone(),
            self.pipeline.clone(),
            self.config.poll_interval,
            stopped,
        ));
        *poller = Some(Poller { stop });
    }

    /// An in-flight poll finishes; no new one starts.
    fn stop_polling(&self) {
        if let Some(poller) = self.poller.lock().take() {
            let _ = poller.stop.send(());
        }
    }
}

async fn poll_loop(
    shared: Arc<Shared>,
    pipeline: Arc<EventPipeline>,
    period: Duration,
    mut stopped: oneshot::Receiver<()>,
) {
    // First poll one full period after start.
    let mut ticker = interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            // Fires on an explicit stop and when the bot is dropped.
            _ = &mut stopped => break,
            _ = ticker.tick() => poll_once(&shared, &pipeline, period).await,
        }
    }
    debug!("Poll loop exited");
}

async fn poll_once(shared: &Shared, pipeline: &EventPipeline, period: Duration) {
    shared.record_poll(Utc::now(), period);

    let event = Event::new(
        EventSource::System,
        EventType::IntegrationEvent,
        json!({ "message": "Bot is running and polling" }),
    );

    match pipeline.ingest(&event).await {
        Ok(()) => shared.record_processed(),
        Err(e) => {
            warn!(event_id = %event.id, error = %e, "Poll event failed");
            shared.record_error(&e);
        }
    }
}
