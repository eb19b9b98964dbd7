//! Autosave with a fixed interval, debouncing, and background saving
//!
//! The manager holds the latest markup snapshot pushed by the editor
//! and periodically persists it through a [`ProposalStore`]. Saves are
//! debounced against rapid typing and skipped while the document is
//! clean, so the interval task is idempotent.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::Result;
use crate::proposal::ProposalStore;

/// Autosave configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutosaveConfig {
    /// Whether autosave is enabled
    pub enabled: bool,
    /// Interval between autosave attempts in seconds
    pub interval_secs: u64,
    /// Minimum quiet period after the last change before saving, in
    /// milliseconds
    pub debounce_ms: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
            debounce_ms: 1000,
        }
    }
}

impl AutosaveConfig {
    pub fn with_interval(mut self, secs: u64) -> Self {
        self.interval_secs = secs;
        self
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// Latest document snapshot awaiting persistence
#[derive(Debug, Clone)]
struct Snapshot {
    name: String,
    markup: String,
}

/// Autosave manager with debouncing and a background interval task
pub struct AutosaveManager {
    config: AutosaveConfig,
    dirty: Arc<AtomicBool>,
    is_saving: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
    /// Unix millis of the last successful save; 0 when never saved.
    last_save_time: Arc<AtomicU64>,
    snapshot: Arc<RwLock<Option<Snapshot>>>,
    last_change: Arc<RwLock<Option<Instant>>>,
}

impl AutosaveManager {
    pub fn new(config: AutosaveConfig) -> Self {
        Self {
            config,
            dirty: Arc::new(AtomicBool::new(false)),
            is_saving: Arc::new(AtomicBool::new(false)),
            stopped: Arc::new(AtomicBool::new(false)),
            last_save_time: Arc::new(AtomicU64::new(0)),
            snapshot: Arc::new(RwLock::new(None)),
            last_change: Arc::new(RwLock::new(None)),
        }
    }

    pub fn config(&self) -> &AutosaveConfig {
        &self.config
    }

    /// Record the latest markup snapshot and mark the document dirty
    ///
    /// Safe to call from a synchronous editor subscriber; the lock
    /// writes happen on a spawned task.
    pub fn note_snapshot(&self, name: impl Into<String>, markup: impl Into<String>) {
        self.dirty.store(true, Ordering::SeqCst);
        let snapshot = Snapshot {
            name: name.into(),
            markup: markup.into(),
        };
        let slot = self.snapshot.clone();
        let last_change = self.last_change.clone();
        tokio::spawn(async move {
            *slot.write().await = Some(snapshot);
            *last_change.write().await = Some(Instant::now());
        });
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Unix millis of the last successful save
    pub fn last_save_time(&self) -> Option<u64> {
        match self.last_save_time.load(Ordering::SeqCst) {
            0 => None,
            at => Some(at),
        }
    }

    async fn should_save_now(&self) -> bool {
        if !self.config.enabled || !self.dirty.load(Ordering::SeqCst) {
            return false;
        }
        match *self.last_change.read().await {
            Some(at) => at.elapsed() >= Duration::from_millis(self.config.debounce_ms),
            None => false,
        }
    }

    /// Persist the latest snapshot if dirty and quiet long enough
    ///
    /// Returns true when a save was performed.
    pub async fn autosave(&self, store: &ProposalStore) -> Result<bool> {
        if !self.should_save_now().await {
            return Ok(false);
        }
        if self.is_saving.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }

        let snapshot = self.snapshot.read().await.clone();
        let result = match snapshot {
            Some(snapshot) => store
                .save_current(&snapshot.name, &snapshot.markup)
                .await
                .map(|saved| saved.is_some()),
            None => Ok(false),
        };
        self.is_saving.store(false, Ordering::SeqCst);

        match result {
            Ok(saved) => {
                self.dirty.store(false, Ordering::SeqCst);
                if saved {
                    let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
                    self.last_save_time.store(now, Ordering::SeqCst);
                    tracing::debug!("autosaved proposal");
                }
                Ok(saved)
            }
            Err(err) => {
                tracing::warn!(%err, "autosave failed");
                Err(err)
            }
        }
    }

    /// Stop the background task after its current tick
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// Spawn the background interval task
    pub fn run(self: Arc<Self>, store: Arc<ProposalStore>) -> JoinHandle<()> {
        let interval = Duration::from_secs(self.config.interval_secs.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so a fresh
            // manager waits a full interval before its first save.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if self.stopped.load(Ordering::SeqCst) {
                    break;
                }
                if let Err(err) = self.autosave(&store).await {
                    tracing::warn!(%err, "autosave tick failed");
                }
            }
        })
    }
}
