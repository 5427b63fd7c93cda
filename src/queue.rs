//! Per-folder throttling of form sessions.
//!
//! Forms that write into the same folder can be spaced out in time: with a
//! `queue_wait_time` configured, each new session on a folder starts at
//! least that long after the previous one. Sessions that would have to wait
//! join a queue; when `max_queue_length` sessions are already waiting, a new
//! one is refused with [`QueueError::QueueFull`] instead of queueing.
//!
//! Without a wait time nothing ever waits, so `max_queue_length` has no
//! effect on its own.
//!
//! [`SessionQueue::wait_for_slot`] blocks the calling thread, matching the
//! synchronous request handling of the admission checks.

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::FormConfiguration;
use crate::types::FolderId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QueueError {
    #[error("session queue is full ({max_length} sessions waiting)")]
    QueueFull { max_length: u32 },
}

impl QueueError {
    pub fn code(&self) -> &'static str {
        match self {
            QueueError::QueueFull { .. } => "session_queue_full",
        }
    }
}

#[derive(Debug)]
struct QueueState {
    wait_time: Option<Duration>,
    max_length: Option<u32>,
    next_slot: Option<Instant>,
    waiting: u32,
}

/// Throttle for the sessions of a single folder.
#[derive(Debug)]
pub struct SessionQueue {
    state: Mutex<QueueState>,
}

impl SessionQueue {
    pub fn new(wait_time: Option<Duration>, max_length: Option<u32>) -> Self {
        Self {
            state: Mutex::new(QueueState {
                wait_time,
                max_length,
                next_slot: None,
                waiting: 0,
            }),
        }
    }

    /// Replace the throttle settings. Sessions already waiting keep their slot.
    pub fn configure(&self, wait_time: Option<Duration>, max_length: Option<u32>) {
        let mut state = self.lock();
        state.wait_time = wait_time;
        state.max_length = max_length;
    }

    /// Number of sessions currently sleeping until their slot.
    pub fn waiting(&self) -> u32 {
        self.lock().waiting
    }

    /// Block until this session may start.
    pub fn wait_for_slot(&self) -> Result<(), QueueError> {
        let now = Instant::now();
        let slot = {
            let mut state = self.lock();
            let Some(wait_time) = state.wait_time else {
                return Ok(());
            };

            let slot = state.next_slot.map_or(now, |next| next.max(now));
            if slot > now {
                if let Some(max_length) = state.max_length {
                    if state.waiting >= max_length {
                        warn!(
                            waiting = state.waiting,
                            max_length, "session_queue_full"
                        );
                        return Err(QueueError::QueueFull { max_length });
                    }
                }
                state.waiting += 1;
            }
            state.next_slot = Some(slot + wait_time);
            slot
        };

        if slot > now {
            let delay = slot - now;
            debug!(delay_millis = delay.as_millis(), "session_queue_wait");
            thread::sleep(delay);
            self.lock().waiting -= 1;
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// One [`SessionQueue`] per target folder.
#[derive(Debug, Default)]
pub struct SessionQueueRegistry {
    queues: DashMap<FolderId, Arc<SessionQueue>>,
}

impl SessionQueueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The queue for the form's target folder, created on first use and
    /// updated to the form's current throttle settings.
    pub fn queue_for(&self, config: &FormConfiguration) -> Arc<SessionQueue> {
        let queue = self
            .queues
            .entry(config.target_folder.clone())
            .or_insert_with(|| {
                Arc::new(SessionQueue::new(
                    config.queue_wait_time,
                    config.max_queue_length,
                ))
            })
            .clone();
        queue.configure(config.queue_wait_time, config.max_queue_length);
        queue
    }

    /// Wait for a slot on the form's target folder.
    pub fn wait_for_slot(&self, config: &FormConfiguration) -> Result<(), QueueError> {
        self.queue_for(config).wait_for_slot()
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}
