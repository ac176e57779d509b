//! Cancellable per-session turn countdowns.
//!
//! The engine owns the countdown state; a [`TimerDriver`] only delivers one
//! [`TimerEvent`] per elapsed second. Every start carries a fresh
//! [`TimerToken`], and the engine drops events whose token is not the
//! session's live one, so a late tick can never touch a session that was
//! ended, paused or restarted in the meantime.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::common::SessionId;

/// Identity of one started countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(pub u64);

/// One elapsed second of a countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    pub session: SessionId,
    pub token: TimerToken,
    /// Seconds left after this tick; zero means the countdown expired.
    pub remaining: u32,
}

/// Schedules countdown ticks for sessions.
pub trait TimerDriver {
    /// Start a `seconds`-long countdown for `session`, replacing any running one.
    fn start(&mut self, session: SessionId, token: TimerToken, seconds: u32);
    /// Stop the countdown of `session`, if any.
    fn cancel(&mut self, session: SessionId);
}

/// Drives countdowns with tokio tasks, delivering ticks on a channel that the
/// engine actor consumes alongside client commands.
pub struct TokioTimers {
    events: mpsc::UnboundedSender<TimerEvent>,
    tasks: HashMap<SessionId, JoinHandle<()>>,
}

impl TokioTimers {
    pub fn new(events: mpsc::UnboundedSender<TimerEvent>) -> Self {
        Self {
            events,
            tasks: HashMap::new(),
        }
    }

    /// A driver plus the receiving end of its tick channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TimerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Number of countdown tasks currently tracked.
    pub fn active(&self) -> usize {
        self.tasks.len()
    }
}

impl TimerDriver for TokioTimers {
    fn start(&mut self, session: SessionId, token: TimerToken, seconds: u32) {
        self.cancel(session);
        let events = self.events.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(1));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately, skip it
            ticker.tick().await;
            for remaining in (0..seconds).rev() {
                ticker.tick().await;
                let event = TimerEvent {
                    session,
                    token,
                    remaining,
                };
                if events.send(event).is_err() {
                    return;
                }
            }
        });
        self.tasks.insert(session, handle);
    }

    fn cancel(&mut self, session: SessionId) {
        if let Some(handle) = self.tasks.remove(&session) {
            handle.abort();
        }
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

/// Records starts and cancels without any clock; tests feed the engine
/// the events this driver would have produced.
#[derive(Debug, Default)]
pub struct ManualTimers {
    running: HashMap<SessionId, (TimerToken, u32)>,
    starts: usize,
    cancels: usize,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self, session: SessionId) -> Option<TimerToken> {
        self.running.get(&session).map(|&(token, _)| token)
    }

    pub fn is_running(&self, session: SessionId) -> bool {
        self.running.contains_key(&session)
    }

    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    /// Total number of countdowns ever started.
    pub fn starts(&self) -> usize {
        self.starts
    }

    /// Total number of running countdowns that were cancelled.
    pub fn cancels(&self) -> usize {
        self.cancels
    }

    /// The full tick sequence of the running countdown of `session`.
    pub fn countdown(&self, session: SessionId) -> Vec<TimerEvent> {
        match self.running.get(&session) {
            Some(&(token, seconds)) => (0..seconds)
                .rev()
                .map(|remaining| TimerEvent {
                    session,
                    token,
                    remaining,
                })
                .collect(),
            None => Vec::new(),
        }
    }
}

impl TimerDriver for ManualTimers {
    fn start(&mut self, session: SessionId, token: TimerToken, seconds: u32) {
        self.starts += 1;
        self.running.insert(session, (token, seconds));
    }

    fn cancel(&mut self, session: SessionId) {
        if self.running.remove(&session).is_some() {
            self.cancels += 1;
        }
    }
}
