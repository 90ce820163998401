use std::time::{Duration, Instant};

use serde::Serialize;

/// Snapshot of a timer for clients.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TimerStatus {
    pub active: bool,
    pub paused: bool,
    /// `None` for untimed games
    pub remaining: Option<u32>,
    pub elapsed: u32,
    pub total: u32,
    pub formatted_remaining: Option<String>,
    pub formatted_elapsed: String,
    pub expired: bool,
}

/// Countdown for one game. Time spent paused does not count.
///
/// Every query has an `_at` form taking the current instant so callers can
/// evaluate the timer against a single clock reading.
#[derive(Debug, Clone)]
pub struct GameTimer {
    time_limit: u32,
    started: Option<Instant>,
    paused_at: Option<Instant>,
    paused_total: Duration,
    stopped_at: Option<Instant>,
}

impl GameTimer {
    /// `time_limit` in seconds, 0 for an untimed game
    pub fn new(time_limit: u32) -> Self {
        Self {
            time_limit,
            started: None,
            paused_at: None,
            paused_total: Duration::ZERO,
            stopped_at: None,
        }
    }

    pub fn start_at(&mut self, now: Instant) {
        self.started = Some(now);
        self.paused_at = None;
        self.paused_total = Duration::ZERO;
        self.stopped_at = None;
    }

    /// Returns false if the timer was not running
    pub fn pause_at(&mut self, now: Instant) -> bool {
        if !self.is_running() {
            return false;
        }
        self.paused_at = Some(now);
        true
    }

    /// Returns false if the timer was not paused
    pub fn resume_at(&mut self, now: Instant) -> bool {
        if self.stopped_at.is_some() {
            return false;
        }
        match self.paused_at.take() {
            Some(paused_at) => {
                self.paused_total += now.saturating_duration_since(paused_at);
                true
            }
            None => false,
        }
    }

    pub fn stop_at(&mut self, now: Instant) {
        if self.started.is_some() && self.stopped_at.is_none() {
            self.stopped_at = Some(now);
        }
    }

    pub fn is_timed(&self) -> bool {
        self.time_limit > 0
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some() && self.paused_at.is_none() && self.stopped_at.is_none()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some() && self.stopped_at.is_none()
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        let Some(started) = self.started else {
            return Duration::ZERO;
        };
        // A pause or stop freezes the clock at that moment
        let end = self.paused_at.or(self.stopped_at).unwrap_or(now);
        end.saturating_duration_since(started)
            .saturating_sub(self.paused_total)
    }

    pub fn elapsed_secs_at(&self, now: Instant) -> u32 {
        self.elapsed_at(now).as_secs().min(u32::MAX as u64) as u32
    }

    /// Whole seconds left, `None` when the game is untimed
    pub fn remaining_at(&self, now: Instant) -> Option<u32> {
        if !self.is_timed() {
            return None;
        }
        let remaining = Duration::from_secs(self.time_limit as u64)
            .saturating_sub(self.elapsed_at(now));
        Some(remaining.as_secs() as u32)
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.started.is_some() && self.remaining_at(now) == Some(0)
    }

    pub fn status_at(&self, now: Instant) -> TimerStatus {
        let remaining = self.remaining_at(now);
        let elapsed = self.elapsed_secs_at(now);
        TimerStatus {
            active: self.is_running(),
            paused: self.is_paused(),
            remaining,
            elapsed,
            total: self.time_limit,
            formatted_remaining: remaining.map(format_time),
            formatted_elapsed: format_time(elapsed),
            expired: self.is_expired_at(now),
        }
    }
}

/// `MM:SS`; minutes keep counting past 99
pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
