//! Pass scheduling
//!
//! A depth-one slot: at most one debounced pass is pending, and a newer
//! trigger replaces it. Timers themselves belong to the host; the scheduler
//! only hands out tokens and decides whether a fired token is still current.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Debounced filter pass
    Pass,
    /// End of the flicker-prevention window
    FlickerRelease,
}

/// Ask the host to call back after `delay_ms` with this request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerRequest {
    pub kind: TimerKind,
    pub token: u64,
    pub delay_ms: u64,
}

#[derive(Debug, Default)]
pub struct PassScheduler {
    debounce_ms: u64,
    next_token: u64,
    pending: Option<u64>,
    flicker: Option<u64>,
    in_pass: bool,
}

impl PassScheduler {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            debounce_ms,
            ..Self::default()
        }
    }

    fn issue(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    /// Schedule a trailing pass, replacing any pending one. Ignored while a
    /// pass is running.
    pub fn debounce(&mut self) -> Option<TimerRequest> {
        if self.in_pass {
            return None;
        }
        let token = self.issue();
        self.pending = Some(token);
        Some(TimerRequest {
            kind: TimerKind::Pass,
            token,
            delay_ms: self.debounce_ms,
        })
    }

    /// Drop the pending pass. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Consume a fired pass timer. Stale tokens are rejected.
    pub fn fire(&mut self, token: u64) -> bool {
        if self.pending == Some(token) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn start_flicker(&mut self, window_ms: u64) -> TimerRequest {
        let token = self.issue();
        self.flicker = Some(token);
        TimerRequest {
            kind: TimerKind::FlickerRelease,
            token,
            delay_ms: window_ms,
        }
    }

    /// Consume a fired flicker timer.
    pub fn release_flicker(&mut self, token: u64) -> bool {
        if self.flicker == Some(token) {
            self.flicker = None;
            true
        } else {
            false
        }
    }

    /// Forget the flicker window without waiting for its timer.
    pub fn end_flicker(&mut self) {
        self.flicker = None;
    }

    /// Enter a pass. False when one is already running.
    pub fn begin_pass(&mut self) -> bool {
        if self.in_pass {
            return false;
        }
        self.in_pass = true;
        true
    }

    pub fn end_pass(&mut self) {
        self.in_pass = false;
    }

    pub fn in_pass(&self) -> bool {
        self.in_pass
    }
}
