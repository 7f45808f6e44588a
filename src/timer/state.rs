use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
    Completed,
}

impl Default for TimerStatus {
    fn default() -> Self {
        TimerStatus::Idle
    }
}

/// What a single tick produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Time remains; carries the elapsed seconds.
    Elapsed(u32),
    Completed,
    /// The timer was not running.
    Ignored,
}

/// Freewrite countdown measured in whole seconds.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub status: TimerStatus,
    pub duration_seconds: u32,
    pub remaining_seconds: u32,
}

impl TimerState {
    pub fn new(duration_seconds: u32) -> Self {
        Self {
            status: TimerStatus::Idle,
            duration_seconds,
            remaining_seconds: duration_seconds,
        }
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.duration_seconds - self.remaining_seconds
    }

    /// Only an idle or paused timer with time left can start.
    pub fn can_start(&self) -> bool {
        matches!(self.status, TimerStatus::Idle | TimerStatus::Paused)
            && self.remaining_seconds > 0
    }

    pub fn start(&mut self) -> bool {
        if !self.can_start() {
            return false;
        }
        self.status = TimerStatus::Running;
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.status != TimerStatus::Running {
            return false;
        }
        self.status = TimerStatus::Paused;
        true
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.duration_seconds);
    }

    /// Counts one second down. Reaching zero completes the timer instead of
    /// reporting a final elapsed value.
    pub fn tick(&mut self) -> TickOutcome {
        if self.status != TimerStatus::Running {
            return TickOutcome::Ignored;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.status = TimerStatus::Completed;
            TickOutcome::Completed
        } else {
            TickOutcome::Elapsed(self.elapsed_seconds())
        }
    }

    /// `m:ss` of the remaining time.
    pub fn display_remaining(&self) -> String {
        format_clock(self.remaining_seconds)
    }

    pub fn display_elapsed(&self) -> String {
        format_clock(self.elapsed_seconds())
    }
}

pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_and_completes_once() {
        let mut state = TimerState::new(3);
        assert!(state.start());
        assert_eq!(state.tick(), TickOutcome::Elapsed(1));
        assert_eq!(state.tick(), TickOutcome::Elapsed(2));
        assert_eq!(state.tick(), TickOutcome::Completed);
        assert_eq!(state.tick(), TickOutcome::Ignored);
        assert_eq!(state.status, TimerStatus::Completed);
        assert!(!state.start());
    }

    #[test]
    fn pause_stops_ticks_and_reset_restores_duration() {
        let mut state = TimerState::new(600);
        state.start();
        state.tick();
        assert!(state.pause());
        assert_eq!(state.tick(), TickOutcome::Ignored);
        assert_eq!(state.elapsed_seconds(), 1);

        state.reset();
        assert_eq!(state.status, TimerStatus::Idle);
        assert_eq!(state.remaining_seconds, 600);
        assert!(state.can_start());
    }

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(600), "10:00");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(0), "0:00");
    }
}
