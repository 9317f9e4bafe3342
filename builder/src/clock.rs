use std::time::{SystemTime, UNIX_EPOCH};

use crate::vcs::Timestamp;

/// Hands out commit dates that strictly increase, one second apart at
/// least, so the replayed history sorts in narrative order even when
/// several commits are made within the same second.
#[derive(Debug, Clone)]
pub struct CommitClock {
    last: Option<Timestamp>,
    follow_wall_clock: bool,
}

impl Default for CommitClock {
    fn default() -> Self {
        Self::new()
    }
}

impl CommitClock {
    pub fn new() -> Self {
        CommitClock {
            last: None,
            follow_wall_clock: true,
        }
    }

    /// A clock counting up from `start`, one second per call, ignoring
    /// the wall clock.
    pub fn starting_at(start: Timestamp) -> Self {
        CommitClock {
            last: Some(start - 1),
            follow_wall_clock: false,
        }
    }

    pub fn next(&mut self) -> Timestamp {
        let next = match (self.last, self.follow_wall_clock) {
            (Some(last), false) => last + 1,
            (Some(last), true) => wall_clock().max(last + 1),
            (None, _) => wall_clock(),
        };
        self.last = Some(next);
        next
    }
}

fn wall_clock() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as Timestamp)
        .unwrap_or(0)
}
