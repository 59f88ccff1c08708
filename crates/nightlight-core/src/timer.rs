// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

/// One-shot absolute deadline
///
/// Arming stores `now + delay`, replacing any earlier deadline. A fired
/// timeout is cleared; the owner re-arms it for periodic behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeout {
    deadline: Option<u64>,
}

impl Timeout {
    pub fn arm(&mut self, now: u64, delay_ms: u64) {
        self.deadline = Some(now.saturating_add(delay_ms));
    }

    pub fn clear(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Clear and report the timeout if its deadline has been reached
    pub fn take_expired(&mut self, now: u64) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
