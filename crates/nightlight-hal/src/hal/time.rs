// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

/// Time and delay abstraction
pub trait TimeProvider {
    /// Get current time in milliseconds since boot
    ///
    /// # Returns
    /// Monotonic timestamp in milliseconds
    fn now_ms(&self) -> u64;

    /// Wait for the specified number of milliseconds
    ///
    /// # Arguments
    /// * `ms` - Milliseconds to delay
    fn delay_ms(&self, ms: u32);
}
