// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// Time and delay abstraction for the link
///
/// Used for the post-reset settle delay, reset pulse timing and the optional
/// wall-clock setup deadline.
pub trait TimeProvider {
    /// Get current time in microseconds since an arbitrary epoch
    ///
    /// # Returns
    /// Monotonic timestamp in microseconds
    fn now_us(&self) -> u64;

    /// Block for the specified number of microseconds
    fn delay_us(&mut self, us: u32);

    /// Block for the specified number of milliseconds
    ///
    /// # Arguments
    /// * `ms` - Milliseconds to delay
    fn delay_ms(&mut self, ms: u32) {
        self.delay_us(ms.saturating_mul(1000));
    }
}
