// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

/// GPIO abstraction for binary outputs
pub trait GpioProvider {
    /// Platform-specific pin type (must be Copy for ease of use)
    type Pin: Copy;

    /// Platform-specific error type
    type Error: core::fmt::Debug;

    /// Set pin high
    fn set_high(&mut self, pin: Self::Pin) -> Result<(), Self::Error>;

    /// Set pin low
    fn set_low(&mut self, pin: Self::Pin) -> Result<(), Self::Error>;

    /// Read pin state
    ///
    /// # Returns
    /// True if pin is high, false if low, or error
    fn is_high(&self, pin: Self::Pin) -> Result<bool, Self::Error>;

    /// Drive the pin to a level
    fn set_level(&mut self, pin: Self::Pin, high: bool) -> Result<(), Self::Error> {
        if high {
            self.set_high(pin)
        } else {
            self.set_low(pin)
        }
    }

    /// Toggle pin state
    fn toggle(&mut self, pin: Self::Pin) -> Result<(), Self::Error> {
        if self.is_high(pin)? {
            self.set_low(pin)
        } else {
            self.set_high(pin)
        }
    }
}
