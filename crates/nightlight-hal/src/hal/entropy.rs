// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

/// Source of an unpredictable seed, read once at boot
///
/// On a microcontroller this is typically noise sampled from an unconnected
/// analog input.
pub trait EntropySource {
    /// Produce a seed value
    fn seed(&mut self) -> u64;
}
