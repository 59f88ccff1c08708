// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

//! Platform implementations
//!
//! Each platform is gated behind a feature flag:
//!
//! | Platform | Feature | Use |
//! |----------|---------|-----|
//! | Simulator | `sim` | Tests, multi-node simulation on one host |
//! | Host | `std-host` | Console I/O and wall-clock time on a desktop |

/// Deterministic in-memory platform
#[cfg(feature = "sim")]
pub mod sim;

/// Desktop host platform
#[cfg(feature = "std-host")]
pub mod host;
