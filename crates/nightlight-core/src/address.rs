// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

//! Node addressing
//!
//! Every node listens on the shared broadcast address and on
//! `broadcast + personal_offset`. The offset is picked at boot from an
//! entropy seed; two nodes picking the same offset is tolerated.

use nightlight_config::{self as config, NightlightConfig};
use nightlight_hal::{DataRate, EntropySource, PaLevel, RadioSettings};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Radio identity of one node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeIdentity {
    broadcast_address: u64,
    personal_offset: u8,
}

impl NodeIdentity {
    /// Identity with a known offset
    pub fn new(broadcast_address: u64, personal_offset: u8) -> Self {
        Self {
            broadcast_address,
            personal_offset,
        }
    }

    /// Identity with an offset drawn from a boot seed
    pub fn from_entropy<E: EntropySource>(broadcast_address: u64, entropy: &mut E) -> Self {
        let mut rng = StdRng::seed_from_u64(entropy.seed());
        Self::new(broadcast_address, rng.gen())
    }

    /// Identity for a configured node; a fixed `personal_offset` wins over entropy
    pub fn from_config<E: EntropySource>(config: &NightlightConfig, entropy: &mut E) -> Self {
        match config.node.personal_offset {
            Some(offset) => Self::new(config.radio.broadcast_address, offset),
            None => Self::from_entropy(config.radio.broadcast_address, entropy),
        }
    }

    pub fn broadcast_address(&self) -> u64 {
        self.broadcast_address
    }

    pub fn personal_offset(&self) -> u8 {
        self.personal_offset
    }

    /// Our own listening address
    pub fn personal_address(&self) -> u64 {
        self.address_of(self.personal_offset)
    }

    /// Radio address for a node offset (0 is the broadcast address)
    pub fn address_of(&self, offset: u8) -> u64 {
        self.broadcast_address.wrapping_add(offset as u64)
    }

    /// Transceiver settings for this identity
    pub fn radio_settings(&self, radio: &config::RadioConfig) -> RadioSettings {
        let mut settings = RadioSettings::new(self.broadcast_address, self.personal_address());
        settings.payload_size = radio.payload_size;
        settings.retry_delay = radio.retry_delay;
        settings.retry_count = radio.retry_count;
        settings.data_rate = match radio.data_rate {
            config::DataRate::OneMbps => DataRate::OneMbps,
            config::DataRate::TwoMbps => DataRate::TwoMbps,
        };
        settings.pa_level = match radio.pa_level {
            config::PaLevel::Min => PaLevel::Min,
            config::PaLevel::Low => PaLevel::Low,
            config::PaLevel::High => PaLevel::High,
            config::PaLevel::Max => PaLevel::Max,
        };
        settings.auto_ack = radio.auto_ack;
        settings.dynamic_payloads = radio.dynamic_payloads;
        settings
    }
}
