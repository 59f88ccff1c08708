// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

/// Largest packet the transceiver carries, header included.
pub const MAX_PACKET_SIZE: usize = 32;

/// Air data rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataRate {
    /// 1 Mbps
    OneMbps,
    /// 2 Mbps
    TwoMbps,
}

/// Transmit power level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaLevel {
    /// Lowest power
    Min,
    /// Low power
    Low,
    /// High power
    High,
    /// Highest power
    Max,
}

/// Transceiver configuration applied once at boot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioSettings {
    /// Shared address every node listens on
    pub broadcast_address: u64,
    /// This node's own listening address
    pub personal_address: u64,
    /// Fixed packet size policy, in bytes
    pub payload_size: u8,
    /// Delay between automatic retries (0-15)
    pub retry_delay: u8,
    /// Number of automatic retries (0-15)
    pub retry_count: u8,
    /// Air data rate
    pub data_rate: DataRate,
    /// Transmit power
    pub pa_level: PaLevel,
    /// Hardware acknowledgements for directed packets
    pub auto_ack: bool,
    /// Report the actual received length instead of the fixed size
    pub dynamic_payloads: bool,
}

impl RadioSettings {
    /// Settings with the two listening addresses and defaults for the rest
    pub fn new(broadcast_address: u64, personal_address: u64) -> Self {
        Self {
            broadcast_address,
            personal_address,
            payload_size: MAX_PACKET_SIZE as u8,
            retry_delay: 15,
            retry_count: 15,
            data_rate: DataRate::TwoMbps,
            pa_level: PaLevel::High,
            auto_ack: true,
            dynamic_payloads: true,
        }
    }
}

/// Packet radio capability
///
/// Best-effort and half-duplex: the caller stops listening before a write
/// and resumes afterwards. There is no delivery report for broadcasts.
pub trait RadioProvider {
    /// Open the reading pipes and apply the transceiver settings
    fn configure(&mut self, settings: &RadioSettings);

    /// Resume receiving
    fn start_listening(&mut self);

    /// Stop receiving (required before a write)
    fn stop_listening(&mut self);

    /// Check if a received packet is waiting
    fn is_packet_available(&self) -> bool;

    /// Read the oldest received packet
    ///
    /// # Returns
    /// Number of bytes written into `buffer` (the transport's reported length)
    fn read_packet(&mut self, buffer: &mut [u8]) -> usize;

    /// Transmit a packet to a radio address
    ///
    /// # Returns
    /// True if the transceiver reported success
    fn write_packet(&mut self, address: u64, data: &[u8]) -> bool;
}
