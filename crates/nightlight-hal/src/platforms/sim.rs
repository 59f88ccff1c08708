// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

//! Simulated platform
//!
//! Everything here is shared through cheap clones so a test (or the
//! simulator binary) can hold one handle while a node owns another:
//!
//! ```text
//! ┌──────────┐   write_packet    ┌────────────┐   inbox   ┌──────────┐
//! │ SimRadio ├──────────────────►│   Ether    ├──────────►│ SimRadio │
//! │ (node A) │                   │ (stations) │           │ (node B) │
//! └──────────┘                   └────────────┘           └──────────┘
//! ```
//!
//! A transmission reaches every *other* station that is listening on the
//! destination address. The sender never hears itself.
//!
//! The transmission log and GPIO history keep only the most recent
//! [`SIM_LOG_CAPACITY`] entries, so a long-running simulation stays bounded.

use crate::hal::serial::truncate_line;
use crate::hal::{EntropySource, GpioProvider, RadioProvider, RadioSettings, SerialIO, TimeProvider, MAX_PACKET_SIZE};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Entries kept by the ether's transmission log and each GPIO history
pub const SIM_LOG_CAPACITY: usize = 256;

/// Append to a bounded log, dropping the oldest entry when full
fn record<T>(log: &mut VecDeque<T>, entry: T) {
    if log.len() == SIM_LOG_CAPACITY {
        log.pop_front();
    }
    log.push_back(entry);
}

/// Manually advanced monotonic clock
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now: Arc<AtomicU64>,
}

impl VirtualClock {
    /// Clock starting at 0 ms
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock starting at `ms`
    pub fn at(ms: u64) -> Self {
        let clock = Self::new();
        clock.set(ms);
        clock
    }

    /// Move time forward
    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jump to an absolute time
    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl TimeProvider for VirtualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn delay_ms(&self, ms: u32) {
        self.advance(ms as u64);
    }
}

/// One packet put on the air
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmission {
    /// Sending station, `None` for packets injected from outside
    pub from: Option<usize>,
    /// Destination radio address
    pub address: u64,
    /// Bytes as written
    pub data: Vec<u8>,
    /// Number of stations that received it
    pub delivered: usize,
    /// Whether the sender had stopped listening before writing
    pub half_duplex: bool,
}

#[derive(Debug, Default)]
struct Station {
    addresses: Vec<u64>,
    listening: bool,
    payload_size: usize,
    dynamic_payloads: bool,
    inbox: VecDeque<Vec<u8>>,
}

#[derive(Debug, Default)]
struct EtherInner {
    stations: Vec<Station>,
    log: VecDeque<Transmission>,
    link_down: bool,
}

impl EtherInner {
    fn deliver(&mut self, from: Option<usize>, address: u64, data: &[u8]) -> usize {
        if self.link_down {
            return 0;
        }
        let mut delivered = 0;
        for (index, station) in self.stations.iter_mut().enumerate() {
            if Some(index) == from || !station.listening || !station.addresses.contains(&address) {
                continue;
            }
            let mut packet = data[..data.len().min(station.payload_size)].to_vec();
            if !station.dynamic_payloads {
                packet.resize(station.payload_size, 0);
            }
            station.inbox.push_back(packet);
            delivered += 1;
        }
        delivered
    }
}

/// Shared radio medium
#[derive(Debug, Clone, Default)]
pub struct Ether {
    inner: Arc<Mutex<EtherInner>>,
}

impl Ether {
    /// Empty medium
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new radio to the medium
    pub fn radio(&self) -> SimRadio {
        let mut inner = self.inner.lock();
        inner.stations.push(Station {
            payload_size: MAX_PACKET_SIZE,
            dynamic_payloads: true,
            ..Station::default()
        });
        SimRadio {
            ether: self.clone(),
            station: inner.stations.len() - 1,
        }
    }

    /// Put a packet on the air from outside any station
    ///
    /// # Returns
    /// Number of stations that received it
    pub fn inject(&self, address: u64, data: &[u8]) -> usize {
        let mut inner = self.inner.lock();
        let delivered = inner.deliver(None, address, data);
        record(
            &mut inner.log,
            Transmission {
                from: None,
            address,
                data: data.to_vec(),
                delivered,
                half_duplex: true,
            },
        );
        delivered
    }

    /// Recent transmissions, oldest first
    pub fn transmissions(&self) -> Vec<Transmission> {
        self.inner.lock().log.iter().cloned().collect()
    }

    /// Drain the transmission log
    pub fn take_transmissions(&self) -> Vec<Transmission> {
        self.inner.lock().log.drain(..).collect()
    }

    /// Drop every packet while set (transmissions are still logged)
    pub fn set_link_down(&self, down: bool) {
        self.inner.lock().link_down = down;
    }
}

/// Radio attached to an [`Ether`]
#[derive(Debug)]
pub struct SimRadio {
    ether: Ether,
    station: usize,
}

impl SimRadio {
    /// Index of this radio on the medium
    pub fn station(&self) -> usize {
        self.station
    }

    /// Whether the radio is currently receiving
    pub fn is_listening(&self) -> bool {
        self.ether.inner.lock().stations[self.station].listening
    }
}

impl RadioProvider for SimRadio {
    fn configure(&mut self, settings: &RadioSettings) {
        let mut inner = self.ether.inner.lock();
        let station = &mut inner.stations[self.station];
        station.addresses = vec![settings.broadcast_address, settings.personal_address];
        station.payload_size = (settings.payload_size as usize).min(MAX_PACKET_SIZE);
        station.dynamic_payloads = settings.dynamic_payloads;
        station.listening = false;
        station.inbox.clear();
    }

    fn start_listening(&mut self) {
        self.ether.inner.lock().stations[self.station].listening = true;
    }

    fn stop_listening(&mut self) {
        self.ether.inner.lock().stations[self.station].listening = false;
    }

    fn is_packet_available(&self) -> bool {
        !self.ether.inner.lock().stations[self.station].inbox.is_empty()
    }

    fn read_packet(&mut self, buffer: &mut [u8]) -> usize {
        let mut inner = self.ether.inner.lock();
        match inner.stations[self.station].inbox.pop_front() {
            Some(packet) => {
                let len = packet.len().min(buffer.len());
                buffer[..len].copy_from_slice(&packet[..len]);
                len
            }
            None => 0,
        }
    }

    fn write_packet(&mut self, address: u64, data: &[u8]) -> bool {
        let mut inner = self.ether.inner.lock();
        let half_duplex = !inner.stations[self.station].listening;
        if !half_duplex {
            warn!(station = self.station, "radio write while still listening");
        }
        let delivered = inner.deliver(Some(self.station), address, data);
        record(
            &mut inner.log,
            Transmission {
                from: Some(self.station),
                address,
                data: data.to_vec(),
                delivered,
                half_duplex,
            },
        );
        delivered > 0
    }
}

#[derive(Debug, Default)]
struct SerialInner {
    input: VecDeque<String>,
    output: Vec<String>,
}

/// Scripted console: lines pushed by the test, output captured
#[derive(Debug, Clone, Default)]
pub struct SimSerial {
    inner: Arc<Mutex<SerialInner>>,
}

impl SimSerial {
    /// Empty console
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a line as if typed by the operator
    pub fn push_line(&self, line: impl Into<String>) {
        self.inner.lock().input.push_back(line.into());
    }

    /// Lines written so far
    pub fn output(&self) -> Vec<String> {
        self.inner.lock().output.clone()
    }

    /// Drain the written lines
    pub fn take_output(&self) -> Vec<String> {
        std::mem::take(&mut self.inner.lock().output)
    }
}

impl SerialIO for SimSerial {
    fn is_line_available(&self) -> bool {
        !self.inner.lock().input.is_empty()
    }

    fn read_line(&mut self) -> Option<String> {
        self.inner.lock().input.pop_front().map(truncate_line)
    }

    fn write_line(&mut self, line: &str) {
        self.inner.lock().output.push(line.to_string());
    }
}

#[derive(Debug, Default)]
struct GpioInner {
    levels: HashMap<u8, bool>,
    history: VecDeque<(u8, bool)>,
}

/// Recording GPIO bank; every pin starts low
#[derive(Debug, Clone, Default)]
pub struct SimGpio {
    inner: Arc<Mutex<GpioInner>>,
}

impl SimGpio {
    /// All pins low, empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level of a pin
    pub fn level(&self, pin: u8) -> bool {
        self.inner.lock().levels.get(&pin).copied().unwrap_or(false)
    }

    /// Recent levels written, in order
    pub fn history(&self) -> Vec<(u8, bool)> {
        self.inner.lock().history.iter().copied().collect()
    }

    /// Number of recent writes to one pin
    pub fn writes(&self, pin: u8) -> usize {
        self.inner.lock().history.iter().filter(|(p, _)| *p == pin).count()
    }

    fn write(&self, pin: u8, high: bool) {
        let mut inner = self.inner.lock();
        inner.levels.insert(pin, high);
        record(&mut inner.history, (pin, high));
    }
}

impl GpioProvider for SimGpio {
    type Pin = u8;
    type Error = Infallible;

    fn set_high(&mut self, pin: u8) -> Result<(), Infallible> {
        self.write(pin, true);
        Ok(())
    }

    fn set_low(&mut self, pin: u8) -> Result<(), Infallible> {
        self.write(pin, false);
        Ok(())
    }

    fn is_high(&self, pin: u8) -> Result<bool, Infallible> {
        Ok(self.level(pin))
    }
}

/// Entropy source returning a fixed seed
#[derive(Debug, Clone, Copy)]
pub struct FixedEntropy(pub u64);

impl EntropySource for FixedEntropy {
    fn seed(&mut self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BROADCAST: u64 = 0xF0F0_F0F0_00;

    fn listening_radio(ether: &Ether, offset: u64) -> SimRadio {
        let mut radio = ether.radio();
        radio.configure(&RadioSettings::new(BROADCAST, BROADCAST + offset));
        radio.start_listening();
        radio
    }

    #[test]
    fn test_broadcast_reaches_everyone_but_sender() {
        let ether = Ether::new();
        let mut a = listening_radio(&ether, 1);
        let b = listening_radio(&ether, 2);
        let c = listening_radio(&ether, 3);

        a.stop_listening();
        assert!(a.write_packet(BROADCAST, &[0x01, 0x01]));
        a.start_listening();

        assert!(!a.is_packet_available());
        assert!(b.is_packet_available());
        assert!(c.is_packet_available());
        assert_eq!(ether.transmissions()[0].delivered, 2);
    }

    #[test]
    fn test_directed_packet_reaches_only_owner() {
        let ether = Ether::new();
        let mut a = listening_radio(&ether, 1);
        let mut b = listening_radio(&ether, 2);
        let c = listening_radio(&ether, 3);

        a.stop_listening();
        a.write_packet(BROADCAST + 2, &[0x09, 0x01, 0xAA]);
        a.start_listening();

        assert!(!c.is_packet_available());
        let mut buf = [0u8; MAX_PACKET_SIZE];
        let len = b.read_packet(&mut buf);
        assert_eq!(&buf[..len], &[0x09, 0x01, 0xAA]);
    }

    #[test]
    fn test_not_listening_station_misses_packets() {
        let ether = Ether::new();
        let mut a = listening_radio(&ether, 1);
        let mut b = listening_radio(&ether, 2);
        b.stop_listening();

        a.stop_listening();
        assert!(!a.write_packet(BROADCAST + 2, &[0x01, 0x01]));
        b.start_listening();
        assert!(!b.is_packet_available());
    }

    #[test]
    fn test_write_while_listening_is_flagged() {
        let ether = Ether::new();
        let mut a = listening_radio(&ether, 1);
        let _b = listening_radio(&ether, 2);

        a.write_packet(BROADCAST, &[0x01, 0x01]);
        assert!(!ether.transmissions()[0].half_duplex);
    }

    #[test]
    fn test_fixed_payload_pads_to_size() {
        let ether = Ether::new();
        let mut a = listening_radio(&ether, 1);
        let mut b = ether.radio();
        let mut settings = RadioSettings::new(BROADCAST, BROADCAST + 2);
        settings.payload_size = 8;
        settings.dynamic_payloads = false;
        b.configure(&settings);
        b.start_listening();

        a.stop_listening();
        a.write_packet(BROADCAST, &[0x01, 0x01, 0x41]);

        let mut buf = [0u8; MAX_PACKET_SIZE];
        assert_eq!(b.read_packet(&mut buf), 8);
        assert_eq!(&buf[..4], &[0x01, 0x01, 0x41, 0x00]);
    }

    #[test]
    fn test_link_down_drops_everything() {
        let ether = Ether::new();
        let mut a = listening_radio(&ether, 1);
        let b = listening_radio(&ether, 2);
        ether.set_link_down(true);

        a.stop_listening();
        assert!(!a.write_packet(BROADCAST, &[0x01, 0x01]));
        assert!(!b.is_packet_available());
        assert_eq!(ether.transmissions().len(), 1);
    }

    #[test]
    fn test_transmission_log_keeps_most_recent() {
        let ether = Ether::new();
        let mut a = listening_radio(&ether, 1);
        let _b = listening_radio(&ether, 2);
        a.stop_listening();

        for seq in 0..SIM_LOG_CAPACITY + 10 {
            a.write_packet(BROADCAST, &[0x01, 0x01, seq as u8]);
        }

        let log = ether.transmissions();
        assert_eq!(log.len(), SIM_LOG_CAPACITY);
        assert_eq!(log[0].data[2], 10);
        assert_eq!(ether.take_transmissions().len(), SIM_LOG_CAPACITY);
        assert!(ether.transmissions().is_empty());
    }

    #[test]
    fn test_gpio_history_keeps_most_recent() {
        let gpio = SimGpio::new();
        let mut bank = gpio.clone();
        for _ in 0..SIM_LOG_CAPACITY + 1 {
            bank.toggle(13).unwrap();
        }

        let history = gpio.history();
        assert_eq!(history.len(), SIM_LOG_CAPACITY);
        assert_eq!(history[0], (13, false));
        assert!(gpio.level(13));
    }

    #[test]
    fn test_virtual_clock_shared_between_clones() {
        let clock = VirtualClock::at(10);
        let other = clock.clone();
        other.advance(5);
        clock.delay_ms(5);
        assert_eq!(clock.now_ms(), 20);
        assert_eq!(other.now_ms(), 20);
    }

    #[test]
    fn test_serial_script_and_capture() {
        let serial = SimSerial::new();
        let mut port = serial.clone();
        serial.push_line("20 blink");

        assert!(port.is_line_available());
        assert_eq!(port.read_line().as_deref(), Some("20 blink"));
        assert!(port.read_line().is_none());

        port.write_line("unknown mode");
        assert_eq!(serial.take_output(), vec!["unknown mode".to_string()]);
        assert!(serial.output().is_empty());
    }

    #[test]
    fn test_gpio_toggle_and_history() {
        let gpio = SimGpio::new();
        let mut bank = gpio.clone();
        bank.toggle(13).unwrap();
        bank.toggle(13).unwrap();
        bank.set_level(13, true).unwrap();

        assert!(gpio.level(13));
        assert_eq!(gpio.history(), vec![(13, true), (13, false), (13, true)]);
        assert_eq!(gpio.writes(13), 3);
        assert_eq!(gpio.writes(7), 0);
    }
}
