// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

//! Node scheduler
//!
//! One [`Node::tick`] = at most one radio packet, at most one console line,
//! then every expired timeout. Effects queued by the handlers are applied
//! after each step, in issue order. Nothing here blocks.

use nightlight_config::{validate_config, NightlightConfig};
use nightlight_hal::{
    EntropySource, GpioProvider, RadioProvider, RadioSettings, SerialIO, TimeProvider, MAX_PACKET_SIZE,
};
use tracing::{debug, info, warn};

use crate::address::NodeIdentity;
use crate::engine::{Behavior, Effect, StateId, StateStack};
use crate::error::{NodeError, Result};
use crate::protocol::{Message, MessageType, Packet, Sender, HEADER_SIZE};
use crate::serial::decode_line;

/// What one tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// A radio packet was read (valid or not)
    pub packet_received: bool,
    /// A console line was read (valid or not)
    pub line_received: bool,
    /// Timeouts fired
    pub timeouts: usize,
    /// Packets handed to the radio
    pub packets_sent: usize,
    /// Console lines written
    pub lines_written: usize,
}

impl TickReport {
    /// True if the tick did nothing at all
    pub fn is_idle(&self) -> bool {
        *self == TickReport::default()
    }
}

/// One running node: its collaborators plus the state stack
pub struct Node<R, S, C, G, B> {
    radio: R,
    serial: S,
    clock: C,
    gpio: G,
    engine: StateStack<B>,
    settings: RadioSettings,
    legacy_command_end: bool,
}

impl<R, S, C, G, B> Node<R, S, C, G, B>
where
    R: RadioProvider,
    S: SerialIO,
    C: TimeProvider,
    G: GpioProvider<Pin = u8>,
    B: Behavior,
{
    /// Assemble a node with a known identity
    pub fn new(radio: R, serial: S, clock: C, gpio: G, identity: NodeIdentity, config: &NightlightConfig) -> Self {
        Self {
            radio,
            serial,
            clock,
            gpio,
            engine: StateStack::from_config(identity, config),
            settings: identity.radio_settings(&config.radio),
            legacy_command_end: config.node.legacy_command_end,
        }
    }

    /// Validate the config, pick the identity and assemble the node
    pub fn from_config<E: EntropySource>(
        radio: R,
        serial: S,
        clock: C,
        gpio: G,
        entropy: &mut E,
        config: &NightlightConfig,
    ) -> Result<Self> {
        validate_config(config)?;
        let identity = NodeIdentity::from_config(config, entropy);
        Ok(Self::new(radio, serial, clock, gpio, identity, config))
    }

    pub fn identity(&self) -> NodeIdentity {
        self.engine.identity()
    }

    pub fn engine(&self) -> &StateStack<B> {
        &self.engine
    }

    /// Engine access for wiring states before boot
    pub fn engine_mut(&mut self) -> &mut StateStack<B> {
        &mut self.engine
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn serial(&self) -> &S {
        &self.serial
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn gpio(&self) -> &G {
        &self.gpio
    }

    /// Configure the radio, start listening and push the initial states
    /// (bottom first)
    pub fn boot(&mut self, initial: &[StateId]) -> Result<TickReport> {
        self.radio.configure(&self.settings);
        self.radio.start_listening();
        let address = format!("{:#x}", self.settings.personal_address);
        info!(offset = self.identity().personal_offset(), address = %address, "node listening");

        let mut report = TickReport::default();
        self.engine.set_now(self.clock.now_ms());
        for state in initial {
            self.engine.push(*state)?;
            self.flush(&mut report)?;
        }
        Ok(report)
    }

    /// Run one scheduler step
    ///
    /// # Errors
    /// Returns the first engine fault raised by a handler during this tick.
    pub fn tick(&mut self) -> Result<TickReport> {
        let mut report = TickReport::default();
        self.engine.set_now(self.clock.now_ms());

        if self.radio.is_packet_available() {
            report.packet_received = true;
            let mut buffer = [0u8; MAX_PACKET_SIZE];
            let len = self.radio.read_packet(&mut buffer).min(MAX_PACKET_SIZE);
            match Packet::decode(&buffer[..len]) {
                Ok(packet) => {
                    debug!(sender = packet.sender, msg_type = %packet.msg_type, len, "packet");
                    self.engine.dispatch(packet.into_message());
                }
                Err(e) => debug!(error = %e, "dropping packet"),
            }
            self.flush(&mut report)?;
        }

        if self.serial.is_line_available() {
            if let Some(line) = self.serial.read_line() {
                report.line_received = true;
                match decode_line(&line) {
                    Ok((msg_type, payload)) => {
                        debug!(msg_type = %msg_type, "console line");
                        self.engine.dispatch(Message {
                            sender: Sender::Serial,
                            msg_type,
                            payload,
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "ignoring console line");
                        self.serial.write_line(&format!("bad line {:?}", line));
                    }
                }
                self.flush(&mut report)?;
            }
        }

        report.timeouts = self.engine.run_timers();
        self.flush(&mut report)?;

        Ok(report)
    }

    /// Inject a message as if it had arrived this tick
    pub fn inject(&mut self, msg: Message) -> Result<TickReport> {
        let mut report = TickReport::default();
        self.engine.set_now(self.clock.now_ms());
        self.engine.dispatch(msg);
        self.flush(&mut report)?;
        Ok(report)
    }

    fn flush(&mut self, report: &mut TickReport) -> Result<()> {
        for effect in self.engine.take_effects() {
            match effect {
                Effect::Radio { to, msg_type, payload } => {
                    self.transmit(to, msg_type, &payload);
                    report.packets_sent += 1;
                }
                Effect::Line(line) => {
                    self.serial.write_line(&line);
                    report.lines_written += 1;
                }
                Effect::Output { pin, high } => {
                    if let Err(e) = self.gpio.set_level(pin, high) {
                        warn!(pin, error = ?e, "output write failed");
                    }
                }
            }
        }
        match self.engine.take_fault() {
            Some(fault) => Err(NodeError::Engine(fault)),
            None => Ok(()),
        }
    }

    /// Half-duplex, best-effort write
    fn transmit(&mut self, to: u8, msg_type: MessageType, payload: &[u8]) {
        let room = (self.settings.payload_size as usize).saturating_sub(HEADER_SIZE);
        if payload.len() > room {
            debug!(len = payload.len(), room, "payload truncated to packet size");
        }
        let wire_type = msg_type.on_wire(self.legacy_command_end);
        let packet = Packet::new(wire_type, self.identity().personal_offset(), &payload[..payload.len().min(room)]);
        let address = self.identity().address_of(to);

        self.radio.stop_listening();
        let delivered = self.radio.write_packet(address, &packet.encode());
        self.radio.start_listening();

        if delivered {
            debug!(to, msg_type = %msg_type, "sent");
        } else {
            debug!(to, msg_type = %msg_type, address, "radio write failed, dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Context;
    use crate::protocol::Destination;
    use nightlight_hal::{Ether, FixedEntropy, SimGpio, SimSerial, VirtualClock};

    /// Replies to every radio HELLO with CONTROL_REQUEST and echoes console
    /// lines back
    struct Echo;

    impl Behavior for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn start(&mut self, ctx: &mut Context<'_, Self>) {
            ctx.set_output(13, true);
        }

        fn receive_message(&mut self, ctx: &mut Context<'_, Self>, msg: &Message) -> bool {
            match msg.sender {
                Sender::Radio(from) if msg.msg_type == MessageType::HELLO => {
                    ctx.send(Destination::Node(from), MessageType::CONTROL_REQUEST, &[]);
                    true
                }
                Sender::Serial if msg.msg_type == MessageType::COMMAND_END => {
                    ctx.send(Destination::Broadcast, MessageType::COMMAND_END, &msg.payload);
                    true
                }
                Sender::Serial => {
                    let text = msg.text().into_owned();
                    ctx.write_line(text);
                    true
                }
                _ => false,
            }
        }
    }

    type TestNode = Node<nightlight_hal::SimRadio, SimSerial, VirtualClock, SimGpio, Echo>;

    fn node(ether: &Ether, config: &NightlightConfig, offset: u8) -> (TestNode, SimSerial, SimGpio) {
        let serial = SimSerial::new();
        let gpio = SimGpio::new();
        let mut config = config.clone();
        config.node.personal_offset = Some(offset);
        let node = Node::from_config(
            ether.radio(),
            serial.clone(),
            VirtualClock::new(),
            gpio.clone(),
            &mut FixedEntropy(0),
            &config,
        )
        .unwrap();
        (node, serial, gpio)
    }

    #[test]
    fn test_boot_listens_and_starts_states() {
        let ether = Ether::new();
        let (mut node, _, gpio) = node(&ether, &NightlightConfig::default(), 3);
        let echo = node.engine_mut().register(Echo);
        node.boot(&[echo]).unwrap();

        assert!(node.radio().is_listening());
        assert!(gpio.level(13));
        assert_eq!(node.engine().stack(), &[echo]);
    }

    #[test]
    fn test_reply_uses_half_duplex_write() {
        let ether = Ether::new();
        let config = NightlightConfig::default();
        let (mut node, _, _) = node(&ether, &config, 3);
        let echo = node.engine_mut().register(Echo);
        node.boot(&[echo]).unwrap();
        let mut peer = ether.radio();
        peer.configure(&RadioSettings::new(config.radio.broadcast_address, config.radio.broadcast_address + 9));
        peer.start_listening();

        ether.inject(config.radio.broadcast_address, &[0x01, 9, b'p']);
        let report = node.tick().unwrap();
        assert!(report.packet_received);
        assert_eq!(report.packets_sent, 1);

        let sent = ether.take_transmissions().pop().unwrap();
        assert_eq!(sent.address, config.radio.broadcast_address + 9);
        assert_eq!(sent.data, vec![0x08, 3]);
        assert!(sent.half_duplex);
        assert!(node.radio().is_listening());
        assert!(peer.is_packet_available());
    }

    #[test]
    fn test_short_packet_dropped() {
        let ether = Ether::new();
        let config = NightlightConfig::default();
        let (mut node, _, _) = node(&ether, &config, 3);
        let echo = node.engine_mut().register(Echo);
        node.boot(&[echo]).unwrap();

        ether.inject(config.radio.broadcast_address, &[0x01]);
        let report = node.tick().unwrap();
        assert!(report.packet_received);
        assert_eq!(report.packets_sent, 0);
    }

    #[test]
    fn test_one_line_per_tick() {
        let ether = Ether::new();
        let (mut node, serial, _) = node(&ether, &NightlightConfig::default(), 3);
        let echo = node.engine_mut().register(Echo);
        node.boot(&[echo]).unwrap();

        serial.push_line("18 first");
        serial.push_line("18 second");
        node.tick().unwrap();
        assert_eq!(serial.take_output(), vec!["first".to_string()]);
        node.tick().unwrap();
        assert_eq!(serial.take_output(), vec!["second".to_string()]);
        assert!(node.tick().unwrap().is_idle());
    }

    #[test]
    fn test_malformed_line_reported_not_dispatched() {
        let ether = Ether::new();
        let (mut node, serial, _) = node(&ether, &NightlightConfig::default(), 3);
        let echo = node.engine_mut().register(Echo);
        node.boot(&[echo]).unwrap();

        serial.push_line("x");
        let report = node.tick().unwrap();
        assert!(report.line_received);
        assert_eq!(serial.take_output(), vec![r#"bad line "x""#.to_string()]);

        serial.push_line("zz blink");
        node.tick().unwrap();
        assert_eq!(serial.take_output(), vec![r#"bad line "zz blink""#.to_string()]);
    }

    #[test]
    fn test_legacy_command_end_code() {
        let ether = Ether::new();
        let mut config = NightlightConfig::default();
        config.node.legacy_command_end = true;
        let (mut node, serial, _) = node(&ether, &config, 3);
        let echo = node.engine_mut().register(Echo);
        node.boot(&[echo]).unwrap();

        serial.push_line("12");
        node.tick().unwrap();
        let sent = ether.take_transmissions().pop().unwrap();
        assert_eq!(sent.data[0], 0x11);
        assert_eq!(sent.address, config.radio.broadcast_address);
    }

    #[test]
    fn test_payload_capped_by_packet_size() {
        let ether = Ether::new();
        let mut config = NightlightConfig::default();
        config.radio.payload_size = 8;
        let (mut node, serial, _) = node(&ether, &config, 3);
        let echo = node.engine_mut().register(Echo);
        node.boot(&[echo]).unwrap();

        serial.push_line("12 0123456789");
        node.tick().unwrap();
        let sent = ether.take_transmissions().pop().unwrap();
        assert_eq!(sent.data.len(), 8);
        assert_eq!(&sent.data[2..], b"012345");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let ether = Ether::new();
        let mut config = NightlightConfig::default();
        config.node.max_stack_depth = 0;
        let result: Result<TestNode> = Node::from_config(
            ether.radio(),
            SimSerial::new(),
            VirtualClock::new(),
            SimGpio::new(),
            &mut FixedEntropy(1),
            &config,
        );
        assert!(matches!(result, Err(NodeError::Config(_))));
    }

    #[test]
    fn test_fault_surfaces_from_boot() {
        let ether = Ether::new();
        let mut config = NightlightConfig::default();
        config.node.max_stack_depth = 5;
        let (mut node, _, _) = node(&ether, &config, 3);
        let states: Vec<StateId> = (0..6).map(|_| node.engine_mut().register(Echo)).collect();
        let err = node.boot(&states).unwrap_err();
        assert!(matches!(err, NodeError::Engine(crate::EngineError::StackOverflow { .. })));
    }
}
