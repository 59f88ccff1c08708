// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

//! Several standard nodes sharing one simulated ether and one clock

use nightlight_behaviors::{standard_node, NodeState, StandardNode, StandardStates};
use nightlight_config::NightlightConfig;
use nightlight_hal::{Ether, FixedEntropy, SimGpio, SimRadio, SimSerial, VirtualClock};

const OPERATOR: u8 = 1;
const LAMP: u8 = 2;
const STEP_MS: u64 = 100;

struct Station {
    node: StandardNode<SimRadio, SimSerial, VirtualClock, SimGpio>,
    states: StandardStates,
    serial: SimSerial,
    gpio: SimGpio,
}

impl Station {
    fn new(ether: &Ether, clock: &VirtualClock, offset: u8, config: &NightlightConfig) -> Self {
        let mut config = config.clone();
        config.node.personal_offset = Some(offset);
        config.node.name = format!("node-{offset}");
        let serial = SimSerial::new();
        let gpio = SimGpio::new();
        let (node, states, _) = standard_node(
            ether.radio(),
            serial.clone(),
            clock.clone(),
            gpio.clone(),
            &mut FixedEntropy(0),
            &config,
        )
        .unwrap();
        Self {
            node,
            states,
            serial,
            gpio,
        }
    }

    fn friends(&self) -> Vec<u8> {
        self.node
            .engine()
            .state(self.states.friends)
            .and_then(NodeState::as_friends)
            .map(|list| list.friends().iter().map(|friend| friend.address).collect())
            .unwrap_or_default()
    }

    fn controlled(&self) -> Vec<u8> {
        self.node
            .engine()
            .state(self.states.controller)
            .and_then(NodeState::as_controller)
            .map(|controller| controller.controlled().to_vec())
            .unwrap_or_default()
    }

    fn said(&self, line: &str) -> bool {
        self.serial.output().iter().any(|out| out == line)
    }
}

/// Tick every station until nothing is left in flight
fn settle(stations: &mut [Station]) {
    for _ in 0..64 {
        let mut busy = false;
        for station in stations.iter_mut() {
            let report = station.node.tick().unwrap();
            busy |= report.packet_received || report.line_received || report.packets_sent > 0;
        }
        if !busy {
            return;
        }
    }
    panic!("network did not settle");
}

fn run_for(stations: &mut [Station], clock: &VirtualClock, ms: u64) {
    for _ in 0..ms / STEP_MS {
        clock.advance(STEP_MS);
        settle(stations);
    }
}

/// Operator in controller mode with the lamp under its control
fn controlled_pair(config: &NightlightConfig) -> (Ether, VirtualClock, Vec<Station>) {
    let ether = Ether::new();
    let clock = VirtualClock::new();
    let mut stations = vec![
        Station::new(&ether, &clock, OPERATOR, config),
        Station::new(&ether, &clock, LAMP, config),
    ];
    settle(&mut stations);

    stations[0].serial.push_line("20 controller");
    settle(&mut stations);
    run_for(&mut stations, &clock, config.timing.hello_interval_ms);
    (ether, clock, stations)
}

#[test]
fn test_nodes_discover_each_other() {
    let config = NightlightConfig::default();
    let ether = Ether::new();
    let clock = VirtualClock::new();
    let mut stations = vec![
        Station::new(&ether, &clock, OPERATOR, &config),
        Station::new(&ether, &clock, LAMP, &config),
    ];

    run_for(&mut stations, &clock, config.timing.hello_interval_ms);

    assert_eq!(stations[0].friends(), vec![LAMP]);
    assert_eq!(stations[1].friends(), vec![OPERATOR]);
}

#[test]
fn test_silent_node_disappears() {
    let config = NightlightConfig::default();
    let ether = Ether::new();
    let clock = VirtualClock::new();
    let mut stations = vec![
        Station::new(&ether, &clock, OPERATOR, &config),
        Station::new(&ether, &clock, LAMP, &config),
    ];
    run_for(&mut stations, &clock, config.timing.hello_interval_ms);
    assert_eq!(stations[0].friends(), vec![LAMP]);

    ether.set_link_down(true);
    run_for(
        &mut stations,
        &clock,
        config.timing.friend_liveness_ms + 2 * config.timing.friend_scan_interval_ms,
    );

    assert!(stations[0].friends().is_empty());
    assert!(stations[1].friends().is_empty());
}

#[test]
fn test_operator_takes_control() {
    let (_, _, stations) = controlled_pair(&NightlightConfig::default());

    assert!(stations[0].said("node 02 under control"));
    assert_eq!(stations[0].controlled(), vec![LAMP]);
    assert!(stations[1].node.engine().is_active(stations[1].states.controlled));
}

#[test]
fn test_beat_blinks_remote_lamp() {
    let config = NightlightConfig::default();
    let (_, clock, mut stations) = controlled_pair(&config);

    stations[0].serial.push_line("10");
    settle(&mut stations);

    assert!(stations[0].said("node 02 started"));
    assert!(stations[1].gpio.level(config.outputs.led_pin));
    assert!(stations[1].node.engine().is_active(stations[1].states.blinky));

    run_for(&mut stations, &clock, config.timing.blink_duration_ms);

    assert!(stations[0].said("node 02 finished"));
    assert!(!stations[1].gpio.level(config.outputs.led_pin));
    assert!(!stations[1].node.engine().is_active(stations[1].states.blinky));
    assert!(stations[1].gpio.writes(config.outputs.led_pin) > 2);
}

#[test]
fn test_legacy_completion_reads_as_started() {
    let mut config = NightlightConfig::default();
    config.node.legacy_command_end = true;
    let (_, clock, mut stations) = controlled_pair(&config);

    stations[0].serial.push_line("10");
    settle(&mut stations);
    run_for(&mut stations, &clock, config.timing.blink_duration_ms);

    let started = stations[0]
        .serial
        .output()
        .iter()
        .filter(|line| *line == "node 02 started")
        .count();
    assert_eq!(started, 2);
    assert!(!stations[0].said("node 02 finished"));
}

#[test]
fn test_lease_expiry_releases_lamp() {
    let mut config = NightlightConfig::default();
    config.timing.control_lease_ms = 1000;
    config.timing.hello_interval_ms = 5000;
    let (_, clock, mut stations) = controlled_pair(&config);
    assert_eq!(stations[0].controlled(), vec![LAMP]);

    run_for(&mut stations, &clock, config.timing.control_lease_ms);

    assert!(stations[0].said("node 02 released"));
    assert!(stations[0].controlled().is_empty());
    assert!(!stations[1].node.engine().is_active(stations[1].states.controlled));
}

#[test]
fn test_beat_without_lamps() {
    let config = NightlightConfig::default();
    let ether = Ether::new();
    let clock = VirtualClock::new();
    let mut stations = vec![Station::new(&ether, &clock, OPERATOR, &config)];

    stations[0].serial.push_line("20 controller");
    stations[0].serial.push_line("10");
    settle(&mut stations);

    assert!(stations[0].said("no nodes under control"));
}
