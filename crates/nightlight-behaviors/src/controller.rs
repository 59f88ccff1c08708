// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

use nightlight_config::NightlightConfig;
use nightlight_core::{Destination, Message, MessageType, Sender};
use tracing::{info, warn};

use crate::Ctx;

/// Operator side of remote control
///
/// Requests control of every node it hears say `HELLO` and keeps the nodes
/// that accepted. A `COMMAND_SEND` line on the console (`10`) sends one
/// command to each of them.
///
/// With `legacy_command_end` on the air, completions arrive with the same
/// code as acknowledgements and are reported as "started".
#[derive(Debug, Clone)]
pub struct ControllerState {
    controlled: Vec<u8>,
    capacity: usize,
}

impl ControllerState {
    pub fn new(capacity: usize) -> Self {
        Self {
            controlled: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn from_config(config: &NightlightConfig) -> Self {
        Self::new(config.controller.max_controlled)
    }

    /// Nodes currently under control, in the order they accepted
    pub fn controlled(&self) -> &[u8] {
        &self.controlled
    }

    fn accept(&mut self, ctx: &mut Ctx<'_>, node: u8) {
        if self.controlled.contains(&node) {
            return;
        }
        if self.controlled.len() >= self.capacity {
            warn!(node, capacity = self.capacity, "controlled list full");
            ctx.write_line(format!("controller full, ignoring node {:02X}", node));
            return;
        }
        self.controlled.push(node);
        info!(node, "node under control");
        ctx.write_line(format!("node {:02X} under control", node));
    }

    fn send_beat(&self, ctx: &mut Ctx<'_>) {
        if self.controlled.is_empty() {
            ctx.write_line("no nodes under control");
            return;
        }
        for node in &self.controlled {
            ctx.send(Destination::Node(*node), MessageType::COMMAND_SEND, &[]);
        }
    }

    pub fn receive_message(&mut self, ctx: &mut Ctx<'_>, msg: &Message) -> bool {
        match (msg.msg_type, msg.sender) {
            (MessageType::HELLO, Sender::Radio(from)) => {
                ctx.send(Destination::Node(from), MessageType::CONTROL_REQUEST, &[]);
                true
            }
            (MessageType::CONTROL_START, Sender::Radio(from)) => {
                self.accept(ctx, from);
                true
            }
            (MessageType::COMMAND_SEND, Sender::Serial) => {
                self.send_beat(ctx);
                true
            }
            (MessageType::CONTROL_STOP, Sender::Radio(from)) => {
                self.controlled.retain(|node| *node != from);
                info!(node = from, "node released");
                ctx.write_line(format!("node {:02X} released", from));
                true
            }
            (MessageType::COMMAND_START, Sender::Radio(from)) => {
                ctx.write_line(format!("node {:02X} started", from));
                true
            }
            (MessageType::COMMAND_END, Sender::Radio(from)) => {
                ctx.write_line(format!("node {:02X} finished", from));
                true
            }
            _ => ctx.change_mode(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{booted, console, lines, radio, sent};
    use crate::NodeState;
    use nightlight_core::StateStack;

    fn operator(config: &NightlightConfig) -> (StateStack<NodeState>, crate::StandardStates) {
        let (mut engine, states, _) = booted(config);
        assert!(engine.dispatch(console(MessageType::CHANGE_MODE, "controller")));
        engine.take_effects();
        (engine, states)
    }

    fn controlled(engine: &StateStack<NodeState>, states: &crate::StandardStates) -> Vec<u8> {
        engine
            .state(states.controller)
            .and_then(NodeState::as_controller)
            .map(|c| c.controlled().to_vec())
            .unwrap_or_default()
    }

    #[test]
    fn test_hello_answered_with_request() {
        let (mut engine, states) = operator(&NightlightConfig::default());

        assert!(engine.dispatch(radio(7, MessageType::HELLO, b"lamp")));
        assert_eq!(sent(&engine.take_effects()), vec![(7, MessageType::CONTROL_REQUEST)]);
        let friends = engine.state(states.friends).and_then(NodeState::as_friends).map(|f| f.contains(7));
        assert_eq!(friends, Some(false));
    }

    #[test]
    fn test_accepted_nodes_get_beats() {
        let (mut engine, states) = operator(&NightlightConfig::default());

        engine.dispatch(radio(7, MessageType::CONTROL_START, &[]));
        engine.dispatch(radio(9, MessageType::CONTROL_START, &[]));
        assert_eq!(
            lines(&engine.take_effects()),
            vec!["node 07 under control".to_string(), "node 09 under control".to_string()]
        );
        assert_eq!(controlled(&engine, &states), vec![7, 9]);

        assert!(engine.dispatch(console(MessageType::COMMAND_SEND, "")));
        assert_eq!(
            sent(&engine.take_effects()),
            vec![(7, MessageType::COMMAND_SEND), (9, MessageType::COMMAND_SEND)]
        );
    }

    #[test]
    fn test_beat_with_nobody_under_control() {
        let (mut engine, _) = operator(&NightlightConfig::default());
        assert!(engine.dispatch(console(MessageType::COMMAND_SEND, "")));
        let effects = engine.take_effects();
        assert!(sent(&effects).is_empty());
        assert_eq!(lines(&effects), vec!["no nodes under control".to_string()]);
    }

    #[test]
    fn test_full_controller_ignores_new_nodes() {
        let mut config = NightlightConfig::default();
        config.controller.max_controlled = 1;
        let (mut engine, states) = operator(&config);

        engine.dispatch(radio(7, MessageType::CONTROL_START, &[]));
        engine.dispatch(radio(7, MessageType::CONTROL_START, &[]));
        engine.dispatch(radio(8, MessageType::CONTROL_START, &[]));

        assert_eq!(controlled(&engine, &states), vec![7]);
        assert_eq!(
            lines(&engine.take_effects()),
            vec!["node 07 under control".to_string(), "controller full, ignoring node 08".to_string()]
        );
    }

    #[test]
    fn test_progress_and_release_reported() {
        let (mut engine, states) = operator(&NightlightConfig::default());
        engine.dispatch(radio(7, MessageType::CONTROL_START, &[]));
        engine.take_effects();

        engine.dispatch(radio(7, MessageType::COMMAND_START, &[]));
        engine.dispatch(radio(7, MessageType::COMMAND_END, &[]));
        engine.dispatch(radio(7, MessageType::CONTROL_STOP, &[]));

        assert_eq!(
            lines(&engine.take_effects()),
            vec![
                "node 07 started".to_string(),
                "node 07 finished".to_string(),
                "node 07 released".to_string(),
            ]
        );
        assert!(controlled(&engine, &states).is_empty());
    }

    #[test]
    fn test_blink_mode_from_controller() {
        let (mut engine, states) = operator(&NightlightConfig::default());
        assert!(engine.dispatch(console(MessageType::CHANGE_MODE, "blink")));
        assert_eq!(engine.stack().last(), Some(&states.blinky));
    }

    #[test]
    fn test_controller_mode_already_active() {
        let (mut engine, _) = operator(&NightlightConfig::default());
        assert!(engine.dispatch(console(MessageType::CHANGE_MODE, "controller")));
        assert!(lines(&engine.take_effects()).contains(&"mode controller already active".to_string()));
    }
}
