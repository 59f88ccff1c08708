// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

use nightlight_config::NightlightConfig;
use nightlight_core::{Destination, Message, MessageType, Sender, StateId};
use tracing::{debug, info, warn};

use crate::{Ctx, NodeState};

/// Idle, discoverable node
///
/// Broadcasts `HELLO` with the node name on start and every
/// `hello_interval_ms`. A `CONTROL_REQUEST` hands the node to the requester:
/// the configured controlled state gets the requester as its friend and is
/// pushed on top.
#[derive(Debug, Clone)]
pub struct OpenNode {
    name: String,
    hello_interval_ms: u64,
    controlled: StateId,
}

impl OpenNode {
    pub fn new(name: impl Into<String>, hello_interval_ms: u64, controlled: StateId) -> Self {
        Self {
            name: name.into(),
            hello_interval_ms,
            controlled,
        }
    }

    pub fn from_config(config: &NightlightConfig, controlled: StateId) -> Self {
        Self::new(config.node.name.clone(), config.timing.hello_interval_ms, controlled)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn hello(&self, ctx: &mut Ctx<'_>) {
        ctx.send(Destination::Broadcast, MessageType::HELLO, self.name.as_bytes());
        ctx.set_timeout(self.hello_interval_ms);
    }

    pub fn start(&mut self, ctx: &mut Ctx<'_>) {
        self.hello(ctx);
    }

    pub fn on_timeout(&mut self, ctx: &mut Ctx<'_>) {
        self.hello(ctx);
    }

    pub fn receive_message(&mut self, ctx: &mut Ctx<'_>, msg: &Message) -> bool {
        match (msg.msg_type, msg.sender) {
            (MessageType::CONTROL_REQUEST, Sender::Radio(from)) => {
                if ctx.is_active(self.controlled) {
                    debug!(from, "already under control");
                    return true;
                }
                match ctx.state_mut(self.controlled).and_then(NodeState::as_controlled_mut) {
                    Some(controlled) => controlled.set_friend(from),
                    None => {
                        warn!(state = %self.controlled, "configured controlled state is not a ControlledNode");
                        return true;
                    }
                }
                info!(friend = from, "control requested");
                ctx.push_state(self.controlled);
                true
            }
            _ => ctx.change_mode(msg),
        }
    }
}
