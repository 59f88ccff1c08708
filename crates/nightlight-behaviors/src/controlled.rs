// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

use nightlight_config::NightlightConfig;
use nightlight_core::{Destination, Message, MessageType, Sender, StateId};
use tracing::{debug, info};

use crate::Ctx;

/// Node under remote control of one friend
///
/// Announces `CONTROL_START` when pushed. Each `COMMAND_SEND` from the
/// friend is acknowledged with `COMMAND_START` and runs the command state,
/// whose completion is reported back with `COMMAND_END`.
///
/// Control is held on a lease renewed by every command; when it runs out the
/// node sends `CONTROL_STOP` and finishes. `CONTROL_STOP` from the friend
/// ends control without a reply. `lease_ms == 0` disables the lease.
#[derive(Debug, Clone)]
pub struct ControlledNode {
    friend: Option<u8>,
    command: StateId,
    lease_ms: u64,
}

impl ControlledNode {
    pub fn new(command: StateId, lease_ms: u64) -> Self {
        Self {
            friend: None,
            command,
            lease_ms,
        }
    }

    pub fn from_config(config: &NightlightConfig, command: StateId) -> Self {
        Self::new(command, config.timing.control_lease_ms)
    }

    /// Record the controlling node (called before the state is pushed)
    pub fn set_friend(&mut self, friend: u8) {
        self.friend = Some(friend);
    }

    pub fn friend(&self) -> Option<u8> {
        self.friend
    }

    fn renew_lease(&self, ctx: &mut Ctx<'_>) {
        if self.lease_ms > 0 {
            ctx.set_timeout(self.lease_ms);
        }
    }

    fn release(&mut self, ctx: &mut Ctx<'_>) {
        self.friend = None;
        // A command still running belongs to this session, not the next one
        ctx.unlink_finish(self.command);
        ctx.finish();
    }

    pub fn start(&mut self, ctx: &mut Ctx<'_>) {
        if let Some(friend) = self.friend {
            info!(friend, "under control");
            ctx.send(Destination::Node(friend), MessageType::CONTROL_START, &[]);
        }
        self.renew_lease(ctx);
    }

    /// Lease expired
    pub fn on_timeout(&mut self, ctx: &mut Ctx<'_>) {
        if let Some(friend) = self.friend {
            info!(friend, "control lease expired");
            ctx.send(Destination::Node(friend), MessageType::CONTROL_STOP, &[]);
        }
        self.release(ctx);
    }

    /// The command state finished
    pub fn on_finished(&mut self, ctx: &mut Ctx<'_>) {
        if let Some(friend) = self.friend {
            ctx.send(Destination::Node(friend), MessageType::COMMAND_END, &[]);
        }
    }

    pub fn receive_message(&mut self, ctx: &mut Ctx<'_>, msg: &Message) -> bool {
        let from_friend = matches!((msg.sender, self.friend), (Sender::Radio(a), Some(f)) if a == f);
        match msg.msg_type {
            MessageType::CONTROL_REQUEST => {
                debug!(sender = %msg.sender, "control request while controlled");
                true
            }
            MessageType::COMMAND_SEND if from_friend => {
                if let Some(friend) = self.friend {
                    ctx.send(Destination::Node(friend), MessageType::COMMAND_START, &[]);
                }
                let me = ctx.me();
                ctx.link_finish(self.command, me);
                if ctx.is_active(self.command) {
                    debug!("command already running");
                } else {
                    ctx.push_state(self.command);
                }
                self.renew_lease(ctx);
                true
            }
            MessageType::CONTROL_STOP if from_friend => {
                info!(sender = %msg.sender, "released by friend");
                self.release(ctx);
                true
            }
            _ => ctx.change_mode(msg),
        }
    }
}
