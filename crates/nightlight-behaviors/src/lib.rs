// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Nightlight Behaviors
//!
//! The states a nightlight node is built from:
//!
//! | State | Role |
//! |-------|------|
//! | [`OpenNode`] | Idle and discoverable; hands the node to whoever asks for control |
//! | [`ControlledNode`] | Under remote control; runs commands for its friend |
//! | [`ControllerState`] | Operator side; takes control of nodes and sends them commands |
//! | [`FriendList`] | Tracks which nodes are in range |
//! | [`BlinkyLight`] | Blinks the LED for a while, then finishes |
//!
//! They are a closed set, so they are dispatched through the [`NodeState`]
//! enum rather than trait objects. [`standard_node`] wires them the way every
//! node ships: `[FriendList, OpenNode]` on the stack, `controller` and
//! `blink` modes on the console.

pub mod blinky;
pub mod controlled;
pub mod controller;
pub mod friends;
pub mod open;
pub mod wiring;

pub use blinky::BlinkyLight;
pub use controlled::ControlledNode;
pub use controller::ControllerState;
pub use friends::{Friend, FriendList};
pub use open::OpenNode;
pub use wiring::{register_standard, standard_node, StandardNode, StandardStates};

use nightlight_core::{Behavior, Context, Message};

/// Handler context for node states
pub type Ctx<'a> = Context<'a, NodeState>;

/// Every state a node can run
#[derive(Debug, Clone)]
pub enum NodeState {
    Open(OpenNode),
    Controlled(ControlledNode),
    Controller(ControllerState),
    Friends(FriendList),
    Blinky(BlinkyLight),
}

impl NodeState {
    pub fn as_open(&self) -> Option<&OpenNode> {
        match self {
            NodeState::Open(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_controlled(&self) -> Option<&ControlledNode> {
        match self {
            NodeState::Controlled(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_controlled_mut(&mut self) -> Option<&mut ControlledNode> {
        match self {
            NodeState::Controlled(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_controller(&self) -> Option<&ControllerState> {
        match self {
            NodeState::Controller(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_friends(&self) -> Option<&FriendList> {
        match self {
            NodeState::Friends(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_blinky(&self) -> Option<&BlinkyLight> {
        match self {
            NodeState::Blinky(state) => Some(state),
            _ => None,
        }
    }
}

impl Behavior for NodeState {
    fn name(&self) -> &'static str {
        match self {
            NodeState::Open(_) => "open",
            NodeState::Controlled(_) => "controlled",
            NodeState::Controller(_) => "controller",
            NodeState::Friends(_) => "friends",
            NodeState::Blinky(_) => "blinky",
        }
    }

    fn start(&mut self, ctx: &mut Ctx<'_>) {
        match self {
            NodeState::Open(state) => state.start(ctx),
            NodeState::Controlled(state) => state.start(ctx),
            NodeState::Friends(state) => state.start(ctx),
            NodeState::Blinky(state) => state.start(ctx),
            NodeState::Controller(_) => {}
        }
    }

    fn on_timeout(&mut self, ctx: &mut Ctx<'_>) {
        match self {
            NodeState::Open(state) => state.on_timeout(ctx),
            NodeState::Controlled(state) => state.on_timeout(ctx),
            NodeState::Friends(state) => state.on_timeout(ctx),
            NodeState::Blinky(state) => state.on_timeout(ctx),
            NodeState::Controller(_) => {}
        }
    }

    fn on_finished(&mut self, ctx: &mut Ctx<'_>) {
        if let NodeState::Controlled(state) = self {
            state.on_finished(ctx);
        }
    }

    fn receive_message(&mut self, ctx: &mut Ctx<'_>, msg: &Message) -> bool {
        match self {
            NodeState::Open(state) => state.receive_message(ctx, msg),
            NodeState::Controlled(state) => state.receive_message(ctx, msg),
            NodeState::Controller(state) => state.receive_message(ctx, msg),
            NodeState::Friends(state) => state.receive_message(ctx, msg),
            NodeState::Blinky(_) => ctx.change_mode(msg),
        }
    }
}

macro_rules! impl_from_state {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for NodeState {
                fn from(state: $ty) -> Self {
                    NodeState::$variant(state)
                }
            }
        )*
    };
}

impl_from_state!(
    Open(OpenNode),
    Controlled(ControlledNode),
    Controller(ControllerState),
    Friends(FriendList),
    Blinky(BlinkyLight),
);
