// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

//! Default node wiring
//!
//! ```text
//! OpenNode ──"controller"──► ControllerState ──"blink"──► BlinkyLight
//!    │ └──────"blink"───────────────────────────────────►     ▲
//!    └──CONTROL_REQUEST──► ControlledNode ──COMMAND_SEND──────┘
//! ```

use nightlight_config::NightlightConfig;
use nightlight_core::{EngineError, Node, NodeError, StateId, StateStack, TickReport};
use nightlight_hal::{EntropySource, GpioProvider, RadioProvider, SerialIO, TimeProvider};

use crate::{BlinkyLight, ControlledNode, ControllerState, FriendList, NodeState, OpenNode};

/// Node running the standard states
pub type StandardNode<R, S, C, G> = Node<R, S, C, G, NodeState>;

/// Handles of the standard states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardStates {
    pub friends: StateId,
    pub open: StateId,
    pub controlled: StateId,
    pub controller: StateId,
    pub blinky: StateId,
}

impl StandardStates {
    /// Stack at boot, bottom first
    pub fn initial_stack(&self) -> [StateId; 2] {
        [self.friends, self.open]
    }
}

/// Register the standard states and their console modes
pub fn register_standard(
    engine: &mut StateStack<NodeState>,
    config: &NightlightConfig,
) -> Result<StandardStates, EngineError> {
    let friends = engine.register(FriendList::from_config(config).into());
    let blinky = engine.register(BlinkyLight::from_config(config).into());
    let controlled = engine.register(ControlledNode::from_config(config, blinky).into());
    let controller = engine.register(ControllerState::from_config(config).into());
    let open = engine.register(OpenNode::from_config(config, controlled).into());

    engine.add_command(open, "controller", controller)?;
    engine.add_command(open, "blink", blinky)?;
    engine.add_command(controller, "blink", blinky)?;

    Ok(StandardStates {
        friends,
        open,
        controlled,
        controller,
        blinky,
    })
}

/// Build, wire and boot a standard node
///
/// # Returns
/// The node, the handles of its states and what booting did (the first
/// `HELLO` goes out here)
pub fn standard_node<R, S, C, G, E>(
    radio: R,
    serial: S,
    clock: C,
    gpio: G,
    entropy: &mut E,
    config: &NightlightConfig,
) -> Result<(StandardNode<R, S, C, G>, StandardStates, TickReport), NodeError>
where
    R: RadioProvider,
    S: SerialIO,
    C: TimeProvider,
    G: GpioProvider<Pin = u8>,
    E: EntropySource,
{
    let mut node = Node::from_config(radio, serial, clock, gpio, entropy, config)?;
    let states = register_standard(node.engine_mut(), config)?;
    let report = node.boot(&states.initial_stack())?;
    Ok((node, states, report))
}
