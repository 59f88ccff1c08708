// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

//! # State Stack Engine
//!
//! A node's behavior is a stack of active states. Every inbound event walks
//! the stack from the top (most recently pushed) down and stops at the first
//! state that claims it, so a transient state shadows the idle states
//! beneath it without replacing them.
//!
//! ## Ownership
//!
//! States live in an arena and are addressed by [`StateId`]. The stack only
//! holds ids, and so does the finish-notification link, so a link to a state
//! that has since left the stack is harmless: it is skipped.
//!
//! ```text
//!   arena: [FriendList, BlinkyLight, ControlledNode, ControllerState, OpenNode]
//!               #0          #1             #2              #3            #4
//!   stack: [#0, #4, #2]          <- top (#2) sees events first
//! ```
//!
//! ## Handler effects
//!
//! Handlers get a [`Context`] and never touch hardware. Radio sends, console
//! lines and output changes are queued as [`Effect`]s for the node to apply
//! after dispatch. Loopback and local events are queued too, and dispatched
//! once the current handler returns, in the same tick.
//!
//! ## Reentrancy
//!
//! Dispatch iterates a snapshot of the stack taken when it starts. A state
//! removed mid-sweep is skipped; a state pushed mid-sweep is not part of the
//! sweep and first sees events from the next dispatch.
//!
//! ## Faults
//!
//! Stack overflow, under-run and similar wiring mistakes raised from inside a
//! handler are latched; the node returns them from the next tick.

use std::collections::VecDeque;
use std::fmt;

use nightlight_config::NightlightConfig;
use tracing::{debug, error, trace, warn};

use crate::address::NodeIdentity;
use crate::command_table::CommandTable;
use crate::error::EngineError;
use crate::protocol::{payload_from, Destination, Message, MessageType, Payload, Sender};
use crate::serial::encode_line;
use crate::timer::Timeout;

/// Longest run of local events handled after one dispatch before the rest
/// are dropped (guards against two states bouncing events forever)
pub const MAX_LOCAL_CHAIN: usize = 64;

/// Stable handle of a registered state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(usize);

impl StateId {
    /// Arena index
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Event handlers of a state
///
/// Every handler has a default. The default `receive_message` is the shared
/// mode switch ([`Context::change_mode`]); states that override it should
/// fall back to it for messages they don't handle.
pub trait Behavior: Sized {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Called when the state is pushed, after its timeout is cleared
    fn start(&mut self, ctx: &mut Context<'_, Self>) {
        let _ = ctx;
    }

    /// Called once when the state's timeout expires
    fn on_timeout(&mut self, ctx: &mut Context<'_, Self>) {
        let _ = ctx;
    }

    /// Called when a state that named this one as its finish target finishes
    fn on_finished(&mut self, ctx: &mut Context<'_, Self>) {
        let _ = ctx;
    }

    /// Handle a message; return true to claim it and stop the sweep
    fn receive_message(&mut self, ctx: &mut Context<'_, Self>, msg: &Message) -> bool {
        ctx.change_mode(msg)
    }
}

/// Side effect requested by a handler, applied by the node after dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Frame and transmit to `broadcast + to`
    Radio {
        to: u8,
        msg_type: MessageType,
        payload: Payload,
    },
    /// Write a console line
    Line(String),
    /// Drive an output pin
    Output { pin: u8, high: bool },
}

struct Slot<B> {
    /// `None` while the state's own handler is running
    behavior: Option<B>,
    name: &'static str,
    timeout: Timeout,
    notify: Option<StateId>,
    commands: CommandTable<StateId>,
}

/// Arena of states plus the ordered stack of active ones
pub struct StateStack<B> {
    slots: Vec<Slot<B>>,
    /// Bottom first
    stack: Vec<StateId>,
    max_depth: usize,
    max_commands: usize,
    identity: NodeIdentity,
    now: u64,
    local: VecDeque<Message>,
    effects: Vec<Effect>,
    fault: Option<EngineError>,
}

impl<B: Behavior> StateStack<B> {
    /// Empty engine
    ///
    /// # Arguments
    /// * `identity` - Radio identity, used to recognize loopback sends
    /// * `max_depth` - Maximum number of simultaneously active states
    /// * `max_commands` - Capacity of each state's command table
    pub fn new(identity: NodeIdentity, max_depth: usize, max_commands: usize) -> Self {
        Self {
            slots: Vec::new(),
            stack: Vec::with_capacity(max_depth),
            max_depth,
            max_commands,
            identity,
            now: 0,
            local: VecDeque::new(),
            effects: Vec::new(),
            fault: None,
        }
    }

    /// Engine sized from the `[node]` config section
    pub fn from_config(identity: NodeIdentity, config: &NightlightConfig) -> Self {
        Self::new(identity, config.node.max_stack_depth, config.node.max_commands)
    }

    /// Add a state to the arena (inactive until pushed)
    pub fn register(&mut self, behavior: B) -> StateId {
        let id = StateId(self.slots.len());
        debug!(state = %id, name = behavior.name(), "registered state");
        self.slots.push(Slot {
            name: behavior.name(),
            behavior: Some(behavior),
            timeout: Timeout::default(),
            notify: None,
            commands: CommandTable::with_capacity(self.max_commands),
        });
        id
    }

    /// Map a mode name in `state`'s command table to `target`
    pub fn add_command(&mut self, state: StateId, key: &str, target: StateId) -> Result<(), EngineError> {
        if target.0 >= self.slots.len() {
            return Err(EngineError::UnknownState(target));
        }
        let slot = self.slots.get_mut(state.0).ok_or(EngineError::UnknownState(state))?;
        slot.commands.add(key, target)?;
        Ok(())
    }

    /// Command table of a state
    pub fn commands(&self, state: StateId) -> Option<&CommandTable<StateId>> {
        self.slots.get(state.0).map(|slot| &slot.commands)
    }

    pub fn identity(&self) -> NodeIdentity {
        self.identity
    }

    /// Time handlers see as "now"
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn set_now(&mut self, now: u64) {
        self.now = now;
    }

    /// Active states, bottom first
    pub fn stack(&self) -> &[StateId] {
        &self.stack
    }

    /// Names of the active states, bottom first
    pub fn stack_names(&self) -> Vec<&'static str> {
        self.stack.iter().filter_map(|id| self.name(*id)).collect()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn name(&self, id: StateId) -> Option<&'static str> {
        self.slots.get(id.0).map(|slot| slot.name)
    }

    pub fn is_active(&self, id: StateId) -> bool {
        self.stack.contains(&id)
    }

    /// Borrow a state (`None` while its own handler runs)
    pub fn state(&self, id: StateId) -> Option<&B> {
        self.slots.get(id.0).and_then(|slot| slot.behavior.as_ref())
    }

    /// Mutably borrow a state (`None` while its own handler runs)
    pub fn state_mut(&mut self, id: StateId) -> Option<&mut B> {
        self.slots.get_mut(id.0).and_then(|slot| slot.behavior.as_mut())
    }

    /// Pending timeout deadline of a state
    pub fn timeout(&self, id: StateId) -> Option<u64> {
        self.slots.get(id.0).and_then(|slot| slot.timeout.deadline())
    }

    /// Push a registered state and run its `start` handler
    pub fn push(&mut self, id: StateId) -> Result<(), EngineError> {
        let result = self.push_inner(id);
        self.drain_local();
        result
    }

    /// Remove a state, keeping the order of the others
    ///
    /// Removing a state that isn't on the stack is a no-op; removing from an
    /// empty stack is an under-run.
    pub fn remove(&mut self, id: StateId) -> Result<(), EngineError> {
        self.remove_inner(id).map(|_| ())
    }

    /// Remove `from`, then push `to` on top
    pub fn change_state(&mut self, from: StateId, to: StateId) -> Result<(), EngineError> {
        let result = self.change_inner(from, to);
        self.drain_local();
        result
    }

    /// Remove a state and notify its finish target, if any
    pub fn finish(&mut self, id: StateId) -> Result<(), EngineError> {
        let result = self.finish_inner(id);
        self.drain_local();
        result
    }

    /// Set the state notified when `state` finishes
    pub fn set_finish_target(&mut self, state: StateId, target: Option<StateId>) -> Result<(), EngineError> {
        let slot = self.slots.get_mut(state.0).ok_or(EngineError::UnknownState(state))?;
        slot.notify = target;
        Ok(())
    }

    /// Bubble a message down the stack, then drain queued local events
    ///
    /// # Returns
    /// True if some state claimed the message
    pub fn dispatch(&mut self, msg: Message) -> bool {
        let claimed = self.sweep(&msg);
        self.drain_local();
        claimed
    }

    /// Fire every expired timeout of the active states, top first
    ///
    /// # Returns
    /// Number of timeouts fired
    pub fn run_timers(&mut self) -> usize {
        let now = self.now;
        let snapshot: Vec<StateId> = self.stack.iter().rev().copied().collect();
        let mut fired = 0;
        for id in snapshot {
            if !self.is_active(id) {
                continue;
            }
            let expired = self
                .slots
                .get_mut(id.0)
                .map_or(false, |slot| slot.timeout.take_expired(now));
            if expired {
                trace!(state = %id, now, "timeout");
                fired += 1;
                self.invoke(id, |behavior, ctx| behavior.on_timeout(ctx));
                self.drain_local();
            }
        }
        fired
    }

    /// Effects queued since the last call, in issue order
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// First fault latched since the last call
    pub fn take_fault(&mut self) -> Option<EngineError> {
        self.fault.take()
    }

    fn push_inner(&mut self, id: StateId) -> Result<(), EngineError> {
        if id.0 >= self.slots.len() {
            return Err(EngineError::UnknownState(id));
        }
        if self.is_active(id) {
            return Err(EngineError::StateAlreadyActive(id));
        }
        if self.stack.len() >= self.max_depth {
            return Err(EngineError::StackOverflow {
                state: id,
                max_depth: self.max_depth,
            });
        }

        self.stack.push(id);
        let slot = &mut self.slots[id.0];
        slot.timeout.clear();
        debug!(state = %id, name = slot.name, depth = self.stack.len(), "push");

        self.invoke(id, |behavior, ctx| behavior.start(ctx));
        Ok(())
    }

    fn remove_inner(&mut self, id: StateId) -> Result<bool, EngineError> {
        if self.stack.is_empty() {
            return Err(EngineError::StackUnderrun(id));
        }
        let Some(position) = self.stack.iter().position(|active| *active == id) else {
            trace!(state = %id, "remove of inactive state ignored");
            return Ok(false);
        };

        self.stack.remove(position);
        if let Some(slot) = self.slots.get_mut(id.0) {
            slot.timeout.clear();
            debug!(state = %id, name = slot.name, depth = self.stack.len(), "remove");
        }
        Ok(true)
    }

    fn change_inner(&mut self, from: StateId, to: StateId) -> Result<(), EngineError> {
        self.remove_inner(from)?;
        self.push_inner(to)
    }

    fn finish_inner(&mut self, id: StateId) -> Result<(), EngineError> {
        self.remove_inner(id)?;

        let target = self.slots.get_mut(id.0).and_then(|slot| slot.notify.take());
        match target {
            Some(target) if self.is_active(target) => {
                debug!(state = %id, target = %target, "finished, notifying");
                self.invoke(target, |behavior, ctx| behavior.on_finished(ctx));
            }
            Some(target) => debug!(state = %id, target = %target, "finish target not on the stack"),
            None => debug!(state = %id, "finished"),
        }
        Ok(())
    }

    fn sweep(&mut self, msg: &Message) -> bool {
        let snapshot: Vec<StateId> = self.stack.iter().rev().copied().collect();
        for id in snapshot {
            if !self.is_active(id) {
                continue;
            }
            if self.invoke(id, |behavior, ctx| behavior.receive_message(ctx, msg)) == Some(true) {
                trace!(state = %id, msg_type = %msg.msg_type, sender = %msg.sender, "claimed");
                return true;
            }
        }
        trace!(msg_type = %msg.msg_type, sender = %msg.sender, "unclaimed");
        false
    }

    fn drain_local(&mut self) {
        let mut handled = 0;
        while let Some(msg) = self.local.pop_front() {
            if handled == MAX_LOCAL_CHAIN {
                warn!(dropped = self.local.len() + 1, "local event chain too long, dropping the rest");
                self.local.clear();
                break;
            }
            handled += 1;
            self.sweep(&msg);
        }
    }

    /// Run a handler with its state checked out of the arena
    fn invoke<R>(&mut self, id: StateId, f: impl FnOnce(&mut B, &mut Context<'_, B>) -> R) -> Option<R> {
        let Some(mut behavior) = self.slots.get_mut(id.0).and_then(|slot| slot.behavior.take()) else {
            warn!(state = %id, "handler already running, event skipped");
            return None;
        };
        let result = f(&mut behavior, &mut Context { engine: &mut *self, me: id });
        if let Some(slot) = self.slots.get_mut(id.0) {
            slot.behavior = Some(behavior);
        }
        Some(result)
    }

    fn latch(&mut self, result: Result<(), EngineError>) {
        if let Err(e) = result {
            error!(error = %e, "engine fault");
            if self.fault.is_none() {
                self.fault = Some(e);
            }
        }
    }
}

/// What a running handler can do
pub struct Context<'a, B> {
    engine: &'a mut StateStack<B>,
    me: StateId,
}

impl<'a, B: Behavior> Context<'a, B> {
    /// The state whose handler is running
    pub fn me(&self) -> StateId {
        self.me
    }

    pub fn now(&self) -> u64 {
        self.engine.now
    }

    pub fn identity(&self) -> NodeIdentity {
        self.engine.identity
    }

    /// Arm this state's timeout `ms` from now, replacing any pending one
    pub fn set_timeout(&mut self, ms: u64) {
        let now = self.engine.now;
        if let Some(slot) = self.engine.slots.get_mut(self.me.0) {
            slot.timeout.arm(now, ms);
        }
    }

    pub fn clear_timeout(&mut self) {
        if let Some(slot) = self.engine.slots.get_mut(self.me.0) {
            slot.timeout.clear();
        }
    }

    pub fn push_state(&mut self, id: StateId) {
        let result = self.engine.push_inner(id);
        self.engine.latch(result);
    }

    pub fn remove_state(&mut self, id: StateId) {
        let result = self.engine.remove_inner(id).map(|_| ());
        self.engine.latch(result);
    }

    pub fn change_state(&mut self, from: StateId, to: StateId) {
        let result = self.engine.change_inner(from, to);
        self.engine.latch(result);
    }

    /// Remove this state, then notify its finish target
    pub fn finish(&mut self) {
        let result = self.engine.finish_inner(self.me);
        self.engine.latch(result);
    }

    /// Have `target` notified when this state finishes
    pub fn notify_finished(&mut self, target: StateId) {
        let me = self.me;
        self.link_finish(me, target);
    }

    /// Have `target` notified when `state` finishes
    pub fn link_finish(&mut self, state: StateId, target: StateId) {
        let result = self.engine.set_finish_target(state, Some(target));
        self.engine.latch(result);
    }

    /// Stop notifying anyone when `state` finishes
    pub fn unlink_finish(&mut self, state: StateId) {
        let result = self.engine.set_finish_target(state, None);
        self.engine.latch(result);
    }

    pub fn is_active(&self, id: StateId) -> bool {
        self.engine.is_active(id)
    }

    /// Another state's data (`None` for the running state itself)
    pub fn state_mut(&mut self, id: StateId) -> Option<&mut B> {
        self.engine.state_mut(id)
    }

    /// This state's command table
    pub fn commands(&self) -> Option<&CommandTable<StateId>> {
        self.engine.commands(self.me)
    }

    /// Send a message
    ///
    /// Our own offset loops back into the stack (sender = our offset) after
    /// this handler returns. `Serial` becomes a console line. Anything else
    /// is transmitted by the node, best effort.
    pub fn send(&mut self, to: Destination, msg_type: MessageType, payload: &[u8]) {
        let own = self.engine.identity.personal_offset();
        match to {
            Destination::Node(offset) if offset == own => {
                trace!(msg_type = %msg_type, "loopback");
                self.engine
                    .local
                    .push_back(Message::new(Sender::Radio(own), msg_type, payload));
            }
            Destination::Serial => self.engine.effects.push(Effect::Line(encode_line(msg_type, payload))),
            Destination::Broadcast => self.radio(0, msg_type, payload),
            Destination::Node(offset) => self.radio(offset, msg_type, payload),
        }
    }

    fn radio(&mut self, to: u8, msg_type: MessageType, payload: &[u8]) {
        self.engine.effects.push(Effect::Radio {
            to,
            msg_type,
            payload: payload_from(payload),
        });
    }

    /// Raise an event for the rest of this node's stack (sender `Local`)
    pub fn emit_local(&mut self, msg_type: MessageType, payload: &[u8]) {
        self.engine.local.push_back(Message::new(Sender::Local, msg_type, payload));
    }

    /// Write an operator-facing console line
    pub fn write_line(&mut self, line: impl Into<String>) {
        self.engine.effects.push(Effect::Line(line.into()));
    }

    /// Drive an output pin
    pub fn set_output(&mut self, pin: u8, high: bool) {
        self.engine.effects.push(Effect::Output { pin, high });
    }

    /// Shared mode switch
    ///
    /// A `CHANGE_MODE` line from the console names a mode; if this state's
    /// command table maps it, the mapped state is pushed and the message is
    /// claimed. Otherwise "unknown mode" is reported and the message bubbles
    /// on. Anything else is left unclaimed.
    pub fn change_mode(&mut self, msg: &Message) -> bool {
        if !msg.is(MessageType::CHANGE_MODE, Sender::Serial) {
            return false;
        }
        let mode = msg.text();
        let mode = mode.trim();
        match self.commands().and_then(|table| table.get(mode)) {
            Some(target) if self.is_active(target) => {
                self.write_line(format!("mode {} already active", mode));
                true
            }
            Some(target) => {
                debug!(state = %self.me, mode, target = %target, "change mode");
                self.push_state(target);
                true
            }
            None => {
                debug!(state = %self.me, mode, "unknown mode");
                self.write_line(format!("unknown mode {}", mode));
                false
            }
        }
    }
}
