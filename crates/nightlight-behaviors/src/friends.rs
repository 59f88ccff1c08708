// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

use nightlight_config::NightlightConfig;
use nightlight_core::{Behavior, Context, Message, MessageType, Sender};
use tracing::{info, warn};

/// A node heard recently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Friend {
    pub address: u8,
    /// Forgotten once the clock is past this
    pub deadline: u64,
}

/// Presence tracker
///
/// Every `HELLO` keeps its sender alive for `liveness_ms`. New senders are
/// announced with a local `APPEAR`, and senders gone quiet are dropped on the
/// next scan with a local `DISAPPEAR`. Both carry the address as a one-byte
/// payload.
///
/// It needs nothing from the states around it, so its handlers work on any
/// stack, not only a [`NodeState`](crate::NodeState) one.
#[derive(Debug, Clone)]
pub struct FriendList {
    friends: Vec<Friend>,
    capacity: usize,
    scan_interval_ms: u64,
    liveness_ms: u64,
}

impl FriendList {
    pub fn new(capacity: usize, scan_interval_ms: u64, liveness_ms: u64) -> Self {
        Self {
            friends: Vec::with_capacity(capacity),
            capacity,
            scan_interval_ms,
            liveness_ms,
        }
    }

    pub fn from_config(config: &NightlightConfig) -> Self {
        Self::new(
            config.friends.capacity,
            config.timing.friend_scan_interval_ms,
            config.timing.friend_liveness_ms,
        )
    }

    pub fn friends(&self) -> &[Friend] {
        &self.friends
    }

    pub fn contains(&self, address: u8) -> bool {
        self.friends.iter().any(|friend| friend.address == address)
    }

    pub fn start<B: Behavior>(&mut self, ctx: &mut Context<'_, B>) {
        ctx.set_timeout(self.scan_interval_ms);
    }

    /// Scan for friends gone quiet
    pub fn on_timeout<B: Behavior>(&mut self, ctx: &mut Context<'_, B>) {
        let now = ctx.now();
        let (gone, alive): (Vec<Friend>, Vec<Friend>) = self.friends.iter().partition(|friend| now > friend.deadline);
        self.friends = alive;
        for friend in gone {
            info!(friend = friend.address, "friend disappeared");
            ctx.emit_local(MessageType::DISAPPEAR, &[friend.address]);
        }
        ctx.set_timeout(self.scan_interval_ms);
    }

    pub fn receive_message<B: Behavior>(&mut self, ctx: &mut Context<'_, B>, msg: &Message) -> bool {
        match (msg.msg_type, msg.sender) {
            (MessageType::HELLO, Sender::Radio(from)) => {
                let deadline = ctx.now() + self.liveness_ms;
                if let Some(friend) = self.friends.iter_mut().find(|friend| friend.address == from) {
                    friend.deadline = deadline;
                } else if self.friends.len() >= self.capacity {
                    warn!(friend = from, capacity = self.capacity, "friend list full");
                } else {
                    self.friends.push(Friend { address: from, deadline });
                    info!(friend = from, name = %msg.text(), "friend appeared");
                    ctx.emit_local(MessageType::APPEAR, &[from]);
                }
                true
            }
            _ => ctx.change_mode(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{booted, console, radio};
    use crate::NodeState;
    use nightlight_core::{NodeIdentity, StateStack};

    /// FriendList under a state that records every local event
    #[derive(Debug)]
    enum Watched {
        Friends(FriendList),
        Recorder(Vec<Message>),
    }

    impl Behavior for Watched {
        fn name(&self) -> &'static str {
            match self {
                Watched::Friends(_) => "friends",
                Watched::Recorder(_) => "recorder",
            }
        }

        fn start(&mut self, ctx: &mut Context<'_, Self>) {
            if let Watched::Friends(list) = self {
                list.start(ctx);
            }
        }

        fn on_timeout(&mut self, ctx: &mut Context<'_, Self>) {
            if let Watched::Friends(list) = self {
                list.on_timeout(ctx);
            }
        }

        fn receive_message(&mut self, ctx: &mut Context<'_, Self>, msg: &Message) -> bool {
            match self {
                Watched::Friends(list) => list.receive_message(ctx, msg),
                Watched::Recorder(seen) => {
                    if msg.sender == Sender::Local {
                        seen.push(msg.clone());
                    }
                    false
                }
            }
        }
    }

    fn friends(engine: &StateStack<NodeState>, states: &crate::StandardStates) -> Vec<u8> {
        engine
            .state(states.friends)
            .and_then(NodeState::as_friends)
            .map(|list| list.friends().iter().map(|friend| friend.address).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_hello_adds_friend() {
        let (mut engine, states, _) = booted(&NightlightConfig::default());

        assert!(engine.dispatch(radio(7, MessageType::HELLO, b"lamp")));
        assert!(engine.dispatch(radio(7, MessageType::HELLO, b"lamp")));
        assert_eq!(friends(&engine, &states), vec![7]);
    }

    #[test]
    fn test_quiet_friend_forgotten() {
        let (mut engine, states, _) = booted(&NightlightConfig::default());
        engine.dispatch(radio(7, MessageType::HELLO, &[]));

        engine.set_now(5000);
        engine.run_timers();
        assert_eq!(friends(&engine, &states), vec![7]);

        engine.set_now(6000);
        engine.run_timers();
        assert!(friends(&engine, &states).is_empty());
        assert_eq!(engine.timeout(states.friends), Some(7000));
    }

    #[test]
    fn test_hello_refreshes_liveness() {
        let (mut engine, states, _) = booted(&NightlightConfig::default());
        engine.dispatch(radio(7, MessageType::HELLO, &[]));

        engine.set_now(4000);
        engine.dispatch(radio(7, MessageType::HELLO, &[]));
        engine.set_now(8000);
        engine.run_timers();

        assert_eq!(friends(&engine, &states), vec![7]);
    }

    #[test]
    fn test_full_list_still_claims_hello() {
        let mut config = NightlightConfig::default();
        config.friends.capacity = 1;
        let (mut engine, states, _) = booted(&config);

        engine.dispatch(radio(7, MessageType::HELLO, &[]));
        assert!(engine.dispatch(radio(8, MessageType::HELLO, &[])));
        assert_eq!(friends(&engine, &states), vec![7]);
    }

    #[test]
    fn test_console_hello_not_a_friend() {
        let (mut engine, states, _) = booted(&NightlightConfig::default());
        assert!(!engine.dispatch(console(MessageType::HELLO, "")));
        assert!(friends(&engine, &states).is_empty());
    }

    #[test]
    fn test_appear_and_disappear_raised_locally() {
        let mut engine = StateStack::new(NodeIdentity::new(0xF0F0_F0F0_00, 3), 4, 2);
        let list = engine.register(Watched::Friends(FriendList::new(4, 1000, 5000)));
        let recorder = engine.register(Watched::Recorder(Vec::new()));
        engine.push(list).unwrap();
        engine.push(recorder).unwrap();

        assert!(engine.dispatch(radio(7, MessageType::HELLO, b"lamp")));

        engine.set_now(5001);
        assert_eq!(engine.run_timers(), 1);

        let Some(Watched::Recorder(seen)) = engine.state(recorder) else {
            panic!("recorder missing");
        };
        assert_eq!(
            seen,
            &vec![
                Message::new(Sender::Local, MessageType::APPEAR, &[7]),
                Message::new(Sender::Local, MessageType::DISAPPEAR, &[7]),
            ]
        );
    }
}
