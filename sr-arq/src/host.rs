//! The boundary between the protocol core and its environment.
//!
//! The state machines never touch a socket, a clock or the application
//! directly.  Each event handler receives a `&mut dyn Host` and calls back
//! into it to transmit a packet, arm or cancel the entity's timer, or hand a
//! payload up to the application.  The emulator in [`crate::simulator`]
//! implements [`Host`] directly; the UDP driver in [`crate::transfer`] uses an
//! [`Outbox`] and executes the recorded [`Action`]s after each handler
//! returns.

use std::fmt;

use crate::packet::{Packet, Payload};

/// The two protocol entities.  Data always flows from `A` to `B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    /// Sending side.
    A,
    /// Receiving side.
    B,
}

impl Entity {
    /// The entity at the other end of the channel.
    pub fn peer(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// Position of this entity in per-entity arrays.
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("A"),
            Self::B => f.write_str("B"),
        }
    }
}

/// Services the environment provides to a protocol entity.
pub trait Host {
    /// Hand `packet` to the channel, travelling away from `from`.
    fn send(&mut self, from: Entity, packet: Packet);

    /// Arm `entity`'s timer to fire after `increment` time units.
    fn start_timer(&mut self, entity: Entity, increment: f64);

    /// Cancel `entity`'s pending timer.
    fn stop_timer(&mut self, entity: Entity);

    /// Pass an in-order payload up to `entity`'s application.
    fn deliver(&mut self, entity: Entity, payload: Payload);
}

// ---------------------------------------------------------------------------
// Outbox
// ---------------------------------------------------------------------------

/// One side effect requested by a protocol entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Send(Packet),
    StartTimer(f64),
    StopTimer,
    Deliver(Payload),
}

/// A [`Host`] that records requested side effects in order.
///
/// An `Outbox` belongs to a single endpoint, so the entity argument of each
/// [`Host`] call is dropped.
#[derive(Debug, Default)]
pub struct Outbox {
    actions: Vec<Action>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Actions recorded since the last drain, oldest first.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Remove and return all recorded actions.
    pub fn drain(&mut self) -> std::vec::Drain<'_, Action> {
        self.actions.drain(..)
    }

    /// Packets sent since the last drain.
    pub fn sent(&self) -> Vec<Packet> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Action::Send(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    /// Payloads delivered since the last drain.
    pub fn delivered(&self) -> Vec<Payload> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Action::Deliver(p) => Some(*p),
                _ => None,
            })
            .collect()
    }
}

impl Host for Outbox {
    fn send(&mut self, _from: Entity, packet: Packet) {
        self.actions.push(Action::Send(packet));
    }

    fn start_timer(&mut self, _entity: Entity, increment: f64) {
        self.actions.push(Action::StartTimer(increment));
    }

    fn stop_timer(&mut self, _entity: Entity) {
        self.actions.push(Action::StopTimer);
    }

    fn deliver(&mut self, _entity: Entity, payload: Payload) {
        self.actions.push(Action::Deliver(payload));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Message;

    #[test]
    fn peer_is_symmetric() {
        assert_eq!(Entity::A.peer(), Entity::B);
        assert_eq!(Entity::B.peer().peer(), Entity::B);
    }

    #[test]
    fn outbox_records_in_order() {
        let mut out = Outbox::new();
        let pkt = Packet::ack(3);
        out.start_timer(Entity::A, 16.0);
        out.send(Entity::A, pkt);
        out.deliver(Entity::B, Message::letter(1).data);
        out.stop_timer(Entity::A);

        assert_eq!(
            out.actions(),
            &[
                Action::StartTimer(16.0),
                Action::Send(pkt),
                Action::Deliver(Message::letter(1).data),
                Action::StopTimer,
            ]
        );
        assert_eq!(out.sent(), vec![pkt]);
        assert_eq!(out.delivered(), vec![Message::letter(1).data]);
    }

    #[test]
    fn drain_empties_outbox() {
        let mut out = Outbox::new();
        out.stop_timer(Entity::A);
        assert_eq!(out.drain().count(), 1);
        assert!(out.is_empty());
    }
}
