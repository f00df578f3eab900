//! Discrete-event network emulator for exercising the protocol.
//!
//! The emulator plays every role outside the protocol core: the application
//! at A that produces messages, the unreliable channel in both directions,
//! the per-entity timers, and the application at B that consumes payloads.
//! Events are processed strictly one at a time in timestamp order.
//!
//! | Fault       | Description                                              |
//! |-------------|----------------------------------------------------------|
//! | Loss        | Drop a packet with probability `loss_prob`.              |
//! | Corruption  | Damage a surviving packet with probability `corrupt_prob`: |
//! |             | 3/4 overwrite `payload[0]`, 1/8 `seqnum`, 1/8 `acknum`.  |
//! | Delay       | Each packet takes 1–10 time units; a link never reorders. |
//!
//! Runs are reproducible: all randomness comes from a [`StdRng`] seeded with
//! [`SimulatorConfig::seed`].

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{ArqConfig, ConfigError};
use crate::host::{Entity, Host};
use crate::packet::{Message, Packet, Payload};
use crate::receiver::{ReceiverStats, SrReceiver};
use crate::sender::{SenderStats, SrSender};

/// Value written over a header field by the corruption fault.
const CORRUPT_FIELD: i32 = 999_999;
/// Byte written over `payload[0]` by the corruption fault.
const CORRUPT_BYTE: u8 = b'Z';

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Emulator parameters.
///
/// All probabilities are in the range `[0.0, 1.0]`.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Number of messages the application at A generates.
    pub messages: usize,
    /// Probability that any given packet is silently dropped.
    pub loss_prob: f64,
    /// Probability that a packet which survived loss is damaged.
    pub corrupt_prob: f64,
    /// Mean time between messages from A's application.
    pub mean_interarrival: f64,
    /// RNG seed.
    pub seed: u64,
    /// Simulation time after which the run is abandoned.
    pub max_time: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        // No faults by default: the channel is a reliable pipe.
        Self {
            messages: 20,
            loss_prob: 0.0,
            corrupt_prob: 0.0,
            mean_interarrival: 10.0,
            seed: 1,
            max_time: 1.0e7,
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("loss", self.loss_prob), ("corruption", self.corrupt_prob)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidProbability { name, value });
            }
        }
        if !self.mean_interarrival.is_finite() || self.mean_interarrival <= 0.0 {
            return Err(ConfigError::InvalidInterarrival(self.mean_interarrival));
        }
        if !self.max_time.is_finite() || self.max_time <= 0.0 {
            return Err(ConfigError::InvalidMaxTime(self.max_time));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum EventKind {
    FromApplication,
    FromNetwork(Packet),
    TimerInterrupt,
}

#[derive(Debug, Clone, Copy)]
struct Event {
    time: f64,
    /// Insertion counter; breaks ties so equal-time events keep FIFO order.
    order: u64,
    entity: Entity,
    kind: EventKind,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    // Reversed: `BinaryHeap` is a max-heap and the earliest event must pop first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.order.cmp(&self.order))
    }
}

// ---------------------------------------------------------------------------
// Network: the Host half of the emulator
// ---------------------------------------------------------------------------

/// Counters kept by the emulated channel.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NetworkStats {
    /// Packets handed to the channel by either entity.
    pub to_layer3: u64,
    pub lost: u64,
    pub corrupted: u64,
    /// Payloads passed up to B's application.
    pub to_layer5: u64,
}

#[derive(Debug)]
struct Network {
    rng: StdRng,
    loss_prob: f64,
    corrupt_prob: f64,
    now: f64,
    events: BinaryHeap<Event>,
    order: u64,
    /// Latest scheduled arrival per destination, keeps each link FIFO.
    last_arrival: [f64; 2],
    timer_armed: [bool; 2],
    delivered: Vec<Payload>,
    stats: NetworkStats,
}

impl Network {
    fn schedule(&mut self, time: f64, entity: Entity, kind: EventKind) {
        self.order += 1;
        self.events.push(Event {
            time,
            order: self.order,
            entity,
            kind,
        });
    }

    fn corrupt(&mut self, packet: &mut Packet) {
        let x: f64 = self.rng.random();
        if x < 0.75 {
            packet.payload[0] = CORRUPT_BYTE;
        } else if x < 0.875 {
            packet.seqnum = CORRUPT_FIELD;
        } else {
            packet.acknum = CORRUPT_FIELD;
        }
    }
}

impl Host for Network {
    fn send(&mut self, from: Entity, mut packet: Packet) {
        self.stats.to_layer3 += 1;

        if self.rng.random::<f64>() < self.loss_prob {
            self.stats.lost += 1;
            log::trace!("[emu] packet from {from} lost");
            return;
        }

        let to = from.peer();
        let start = self.now.max(self.last_arrival[to.index()]);
        let arrival = start + 1.0 + 9.0 * self.rng.random::<f64>();
        self.last_arrival[to.index()] = arrival;

        if self.rng.random::<f64>() < self.corrupt_prob {
            self.stats.corrupted += 1;
            self.corrupt(&mut packet);
            log::trace!("[emu] packet from {from} corrupted");
        }

        self.schedule(arrival, to, EventKind::FromNetwork(packet));
    }

    fn start_timer(&mut self, entity: Entity, increment: f64) {
        if self.timer_armed[entity.index()] {
            log::warn!("[emu] attempt to start {entity}'s timer that is already started");
            return;
        }
        self.timer_armed[entity.index()] = true;
        self.schedule(self.now + increment, entity, EventKind::TimerInterrupt);
    }

    fn stop_timer(&mut self, entity: Entity) {
        if !self.timer_armed[entity.index()] {
            log::warn!("[emu] unable to cancel {entity}'s timer. It wasn't running.");
            return;
        }
        self.timer_armed[entity.index()] = false;
        self.events
            .retain(|e| !(e.entity == entity && matches!(e.kind, EventKind::TimerInterrupt)));
    }

    fn deliver(&mut self, entity: Entity, payload: Payload) {
        self.stats.to_layer5 += 1;
        log::trace!("[emu] {entity} delivered {:?}", String::from_utf8_lossy(&payload));
        self.delivered.push(payload);
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Outcome of a finished simulation run.
#[derive(Debug, Clone)]
pub struct Report {
    pub generated: usize,
    pub sender: SenderStats,
    pub receiver: ReceiverStats,
    pub network: NetworkStats,
    /// Payloads delivered at B, in delivery order.
    pub delivered: Vec<Payload>,
    pub end_time: f64,
    /// `false` when the run hit `max_time` with events still pending.
    pub completed: bool,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "simulation ended at time {:.3}", self.end_time)?;
        writeln!(f, "messages generated at A:          {}", self.generated)?;
        writeln!(f, "messages that found window full:  {}", self.sender.window_full)?;
        writeln!(f, "new ACKs received at A:           {}", self.sender.new_acks)?;
        writeln!(f, "packets resent by A:              {}", self.sender.packets_resent)?;
        writeln!(f, "packets delivered at B:           {}", self.receiver.packets_delivered)?;
        writeln!(
            f,
            "packets through channel:          {} ({} lost, {} corrupted)",
            self.network.to_layer3, self.network.lost, self.network.corrupted
        )?;
        write!(f, "run {}", if self.completed { "completed" } else { "abandoned at time limit" })
    }
}

/// A sender, a receiver, and the emulated environment between them.
#[derive(Debug)]
pub struct Simulation {
    sender: SrSender,
    receiver: SrReceiver,
    net: Network,
    messages: usize,
    generated: usize,
    mean_interarrival: f64,
    max_time: f64,
}

impl Simulation {
    pub fn new(arq: ArqConfig, config: SimulatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut sim = Self {
            sender: SrSender::new(arq),
            receiver: SrReceiver::new(arq),
            net: Network {
                rng: StdRng::seed_from_u64(config.seed),
                loss_prob: config.loss_prob,
                corrupt_prob: config.corrupt_prob,
                now: 0.0,
                events: BinaryHeap::new(),
                order: 0,
                last_arrival: [0.0; 2],
                timer_armed: [false; 2],
                delivered: Vec::new(),
                stats: NetworkStats::default(),
            },
            messages: config.messages,
            generated: 0,
            mean_interarrival: config.mean_interarrival,
            max_time: config.max_time,
        };
        sim.sender.init();
        sim.receiver.init();
        if sim.messages > 0 {
            sim.schedule_next_message();
        }
        Ok(sim)
    }

    pub fn sender(&self) -> &SrSender {
        &self.sender
    }

    pub fn receiver(&self) -> &SrReceiver {
        &self.receiver
    }

    /// Payloads delivered at B so far.
    pub fn delivered(&self) -> &[Payload] {
        &self.net.delivered
    }

    /// Process the earliest pending event.
    ///
    /// Returns `false` once there is nothing left to do, either because the
    /// queue is empty or because the next event lies beyond `max_time`.
    pub fn step(&mut self) -> bool {
        let Some(event) = self.net.events.pop() else {
            return false;
        };
        if event.time > self.max_time {
            self.net.events.push(event);
            return false;
        }
        self.net.now = event.time;

        match (event.kind, event.entity) {
            (EventKind::FromApplication, _) => {
                let message = Message::letter(self.generated);
                self.generated += 1;
                log::debug!(
                    "[emu] t={:.3} message {} from layer 5",
                    self.net.now,
                    self.generated
                );
                if self.generated < self.messages {
                    self.schedule_next_message();
                }
                self.sender.output(message, &mut self.net);
            }
            (EventKind::FromNetwork(packet), Entity::A) => {
                self.sender.input(&packet, &mut self.net);
            }
            (EventKind::FromNetwork(packet), Entity::B) => {
                self.receiver.input(&packet, &mut self.net);
            }
            (EventKind::TimerInterrupt, entity) => {
                self.net.timer_armed[entity.index()] = false;
                log::debug!("[emu] t={:.3} {entity}'s timer fired", self.net.now);
                if entity == Entity::A {
                    self.sender.timer_interrupt(&mut self.net);
                }
            }
        }
        true
    }

    /// Run until the event queue drains or the time limit is reached.
    pub fn run(mut self) -> Report {
        while self.step() {}
        let completed = self.net.events.is_empty();
        if !completed {
            log::warn!("[emu] time limit {} reached with events pending", self.max_time);
        }
        Report {
            generated: self.generated,
            sender: self.sender.stats(),
            receiver: self.receiver.stats(),
            network: self.net.stats,
            delivered: self.net.delivered,
            end_time: self.net.now,
            completed,
        }
    }

    fn schedule_next_message(&mut self) {
        let gap = 2.0 * self.mean_interarrival * self.net.rng.random::<f64>();
        let at = self.net.now + gap;
        self.net.schedule(at, Entity::A, EventKind::FromApplication);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim(config: SimulatorConfig) -> Simulation {
        Simulation::new(ArqConfig::default(), config).unwrap()
    }

    #[test]
    fn perfect_channel_delivers_everything() {
        let report = sim(SimulatorConfig::default()).run();
        assert!(report.completed);
        assert_eq!(report.generated, 20);
        assert_eq!(report.delivered.len(), 20);
        assert_eq!(report.network.lost, 0);
        assert_eq!(report.sender.packets_resent, 0);
    }

    #[test]
    fn zero_messages_finishes_immediately() {
        let report = sim(SimulatorConfig {
            messages: 0,
            ..Default::default()
        })
        .run();
        assert!(report.completed);
        assert!(report.delivered.is_empty());
        assert_eq!(report.end_time, 0.0);
    }

    #[test]
    fn same_seed_same_run() {
        let config = SimulatorConfig {
            messages: 30,
            loss_prob: 0.2,
            corrupt_prob: 0.2,
            seed: 42,
            ..Default::default()
        };
        let a = sim(config.clone()).run();
        let b = sim(config).run();
        assert_eq!(a.end_time, b.end_time);
        assert_eq!(a.network, b.network);
        assert_eq!(a.sender, b.sender);
    }

    #[test]
    fn total_loss_hits_time_limit() {
        let report = sim(SimulatorConfig {
            messages: 1,
            loss_prob: 1.0,
            max_time: 500.0,
            ..Default::default()
        })
        .run();
        assert!(!report.completed);
        assert!(report.delivered.is_empty());
        assert!(report.sender.packets_resent > 0);
    }

    #[test]
    fn invalid_probabilities_are_rejected() {
        let err = Simulation::new(
            ArqConfig::default(),
            SimulatorConfig {
                loss_prob: 1.5,
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProbability { name: "loss", .. }));

        let err = Simulation::new(
            ArqConfig::default(),
            SimulatorConfig {
                mean_interarrival: 0.0,
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInterarrival(_)));
    }

    #[test]
    fn unbounded_time_limit_is_rejected() {
        for max_time in [f64::NAN, f64::INFINITY, 0.0, -5.0] {
            let err = Simulation::new(
                ArqConfig::default(),
                SimulatorConfig {
                    loss_prob: 1.0,
                    max_time,
                    ..Default::default()
                },
            )
            .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidMaxTime(_)), "max_time={max_time}");
        }
    }

    #[test]
    fn events_pop_in_time_then_insertion_order() {
        let mut heap = BinaryHeap::new();
        let ev = |time, order| Event {
            time,
            order,
            entity: Entity::A,
            kind: EventKind::TimerInterrupt,
        };
        heap.push(ev(5.0, 1));
        heap.push(ev(1.0, 3));
        heap.push(ev(1.0, 2));
        let popped: Vec<_> = std::iter::from_fn(|| heap.pop()).map(|e| (e.time, e.order)).collect();
        assert_eq!(popped, vec![(1.0, 2), (1.0, 3), (5.0, 1)]);
    }
}
