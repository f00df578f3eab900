//! Selective-Repeat receive-side state machine (entity B).
//!
//! [`SrReceiver`] accepts any intact packet whose sequence number falls in
//! `[expected, expected + window_size)`, buffers it, and delivers the longest
//! contiguous run starting at `expected`.
//!
//! Every intact in-window packet is acknowledged **individually** with its own
//! sequence number, so the sender retransmits only what is truly missing.
//! Packets from the arc just behind the window were already delivered; their
//! ACK may have been lost, so they are re-acknowledged without being buffered
//! again.  Anything further ahead is discarded unacknowledged and left to the
//! sender's timeout.

use crate::config::ArqConfig;
use crate::host::{Entity, Host};
use crate::packet::Packet;
use crate::seq_space::SeqSpace;
use crate::state::ReceiverSlot;

/// Counters kept by the receiving entity.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverStats {
    /// Uncorrupted packets received, whatever their fate.
    pub packets_received: u64,
    pub packets_delivered: u64,
    /// Packets already buffered or already delivered.
    pub duplicates: u64,
    /// Packets too far ahead of the window to accept.
    pub out_of_window: u64,
    pub corrupted: u64,
    pub acks_sent: u64,
}

/// Selective-Repeat receive-side state for one entity.
#[derive(Debug)]
pub struct SrReceiver {
    config: ArqConfig,
    ring: SeqSpace,
    /// Receive base: the next sequence number to deliver.
    expected: i32,
    /// Arena indexed by `seq mod seq_space`.
    slots: Vec<ReceiverSlot>,
    stats: ReceiverStats,
}

impl SrReceiver {
    pub fn new(config: ArqConfig) -> Self {
        Self {
            config,
            ring: config.ring(),
            expected: 0,
            slots: vec![ReceiverSlot::NotReceived; config.seq_space()],
            stats: ReceiverStats::default(),
        }
    }

    pub fn init(&mut self) {
        self.expected = 0;
        self.slots.fill(ReceiverSlot::NotReceived);
        self.stats = ReceiverStats::default();
    }

    pub fn expected(&self) -> i32 {
        self.expected
    }

    /// Number of packets buffered but not yet delivered.
    pub fn buffered(&self) -> usize {
        self.slots.iter().filter(|s| s.is_buffered()).count()
    }

    pub fn stats(&self) -> ReceiverStats {
        self.stats
    }

    /// A packet arrives from the channel.
    pub fn input(&mut self, packet: &Packet, host: &mut dyn Host) {
        if packet.is_corrupted() {
            self.stats.corrupted += 1;
            log::debug!("[B] corrupted packet received, dropped");
            return;
        }
        self.stats.packets_received += 1;

        let seq = packet.seqnum;
        if !self.ring.contains(seq) {
            self.stats.out_of_window += 1;
            log::debug!("[B] packet with invalid sequence number {seq}, dropped");
            return;
        }

        let window = self.config.window_size();
        let offset = self.ring.offset(seq, self.expected);

        if offset < window {
            let idx = self.ring.index(seq);
            match self.slots[idx] {
                ReceiverSlot::NotReceived => {
                    log::debug!("[B] packet {seq} received, buffered");
                    self.slots[idx] = ReceiverSlot::Buffered(packet.payload);
                }
                ReceiverSlot::Buffered(_) => {
                    self.stats.duplicates += 1;
                    log::debug!("[B] packet {seq} already buffered");
                }
            }
            self.send_ack(seq, host);
            self.deliver_run(host);
        } else if self.ring.size() - offset <= window {
            self.stats.duplicates += 1;
            log::debug!("[B] packet {seq} already delivered, re-acknowledging");
            self.send_ack(seq, host);
        } else {
            self.stats.out_of_window += 1;
            log::debug!(
                "[B] packet {seq} ahead of window starting at {}, dropped",
                self.expected
            );
        }
    }

    fn send_ack(&mut self, seq: i32, host: &mut dyn Host) {
        host.send(Entity::B, Packet::ack(seq));
        self.stats.acks_sent += 1;
    }

    /// Deliver buffered payloads from `expected` onwards until the first gap.
    fn deliver_run(&mut self, host: &mut dyn Host) {
        while let ReceiverSlot::Buffered(payload) = self.slots[self.ring.index(self.expected)] {
            host.deliver(Entity::B, payload);
            self.stats.packets_delivered += 1;
            self.slots[self.ring.index(self.expected)] = ReceiverSlot::NotReceived;
            self.expected = self.ring.add(self.expected, 1);
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
