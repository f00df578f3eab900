//! Selective-Repeat send-side state machine (entity A).
//!
//! [`SrSender`] maintains a sliding window of up to `window_size` outstanding
//! packets, each acknowledged **individually**.
//!
//! # Protocol contract
//!
//! - A new message is admitted only while fewer than `window_size` sequence
//!   numbers are outstanding; otherwise it waits in the [`Backlog`].
//! - An ACK for sequence number `s` marks only slot `s`.  The window base
//!   slides over every contiguous acknowledged slot.
//! - On timeout only the slots still awaiting acknowledgement are resent.
//! - One timer covers the whole window.  It runs exactly while at least one
//!   slot is awaiting acknowledgement.
//!
//! # Sequence-number layout
//!
//! ```text
//!    base                next            base + window_size
//!      │                   │                     │
//!  ────┼───────────────────┼─────────────────────┼────▶ (mod seq_space)
//!      │ <── outstanding ─▶│ <──── admissible ──▶│
//! ```
//!
//! All I/O goes through the [`Host`] passed to each handler.

use crate::backlog::Backlog;
use crate::config::ArqConfig;
use crate::host::{Entity, Host};
use crate::packet::{Message, Packet};
use crate::seq_space::SeqSpace;
use crate::state::SenderSlot;
use crate::timer::RetransmitTimer;

/// Counters kept by the sending entity.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SenderStats {
    /// First transmissions of data packets.
    pub packets_sent: u64,
    /// Retransmissions triggered by timeouts.
    pub packets_resent: u64,
    /// Messages that found the window full on arrival.
    pub window_full: u64,
    /// Uncorrupted ACKs received, duplicates included.
    pub acks_received: u64,
    /// ACKs that acknowledged a previously unacknowledged slot.
    pub new_acks: u64,
    pub corrupted_acks: u64,
}

/// Selective-Repeat send-side state for one entity.
#[derive(Debug)]
pub struct SrSender {
    config: ArqConfig,
    ring: SeqSpace,
    /// Oldest unacknowledged sequence number (left window edge).
    base: i32,
    /// Sequence number to assign to the next admitted message.
    next: i32,
    /// Arena indexed by `seq mod seq_space`.
    slots: Vec<SenderSlot>,
    backlog: Backlog,
    timer: RetransmitTimer,
    stats: SenderStats,
}

impl SrSender {
    pub fn new(config: ArqConfig) -> Self {
        Self {
            config,
            ring: config.ring(),
            base: 0,
            next: 0,
            slots: vec![SenderSlot::Empty; config.seq_space()],
            backlog: Backlog::new(),
            timer: RetransmitTimer::new(Entity::A, config.rtt()),
            stats: SenderStats::default(),
        }
    }

    /// Reset to the initial state: empty window at sequence number 0, empty
    /// backlog, timer considered stopped, counters cleared.
    pub fn init(&mut self) {
        self.base = 0;
        self.next = 0;
        self.slots.fill(SenderSlot::Empty);
        self.backlog.clear();
        self.timer.reset();
        self.stats = SenderStats::default();
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn base(&self) -> i32 {
        self.base
    }

    pub fn next_seq(&self) -> i32 {
        self.next
    }

    /// Number of sequence numbers in `[base, next)`.
    pub fn in_flight(&self) -> usize {
        self.ring.offset(self.next, self.base)
    }

    /// Number of slots in the window still awaiting acknowledgement.
    pub fn unacked(&self) -> usize {
        self.window_seqs()
            .filter(|&seq| self.slots[self.ring.index(seq)].is_sent())
            .count()
    }

    /// `true` when another message could be admitted right now.
    pub fn can_admit(&self) -> bool {
        self.in_flight() < self.config.window_size()
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// `true` when every admitted message is acknowledged and nothing waits.
    pub fn is_idle(&self) -> bool {
        self.in_flight() == 0 && self.backlog.is_empty()
    }

    pub fn timer_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn stats(&self) -> SenderStats {
        self.stats
    }

    // -----------------------------------------------------------------------
    // Event handlers
    // -----------------------------------------------------------------------

    /// A message arrives from the application.
    ///
    /// It is admitted immediately if the window has room; otherwise it is
    /// queued and the window-full counter is bumped.
    pub fn output(&mut self, message: Message, host: &mut dyn Host) {
        self.backlog.push(message);
        if !self.can_admit() {
            self.stats.window_full += 1;
            log::debug!(
                "[A] window full ({} outstanding), {} message(s) queued",
                self.in_flight(),
                self.backlog.len()
            );
            return;
        }
        self.pump(host);
    }

    /// A packet (always an ACK in this simplex protocol) arrives from the
    /// channel.
    pub fn input(&mut self, packet: &Packet, host: &mut dyn Host) {
        if packet.is_corrupted() {
            self.stats.corrupted_acks += 1;
            log::debug!("[A] corrupted ACK received, ignored");
            return;
        }
        self.stats.acks_received += 1;

        let seq = packet.acknum;
        if !self.ring.contains(seq) || !self.ring.in_window(seq, self.base, self.in_flight()) {
            log::debug!("[A] ACK {seq} outside window [{}, {}), ignored", self.base, self.next);
            return;
        }

        let idx = self.ring.index(seq);
        if !self.slots[idx].is_sent() {
            log::debug!("[A] duplicate ACK {seq}, ignored");
            return;
        }

        self.slots[idx] = SenderSlot::Acked;
        self.stats.new_acks += 1;
        log::debug!("[A] ACK {seq} is new");

        let old_base = self.base;
        while self.base != self.next && self.slots[self.ring.index(self.base)].is_acked() {
            self.slots[self.ring.index(self.base)] = SenderSlot::Empty;
            self.base = self.ring.add(self.base, 1);
        }
        if self.base == old_base {
            return;
        }

        log::debug!("[A] window slid {old_base} -> {}", self.base);
        if self.unacked() == 0 {
            self.timer.stop(host);
        } else {
            self.timer.restart(host);
        }
        self.pump(host);
    }

    /// The retransmission timer fired: resend every unacknowledged packet in
    /// the window and start a fresh period.
    pub fn timer_interrupt(&mut self, host: &mut dyn Host) {
        self.timer.expired();
        log::debug!("[A] timeout, resending unacknowledged packets");

        for k in 0..self.in_flight() {
            let seq = self.ring.add(self.base, k);
            if let SenderSlot::Sent(packet) = self.slots[self.ring.index(seq)] {
                log::debug!("[A] resending packet {seq}");
                host.send(Entity::A, packet);
                self.stats.packets_resent += 1;
            }
        }
        self.timer.restart(host);
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Admit backlog messages while the window has room.
    fn pump(&mut self, host: &mut dyn Host) {
        while self.can_admit() {
            let Some(message) = self.backlog.pop() else {
                break;
            };
            self.admit(message, host);
        }
    }

    fn admit(&mut self, message: Message, host: &mut dyn Host) {
        let packet = Packet::data(self.next, message.data);
        self.slots[self.ring.index(self.next)] = SenderSlot::Sent(packet);

        log::debug!("[A] sending packet {}", self.next);
        host.send(Entity::A, packet);
        self.stats.packets_sent += 1;

        if self.base == self.next {
            self.timer.restart(host);
        }
        self.next = self.ring.add(self.next, 1);
    }

    /// Sequence numbers in `[base, next)`, oldest first.
    fn window_seqs(&self) -> impl Iterator<Item = i32> + '_ {
        (0..self.in_flight()).map(move |k| self.ring.add(self.base, k))
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
