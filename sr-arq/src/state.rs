//! Per-slot lifecycle types for the two windows.
//!
//! Both windows keep an arena of `seq_space` slots addressed by
//! `seq mod seq_space`.  Each slot's lifecycle is a tagged enum so that
//! impossible combinations (acknowledged but never sent, buffered without a
//! payload) cannot be expressed.
//!
//! ```text
//!  sender:    Empty ──admit──▶ Sent ──ACK──▶ Acked ──slide──▶ Empty
//!  receiver:  NotReceived ──arrival──▶ Buffered ──deliver──▶ NotReceived
//! ```

use crate::packet::{Packet, Payload};

/// One send-window slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SenderSlot {
    /// Free for a new sequence number.
    #[default]
    Empty,
    /// Transmitted and awaiting acknowledgement.  Keeps the exact packet for
    /// retransmission; its checksum is never recomputed.
    Sent(Packet),
    /// Acknowledged, waiting for the window base to slide past it.
    Acked,
}

impl SenderSlot {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent(_))
    }

    pub fn is_acked(&self) -> bool {
        matches!(self, Self::Acked)
    }
}

/// One receive-window slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReceiverSlot {
    #[default]
    NotReceived,
    /// Arrived intact, waiting for every earlier sequence number.
    Buffered(Payload),
}

impl ReceiverSlot {
    pub fn is_buffered(&self) -> bool {
        matches!(self, Self::Buffered(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_free_slots() {
        assert_eq!(SenderSlot::default(), SenderSlot::Empty);
        assert_eq!(ReceiverSlot::default(), ReceiverSlot::NotReceived);
    }

    #[test]
    fn predicates() {
        let sent = SenderSlot::Sent(Packet::ack(0));
        assert!(sent.is_sent());
        assert!(!sent.is_acked());
        assert!(SenderSlot::Acked.is_acked());
        assert!(ReceiverSlot::Buffered([0u8; 20]).is_buffered());
        assert!(!ReceiverSlot::NotReceived.is_buffered());
    }
}
