//! Packet and message definitions, the additive checksum, and the wire codec.
//!
//! Every unit exchanged between the two entities is a [`Packet`].  This module
//! is responsible for:
//! - Defining the fixed-size packet layout (three integers + 20-byte payload).
//! - Computing and verifying the additive checksum that is the protocol's only
//!   corruption detector.
//! - Serialising a [`Packet`] into a byte buffer for the UDP transport and
//!   parsing it back.
//!
//! No I/O happens here.
//!
//! # Wire format
//!
//! All integers are **big-endian** two's-complement `i32`.
//!
//! ```text
//!  0               1               2               3
//!  0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        Sequence Number                        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |              Acknowledgment Number (-1 = not in use)          |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           Checksum                            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                     Payload (20 bytes) ...                    |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Total size: [`PACKET_LEN`] = 32 bytes.

use thiserror::Error;

/// Number of payload bytes carried by every packet and message.
pub const PAYLOAD_LEN: usize = 20;

/// Sentinel for header fields that carry no meaning (acknum on data packets,
/// seqnum on acknowledgements).
pub const NOTINUSE: i32 = -1;

/// Byte length of an encoded packet on the wire.
pub const PACKET_LEN: usize = 32;

/// Filler byte used for the payload of pure acknowledgements.
const ACK_FILL: u8 = b'0';

// Byte offsets of each field within the serialised packet.
const OFF_SEQ: usize = 0;
const OFF_ACK: usize = 4;
const OFF_CHECKSUM: usize = 8;
const OFF_PAYLOAD: usize = 12;

/// Fixed-size application data unit.
pub type Payload = [u8; PAYLOAD_LEN];

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// One application message handed down to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    pub data: Payload,
}

impl Message {
    /// The `k`-th message of a generated stream: twenty copies of the letter
    /// `'a' + k % 26`.
    pub fn letter(k: usize) -> Self {
        Self {
            data: [b'a' + (k % 26) as u8; PAYLOAD_LEN],
        }
    }
}

// ---------------------------------------------------------------------------
// Packet
// ---------------------------------------------------------------------------

/// A complete protocol packet.
///
/// The fields are public so that a channel emulator can damage them in
/// transit; protocol code only ever builds packets through [`Packet::data`]
/// and [`Packet::ack`], which fill in the checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    pub seqnum: i32,
    pub acknum: i32,
    pub checksum: i32,
    pub payload: Payload,
}

impl Packet {
    /// Build a data packet carrying `payload` under sequence number `seqnum`.
    pub fn data(seqnum: i32, payload: Payload) -> Self {
        let mut packet = Self {
            seqnum,
            acknum: NOTINUSE,
            checksum: 0,
            payload,
        };
        packet.checksum = compute_checksum(&packet);
        packet
    }

    /// Build an individual acknowledgement for sequence number `acknum`.
    pub fn ack(acknum: i32) -> Self {
        let mut packet = Self {
            seqnum: NOTINUSE,
            acknum,
            checksum: 0,
            payload: [ACK_FILL; PAYLOAD_LEN],
        };
        packet.checksum = compute_checksum(&packet);
        packet
    }

    /// `true` when the stored checksum disagrees with the recomputed one.
    pub fn is_corrupted(&self) -> bool {
        self.checksum != compute_checksum(self)
    }

    /// Serialise this packet into its fixed-size wire representation.
    ///
    /// The stored checksum is written as-is; it is never recomputed here.
    pub fn encode(&self) -> [u8; PACKET_LEN] {
        let mut buf = [0u8; PACKET_LEN];
        buf[OFF_SEQ..OFF_SEQ + 4].copy_from_slice(&self.seqnum.to_be_bytes());
        buf[OFF_ACK..OFF_ACK + 4].copy_from_slice(&self.acknum.to_be_bytes());
        buf[OFF_CHECKSUM..OFF_CHECKSUM + 4].copy_from_slice(&self.checksum.to_be_bytes());
        buf[OFF_PAYLOAD..].copy_from_slice(&self.payload);
        buf
    }

    /// Parse a [`Packet`] from a raw byte slice.
    ///
    /// Returns [`Err`] if `buf` is not exactly [`PACKET_LEN`] bytes long.  The
    /// checksum is **not** verified: a damaged packet decodes fine and is
    /// rejected later by [`Packet::is_corrupted`], exactly like one damaged by
    /// the emulator.
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() < PACKET_LEN {
            return Err(PacketError::BufferTooShort(buf.len()));
        }
        if buf.len() != PACKET_LEN {
            return Err(PacketError::LengthMismatch(buf.len()));
        }

        let mut payload = [0u8; PAYLOAD_LEN];
        payload.copy_from_slice(&buf[OFF_PAYLOAD..]);

        Ok(Self {
            seqnum: read_i32(buf, OFF_SEQ),
            acknum: read_i32(buf, OFF_ACK),
            checksum: read_i32(buf, OFF_CHECKSUM),
            payload,
        })
    }
}

/// Errors that can arise when parsing a raw datagram.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    #[error("buffer of {0} bytes is too short to contain a packet")]
    BufferTooShort(usize),
    #[error("datagram of {0} bytes does not match the fixed packet length")]
    LengthMismatch(usize),
}

/// Additive checksum: `seqnum + acknum + Σ payload bytes`.
///
/// The checksum field itself is excluded from the sum.  Arithmetic wraps so
/// that damaged header values cannot overflow.
pub fn compute_checksum(packet: &Packet) -> i32 {
    packet
        .payload
        .iter()
        .fold(packet.seqnum.wrapping_add(packet.acknum), |sum, &b| {
            sum.wrapping_add(i32::from(b))
        })
}

fn read_i32(buf: &[u8], off: usize) -> i32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&buf[off..off + 4]);
    i32::from_be_bytes(word)
}
