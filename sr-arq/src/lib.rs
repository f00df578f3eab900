//! `sr-arq` — Selective-Repeat Automatic Repeat reQuest.
//!
//! Reliable, in-order, exactly-once delivery of fixed-size messages from
//! entity A to entity B over a channel that may lose or corrupt packets.
//!
//! # Architecture
//!
//! ```text
//!  application ──▶ Backlog ──▶ SrSender ──data──▶ channel ──▶ SrReceiver ──▶ application
//!                                ▲    ▲                           │
//!                                │    └────── individual ACKs ────┘
//!                              timer
//! ```
//!
//! The protocol core is a pair of synchronous state machines that talk to
//! their environment only through the [`host::Host`] trait.  Two
//! environments are provided: a seeded discrete-event emulator and a tokio
//! UDP transport.
//!
//! Each module has a single responsibility:
//! - [`packet`]     — packet layout, additive checksum, wire codec
//! - [`seq_space`]  — modular sequence-number arithmetic
//! - [`config`]     — validated protocol parameters
//! - [`state`]      — per-slot lifecycle enums
//! - [`host`]       — environment trait and the recording [`host::Outbox`]
//! - [`timer`]      — the sender's single logical retransmission timer
//! - [`backlog`]    — unbounded FIFO of not-yet-admitted messages
//! - [`sender`]     — SR send-side window
//! - [`receiver`]   — SR receive-side window
//! - [`simulator`]  — lossy/corrupting discrete-event network emulator
//! - [`socket`]     — async UDP socket abstraction
//! - [`transfer`]   — SR endpoints running over a [`socket::Socket`]

pub mod backlog;
pub mod config;
pub mod host;
pub mod packet;
pub mod receiver;
pub mod sender;
pub mod seq_space;
pub mod simulator;
pub mod socket;
pub mod state;
pub mod timer;
pub mod transfer;

pub use config::{ArqConfig, ConfigError};
pub use host::{Entity, Host};
pub use packet::{Message, Packet};
pub use receiver::SrReceiver;
pub use sender::SrSender;
