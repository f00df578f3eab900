//! Protocol parameters.
//!
//! [`ArqConfig`] carries the three constants both entities agree on: the
//! window capacity, the sequence ring size and the retransmission period.
//! Construction validates the Selective Repeat safety condition
//! `seq_space >= 2 * window_size`; with a smaller ring a retransmitted old
//! packet and a new in-window packet can carry the same sequence number.

use thiserror::Error;

use crate::seq_space::SeqSpace;

/// Window capacity used by [`ArqConfig::default`].
pub const DEFAULT_WINDOW_SIZE: usize = 6;
/// Sequence ring size used by [`ArqConfig::default`].
pub const DEFAULT_SEQ_SPACE: usize = 2 * DEFAULT_WINDOW_SIZE;
/// Retransmission period (emulator time units) used by [`ArqConfig::default`].
pub const DEFAULT_RTT: f64 = 16.0;

/// Validated protocol parameters shared by sender and receiver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArqConfig {
    window_size: usize,
    seq_space: usize,
    rtt: f64,
}

impl ArqConfig {
    /// Build a configuration, rejecting any that would make the protocol
    /// ambiguous or stall.
    pub fn new(window_size: usize, seq_space: usize, rtt: f64) -> Result<Self, ConfigError> {
        if window_size == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if seq_space > i32::MAX as usize {
            return Err(ConfigError::SeqSpaceTooLarge(seq_space));
        }
        if seq_space < window_size.saturating_mul(2) {
            return Err(ConfigError::SeqSpaceTooSmall {
                window_size,
                seq_space,
            });
        }
        if !rtt.is_finite() || rtt <= 0.0 {
            return Err(ConfigError::InvalidRtt(rtt));
        }
        Ok(Self {
            window_size,
            seq_space,
            rtt,
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn seq_space(&self) -> usize {
        self.seq_space
    }

    /// Retransmission timer period.
    pub fn rtt(&self) -> f64 {
        self.rtt
    }

    /// The sequence ring described by this configuration.
    pub fn ring(&self) -> SeqSpace {
        SeqSpace::new(self.seq_space)
    }
}

impl Default for ArqConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            seq_space: DEFAULT_SEQ_SPACE,
            rtt: DEFAULT_RTT,
        }
    }
}

/// Rejected protocol or emulator parameters.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("window size must be at least 1")]
    ZeroWindow,
    #[error("sequence space {seq_space} is smaller than twice the window size {window_size}")]
    SeqSpaceTooSmall { window_size: usize, seq_space: usize },
    #[error("sequence space {0} does not fit in a 32-bit sequence number")]
    SeqSpaceTooLarge(usize),
    #[error("retransmission period must be positive and finite, got {0}")]
    InvalidRtt(f64),
    #[error("{name} probability must be within [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },
    #[error("mean inter-arrival time must be positive and finite, got {0}")]
    InvalidInterarrival(f64),
    #[error("time limit must be positive and finite, got {0}")]
    InvalidMaxTime(f64),
}
