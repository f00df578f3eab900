//! Selective-Repeat transfer over a real UDP socket.
//!
//! # Architecture
//!
//! ```text
//!   send_messages                               receive_messages
//!  ┌──────────────────────┐                    ┌──────────────────────┐
//!  │ SrSender  ──▶ Outbox │   data packets     │ SrReceiver ──▶ Outbox│
//!  │              │       │ ─────────────────▶ │               │      │
//!  │        Driver│       │                    │         Driver│      │
//!  │  (socket + deadline) │ ◀───────────────── │  (socket, payloads)  │
//!  └──────────────────────┘    individual ACKs └──────────────────────┘
//! ```
//!
//! The state machines stay synchronous.  Each handler writes its side effects
//! into an [`Outbox`]; a driver then performs them: packets go to the
//! socket, timer actions move a single `tokio` deadline, deliveries are
//! collected.  One task owns each endpoint and wakes on whichever comes first,
//! an inbound datagram or the deadline, so handlers never run concurrently.
//!
//! Timer increments are in protocol time units; `time_unit` converts them to
//! wall-clock time.

use std::future;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{sleep_until, timeout, Instant};

use crate::config::ArqConfig;
use crate::host::{Action, Outbox};
use crate::packet::{Message, Packet, Payload};
use crate::receiver::{ReceiverStats, SrReceiver};
use crate::sender::{SenderStats, SrSender};
use crate::socket::{Socket, SocketError};

/// Consecutive timeouts without the window base moving before the sender
/// gives up.
const MAX_RETRIES: u32 = 12;

/// How long the receiver waits for the first/next datagram before giving up.
const IDLE_LIMIT: Duration = Duration::from_secs(30);

/// Errors that end a transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error(transparent)]
    Socket(#[from] SocketError),
    #[error("no acknowledgement progress after {0} consecutive timeouts")]
    MaxRetriesExceeded(u32),
    #[error("no datagram received for {0:?}")]
    Idle(Duration),
    #[error("timer increment {0} does not fit on the wall clock")]
    TimerOverflow(f64),
}

/// Result of a completed receive.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Payloads in delivery order.
    pub payloads: Vec<Payload>,
    pub stats: ReceiverStats,
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Executes recorded [`Action`]s against the socket and the wall clock.
struct Driver<'a> {
    socket: &'a Socket,
    time_unit: Duration,
    deadline: Option<Instant>,
    delivered: Vec<Payload>,
}

/// What woke the endpoint task.
enum Wake {
    Datagram(Result<(Packet, SocketAddr), SocketError>),
    Timeout,
}

impl<'a> Driver<'a> {
    fn new(socket: &'a Socket, time_unit: Duration) -> Self {
        Self {
            socket,
            time_unit,
            deadline: None,
            delivered: Vec::new(),
        }
    }

    async fn execute(
        &mut self,
        outbox: &mut Outbox,
        peer: SocketAddr,
    ) -> Result<(), TransferError> {
        let actions: Vec<Action> = outbox.drain().collect();
        for action in actions {
            match action {
                Action::Send(packet) => self.socket.send_to(&packet, peer).await?,
                Action::StartTimer(increment) => {
                    let deadline =
                        Duration::try_from_secs_f64(self.time_unit.as_secs_f64() * increment)
                            .ok()
                            .and_then(|d| Instant::now().checked_add(d))
                            .ok_or(TransferError::TimerOverflow(increment))?;
                    self.deadline = Some(deadline);
                }
                Action::StopTimer => self.deadline = None,
                Action::Deliver(payload) => self.delivered.push(payload),
            }
        }
        Ok(())
    }

    /// Wait for the next datagram or the timer deadline, whichever is first.
    async fn wait(&self) -> Wake {
        let timer = async {
            match self.deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => future::pending().await,
            }
        };
        tokio::select! {
            result = self.socket.recv_from() => Wake::Datagram(result),
            _ = timer => Wake::Timeout,
        }
    }
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// Send `messages` to `peer` and return once every one is acknowledged.
pub async fn send_messages(
    socket: &Socket,
    peer: SocketAddr,
    config: ArqConfig,
    messages: impl IntoIterator<Item = Message>,
    time_unit: Duration,
) -> Result<SenderStats, TransferError> {
    let mut sender = SrSender::new(config);
    let mut outbox = Outbox::new();
    let mut driver = Driver::new(socket, time_unit);

    for message in messages {
        sender.output(message, &mut outbox);
    }
    driver.execute(&mut outbox, peer).await?;

    let mut retries = 0u32;
    while !sender.is_idle() {
        let wake = driver.wait().await;
        match wake {
            Wake::Datagram(Ok((packet, _))) => {
                let base = sender.base();
                sender.input(&packet, &mut outbox);
                if sender.base() != base {
                    retries = 0;
                }
            }
            Wake::Datagram(Err(SocketError::Packet(e))) => {
                log::warn!("[A] undecodable datagram skipped: {e}");
            }
            Wake::Datagram(Err(e)) => return Err(e.into()),
            Wake::Timeout => {
                driver.deadline = None;
                retries += 1;
                if retries > MAX_RETRIES {
                    return Err(TransferError::MaxRetriesExceeded(MAX_RETRIES));
                }
                sender.timer_interrupt(&mut outbox);
            }
        }
        driver.execute(&mut outbox, peer).await?;
    }

    let stats = sender.stats();
    log::info!(
        "[A] transfer complete: {} sent, {} resent",
        stats.packets_sent,
        stats.packets_resent
    );
    Ok(stats)
}

/// Receive until `count` payloads have been delivered, then keep answering
/// retransmissions until the line has been quiet for `linger`.
///
/// The lingering phase lets re-ACKs reach a sender whose final ACKs were lost.
pub async fn receive_messages(
    socket: &Socket,
    config: ArqConfig,
    count: usize,
    linger: Duration,
) -> Result<Delivery, TransferError> {
    let mut receiver = SrReceiver::new(config);
    let mut outbox = Outbox::new();
    let mut driver = Driver::new(socket, Duration::ZERO);

    loop {
        let done = driver.delivered.len() >= count;
        let wait = if done { linger } else { IDLE_LIMIT };
        let result = match timeout(wait, socket.recv_from()).await {
            Ok(result) => result,
            Err(_) if done => break,
            Err(_) => return Err(TransferError::Idle(IDLE_LIMIT)),
        };
        match result {
            Ok((packet, from)) => {
                receiver.input(&packet, &mut outbox);
                driver.execute(&mut outbox, from).await?;
            }
            Err(SocketError::Packet(e)) => log::warn!("[B] undecodable datagram skipped: {e}"),
            Err(e) => return Err(e.into()),
        }
    }

    let stats = receiver.stats();
    log::info!(
        "[B] transfer complete: {} delivered, {} duplicates",
        stats.packets_delivered,
        stats.duplicates
    );
    Ok(Delivery {
        payloads: driver.delivered,
        stats,
    })
}
