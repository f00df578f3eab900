//! The sender's single logical retransmission timer.
//!
//! The environment offers one timer per entity, so Selective Repeat's
//! per-packet timers are approximated by one deadline standing for the oldest
//! unacknowledged packet.  [`RetransmitTimer`] mirrors whether that timer is
//! armed so that:
//! - arming an already running timer first stops the previous instance, and
//! - stopping an idle timer is a no-op rather than a stray host call.
//!
//! The timer itself never decides *when* to run; [`crate::sender::SrSender`]
//! recomputes that from slot state after every slide and every timeout.

use crate::host::{Entity, Host};

/// Mirror of one entity's environment timer.
#[derive(Debug, Clone)]
pub struct RetransmitTimer {
    entity: Entity,
    /// Full timeout period handed to the host on every (re)start.
    period: f64,
    running: bool,
}

impl RetransmitTimer {
    pub fn new(entity: Entity, period: f64) -> Self {
        Self {
            entity,
            period,
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Arm the timer for a fresh full period, cancelling any running instance.
    pub fn restart(&mut self, host: &mut dyn Host) {
        if self.running {
            host.stop_timer(self.entity);
        }
        host.start_timer(self.entity, self.period);
        self.running = true;
    }

    /// Cancel the timer if it is armed.
    pub fn stop(&mut self, host: &mut dyn Host) {
        if self.running {
            host.stop_timer(self.entity);
            self.running = false;
        }
    }

    /// Record that the host's timer fired; it is no longer armed.
    pub fn expired(&mut self) {
        self.running = false;
    }

    /// Forget any armed state without telling the host (entity re-init).
    pub fn reset(&mut self) {
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Action, Outbox};

    #[test]
    fn restart_from_idle_only_starts() {
        let mut out = Outbox::new();
        let mut t = RetransmitTimer::new(Entity::A, 16.0);
        t.restart(&mut out);
        assert!(t.is_running());
        assert_eq!(out.actions(), &[Action::StartTimer(16.0)]);
    }

    #[test]
    fn restart_while_running_stops_first() {
        let mut out = Outbox::new();
        let mut t = RetransmitTimer::new(Entity::A, 16.0);
        t.restart(&mut out);
        out.drain();

        t.restart(&mut out);
        assert_eq!(out.actions(), &[Action::StopTimer, Action::StartTimer(16.0)]);
    }

    #[test]
    fn stop_when_idle_is_silent() {
        let mut out = Outbox::new();
        let mut t = RetransmitTimer::new(Entity::A, 16.0);
        t.stop(&mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn expired_timer_restarts_without_stop() {
        let mut out = Outbox::new();
        let mut t = RetransmitTimer::new(Entity::A, 8.0);
        t.restart(&mut out);
        t.expired();
        out.drain();

        t.restart(&mut out);
        assert_eq!(out.actions(), &[Action::StartTimer(8.0)]);
    }
}
