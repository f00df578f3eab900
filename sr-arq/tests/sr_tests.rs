//! End-to-end properties of the Selective-Repeat core.
//!
//! The first group drives a sender and a receiver by hand through an
//! [`Outbox`] to pin down exact protocol behaviour.  The second group runs the
//! discrete-event emulator with fixed seeds over perfect and hostile channels.

use sr_arq::host::{Action, Outbox};
use sr_arq::packet::{Message, Packet, Payload};
use sr_arq::simulator::{Simulation, SimulatorConfig};
use sr_arq::{ArqConfig, ConfigError, SrReceiver, SrSender};

fn config(window: usize, seq_space: usize) -> ArqConfig {
    ArqConfig::new(window, seq_space, 16.0).expect("valid config")
}

fn letters(n: usize) -> Vec<Payload> {
    (0..n).map(|k| Message::letter(k).data).collect()
}

fn seqs(packets: &[Packet]) -> Vec<i32> {
    packets.iter().map(|p| p.seqnum).collect()
}

// ---------------------------------------------------------------------------
// Scripted scenarios
// ---------------------------------------------------------------------------

#[test]
fn timeout_retransmits_only_missing_packets() {
    let mut sender = SrSender::new(config(4, 10));
    let mut out = Outbox::new();
    for k in 0..4 {
        sender.output(Message::letter(k), &mut out);
    }
    assert_eq!(seqs(&out.sent()), vec![0, 1, 2, 3]);
    out.drain();

    sender.input(&Packet::ack(1), &mut out);
    sender.timer_interrupt(&mut out);

    assert_eq!(seqs(&out.sent()), vec![0, 2, 3]);
    assert!(sender.timer_running());
}

#[test]
fn window_base_wraps_without_aliasing() {
    let mut sender = SrSender::new(config(4, 10));
    let mut out = Outbox::new();

    // two full trips around the ring up to sequence number 8
    for k in 0..18 {
        sender.output(Message::letter(k), &mut out);
        let seq = out.sent().last().expect("packet sent").seqnum;
        sender.input(&Packet::ack(seq), &mut out);
    }
    assert_eq!(sender.base(), 8);
    out.drain();

    for k in 18..22 {
        sender.output(Message::letter(k), &mut out);
    }
    assert_eq!(seqs(&out.sent()), vec![8, 9, 0, 1]);
    for seq in [8, 9, 0, 1] {
        sender.input(&Packet::ack(seq), &mut out);
    }
    assert_eq!(sender.base(), 2);
    assert!(sender.is_idle());
    assert!(!sender.timer_running());

    // slot 2 was used twice before; a stale ACK for it must not count now
    out.drain();
    sender.input(&Packet::ack(2), &mut out);
    assert!(out.is_empty());
    assert_eq!(sender.base(), 2);
}

#[test]
fn reordered_arrivals_are_buffered_then_delivered() {
    let mut receiver = SrReceiver::new(config(4, 10));
    let mut out = Outbox::new();
    let data = |seq: i32| Packet::data(seq, Message::letter(seq as usize).data);

    receiver.input(&data(2), &mut out);
    assert_eq!(out.sent(), vec![Packet::ack(2)]);
    assert!(out.delivered().is_empty());
    out.drain();

    receiver.input(&data(0), &mut out);
    assert_eq!(out.sent(), vec![Packet::ack(0)]);
    assert_eq!(out.delivered(), letters(1));
    out.drain();

    receiver.input(&data(1), &mut out);
    assert_eq!(out.sent(), vec![Packet::ack(1)]);
    assert_eq!(out.delivered(), letters(3)[1..].to_vec());
    assert_eq!(receiver.expected(), 3);
}

#[test]
fn stale_duplicate_is_reacknowledged() {
    let mut receiver = SrReceiver::new(config(4, 10));
    let mut out = Outbox::new();
    for seq in 0..5 {
        receiver.input(&Packet::data(seq, Message::letter(seq as usize).data), &mut out);
    }
    assert_eq!(receiver.expected(), 5);
    let before = receiver.stats().packets_delivered;
    out.drain();

    receiver.input(&Packet::data(3, Message::letter(3).data), &mut out);
    assert_eq!(out.actions(), &[Action::Send(Packet::ack(3))]);
    assert_eq!(receiver.expected(), 5);
    assert_eq!(receiver.stats().packets_delivered, before);
}

#[test]
fn duplicate_arrivals_deliver_once() {
    let mut receiver = SrReceiver::new(config(4, 10));
    let mut out = Outbox::new();
    let pkt = Packet::data(0, Message::letter(0).data);
    for _ in 0..3 {
        receiver.input(&pkt, &mut out);
    }
    assert_eq!(out.delivered(), letters(1));
    assert_eq!(out.sent(), vec![Packet::ack(0); 3]);
}

#[test]
fn lost_ack_is_recovered_by_reack() {
    let cfg = config(4, 10);
    let mut sender = SrSender::new(cfg);
    let mut receiver = SrReceiver::new(cfg);
    let mut a = Outbox::new();
    let mut b = Outbox::new();

    sender.output(Message::letter(0), &mut a);
    let pkt = a.sent()[0];
    a.drain();

    // ACK from the first delivery is lost
    receiver.input(&pkt, &mut b);
    b.drain();

    sender.timer_interrupt(&mut a);
    let resent = a.sent()[0];
    receiver.input(&resent, &mut b);
    let ack = b.sent()[0];
    assert!(b.delivered().is_empty(), "payload must not be delivered twice");

    sender.input(&ack, &mut a);
    assert!(sender.is_idle());
}

#[test]
fn unsafe_sequence_space_is_rejected() {
    for (window, seq_space) in [(6, 7), (6, 10), (4, 7)] {
        assert!(matches!(
            ArqConfig::new(window, seq_space, 16.0),
            Err(ConfigError::SeqSpaceTooSmall { .. })
        ));
    }
}

// ---------------------------------------------------------------------------
// Emulated runs
// ---------------------------------------------------------------------------

#[test]
fn perfect_channel_delivers_in_order() {
    let report = Simulation::new(
        config(6, 12),
        SimulatorConfig {
            messages: 50,
            ..Default::default()
        },
    )
    .unwrap()
    .run();

    assert!(report.completed);
    assert_eq!(report.delivered, letters(50));
    assert_eq!(report.sender.packets_resent, 0);
    assert_eq!(report.receiver.duplicates, 0);
}

#[test]
fn hostile_channel_still_delivers_exactly_once_in_order() {
    for (window, seq_space) in [(6, 12), (4, 10), (1, 2)] {
        for seed in 1..=5 {
            let report = Simulation::new(
                config(window, seq_space),
                SimulatorConfig {
                    messages: 60,
                    loss_prob: 0.2,
                    corrupt_prob: 0.2,
                    seed,
                    ..Default::default()
                },
            )
            .unwrap()
            .run();

            assert!(report.completed, "window={window} seed={seed} did not finish");
            assert_eq!(
                report.delivered,
                letters(60),
                "window={window} seed={seed} delivered the wrong stream"
            );
            assert!(report.network.lost > 0);
            assert!(report.network.corrupted > 0);
        }
    }
}

#[test]
fn windows_stay_bounded_at_every_step() {
    let cfg = config(4, 10);
    let mut sim = Simulation::new(
        cfg,
        SimulatorConfig {
            messages: 80,
            loss_prob: 0.3,
            corrupt_prob: 0.1,
            mean_interarrival: 2.0,
            seed: 7,
            ..Default::default()
        },
    )
    .unwrap();

    while sim.step() {
        assert!(sim.sender().in_flight() <= cfg.window_size());
        assert!(sim.sender().unacked() <= cfg.window_size());
        assert!(sim.receiver().buffered() <= cfg.window_size());
        assert_eq!(sim.sender().timer_running(), sim.sender().unacked() > 0);
    }
    assert_eq!(sim.delivered(), letters(80).as_slice());
}

#[test]
fn bursty_application_fills_backlog_without_loss() {
    let report = Simulation::new(
        config(2, 4),
        SimulatorConfig {
            messages: 40,
            mean_interarrival: 0.5,
            seed: 3,
            ..Default::default()
        },
    )
    .unwrap()
    .run();

    assert!(report.sender.window_full > 0, "burst should overrun the window");
    assert_eq!(report.delivered, letters(40));
}
