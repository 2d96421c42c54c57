//! Randomized checks over id allocation, report ordering and concurrent use.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use matchday::{EventsFile, GameEvent, RunFlag, StompProtocol, Updates, Verb};
use matchday_testing::{message_frame, EventBuilder};

fn logged_in(user: &str) -> StompProtocol {
    let protocol = StompProtocol::new(RunFlag::new(true));
    protocol.set_username(user);
    protocol
}

fn random_event(rng: &mut fastrand::Rng, index: usize) -> GameEvent {
    let mut builder = EventBuilder::new("a", "b")
        .name(&format!("event {index}"))
        .time(rng.i64(0..120))
        .description(&format!("line one\nline {index}"));
    for key in 0..rng.usize(0..4) {
        builder = builder.general(&format!("k{key}"), &rng.u32(..).to_string());
    }
    if rng.bool() {
        builder = builder.team_a("goals", &rng.u8(0..5).to_string());
    }
    builder.build()
}

#[test]
fn ids_are_monotonic_and_receipts_never_repeat() {
    let mut rng = fastrand::Rng::with_seed(7);
    for _ in 0..50 {
        let protocol = logged_in("meni");
        let mut last_subscription = None;
        let mut receipts = HashSet::new();
        let mut joined: Vec<String> = Vec::new();

        for _ in 0..rng.usize(1..40) {
            let game = format!("g{}", rng.u8(0..6));
            let frames = if rng.bool() || joined.is_empty() {
                joined.push(game.clone());
                let frames = protocol.process_input(&format!("join {game}")).unwrap();
                let id: u64 = frames[0].get("id").unwrap().parse().unwrap();
                if let Some(last) = last_subscription {
                    assert!(id > last, "subscription id {id} after {last}");
                }
                last_subscription = Some(id);
                frames
            } else {
                let game = joined.swap_remove(rng.usize(..joined.len()));
                protocol.process_input(&format!("exit {game}")).unwrap()
            };

            for frame in &frames {
                let receipt: u64 = frame.get("receipt").unwrap().parse().unwrap();
                assert!(receipts.insert(receipt), "receipt {receipt} reused");
            }
        }
    }
}

#[test]
fn report_emits_one_send_per_event_in_input_order() {
    let mut rng = fastrand::Rng::with_seed(11);
    for _ in 0..30 {
        let protocol = logged_in("meni");
        let events: Vec<GameEvent> = (0..rng.usize(0..25))
            .map(|i| random_event(&mut rng, i))
            .collect();
        let file = EventsFile {
            team_a: "a".into(),
            team_b: "b".into(),
            events: events.clone(),
        };

        let frames = protocol.report_events(file).unwrap();
        assert_eq!(frames.len(), events.len());
        for (frame, event) in frames.iter().zip(&events) {
            assert_eq!(frame.verb(), Some(Verb::Send));
            assert_eq!(
                GameEvent::parse_body(frame.body_text()).unwrap(),
                *event
            );
        }

        match protocol.render_summary("a_b", "meni") {
            Some(summary) => {
                let times: Vec<i64> = summary.events().iter().map(|e| e.time).collect();
                assert!(times.windows(2).all(|w| w[0] <= w[1]));
                assert_eq!(summary.events().len(), events.len());
            }
            None => assert!(events.is_empty()),
        }
    }
}

#[test]
fn echoes_of_reported_events_are_not_stored_twice() {
    let mut rng = fastrand::Rng::with_seed(3);
    let protocol = logged_in("meni");
    let events: Vec<GameEvent> = (0..10).map(|i| random_event(&mut rng, i)).collect();
    let file = EventsFile {
        team_a: "a".into(),
        team_b: "b".into(),
        events: events.clone(),
    };
    protocol.report_events(file).unwrap();

    for event in &events {
        protocol.process_frame(&message_frame("/a_b", "meni", event));
    }
    let summary = protocol.render_summary("a_b", "meni").unwrap();
    assert_eq!(summary.events().len(), events.len());
}

#[test]
fn malformed_bodies_are_counted_and_dropped() {
    let protocol = logged_in("meni");
    let raw = "MESSAGE\ndestination:/a_b\nuser:bob\n\nnot an event\0";
    for _ in 0..4 {
        protocol.process_frame(raw);
    }
    assert_eq!(protocol.dropped_messages(), 4);
    assert!(protocol.render_summary("a_b", "bob").is_none());
}

#[test]
fn concurrent_ingest_and_commands_stay_consistent() {
    let protocol = Arc::new(logged_in("meni"));
    let reporters = ["bob", "carol", "dan"];

    let readers: Vec<_> = reporters
        .iter()
        .map(|user| {
            let protocol = Arc::clone(&protocol);
            let user = user.to_string();
            thread::spawn(move || {
                let mut rng = fastrand::Rng::with_seed(user.len() as u64);
                for i in 0..200 {
                    let event = random_event(&mut rng, i);
                    protocol.process_frame(&message_frame("/a_b", &user, &event));
                }
            })
        })
        .collect();

    let commands = {
        let protocol = Arc::clone(&protocol);
        thread::spawn(move || {
            let mut receipts = HashSet::new();
            let mut seen = 0;
            for i in 0..200 {
                let frames = protocol.process_input(&format!("join g{}", i % 7)).unwrap();
                let receipt: u64 = frames[0].get("receipt").unwrap().parse().unwrap();
                assert!(receipts.insert(receipt));

                // summaries are rendered while ingest is in flight
                let Some(summary) = protocol.render_summary("a_b", "bob") else {
                    continue;
                };
                let events = summary.events();
                assert!(events.windows(2).all(|w| w[0].time <= w[1].time));
                assert!(events.len() >= seen, "{} events after {seen}", events.len());
                seen = events.len();

                let folded: [(&Updates, fn(&GameEvent) -> &Updates); 3] = [
                    (summary.general_stats(), |e| &e.general_updates),
                    (summary.team_a_stats(), |e| &e.team_a_updates),
                    (summary.team_b_stats(), |e| &e.team_b_updates),
                ];
                // every stat is the latest value for its key within this snapshot
                for (stats, updates) in folded {
                    for (key, value) in stats {
                        let latest = events.iter().rev().find_map(|e| updates(e).get(key));
                        assert_eq!(latest, Some(value), "stat {key} in a torn snapshot");
                    }
                }
            }
        })
    };

    for handle in readers {
        handle.join().unwrap();
    }
    commands.join().unwrap();

    for user in reporters {
        let summary = protocol.render_summary("a_b", user).unwrap();
        assert_eq!(summary.events().len(), 200);
    }
    assert_eq!(protocol.dropped_messages(), 0);
    assert_eq!(protocol.pending_receipts(), 200);
}
