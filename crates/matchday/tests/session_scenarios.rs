//! End-to-end command and frame scenarios against one protocol instance.

use std::fs;

use matchday::{
    EventsFile, Ingest, PendingAction, ProtocolConfig, ProtocolError, Reception, RunFlag,
    StompProtocol, Verb,
};
use matchday_testing::{events_file_json, message_frame, EventBuilder};

fn logged_in(user: &str) -> StompProtocol {
    let protocol = StompProtocol::new(RunFlag::new(true));
    protocol
        .process_input(&format!("login 127.0.0.1:7777 {user} secret"))
        .unwrap();
    protocol
}

#[test]
fn join_join_exit_assigns_and_reuses_subscription_ids() {
    let protocol = logged_in("meni");

    let first = protocol.process_input("join chelsea_arsenal").unwrap();
    assert_eq!(first[0].verb(), Some(Verb::Subscribe));
    assert_eq!(first[0].get("id"), Some("0"));

    let second = protocol.process_input("join liverpool_city").unwrap();
    assert_eq!(second[0].get("id"), Some("1"));

    let exit = protocol.process_input("exit chelsea_arsenal").unwrap();
    assert_eq!(exit.len(), 1);
    assert_eq!(exit[0].verb(), Some(Verb::Unsubscribe));
    assert_eq!(exit[0].get("id"), Some("0"));

    // receipts are distinct across all three frames
    let receipts: Vec<_> = [&first[0], &second[0], &exit[0]]
        .iter()
        .map(|f| f.get("receipt").unwrap().to_string())
        .collect();
    assert_eq!(receipts, ["0", "1", "2"]);
}

#[test]
fn report_sends_in_file_order_and_summary_sorts_by_time() {
    let dir = tempfile::tempdir().expect("tempdir");
    let events_path = dir.path().join("events.json");
    let summary_path = dir.path().join("summary.txt");

    let late = EventBuilder::new("chelsea", "arsenal")
        .name("second half")
        .time(90)
        .general("active", "false")
        .description("Full time.")
        .build();
    let early = EventBuilder::new("chelsea", "arsenal")
        .name("first half")
        .time(45)
        .general("active", "true")
        .team_a("goals", "1")
        .description("Half time.")
        .build();
    fs::write(&events_path, events_file_json(&[late, early])).unwrap();

    let protocol = logged_in("meni");
    let frames = protocol
        .process_input(&format!("report {}", events_path.display()))
        .unwrap();

    assert_eq!(frames.len(), 2);
    assert!(frames.iter().all(|f| f.verb() == Some(Verb::Send)));
    assert!(frames
        .iter()
        .all(|f| f.get("destination") == Some("/chelsea_arsenal")));
    assert!(frames[0].body_text().contains("time: 90"));
    assert!(frames[1].body_text().contains("time: 45"));

    let written = protocol
        .process_input(&format!(
            "summary chelsea_arsenal meni {}",
            summary_path.display()
        ))
        .unwrap();
    assert!(written.is_empty());

    let summary = fs::read_to_string(&summary_path).unwrap();
    let first = summary.find("45 - first half:").unwrap();
    let second = summary.find("90 - second half:").unwrap();
    assert!(first < second);
    // general stats fold in time order, so the 90' value wins
    assert!(summary.contains("General stats:\nactive: false\n"));
    assert!(summary.starts_with("chelsea vs arsenal\nGame stats:\n"));
    assert!(summary.contains("chelsea stats:\ngoals: 1\narsenal stats:\n"));
}

#[test]
fn own_messages_never_touch_the_store() {
    let protocol = logged_in("meni");
    let event = EventBuilder::new("a", "b").time(10).build();
    let raw = message_frame("/a_b", "meni", &event);

    for _ in 0..3 {
        let reception = protocol.process_frame(&raw);
        assert_eq!(
            reception,
            Reception::Message {
                game: "a_b".into(),
                user: "meni".into(),
                outcome: Ingest::OwnEcho,
            }
        );
    }
    assert!(protocol.render_summary("a_b", "meni").is_none());
}

#[test]
fn messages_from_others_are_stored_under_their_user() {
    let protocol = logged_in("meni");
    let event = EventBuilder::new("a", "b")
        .name("kickoff")
        .time(0)
        .team_b("possession", "49%")
        .description("Off we go")
        .build();

    let reception = protocol.process_frame(&message_frame("/topic/a_b", "bob", &event));
    assert!(matches!(
        reception,
        Reception::Message {
            outcome: Ingest::Stored,
            ..
        }
    ));

    let summary = protocol.render_summary("a_b", "bob").unwrap();
    assert_eq!(summary.events(), [event]);
    assert_eq!(protocol.reporters("a_b"), ["bob"]);
    assert_eq!(summary.team_b_stats()["possession"], "49%");
}

#[test]
fn summary_for_unknown_game_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("summary.txt");
    let protocol = logged_in("meni");

    protocol
        .process_input(&format!("summary nowhere meni {}", path.display()))
        .unwrap();
    assert!(!path.exists());
}

#[test]
fn summary_write_failure_propagates() {
    let dir = tempfile::tempdir().expect("tempdir");
    let protocol = logged_in("bob");
    protocol.process_frame(&message_frame(
        "/a_b",
        "meni",
        &EventBuilder::new("a", "b").build(),
    ));

    let target = dir.path().join("missing-dir").join("summary.txt");
    let err = protocol
        .process_input(&format!("summary a_b meni {}", target.display()))
        .unwrap_err();
    assert!(matches!(err, ProtocolError::SummaryWrite { .. }));
}

#[test]
fn error_frame_ends_the_session() {
    let protocol = logged_in("meni");
    let reception = protocol.process_frame("ERROR\nmessage:bad request\n\ndetails\0");

    assert!(matches!(reception, Reception::Error { ref message, .. } if message == "bad request"));
    assert!(!protocol.running().is_running());
    assert!(matches!(
        protocol.process_input("join a_b"),
        Err(ProtocolError::SessionClosed)
    ));
    assert!(matches!(
        protocol.process_input("logout"),
        Err(ProtocolError::SessionClosed)
    ));
    assert_eq!(protocol.pending_receipts(), 0);
}

#[test]
fn logout_then_receipt_stops_and_unknown_receipts_are_ignored() {
    let protocol = logged_in("meni");
    protocol.process_input("join a_b").unwrap();
    let logout = protocol.process_input("logout").unwrap();
    let receipt = logout[0].get("receipt").unwrap().to_string();

    assert_eq!(
        protocol.process_frame("RECEIPT\nreceipt-id:77\n\n"),
        Reception::Receipt {
            id: 77,
            action: None
        }
    );
    assert!(protocol.running().is_running());

    protocol.process_frame(&format!("RECEIPT\nreceipt-id:{receipt}\n\n"));
    assert!(!protocol.running().is_running());
    // the join receipt is still outstanding
    assert_eq!(protocol.pending_receipts(), 1);

    assert_eq!(
        protocol.process_frame("RECEIPT\nreceipt-id:0\n\n"),
        Reception::Receipt {
            id: 0,
            action: Some(PendingAction::Joined("a_b".into()))
        }
    );
    assert_eq!(protocol.pending_receipts(), 0);
}

#[test]
fn report_with_missing_file_is_an_error_without_frames() {
    let protocol = logged_in("meni");
    let err = protocol
        .process_input("report /no/such/events.json")
        .unwrap_err();
    assert!(matches!(err, ProtocolError::EventsFile(_)));
}

#[test]
fn configured_prefix_and_version_reach_every_frame() {
    let config = ProtocolConfig::default()
        .with_accept_version("1.1")
        .with_host("broker.local")
        .with_destination_prefix("/topic/");
    let protocol = StompProtocol::with_config(config, RunFlag::new(true));
    protocol.set_username("meni");

    let connect = protocol.connect_frame("meni", "films");
    assert_eq!(connect.get("accept-version"), Some("1.1"));
    assert_eq!(connect.get("host"), Some("broker.local"));

    let join = protocol.process_input("join germany_japan").unwrap();
    assert_eq!(join[0].get("destination"), Some("/topic/germany_japan"));

    let frames = protocol
        .report_events(EventsFile {
            team_a: "germany".into(),
            team_b: "japan".into(),
            events: vec![EventBuilder::new("germany", "japan").time(3).build()],
        })
        .unwrap();
    assert_eq!(frames[0].get("destination"), Some("/topic/germany_japan"));

    let other = EventBuilder::new("germany", "japan").time(7).build();
    protocol.process_frame(&message_frame("/topic/germany_japan", "bob", &other));
    assert_eq!(protocol.reporters("germany_japan"), ["bob", "meni"]);
    assert!(protocol.reporters("spain_italy").is_empty());
}
