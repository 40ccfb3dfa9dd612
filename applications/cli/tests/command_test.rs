//! Driving a bridge with parsed commands

use monovox_bridge::Bridge;
use monovox_cli::{Clip, Command, Outcome};
use monovox_core::mock::{MockBackend, MockOptions};
use monovox_core::TransportState;

fn clip() -> Clip {
    Clip {
        pcm: vec![0; 8_000 * 2],
        sample_rate: 8_000,
        channels: 1,
    }
}

fn run(bridge: &Bridge<MockBackend>, clip: &Clip, line: &str) -> Outcome {
    line.parse::<Command>().unwrap().apply(bridge, clip, true)
}

#[test]
fn command_sequence_drives_transport() {
    let bridge = Bridge::new(MockBackend::new());
    let clip = clip();

    assert_eq!(run(&bridge, &clip, "play"), Outcome::Continue(None));
    assert_eq!(bridge.state(), TransportState::Playing);

    run(&bridge, &clip, "pause");
    assert_eq!(bridge.state(), TransportState::Paused);

    run(&bridge, &clip, "seek 0.5");
    run(&bridge, &clip, "resume");
    assert_eq!(bridge.state(), TransportState::Playing);

    run(&bridge, &clip, "stop");
    assert_eq!(bridge.state(), TransportState::Stopped);

    run(&bridge, &clip, "release");
    assert!(!bridge.is_initialized());
}

#[test]
fn status_reports_state() {
    let bridge = Bridge::new(MockBackend::new());
    let clip = clip();
    run(&bridge, &clip, "play");

    let Outcome::Continue(Some(line)) = run(&bridge, &clip, "status") else {
        panic!("status should print a line");
    };
    assert!(line.contains("Playing"), "{}", line);
    assert!(line.contains("Unavailable"), "{}", line);
}

#[test]
fn failed_play_prints_message() {
    let bridge = Bridge::new(MockBackend::with_options(MockOptions {
        no_device: true,
        ..MockOptions::default()
    }));
    assert_eq!(
        run(&bridge, &clip(), "play"),
        Outcome::Continue(Some("playback failed".to_string()))
    );
}

#[test]
fn quit_releases_and_exits() {
    let bridge = Bridge::new(MockBackend::new());
    let clip = clip();
    run(&bridge, &clip, "play");

    assert_eq!(run(&bridge, &clip, "quit"), Outcome::Exit);
    assert!(!bridge.is_initialized());
    bridge.with_session(|session| assert!(session.backend().is_empty()));
}
