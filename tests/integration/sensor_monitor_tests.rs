//! SensorMonitor against a scripted input line: debounce, dedup,
//! coalescing and handler ordering.

use std::time::Duration;

use futures_lite::future;

use doorlink::sensors::SensorState;
use doorlink::sensors::door::SensorMonitor;

use crate::mock_hw::{RecordingHandler, RecordingSleeper, ScriptedLine, leaked_signal, until};

const DEBOUNCE: Duration = Duration::from_millis(50);

#[test]
fn arming_subscribes_and_reads_initial_state() {
    let line = ScriptedLine::new(&[false]);
    let sleeper = RecordingSleeper::new();
    let monitor = SensorMonitor::arm(&line, leaked_signal(), &sleeper, DEBOUNCE).unwrap();

    assert!(line.subscribed.get());
    assert_eq!(line.reads.get(), 1);
    assert_eq!(monitor.state(), SensorState::Closed);
    assert_eq!(sleeper.count(), 0, "initial state is not debounced");
}

#[test]
fn high_to_low_past_debounce_reports_closed_once() {
    let line = ScriptedLine::new(&[true, false]);
    let sleeper = RecordingSleeper::new();
    let handler = RecordingHandler::default();
    let signal = leaked_signal();
    let monitor = SensorMonitor::arm(&line, signal, &sleeper, DEBOUNCE).unwrap();

    signal.signal();
    future::block_on(future::or(monitor.run(&handler), until(|| line.reads.get() >= 2)));

    assert_eq!(*handler.transitions.borrow(), vec![SensorState::Closed]);
    assert_eq!(sleeper.durations(), vec![DEBOUNCE]);
    assert_eq!(line.rearms.get(), 1);
}

#[test]
fn bounce_back_within_window_emits_nothing() {
    // OPEN, bounces CLOSED then OPEN inside the window: the edges wake the
    // task, but the post-window read is OPEN again.
    let line = ScriptedLine::new(&[true, true]);
    let sleeper = RecordingSleeper::new();
    let handler = RecordingHandler::default();
    let signal = leaked_signal();
    let monitor = SensorMonitor::arm(&line, signal, &sleeper, DEBOUNCE).unwrap();

    signal.signal();
    signal.signal();
    future::block_on(future::or(monitor.run(&handler), until(|| line.reads.get() >= 2)));

    assert!(handler.transitions.borrow().is_empty());
}

#[test]
fn burst_of_edges_is_one_debounce_cycle() {
    let line = ScriptedLine::new(&[true, false]);
    let sleeper = RecordingSleeper::new();
    let handler = RecordingHandler::default();
    let signal = leaked_signal();
    let monitor = SensorMonitor::arm(&line, signal, &sleeper, DEBOUNCE).unwrap();

    for _ in 0..10 {
        signal.signal();
    }
    // Give the task plenty of turns; only one wake may be observed.
    let turns = std::cell::Cell::new(0u32);
    future::block_on(future::or(
        monitor.run(&handler),
        until(|| {
            turns.set(turns.get() + 1);
            turns.get() > 50
        }),
    ));

    assert_eq!(sleeper.count(), 1);
    assert_eq!(line.reads.get(), 2);
    assert_eq!(*handler.transitions.borrow(), vec![SensorState::Closed]);
}

#[test]
fn alternating_transitions_are_reported_in_order() {
    let line = ScriptedLine::new(&[true]);
    let sleeper = RecordingSleeper::new();
    let handler = RecordingHandler::default();
    let signal = leaked_signal();
    let mut monitor = SensorMonitor::arm(&line, signal, &sleeper, DEBOUNCE).unwrap();

    for level in [false, false, true, false] {
        line.push(level);
        signal.signal();
        if let Some(state) = future::block_on(monitor.settle_edge()) {
            handler.transitions.borrow_mut().push(state);
        }
    }

    assert_eq!(
        *handler.transitions.borrow(),
        vec![SensorState::Closed, SensorState::Open, SensorState::Closed]
    );
    assert_eq!(line.rearms.get(), 4);
}
