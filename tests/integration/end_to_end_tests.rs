//! Whole-pipeline scenarios: sensor edge to remote write, remote command
//! to relay pulse, and all tasks sharing one executor.

use std::cell::Cell;
use std::time::Duration;

use edge_executor::LocalExecutor;
use futures_lite::future;

use doorlink::app::connectivity::{ConnectionState, ConnectivitySupervisor, WifiCredentials};
use doorlink::app::service::DoorController;
use doorlink::drivers::led_patterns::{BlinkPattern, PatternSlot};
use doorlink::drivers::relay::RelayDriver;
use doorlink::drivers::status_led::StatusIndicator;
use doorlink::remote::RemoteStateClient;
use doorlink::sensors::door::SensorMonitor;

use crate::mock_hw::{
    MockConnector, MockPin, MockRestart, RecordingSleeper, Script, ScriptedLine, ScriptedLink, leaked_signal,
    ok_response, stream_response, until,
};

const HOST: &str = "door-1234.firebaseio.com";
const SECRET: &str = "s3cret";
const DEBOUNCE: Duration = Duration::from_millis(50);

#[test]
fn closing_the_door_writes_one_status_patch() {
    let slot = PatternSlot::new(BlinkPattern::NORMAL);
    let connector = MockConnector::new([ok_response()]);
    let sleeper = RecordingSleeper::new();
    let client = RemoteStateClient::new(&connector, &sleeper, HOST, SECRET, &slot);
    let controller: DoorController<'_, _, _, MockPin> =
        DoorController::new(&client, &sleeper, &slot, "/garage", "/command");

    let line = ScriptedLine::new(&[true, false]);
    let signal = leaked_signal();
    let monitor = SensorMonitor::arm(&line, signal, &sleeper, DEBOUNCE).unwrap();

    signal.signal();
    future::block_on(future::or(
        monitor.run(&controller),
        until(|| connector.connects() >= 1 && connector.live() == 0),
    ));

    let requests = connector.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with("PATCH /garage.json?auth=s3cret HTTP/1.1\r\n"));
    assert!(requests[0].ends_with("\r\n\r\n{\"status\":\"CLOSED\"}"));
    assert_eq!(sleeper.durations(), vec![DEBOUNCE]);
    assert_eq!(slot.get(), BlinkPattern::NORMAL);
}

#[test]
fn failed_write_is_dropped_and_next_transition_still_reported() {
    let slot = PatternSlot::new(BlinkPattern::NORMAL);
    let connector = MockConnector::new([Script::Refuse, ok_response()]);
    let sleeper = RecordingSleeper::new();
    let client = RemoteStateClient::new(&connector, &sleeper, HOST, SECRET, &slot);
    let controller: DoorController<'_, _, _, MockPin> =
        DoorController::new(&client, &sleeper, &slot, "/garage", "/command");

    let line = ScriptedLine::new(&[true, false, true]);
    let signal = leaked_signal();
    let monitor = SensorMonitor::arm(&line, signal, &sleeper, DEBOUNCE).unwrap();

    signal.signal();
    let fired = Cell::new(false);
    future::block_on(future::or(
        monitor.run(&controller),
        until(|| {
            if connector.connects() == 1 && !fired.get() {
                fired.set(true);
                signal.signal();
            }
            connector.connects() >= 2 && connector.live() == 0
        }),
    ));

    let requests = connector.requests();
    assert_eq!(requests.len(), 1, "refused write is not retried");
    assert!(requests[0].ends_with("{\"status\":\"OPEN\"}"));
    assert_eq!(slot.get(), BlinkPattern::NORMAL);
}

#[test]
fn open_command_pulses_relay_and_resets_command() {
    let slot = PatternSlot::new(BlinkPattern::NORMAL);
    let connector = MockConnector::new([
        stream_response(&["event: put", "data: {\"path\":\"/\",\"data\":\"OPEN\"}"]),
        ok_response(),
    ]);
    let sleeper = RecordingSleeper::observing(&slot);
    let client = RemoteStateClient::new(&connector, &sleeper, HOST, SECRET, &slot);
    let relay_pin = MockPin::default();
    let controller = DoorController::new(&client, &sleeper, &slot, "/garage", "/command")
        .with_relay(RelayDriver::new(relay_pin.clone()), Duration::from_millis(500));

    future::block_on(future::or(
        client.watch_key(controller.command_key(), &controller),
        until(|| sleeper.count() >= 2),
    ));

    assert_eq!(relay_pin.history(), vec![false, true, false]);
    assert_eq!(
        sleeper.durations(),
        vec![Duration::from_millis(500), Duration::from_secs(5)]
    );
    assert_eq!(
        sleeper.patterns(),
        vec![Some(BlinkPattern::RELAY_CLOSED), Some(BlinkPattern::NORMAL)]
    );

    let requests = connector.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].starts_with("GET /command.json?auth=s3cret HTTP/1.1\r\n"));
    assert!(requests[1].starts_with("PUT /command.json?auth=s3cret HTTP/1.1\r\n"));
    assert!(requests[1].ends_with("\r\n\r\n\"IDLE\""));
}

#[test]
fn idle_and_unknown_commands_do_nothing() {
    let slot = PatternSlot::new(BlinkPattern::NORMAL);
    let connector = MockConnector::new([stream_response(&[
        "data: {\"data\":\"IDLE\"}",
        "data: {\"data\":\"DANCE\"}",
        "data: {\"data\":42}",
    ])]);
    let sleeper = RecordingSleeper::new();
    let client = RemoteStateClient::new(&connector, &sleeper, HOST, SECRET, &slot);
    let relay_pin = MockPin::default();
    let controller = DoorController::new(&client, &sleeper, &slot, "/garage", "/command")
        .with_relay(RelayDriver::new(relay_pin.clone()), Duration::from_millis(500));

    future::block_on(future::or(
        client.watch_key("/command", &controller),
        until(|| sleeper.count() >= 1),
    ));

    assert_eq!(relay_pin.history(), vec![false]);
    assert_eq!(connector.requests().len(), 1);
    assert_eq!(sleeper.secs(), vec![5]);
}

#[test]
fn command_without_relay_is_ignored() {
    let slot = PatternSlot::new(BlinkPattern::NORMAL);
    let connector = MockConnector::new([stream_response(&["data: {\"data\":\"CLOSE\"}"])]);
    let sleeper = RecordingSleeper::new();
    let client = RemoteStateClient::new(&connector, &sleeper, HOST, SECRET, &slot);
    let controller: DoorController<'_, _, _, MockPin> =
        DoorController::new(&client, &sleeper, &slot, "/garage", "/command");

    future::block_on(future::or(
        client.watch_key("/command", &controller),
        until(|| sleeper.count() >= 1),
    ));

    assert_eq!(connector.requests().len(), 1, "no PUT without a relay");
}

#[test]
fn all_tasks_share_one_executor() {
    let slot = PatternSlot::default();
    let connector = MockConnector::new([stream_response(&[]), ok_response()]);
    let client_sleeper = RecordingSleeper::new();
    let client = RemoteStateClient::new(&connector, &client_sleeper, HOST, SECRET, &slot);
    let controller: DoorController<'_, _, _, MockPin> =
        DoorController::new(&client, &client_sleeper, &slot, "/garage", "/command");

    let led_pin = MockPin::default();
    let led_sleeper = RecordingSleeper::new();
    let led = StatusIndicator::new(led_pin.clone(), &led_sleeper, &slot);

    let link = ScriptedLink::up_after(2);
    let wifi_sleeper = RecordingSleeper::new();
    let system = MockRestart::default();
    let mut connectivity = ConnectivitySupervisor::new(&link, &wifi_sleeper, &system, &slot);
    let credentials = WifiCredentials::new("garage-ap", "hunter22").unwrap();

    let line = ScriptedLine::new(&[true, false]);
    let signal = leaked_signal();
    let sensor_sleeper = RecordingSleeper::new();
    let monitor = SensorMonitor::arm(&line, signal, &sensor_sleeper, DEBOUNCE).unwrap();
    signal.signal();

    let outcome = Cell::new(None);
    let outcome_ref = &outcome;

    let executor: LocalExecutor<'_, 8> = LocalExecutor::new();
    executor.spawn(led.run()).detach();
    executor
        .spawn(async move {
            outcome_ref.set(Some(connectivity.connect(&credentials, 10).await));
        })
        .detach();
    executor.spawn(client.watch_key("/command", &controller)).detach();
    executor.spawn(monitor.run(&controller)).detach();

    future::block_on(executor.run(until(|| {
        outcome.get().is_some()
            && connector.requests().len() >= 2
            && connector.live() == 0
            && led_sleeper.count() >= 4
    })));

    assert_eq!(outcome.get(), Some(ConnectionState::Connected));
    assert_eq!(wifi_sleeper.secs(), vec![1, 1]);

    let requests = connector.requests();
    assert!(requests[0].starts_with("GET /command.json"));
    assert!(requests[1].starts_with("PATCH /garage.json"));
    assert!(requests[1].ends_with("{\"status\":\"CLOSED\"}"));
    assert_eq!(system.restarts.get(), 0);
    assert_eq!(slot.get(), BlinkPattern::NORMAL);
    assert!(client_sleeper.secs().starts_with(&[5]));

    let blinks = led_pin.history();
    assert!(blinks.len() >= 4);
    assert!(blinks.chunks(2).all(|c| c[0]), "each cycle starts high");
}
