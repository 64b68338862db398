mod support;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use sonyptp_session::{Session, SessionConfig, SessionError};
use sonyptp_transport::{ScriptedTransport, TransferStatus};
use support::{camera, event_container};

const OBJECT_ADDED: u16 = 0xC201;

fn config() -> SessionConfig {
    SessionConfig::default().with_event_poll(Duration::from_millis(20))
}

fn wait_until(mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(3);
    while !done() {
        assert!(Instant::now() < deadline, "condition not reached");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn wait_event_reads_interrupt_endpoint() {
    let transport = Arc::new(camera());
    let mut session = Session::with_config(Arc::clone(&transport), config());
    session.open().unwrap();

    transport.push_event(event_container(OBJECT_ADDED, &[0xFFFF_C001]));
    let event = session
        .wait_event(Some(Duration::from_millis(100)))
        .unwrap()
        .unwrap();
    assert_eq!(event.code, OBJECT_ADDED);
    assert_eq!(event.params.get(0), Some(0xFFFF_C001));

    assert!(session
        .wait_event(Some(Duration::from_millis(20)))
        .unwrap()
        .is_none());
}

#[test]
fn callback_registered_before_open_starts_pool_at_open() {
    let transport = Arc::new(camera());
    let mut session = Session::with_config(Arc::clone(&transport), config());
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    session
        .register_event_callback(move |event| {
            assert_eq!(event.code, OBJECT_ADDED);
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    assert_eq!(transport.outstanding_interrupts(), 0);

    session.open().unwrap();
    assert_eq!(transport.outstanding_interrupts(), 10);

    transport.push_event(event_container(OBJECT_ADDED, &[1]));
    transport.push_event(event_container(OBJECT_ADDED, &[2]));
    wait_until(|| seen.load(Ordering::SeqCst) == 2);

    assert!(matches!(
        session.wait_event(Some(Duration::from_millis(10))),
        Err(SessionError::EventPoolActive)
    ));

    session.close().unwrap();
    assert_eq!(transport.outstanding_interrupts(), 0);
}

#[test]
fn callback_registered_on_open_session_starts_immediately() {
    let transport = Arc::new(camera());
    let mut session = Session::with_config(Arc::clone(&transport), config());
    session.open().unwrap();

    let (tx, rx) = mpsc::channel();
    session
        .register_event_callback(move |event| {
            let _ = tx.send(event.code);
        })
        .unwrap();
    assert!(session.event_pool().is_some());

    transport.push_event(event_container(0xC203, &[0xD20D]));
    assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), 0xC203);

    session.clear_event_callback().unwrap();
    assert_eq!(transport.outstanding_interrupts(), 0);
    assert!(session
        .wait_event(Some(Duration::from_millis(10)))
        .unwrap()
        .is_none());
}

#[test]
fn teardown_waits_for_delayed_cancellations() {
    let transport = Arc::new(camera().with_completion_delay(Duration::from_millis(150)));
    let mut session = Session::with_config(Arc::clone(&transport), config());
    session.register_event_callback(|_| {}).unwrap();
    session.open().unwrap();
    assert_eq!(transport.outstanding_interrupts(), 10);

    let started = Instant::now();
    session.close().unwrap();

    // Every buffer came back before close returned.
    assert!(started.elapsed() >= Duration::from_millis(150));
    assert_eq!(transport.outstanding_interrupts(), 0);
    assert!(session.event_pool().is_none());
}

#[test]
fn teardown_waits_for_callback_in_flight() {
    let transport = Arc::new(camera());
    let mut session = Session::with_config(Arc::clone(&transport), config());
    let (entered_tx, entered_rx) = mpsc::channel();
    let finished = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&finished);
    session
        .register_event_callback(move |_| {
            let _ = entered_tx.send(());
            thread::sleep(Duration::from_millis(200));
            flag.store(true, Ordering::SeqCst);
        })
        .unwrap();
    session.open().unwrap();

    transport.push_event(event_container(OBJECT_ADDED, &[1]));
    entered_rx.recv_timeout(Duration::from_secs(2)).unwrap();

    session.close().unwrap();
    assert!(finished.load(Ordering::SeqCst));
    assert_eq!(transport.outstanding_interrupts(), 0);
}

#[test]
fn failed_completion_keeps_delivering() {
    let transport = Arc::new(camera());
    let mut session = Session::with_config(Arc::clone(&transport), config());
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    session
        .register_event_callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    session.open().unwrap();

    transport.fail_next_completion(TransferStatus::TimedOut);
    transport.fail_next_completion(TransferStatus::Overflow);
    transport.push_event(event_container(OBJECT_ADDED, &[1]));
    wait_until(|| seen.load(Ordering::SeqCst) == 1);

    assert_eq!(session.event_pool().map(|p| p.in_flight()), Some(10));
    session.close().unwrap();
}

#[test]
fn pool_keeps_running_with_a_failed_slot() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_bulk_in(support::response_container(0x2001, 0, &[]));
    transport.fail_next_submit();
    let mut session = Session::with_config(Arc::clone(&transport), config());
    session.register_event_callback(|_| {}).unwrap();
    session.open().unwrap();

    assert_eq!(session.event_pool().map(|p| p.in_flight()), Some(9));
}
