use std::sync::mpsc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{backend::TestBackend, Terminal};
use worktally::{
    app::{App, Flow},
    clock::ManualClock,
    history::{HistoryStore, STORAGE_KEY},
    manager::SessionManager,
    runtime::{AppEvent, FixedTicker, Runner, TestEventSource},
    storage::MemoryBlobStore,
    SessionState,
};

fn key(c: char) -> AppEvent {
    AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

fn code(code: KeyCode) -> AppEvent {
    AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn screen_text(terminal: &Terminal<TestBackend>) -> String {
    terminal
        .backend()
        .buffer()
        .content()
        .iter()
        .map(|c| c.symbol())
        .collect()
}

// Headless integration using the internal runtime + App without a TTY.
// Drives a full start/pause/resume/stop flow through Runner/TestEventSource.
#[test]
fn headless_session_flow_records_history() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap());
    let storage = MemoryBlobStore::new();
    let mut app = App::new(
        SessionManager::with_clock(clock.clone()),
        HistoryStore::load(storage.clone()),
    );

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );
    let mut terminal = Terminal::new(TestBackend::new(90, 24)).unwrap();

    // name the task, then start
    tx.send(key('t')).unwrap();
    for c in "Design".chars() {
        tx.send(key(c)).unwrap();
    }
    tx.send(code(KeyCode::Enter)).unwrap();
    tx.send(key('s')).unwrap();

    for _ in 0.."Design".len() + 3 {
        let event = runner.step(app.wants_refresh()).unwrap();
        assert_eq!(app.handle_event(event), Flow::Continue);
    }
    assert_eq!(app.state(), SessionState::Running);

    // idle ticks redraw but never move the clock themselves
    clock.advance_secs(600);
    for _ in 0..3 {
        let event = runner.step(app.wants_refresh()).unwrap();
        assert!(matches!(event, AppEvent::Tick));
        app.handle_event(event);
    }
    terminal
        .draw(|f| f.render_widget(&app, f.area()))
        .unwrap();
    assert!(screen_text(&terminal).contains("00:10:00"));

    tx.send(key('p')).unwrap();
    app.handle_event(runner.step(app.wants_refresh()).unwrap());
    assert_eq!(app.state(), SessionState::Paused);

    clock.advance_secs(300);
    terminal
        .draw(|f| f.render_widget(&app, f.area()))
        .unwrap();
    assert!(screen_text(&terminal).contains("00:10:00"));

    tx.send(key('r')).unwrap();
    app.handle_event(runner.step(app.wants_refresh()).unwrap());
    clock.advance_secs(600);

    tx.send(key('x')).unwrap();
    app.handle_event(runner.step(app.wants_refresh()).unwrap());
    assert_eq!(app.state(), SessionState::Idle);
    assert!(!app.wants_refresh());

    let record = &app.history.records()[0];
    assert_eq!(record.task_name, "Design");
    assert_eq!(record.duration_seconds, 1200);
    assert!(storage.get(STORAGE_KEY).unwrap().contains("\"Design\""));

    terminal
        .draw(|f| f.render_widget(&app, f.area()))
        .unwrap();
    let screen = screen_text(&terminal);
    assert!(screen.contains("Design"));
    assert!(screen.contains("0h 20m"));

    tx.send(key('q')).unwrap();
    let event = runner.step(app.wants_refresh()).unwrap();
    assert_eq!(app.handle_event(event), Flow::Quit);
}

#[test]
fn headless_rename_and_delete_flow() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap());
    let storage = MemoryBlobStore::new();
    let mut app = App::new(
        SessionManager::with_clock(clock.clone()),
        HistoryStore::load(storage.clone()),
    );

    for name in ["First", "Second"] {
        app.manager.start(name).unwrap();
        clock.advance_secs(90);
        app.manager.stop(&mut app.history).unwrap();
        clock.advance_secs(10);
    }

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );

    // move to "First" and rename it
    let mut script = vec![code(KeyCode::Down), key('e')];
    script.extend((0.."First".len()).map(|_| code(KeyCode::Backspace)));
    script.extend("Kickoff".chars().map(key));
    script.push(code(KeyCode::Enter));
    // delete "Second", confirming
    script.extend([code(KeyCode::Up), key('d'), key('y')]);

    let steps = script.len();
    for event in script {
        tx.send(event).unwrap();
    }
    for _ in 0..steps {
        let event = runner.step(app.wants_refresh()).unwrap();
        app.handle_event(event);
    }

    assert_eq!(app.history.len(), 1);
    assert_eq!(app.history.records()[0].task_name, "Kickoff");

    let reloaded = HistoryStore::load(storage);
    assert_eq!(reloaded.records(), app.history.records());
}

#[test]
fn idle_runner_waits_for_input_instead_of_ticking() {
    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );

    // a blocking step returns the queued key, never a Tick
    tx.send(key('s')).unwrap();
    assert!(matches!(runner.step(false), Some(AppEvent::Key(_))));
}
