//! The speculative two-phase protocol: determine against a snapshot,
//! commit or discard later.

mod common;

use common::Fixture;
use key_engine::{EditorHost, KeyProcessResult, Mode};
use key_events::{KeyEvent, parse_keys};
use pretty_assertions::assert_eq;

#[test]
fn determine_leaves_live_state_untouched() {
    let f = Fixture::new();
    let before = f.state.clone();

    let result = f.engine.determine(&f.state, KeyEvent::char('d'));
    assert!(!result.is_unknown());
    assert_eq!(f.state, before);
}

#[test]
fn unknown_key_commits_nothing() {
    let f = Fixture::new();
    let before = f.state.clone();

    let result = f.engine.determine(&f.state, KeyEvent::char('q'));
    assert!(result.is_unknown());
    assert_eq!(f.state, before);
}

#[test]
fn commit_applies_snapshot_and_runs_steps() {
    let mut f = Fixture::new();
    let KeyProcessResult::Executable(executable) =
        f.engine.determine(&f.state, KeyEvent::char('x'))
    else {
        panic!("x resolves to a command");
    };

    let mut host = EditorHost {
        actions: &mut f.registry,
        registers: &mut f.registers,
        status: &mut f.status,
    };
    executable.invoke(&mut f.state, &mut host).unwrap();

    assert_eq!(f.executed(), vec!["edit.delete-char"]);
    assert_eq!(f.status.cleared, 1);
    assert_eq!(f.status.updates, 1);
}

#[test]
fn discarding_a_result_cancels_the_key() {
    let mut f = Fixture::new();
    let result = f.engine.determine(&f.state, KeyEvent::char('d'));
    drop(result);

    // No operator is pending: x is a plain delete-char, not d's motion.
    f.feed("x");
    assert_eq!(f.executed(), vec!["edit.delete-char"]);
}

#[test]
fn stale_commit_still_installs_its_snapshot() {
    let mut f = Fixture::new();
    let KeyProcessResult::Executable(enter_insert) =
        f.engine.determine(&f.state, KeyEvent::char('i'))
    else {
        panic!("i resolves to a command");
    };

    // The live state moves on before the old result is invoked.
    f.feed("x");

    let mut host = EditorHost {
        actions: &mut f.registry,
        registers: &mut f.registers,
        status: &mut f.status,
    };
    enter_insert.invoke(&mut f.state, &mut host).unwrap();

    assert_eq!(f.executed(), vec!["edit.delete-char", "mode.insert"]);
    assert_eq!(f.state.mode(), Mode::Insert);
}

#[test]
fn stale_commit_emits_a_warning() {
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let sink = Arc::new(Mutex::new(Vec::new()));
    let writer = CaptureWriter(sink.clone());
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let mut f = Fixture::new();
        let KeyProcessResult::Executable(stale) =
            f.engine.determine(&f.state, KeyEvent::char('i'))
        else {
            panic!("i resolves to a command");
        };

        // The live state moves on, making the old result stale.
        f.feed("x");

        let mut host = EditorHost {
            actions: &mut f.registry,
            registers: &mut f.registers,
            status: &mut f.status,
        };
        stale.invoke(&mut f.state, &mut host).unwrap();
    });

    let output = String::from_utf8(sink.lock().unwrap().clone()).unwrap();
    assert!(
        output.contains("live state changed since determination"),
        "missing stale-commit warning in: {output}"
    );
}

#[test]
fn determine_loop_matches_synchronous_processing() {
    let mut speculative = Fixture::new();
    for key in parse_keys("3dw") {
        match speculative.engine.determine(&speculative.state, key) {
            KeyProcessResult::Unknown => panic!("every key of 3dw is consumed"),
            KeyProcessResult::Executable(executable) => {
                let mut host = EditorHost {
                    actions: &mut speculative.registry,
                    registers: &mut speculative.registers,
                    status: &mut speculative.status,
                };
                executable.invoke(&mut speculative.state, &mut host).unwrap();
            }
        }
    }

    let mut synchronous = Fixture::new();
    synchronous.feed("3dw");

    assert_eq!(speculative.registry.calls, synchronous.registry.calls);
    assert_eq!(speculative.state, synchronous.state);
}
