use gpio_watch::{
    Dispatch, DispatchOutcome, EdgeMode, LineValue, ScriptDispatcher, WatchConfig, WatchedPin,
};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Tests write scripts and then exec them. A fork from another test while a
/// script is still open for writing makes the exec fail with ETXTBSY, so the
/// tests in this file take turns.
static SCRIPTS: Mutex<()> = Mutex::new(());

fn serialize() -> MutexGuard<'static, ()> {
    SCRIPTS.lock().unwrap_or_else(|e| e.into_inner())
}

fn write_script(dir: &Path, name: &str, body: &str) {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Scripts receive the pin and the value as their two arguments
#[test]
fn test_script_receives_pin_and_value() {
    let _guard = serialize();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("args");
    write_script(
        dir.path(),
        "4",
        &format!("echo \"$0|$1|$2|$#\" > {}", out.display()),
    );

    let mut dispatcher = ScriptDispatcher::new(dir.path());
    assert_eq!(
        dispatcher.dispatch(4, LineValue::High),
        DispatchOutcome::Success
    );

    let script = dir.path().join("4");
    assert_eq!(
        fs::read_to_string(&out).unwrap(),
        format!("{}|4|1|2\n", script.display())
    );

    dispatcher.dispatch(4, LineValue::Low);
    assert!(fs::read_to_string(&out).unwrap().contains("|4|0|2"));
}

/// A nonzero exit status is reported, not raised
#[test]
fn test_nonzero_exit_status() {
    let _guard = serialize();
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "7", "exit 17");

    let outcome = ScriptDispatcher::new(dir.path()).dispatch(7, LineValue::High);
    assert_eq!(outcome, DispatchOutcome::Exited(17));
    assert!(outcome.to_string().contains("17"));
}

/// A script killed by a signal is reported with the signal number
#[test]
fn test_killed_by_signal() {
    let _guard = serialize();
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "7", "kill -9 $$");

    let outcome = ScriptDispatcher::new(dir.path()).dispatch(7, LineValue::Low);
    assert_eq!(outcome, DispatchOutcome::Signaled(9));
    assert!(outcome.to_string().contains("signal 9"));
}

/// A script that cannot be executed looks like a script exiting 255
#[test]
fn test_exec_failure_reports_255() {
    let _guard = serialize();
    let dir = tempfile::tempdir().unwrap();
    // a regular file, but not executable
    fs::write(dir.path().join("8"), "#!/bin/sh\nexit 0\n").unwrap();

    let outcome = ScriptDispatcher::new(dir.path()).dispatch(8, LineValue::High);
    assert_eq!(outcome, DispatchOutcome::Exited(255));

    write_script(dir.path(), "9", "exit 255");
    let outcome = ScriptDispatcher::new(dir.path()).dispatch(9, LineValue::High);
    assert_eq!(outcome, DispatchOutcome::Exited(255));
}

/// A directory named after the pin is not a script
#[test]
fn test_directory_is_not_a_script() {
    let _guard = serialize();
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("12")).unwrap();

    let outcome = ScriptDispatcher::new(dir.path()).dispatch(12, LineValue::High);
    assert_eq!(outcome, DispatchOutcome::Missing);
}

/// Without explicit pins, every pin with a script is watched
#[test]
fn test_discovery_finds_scripted_pins() {
    let _guard = serialize();
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "3", "exit 0");
    write_script(dir.path(), "9", "exit 0");

    let config = WatchConfig::new(dir.path());
    config.validate_script_dir().unwrap();
    assert_eq!(
        config.watch_set().unwrap(),
        vec![
            WatchedPin::new(3, EdgeMode::Both),
            WatchedPin::new(9, EdgeMode::Both),
        ]
    );

    let config = WatchConfig::new(dir.path()).with_default_edge(EdgeMode::Switch);
    assert!(config
        .watch_set()
        .unwrap()
        .iter()
        .all(|pin| pin.edge == EdgeMode::Switch));
}

/// Explicit pins win over discovery
#[test]
fn test_explicit_pins_skip_discovery() {
    let _guard = serialize();
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "3", "exit 0");

    let config = WatchConfig::new(dir.path()).with_pins(vec!["17:falling".parse().unwrap()]);
    assert_eq!(
        config.watch_set().unwrap(),
        vec![WatchedPin::new(17, EdgeMode::Falling)]
    );
}
