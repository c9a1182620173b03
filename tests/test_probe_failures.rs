
use logprobe::{Cursor, CursorStore, ProbeError, Severity};
use test_utils::{append, cache_dir, probe, FATAL_LINE};

#[test]
fn a_missing_log_with_a_prior_cursor_is_an_error() {
    let dir = temp_dir::TempDir::new().unwrap();
    let cache = cache_dir(&dir);
    let log = dir.child("test_monitor.log");

    // a planted cursor proves the log existed before
    CursorStore::new(&cache)
        .save(
            &log,
            &Cursor {
                offset: 0,
                checksum: String::from("deadbeef"),
            },
        )
        .unwrap();

    match probe(&cache, &log).build().unwrap().run() {
        Err(ProbeError::LogMissing(path)) => assert_eq!(path, log),
        other => panic!("expected LogMissing, got {other:?}"),
    }
}

#[test]
fn a_missing_log_without_a_cursor_is_the_benign_first_run_case() {
    let dir = temp_dir::TempDir::new().unwrap();
    let cache = cache_dir(&dir);
    let log = dir.child("test_monitor.log");

    let outcome = probe(&cache, &log).build().unwrap().run().unwrap();
    assert_eq!(outcome.severity, Severity::Ok);
    assert_eq!(outcome.tally.lines, 0);
}

#[test]
fn a_malformed_sidecar_restarts_the_scan_from_the_beginning() {
    let dir = temp_dir::TempDir::new().unwrap();
    let cache = cache_dir(&dir);
    let log = dir.child("test_monitor.log");
    append(&log, FATAL_LINE);

    let store = CursorStore::new(&cache);
    std::fs::write(store.sidecar_path(&log), b"]] not json [[").unwrap();

    let outcome = probe(&cache, &log).build().unwrap().run().unwrap();
    assert_eq!(outcome.severity, Severity::Critical);

    // the broken sidecar got replaced by a valid one
    let cursor = store.load(&log).unwrap();
    assert_eq!(cursor.offset, std::fs::metadata(&log).unwrap().len());
}

#[test]
fn a_held_lock_turns_the_run_away() {
    let dir = temp_dir::TempDir::new().unwrap();
    let cache = cache_dir(&dir);
    let log = dir.child("test_monitor.log");
    append(&log, FATAL_LINE);

    let _held = CursorStore::new(&cache).lock(&log).unwrap();
    match probe(&cache, &log).build().unwrap().run() {
        Err(ProbeError::LockContention(_)) => {}
        other => panic!("expected lock contention, got {other:?}"),
    }
}

#[test]
fn a_missing_cache_directory_fails_the_run() {
    let dir = temp_dir::TempDir::new().unwrap();
    let log = dir.child("test_monitor.log");
    append(&log, FATAL_LINE);

    let result = probe(&dir.child("no_such_dir"), &log)
        .build()
        .unwrap()
        .run();
    assert!(matches!(result, Err(ProbeError::Io(_))));
}
