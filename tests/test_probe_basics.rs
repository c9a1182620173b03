
use logprobe::{head_fingerprint, CursorStore, Severity};
use test_utils::{append, cache_dir, probe, FATAL_LINE, NOISE_LINE, OK_LINE, WARN_LINE};

#[test]
fn empty_log_without_cursor_reports_ok_and_persists_nothing() {
    let dir = temp_dir::TempDir::new().unwrap();
    let cache = cache_dir(&dir);
    let log = dir.child("test_monitor.log");
    std::fs::write(&log, b"").unwrap();

    let outcome = probe(&cache, &log).build().unwrap().run().unwrap();

    assert_eq!(outcome.severity, Severity::Ok);
    assert_eq!(outcome.tally.lines, 0);
    assert!(!CursorStore::new(&cache).sidecar_path(&log).exists());
}

#[test]
fn single_critical_line_moves_the_cursor_behind_it() {
    let dir = temp_dir::TempDir::new().unwrap();
    let cache = cache_dir(&dir);
    let log = dir.child("test_monitor.log");
    std::fs::write(&log, b"FATAL - boom\n").unwrap();

    let outcome = probe(&cache, &log).build().unwrap().run().unwrap();

    assert_eq!(outcome.severity, Severity::Critical);
    assert_eq!(outcome.severity.exit_code(), 2);
    assert_eq!(outcome.tally.criticals, 1);

    let cursor = CursorStore::new(&cache).load(&log).unwrap();
    assert_eq!(cursor.offset, 13);
    assert_eq!(cursor.checksum, head_fingerprint(&log, 13).unwrap());
}

#[test]
fn warning_line_reports_warning() {
    let dir = temp_dir::TempDir::new().unwrap();
    let cache = cache_dir(&dir);
    let log = dir.child("test_monitor.log");
    append(&log, WARN_LINE);

    let outcome = probe(&cache, &log).build().unwrap().run().unwrap();

    assert_eq!(outcome.severity, Severity::Warning);
    assert_eq!(outcome.severity.exit_code(), 1);
    assert!(CursorStore::new(&cache).load(&log).is_some());
}

#[test]
fn ok_line_clears_errors_within_one_scan() {
    let dir = temp_dir::TempDir::new().unwrap();
    let cache = cache_dir(&dir);
    let log = dir.child("test_monitor.log");
    append(&log, "FATAL - x\n");
    append(&log, "FATAL - y\n");
    append(&log, "SUCCESS - ok\n");

    let outcome = probe(&cache, &log).build().unwrap().run().unwrap();

    assert_eq!(outcome.severity, Severity::Ok);
    assert_eq!(outcome.tally.criticals, 2);
    assert_eq!(outcome.tally.oks, 1);
}

#[test]
fn appended_ok_line_clears_an_error_seen_by_the_previous_run() {
    let dir = temp_dir::TempDir::new().unwrap();
    let cache = cache_dir(&dir);
    let log = dir.child("test_monitor.log");
    append(&log, FATAL_LINE);

    let first = probe(&cache, &log).build().unwrap().run().unwrap();
    assert_eq!(first.severity, Severity::Critical);

    append(&log, OK_LINE);
    let second = probe(&cache, &log).build().unwrap().run().unwrap();
    assert_eq!(second.severity, Severity::Ok);
    assert_eq!(second.tally.lines, 1);
}

#[test]
fn run_without_new_bytes_reports_ok_and_keeps_the_cursor() {
    let dir = temp_dir::TempDir::new().unwrap();
    let cache = cache_dir(&dir);
    let log = dir.child("test_monitor.log");
    append(&log, FATAL_LINE);

    let probe = probe(&cache, &log).build().unwrap();
    assert_eq!(probe.run().unwrap().severity, Severity::Critical);

    let store = CursorStore::new(&cache);
    let cursor_after_first = store.load(&log).unwrap();

    // nothing new: the engine sees zero lines, so the verdict is OK and
    // the cursor must come out unchanged
    let second = probe.run().unwrap();
    assert_eq!(second.severity, Severity::Ok);
    assert_eq!(second.tally.lines, 0);
    assert_eq!(store.load(&log).unwrap(), cursor_after_first);
}

#[test]
fn without_ok_pattern_only_new_bytes_count() {
    let dir = temp_dir::TempDir::new().unwrap();
    let cache = cache_dir(&dir);
    let log = dir.child("test_monitor.log");

    let build = || {
        logprobe::Probe::builder(&cache, test_utils::ROTATION_PATTERN)
            .log_file(&log)
            .warning_pattern(test_utils::WARNING_PATTERN)
            .critical_pattern(test_utils::CRITICAL_PATTERN)
            .build()
            .unwrap()
    };

    append(&log, FATAL_LINE);
    assert_eq!(build().run().unwrap().severity, Severity::Critical);

    append(&log, NOISE_LINE);
    append(&log, NOISE_LINE);
    assert_eq!(build().run().unwrap().severity, Severity::Ok);

    append(&log, FATAL_LINE);
    assert_eq!(build().run().unwrap().severity, Severity::Critical);
}

#[test]
fn cursor_invariants_hold_after_every_run() {
    let dir = temp_dir::TempDir::new().unwrap();
    let cache = cache_dir(&dir);
    let log = dir.child("test_monitor.log");
    let store = CursorStore::new(&cache);

    for line in [OK_LINE, WARN_LINE, FATAL_LINE, NOISE_LINE] {
        append(&log, line);
        probe(&cache, &log).build().unwrap().run().unwrap();

        let cursor = store.load(&log).unwrap();
        let size = std::fs::metadata(&log).unwrap().len();
        assert_eq!(cursor.offset, size);
        assert_eq!(
            cursor.checksum,
            head_fingerprint(&log, cursor.offset).unwrap()
        );
    }
}
