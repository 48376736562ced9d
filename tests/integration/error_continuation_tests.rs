use super::config_tests::{clear_env, ENV_MUTEX};
use clap::Parser;
use dupelink::cli::Cli;
use dupelink::duplicates::{
    DuplicateFinder, DuplicateHandler, DuplicatePair, FinderConfig, FinderError, PairOutcome,
};
use dupelink::error::ExitCode;
use dupelink::output::read_report;
use dupelink::scanner::{CandidatePath, CandidateSource, Hasher, ScanError, WalkerConfig};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

#[derive(Default)]
struct Collect(Mutex<Vec<DuplicatePair>>);

impl DuplicateHandler for Collect {
    fn handle(&self, pair: &DuplicatePair) -> PairOutcome {
        self.0.lock().unwrap().push(pair.clone());
        PairOutcome::default()
    }
}

#[test]
fn test_unreadable_candidates_do_not_stop_the_run() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.bin");
    let b = dir.path().join("b.bin");
    fs::write(&a, vec![b'x'; 100]).unwrap();
    fs::write(&b, vec![b'x'; 100]).unwrap();

    let candidates = vec![
        Ok(CandidatePath::new(PathBuf::from("nonexistent_1.bin"), 100)),
        Ok(CandidatePath::new(a.clone(), 100)),
        Err(ScanError::PermissionDenied(PathBuf::from("/locked"))),
        Ok(CandidatePath::new(PathBuf::from("nonexistent_2.bin"), 100)),
        Ok(CandidatePath::new(b.clone(), 100)),
    ];
    let handler = Arc::new(Collect::default());

    let finder = DuplicateFinder::new(FinderConfig::default().with_workers(1), Hasher::default());
    let summary = finder.run(candidates, handler.clone()).unwrap();

    assert_eq!(summary.dispatched, 4);
    assert_eq!(summary.hashed, 2);
    assert_eq!(summary.hash_errors, 2);
    assert_eq!(summary.scan_errors, 1);
    assert_eq!(summary.total_errors(), 3);
    assert_eq!(*handler.0.lock().unwrap(), vec![DuplicatePair::new(b, a)]);
}

#[test]
fn test_path_list_with_missing_entries() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.bin");
    let b = dir.path().join("b.bin");
    fs::write(&a, vec![b'm'; 5000]).unwrap();
    fs::write(&b, vec![b'm'; 5000]).unwrap();
    let list = dir.path().join("list.txt");
    fs::write(
        &list,
        format!(
            "{}\n{}\n{}\n",
            a.display(),
            dir.path().join("gone.bin").display(),
            b.display()
        ),
    )
    .unwrap();

    let summary = DuplicateFinder::with_defaults()
        .run_source(
            &CandidateSource::PathList(list),
            WalkerConfig::default(),
            Arc::new(Collect::default()),
        )
        .unwrap();

    assert_eq!(summary.scan_errors, 1);
    assert_eq!(summary.duplicate_pairs, 1);
}

#[test]
fn test_unopenable_path_list_is_fatal() {
    let dir = tempdir().unwrap();
    let result = DuplicateFinder::with_defaults().run_source(
        &CandidateSource::PathList(dir.path().join("no_such_list.txt")),
        WalkerConfig::default(),
        Arc::new(Collect::default()),
    );

    assert!(matches!(
        result,
        Err(FinderError::Source(ScanError::PathList { .. }))
    ));
}

#[test]
fn test_shutdown_before_start_dispatches_nothing() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.bin"), vec![b's'; 5000]).unwrap();
    fs::write(dir.path().join("b.bin"), vec![b's'; 5000]).unwrap();
    let flag = Arc::new(AtomicBool::new(true));

    let summary = DuplicateFinder::new(
        FinderConfig::default().with_shutdown_flag(flag.clone()),
        Hasher::default(),
    )
    .run_source(
        &CandidateSource::Roots(vec![dir.path().to_path_buf()]),
        WalkerConfig::default(),
        Arc::new(Collect::default()),
    )
    .unwrap();

    assert!(flag.load(Ordering::SeqCst));
    assert!(summary.interrupted);
    assert_eq!(summary.dispatched, 0);
}

#[test]
fn test_run_app_writes_report() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    fs::write(data.path().join("a.bin"), vec![b'r'; 5000]).unwrap();
    fs::write(data.path().join("b.bin"), vec![b'r'; 5000]).unwrap();
    let config = out.path().join("config.toml");
    fs::write(&config, "").unwrap();
    let report = out.path().join("report.txt");

    let cli = Cli::try_parse_from([
        "dupelink",
        "-q",
        "--config",
        config.to_str().unwrap(),
        "-o",
        report.to_str().unwrap(),
        data.path().to_str().unwrap(),
    ])
    .unwrap();

    let code = dupelink::run_app(cli).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert_eq!(read_report(&report).unwrap().len(), 1);
}

#[test]
fn test_run_app_rejects_report_with_link() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let out = tempdir().unwrap();
    let config = out.path().join("config.toml");
    fs::write(&config, "").unwrap();
    let report = out.path().join("report.txt");

    let cli = Cli::try_parse_from([
        "dupelink",
        "-q",
        "--config",
        config.to_str().unwrap(),
        "--link",
        "-o",
        report.to_str().unwrap(),
        out.path().to_str().unwrap(),
    ])
    .unwrap();

    let err = dupelink::run_app(cli).unwrap_err();
    assert!(format!("{err:#}").contains("--output cannot be combined"));
    assert!(!report.exists());
}

#[test]
fn test_run_app_missing_config_file() {
    let out = tempdir().unwrap();
    let missing = out.path().join("missing.toml");

    let cli = Cli::try_parse_from([
        "dupelink",
        "-q",
        "--config",
        missing.to_str().unwrap(),
    ])
    .unwrap();

    let err = dupelink::run_app(cli).unwrap_err();
    assert!(format!("{err:#}").contains("Config file not found"));
}

#[test]
fn test_run_app_bad_input_list_keeps_previous_report() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let out = tempdir().unwrap();
    let config = out.path().join("config.toml");
    fs::write(&config, "").unwrap();
    let report = out.path().join("report.txt");
    fs::write(&report, "/old/b\n/old/a\n").unwrap();
    let list = out.path().join("no_such_list.txt");

    let cli = Cli::try_parse_from([
        "dupelink",
        "-q",
        "--config",
        config.to_str().unwrap(),
        "-o",
        report.to_str().unwrap(),
        "-l",
        list.to_str().unwrap(),
    ])
    .unwrap();

    let err = dupelink::run_app(cli).unwrap_err();
    assert!(format!("{err:#}").contains("Cannot read path list"));
    assert_eq!(fs::read_to_string(&report).unwrap(), "/old/b\n/old/a\n");
}
