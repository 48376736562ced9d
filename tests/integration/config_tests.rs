use clap::Parser;
use dupelink::cli::Cli;
use dupelink::config::{Config, ConfigError, ENV_PREFIX};
use dupelink::scanner::{CandidateSource, HashAlgorithm};
use figment::providers::Serialized;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::tempdir;

/// Serializes tests that read or write `DUPELINK_*` variables.
pub(super) static ENV_MUTEX: Mutex<()> = Mutex::new(());

pub(super) fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with(ENV_PREFIX) {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let figment = figment::Figment::from(Serialized::defaults(Config::default()));
    let config: Config = figment.extract().unwrap();
    assert_eq!(config.min_size, 4096);
    assert_eq!(config.max_size, 650 * 1024 * 1024);
    assert_eq!(config.hash, HashAlgorithm::Xxh3);
    assert_eq!(config.workers, 0);
    assert!(!config.link);
}

#[test]
fn test_config_load_from_toml() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let toml_content = r#"
paths = ["/srv/data", "/srv/backup"]
min_size = 1
max_size = 0
ignore = '\.tmp$'
hash = "blake3"
workers = 6
queue_capacity = 32
skip_hidden = true
link = true
"#;
    fs::write(&config_path, toml_content).unwrap();

    let config = Config::load_from_path(&config_path, None);

    assert_eq!(
        config.paths,
        vec![PathBuf::from("/srv/data"), PathBuf::from("/srv/backup")]
    );
    assert_eq!(config.min_size, 1);
    assert_eq!(config.max_size, 0);
    assert_eq!(config.ignore.as_deref(), Some(r"\.tmp$"));
    assert_eq!(config.hash, HashAlgorithm::Blake3);
    assert_eq!(config.worker_count(), 6);
    assert_eq!(config.queue_capacity, 32);
    assert!(config.skip_hidden);
    assert!(config.link);

    let walker = config.walker_config().unwrap();
    assert_eq!(walker.max_size, None);
    assert!(walker.is_ignored(std::path::Path::new("/x/y.tmp")));
}

#[test]
fn test_config_load_from_env() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    std::env::set_var("DUPELINK_MIN_SIZE", "123");
    std::env::set_var("DUPELINK_HASH", "blake3");
    std::env::set_var("DUPELINK_SILENT", "true");

    let temp_dir = tempdir().unwrap();
    let config = Config::load_from_path(temp_dir.path().join("absent.toml"), None);

    assert_eq!(config.min_size, 123);
    assert_eq!(config.hash, HashAlgorithm::Blake3);
    assert!(config.silent);

    clear_env();
}

#[test]
fn test_env_overrides_file() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "min_size = 10\nworkers = 2\n").unwrap();
    std::env::set_var("DUPELINK_WORKERS", "9");

    let config = Config::load_from_path(&config_path, None);

    assert_eq!(config.min_size, 10);
    assert_eq!(config.workers, 9);

    clear_env();
}

#[test]
fn test_cli_overrides_file_and_env() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        "paths = [\"/from/file\"]\nmin_size = 10\nhash = \"blake3\"\n",
    )
    .unwrap();
    std::env::set_var("DUPELINK_MIN_SIZE", "20");

    let mut config = Config::load_from_path(&config_path, None);
    let cli = Cli::try_parse_from([
        "dupelink",
        "--min-size",
        "30",
        "--hash",
        "xxh3",
        "/from/cli",
    ])
    .unwrap();
    config.merge_cli(&cli);

    assert_eq!(config.min_size, 30);
    assert_eq!(config.hash, HashAlgorithm::Xxh3);
    assert_eq!(
        config.candidate_source(),
        CandidateSource::Roots(vec![PathBuf::from("/from/cli")])
    );

    clear_env();
}

#[test]
fn test_invalid_toml_falls_back_to_defaults() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "min_size = \"not a number\"\n").unwrap();

    let config = Config::load_from_path(&config_path, None);

    assert_eq!(config.min_size, 4096);
}

#[test]
fn test_explicit_missing_config_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let missing = temp_dir.path().join("nope.toml");

    let err = Config::load(Some(&missing), None).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(ref p) if p == &missing));
    assert!(err.to_string().contains("not found"));
}

#[test]
fn test_config_rejects_report_with_link() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "link = true\n").unwrap();

    let mut config = Config::load_from_path(&config_path, None);
    let cli = Cli::try_parse_from(["dupelink", "-o", "report.txt"]).unwrap();
    config.merge_cli(&cli);

    assert!(matches!(
        config.validate(),
        Err(ConfigError::ReportWithActions)
    ));
}

#[test]
fn test_config_interactive_silent_is_not_destructive() {
    let config = Config {
        interactive: true,
        silent: true,
        output: Some(PathBuf::from("report.txt")),
        ..Config::default()
    };
    assert!(config.validate().is_ok());
    assert!(!config.resolve_config().unwrap().is_destructive());
}
