use clap::Parser;
use dupcull::cli::Cli;
use dupcull::config::{Config, ConfigError};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use std::sync::Mutex;
use tempfile::tempdir;

// Environment variables are process-wide
static ENV_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_config_load_defaults() {
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();
    assert_eq!(config.sample_size, 1 << 20);
    assert_eq!(config.queue_depth, 2);
    assert_eq!(config.max_workers, None);
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        "sample_size = 4096\nsmall_file_workers = 6\nmax_workers = 3\n",
    )
    .unwrap();

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .extract()
        .unwrap();

    assert_eq!(config.sample_size, 4096);
    assert_eq!(config.small_file_workers, 6);
    assert_eq!(config.max_workers, Some(3));
    // Untouched keys keep their defaults
    assert_eq!(config.large_file_workers, 2);
}

#[test]
fn test_env_overrides_file() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "sample_size = 4096\nqueue_depth = 8\n").unwrap();

    std::env::set_var("DUPCULL_SAMPLE_SIZE", "65536");
    let config = Config::load_from_path(Some(&config_path));
    std::env::remove_var("DUPCULL_SAMPLE_SIZE");

    let config = config.unwrap();
    assert_eq!(config.sample_size, 65536);
    assert_eq!(config.queue_depth, 8);
}

#[test]
fn test_cli_overrides_everything() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "sample_size = 4096\nmax_workers = 16\n").unwrap();

    std::env::set_var("DUPCULL_MAX_WORKERS", "12");
    let cli = Cli::try_parse_from([
        "dupcull",
        "--config",
        config_path.to_str().unwrap(),
        "--sample-size",
        "8KiB",
        "--max-workers",
        "2",
        "/data",
    ])
    .unwrap();
    let config = Config::load(&cli);
    std::env::remove_var("DUPCULL_MAX_WORKERS");

    let config = config.unwrap();
    assert_eq!(config.sample_size, 8192);
    assert_eq!(config.max_workers, Some(2));
    assert_eq!(config.to_finder_config().tiers.max_workers, 2);
}

#[test]
fn test_missing_explicit_config_file() {
    let temp_dir = tempdir().unwrap();
    let missing = temp_dir.path().join("absent.toml");
    let cli =
        Cli::try_parse_from(["dupcull", "--config", missing.to_str().unwrap(), "/data"]).unwrap();

    assert!(matches!(Config::load(&cli), Err(ConfigError::NotFound(p)) if p == missing));
}

#[test]
fn test_invalid_toml_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "invalid = toml").unwrap();

    let result: Result<Config, _> = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .extract();
    assert!(result.is_err());
}

#[test]
fn test_wrong_type_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "sample_size = \"big\"\n").unwrap();

    let result: Result<Config, _> = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .merge(Env::prefixed("DUPCULL_TEST_UNUSED_").split("__"))
        .extract();
    assert!(result.is_err());
}

#[test]
fn test_config_toml_roundtrip() {
    let config = Config {
        sample_size: 1 << 16,
        max_workers: Some(5),
        ..Config::default()
    };
    let text = config.to_toml().unwrap();
    assert!(text.contains("sample_size = 65536"));

    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, text).unwrap();
    let loaded: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .extract()
        .unwrap();
    assert_eq!(loaded, config);
}
