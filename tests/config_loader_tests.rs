use peopleops::config::{ConfigError, ConfigLoader};
use std::{
    env, fs,
    path::PathBuf,
    sync::{Mutex, MutexGuard, OnceLock},
};
use tempfile::TempDir;

const KEYS: &[&str] = &[
    "PEOPLEOPS_PROFILE",
    "PEOPLEOPS_API_BIND_ADDR",
    "PEOPLEOPS_LOG_LEVEL",
    "PEOPLEOPS_OPERATOR_TOKEN",
    "PEOPLEOPS_OPERATOR_TOKENS",
    "PEOPLEOPS_SLACK_SIGNING_SECRET",
    "PEOPLEOPS_SLACK_CHECK_IN_KEYWORDS",
    "PEOPLEOPS_SLACK_CHECK_OUT_KEYWORDS",
    "PEOPLEOPS_ATTENDANCE_UTC_OFFSET_MINUTES",
    "PEOPLEOPS_ATTENDANCE_STANDARD_HOURS",
];

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn env_guard() -> MutexGuard<'static, ()> {
    env_lock()
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

fn clear_env() {
    for key in KEYS {
        unsafe {
            env::remove_var(key);
        }
    }
}

fn write_env_file(dir: &TempDir, name: &str, contents: &str) {
    let path = dir.path().join(name);
    fs::write(path, contents).unwrap();
}

fn loader_for(dir: &TempDir) -> ConfigLoader {
    ConfigLoader::with_base_dir(PathBuf::from(dir.path()))
}

#[test]
fn loads_defaults_with_only_an_operator_token() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "PEOPLEOPS_OPERATOR_TOKEN=local-token\n");

    let cfg = loader_for(&temp_dir).load().expect("config loads with defaults");

    assert_eq!(cfg.profile, "local");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:8080");
    assert_eq!(cfg.operator_tokens, vec!["local-token".to_string()]);
    assert_eq!(cfg.slack.tolerance_seconds, 300);
    assert_eq!(cfg.attendance.utc_offset_minutes, 0);
    assert_eq!(cfg.attendance.standard_hours, 8.0);
    assert!(cfg.slack.check_in_keywords.contains(&"good morning".to_string()));
    cfg.bind_addr().expect("default bind addr parses");
    clear_env();
}

#[test]
fn layered_env_files_apply_in_order() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "PEOPLEOPS_API_BIND_ADDR=127.0.0.1:3000\n");
    write_env_file(
        &temp_dir,
        ".env.test",
        "PEOPLEOPS_API_BIND_ADDR=192.168.0.10:5000\nPEOPLEOPS_ATTENDANCE_UTC_OFFSET_MINUTES=330\n",
    );
    write_env_file(
        &temp_dir,
        ".env.test.local",
        "PEOPLEOPS_API_BIND_ADDR=10.0.0.5:6000\n",
    );

    // Select profile via .env.local before profile-specific files load.
    write_env_file(
        &temp_dir,
        ".env.local",
        "PEOPLEOPS_PROFILE=test\nPEOPLEOPS_API_BIND_ADDR=127.0.0.1:4000\nPEOPLEOPS_OPERATOR_TOKEN=layered-token\n",
    );

    let cfg = loader_for(&temp_dir)
        .load()
        .expect("config loads with layered env files");

    assert_eq!(cfg.profile, "test");
    assert_eq!(cfg.api_bind_addr, "10.0.0.5:6000");
    assert_eq!(cfg.attendance.utc_offset_minutes, 330);
    clear_env();
}

#[test]
fn os_environment_has_highest_precedence() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "PEOPLEOPS_API_BIND_ADDR=127.0.0.1:3000\nPEOPLEOPS_OPERATOR_TOKEN=file-token\n",
    );

    unsafe {
        env::set_var("PEOPLEOPS_API_BIND_ADDR", "0.0.0.0:9090");
        env::set_var("PEOPLEOPS_OPERATOR_TOKENS", "one, two");
    }

    let cfg = loader_for(&temp_dir)
        .load()
        .expect("config loads with env override");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:9090");
    assert_eq!(cfg.operator_tokens, vec!["one".to_string(), "two".to_string()]);

    clear_env();
}

#[test]
fn keyword_lists_are_configurable() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        concat!(
            "PEOPLEOPS_OPERATOR_TOKEN=t\n",
            "PEOPLEOPS_SLACK_CHECK_IN_KEYWORDS=\"Namaste, Online\"\n",
            "PEOPLEOPS_SLACK_CHECK_OUT_KEYWORDS=\"Signing Off, good night ,\"\n",
        ),
    );

    let cfg = loader_for(&temp_dir).load().expect("config loads");
    assert_eq!(
        cfg.slack.check_in_keywords,
        vec!["namaste".to_string(), "online".to_string()]
    );
    assert_eq!(
        cfg.slack.check_out_keywords,
        vec!["signing off".to_string(), "good night".to_string()]
    );
    clear_env();
}

#[test]
fn invalid_bind_addr_returns_error() {
    let _guard = env_guard();
    clear_env();

    unsafe {
        env::set_var("PEOPLEOPS_API_BIND_ADDR", "not-an-addr");
        env::set_var("PEOPLEOPS_OPERATOR_TOKEN", "t");
    }
    let temp_dir = TempDir::new().unwrap();
    let err = loader_for(&temp_dir)
        .load()
        .expect_err("invalid bind addr should fail");
    assert!(format!("{}", err).contains("invalid api bind address"));

    clear_env();
}

#[test]
fn missing_operator_token_is_rejected() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    let err = loader_for(&temp_dir)
        .load()
        .expect_err("operator token is required");
    assert!(matches!(err, ConfigError::MissingOperatorTokens));

    clear_env();
}

#[test]
fn unparsable_numbers_name_the_key() {
    let _guard = env_guard();
    clear_env();

    unsafe {
        env::set_var("PEOPLEOPS_OPERATOR_TOKEN", "t");
        env::set_var("PEOPLEOPS_ATTENDANCE_STANDARD_HOURS", "eight");
    }
    let temp_dir = TempDir::new().unwrap();
    let err = loader_for(&temp_dir)
        .load()
        .expect_err("non-numeric hours should fail");
    assert!(
        matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "PEOPLEOPS_ATTENDANCE_STANDARD_HOURS")
    );

    clear_env();
}
