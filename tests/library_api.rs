//! Library-level integration tests
//!
//! Exercise the public API the way an application would: load a file into
//! an injected environment, validate, read typed values and render.

use envguard::{
    EnvError, EnvGuard, LoadReport, MemoryEnv, ParseOptions, Renderer, StrSource, TypedValue,
};
use std::fs;
use tempfile::TempDir;

const APP_ENV: &str = r#"
# service settings
APP_NAME="Billing Service"
APP_PORT=9090
APP_DEBUG=false
APP_HOSTS=api.example.com,admin.example.com
APP_RETRIES=1,2,4,8
APP_LIMITS={"rps": 100, "burst": 20}
DB_USER=billing
DB_PASSWORD='p@ss w0rd!'
DB_URL=postgres://${DB_USER}@db:5432/billing
"#;

fn guard_with(content: &str) -> EnvGuard<MemoryEnv> {
    let mut guard = EnvGuard::new(MemoryEnv::new());
    guard.load(&StrSource::new(content)).unwrap();
    guard
}

#[test]
fn test_application_startup_flow() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".env");
    fs::write(&path, APP_ENV).unwrap();

    let mut guard = EnvGuard::new(MemoryEnv::new());
    let report = guard
        .load_file_with_validation(&path, &["APP_NAME", "APP_PORT", "DB_PASSWORD"])
        .unwrap();
    assert_eq!(report.loaded, 9);

    assert_eq!(guard.get_string("APP_NAME", "").unwrap(), "Billing Service");
    assert_eq!(guard.get_int("APP_PORT", 8080).unwrap(), 9090);
    assert!(!guard.get_bool("APP_DEBUG", true).unwrap());
    assert_eq!(
        guard.get_string_list("APP_HOSTS", vec![]).unwrap(),
        vec!["api.example.com", "admin.example.com"]
    );
    assert_eq!(guard.get_int_list("APP_RETRIES", vec![]).unwrap(), vec![1, 2, 4, 8]);

    let limits = guard.get_map("APP_LIMITS", Default::default()).unwrap();
    assert_eq!(limits.get("rps"), Some(&serde_json::json!(100)));

    assert_eq!(
        guard.resolve_placeholder("DB_URL").unwrap(),
        "postgres://billing@db:5432/billing"
    );

    guard.mark_sensitive(&["DB_PASSWORD"]).unwrap();
    let lines = guard.render_with(&Renderer::plain());
    assert!(lines.contains(&"DB_PASSWORD = p@******d!".to_string()));
    assert!(lines.contains(&"APP_PORT = 9090".to_string()));
}

#[test]
fn test_failed_validation_leaves_environment_untouched() {
    let mut guard = EnvGuard::new(MemoryEnv::new());
    let err = guard
        .load_with_validation(&StrSource::new(APP_ENV), &["APP_NAME", "APP_REGION"])
        .unwrap_err();

    assert_eq!(err, EnvError::missing_required_key("APP_REGION"));
    assert!(err.is_fatal());
    assert!(guard.env().is_empty());
    assert!(guard.registry().is_empty());
}

#[test]
fn test_precedence_between_load_and_overload() {
    let existing: MemoryEnv = [("APP_PORT", "7000")].into_iter().collect();
    let mut guard = EnvGuard::new(existing);

    let report = guard.load(&StrSource::new("APP_PORT=9090\nAPP_NAME=x")).unwrap();
    assert_eq!(
        report,
        LoadReport {
            loaded: 1,
            skipped_existing: 1,
            lines_skipped: 0,
        }
    );
    assert_eq!(guard.get_int("APP_PORT", 0).unwrap(), 7000);

    guard.overload(&StrSource::new("APP_PORT=9090")).unwrap();
    assert_eq!(guard.get_int("APP_PORT", 0).unwrap(), 9090);
}

#[test]
fn test_typed_errors_surface_to_caller() {
    let guard = guard_with("APP_PORT=ninety\nAPP_LIMITS=[1,2]\n");

    let err = guard.get_int("APP_PORT", 8080).unwrap_err();
    assert!(matches!(err, EnvError::TypeMismatch { .. }));
    assert_eq!(err.exit_code(), 3);

    let err = guard.get("APP_LIMITS", TypedValue::Map(Default::default())).unwrap_err();
    assert!(matches!(err, EnvError::JsonDecode(_)));
}

#[test]
fn test_inline_comments_can_be_disabled() {
    let mut guard = EnvGuard::new(MemoryEnv::new()).with_parse_options(ParseOptions {
        inline_comments: false,
    });
    guard.load(&StrSource::new("COLOR=blue # note")).unwrap();
    assert_eq!(guard.get_string("COLOR", "").unwrap(), "blue # note");
}

#[test]
fn test_reset_and_reload() {
    let mut guard = guard_with(APP_ENV);
    guard.mark_sensitive(&["DB_PASSWORD"]).unwrap();

    guard.reset().unwrap();
    assert!(guard.env().is_empty());
    assert!(guard.render_lines().is_empty());

    guard.load(&StrSource::new("DB_PASSWORD=hunter22")).unwrap();
    assert_eq!(guard.render_lines(), vec!["DB_PASSWORD = hunter22"]);
}
