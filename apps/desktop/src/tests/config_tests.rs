use super::{apply_env, apply_file, load_settings, Settings};

use std::{collections::HashMap, fs};

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        r#"
api_url = "https://school.example.org"
student_id = "65a1f0"
standard = 8
"#,
    )
    .expect("parse");

    assert_eq!(settings.api_url, "https://school.example.org");
    assert_eq!(settings.student_id.as_deref(), Some("65a1f0"));
    assert_eq!(settings.standard, Some(8));
    assert_eq!(settings.notice_delay_ms, 3_000);
}

#[test]
fn prefixed_env_wins_over_plain_env() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        env_of(&[
            ("API_URL", "http://plain"),
            ("APP__API_URL", "http://prefixed"),
            ("STUDENT_ID", "s-plain"),
            ("APP__STANDARD", " 10 "),
            ("APP__NOTICE_DELAY_MS", "250"),
        ]),
    );

    assert_eq!(settings.api_url, "http://prefixed");
    assert_eq!(settings.student_id.as_deref(), Some("s-plain"));
    assert_eq!(settings.standard, Some(10));
    assert_eq!(settings.notice_delay().as_millis(), 250);
}

#[test]
fn malformed_numbers_in_env_are_ignored() {
    let mut settings = Settings::default();
    apply_env(&mut settings, env_of(&[("APP__STANDARD", "eighth")]));
    assert_eq!(settings.standard, None);
}

#[test]
fn explicit_config_file_must_exist_and_parse() {
    let dir = tempfile::tempdir().expect("tempdir");

    let missing = dir.path().join("absent.toml");
    assert!(load_settings(Some(&missing)).is_err());

    let broken = dir.path().join("broken.toml");
    fs::write(&broken, "standard = \"not a number\"").expect("write");
    let err = load_settings(Some(&broken)).expect_err("invalid");
    assert!(err.to_string().contains("broken.toml"), "{err}");

    let good = dir.path().join("good.toml");
    fs::write(&good, "notice_delay_ms = 10").expect("write");
    assert!(load_settings(Some(&good)).is_ok());
}
