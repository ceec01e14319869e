use std::env;
use std::fs;

use clap::Parser;
use serial_test::serial;
use tempfile::TempDir;

use super::{Cli, Role, Settings, load_config, load_with_cli};
use crate::utils::Error;

#[test]
fn test_default_settings() {
    let settings = Settings::for_role(Role::Publisher);
    assert_eq!(settings.broker.host, "test.mosquitto.org");
    assert_eq!(settings.broker.port, 1883);
    assert_eq!(settings.broker.client_id, "mqtt-rp-pir-pub");
    assert_eq!(settings.topic.name, "mqtt-rp-pir");
    assert_eq!(settings.topic.qos, 0);
    assert_eq!(settings.sensor.pin, 7);
    assert_eq!(settings.sensor.poll_interval_ms, 1000);
    assert_eq!(settings.shutdown.quiesce_ms, 1000);

    let sub = Settings::for_role(Role::Subscriber);
    assert_eq!(sub.broker.client_id, "mqtt-rp-pir-sub");
    assert_eq!(sub.broker.uri(), "tcp://test.mosquitto.org:1883");
}

#[test]
fn credentials_need_both_halves() {
    let mut settings = Settings::for_role(Role::Publisher);
    assert_eq!(settings.broker.credentials(), None);

    settings.broker.username = Some("pi".to_string());
    assert_eq!(settings.broker.credentials(), None);

    settings.broker.password = Some(String::new());
    assert_eq!(settings.broker.credentials(), None);

    settings.broker.password = Some("secret".to_string());
    assert_eq!(settings.broker.credentials(), Some(("pi", "secret")));
}

#[test]
#[serial]
fn load_config_from_file_overrides_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let orig = env::current_dir().expect("current_dir");
    env::set_current_dir(tmp.path()).expect("set current dir");

    fs::create_dir_all("config").expect("create config dir");
    let toml = r#"
        [broker]
        host = "broker.lan"
        port = 1884

        [topic]
        name = "hall/pir"
        qos = 1

        [sensor]
        pin = 17
    "#;
    fs::write("config/default.toml", toml).expect("write config file");

    let cfg = load_config(Role::Publisher, None);
    env::set_current_dir(orig).expect("restore cwd");

    let cfg = cfg.expect("load_config failed");
    assert_eq!(cfg.broker.host, "broker.lan");
    assert_eq!(cfg.broker.port, 1884);
    assert_eq!(cfg.broker.client_id, "mqtt-rp-pir-pub");
    assert_eq!(cfg.topic.name, "hall/pir");
    assert_eq!(cfg.topic.qos, 1);
    assert_eq!(cfg.sensor.pin, 17);
    assert_eq!(cfg.sensor.poll_interval_ms, 1000);
}

#[test]
#[serial]
fn environment_overrides_file() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("pir.toml");
    fs::write(&path, "[broker]\nhost = \"from-file\"\nport = 1999\n").expect("write config");

    let cfg = temp_env::with_vars(
        [
            ("PIR_BROKER__HOST", Some("from-env")),
            ("PIR_SHUTDOWN__ACK_TIMEOUT_MS", Some("2500")),
        ],
        || load_config(Role::Subscriber, Some(&path)),
    )
    .expect("load_config failed");

    assert_eq!(cfg.broker.host, "from-env");
    assert_eq!(cfg.broker.port, 1999);
    assert_eq!(cfg.shutdown.ack_timeout_ms, 2500);
}

#[test]
#[serial]
fn invalid_qos_in_file_is_rejected() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("pir.toml");
    fs::write(&path, "[topic]\nqos = 3\n").expect("write config");

    let err = load_config(Role::Publisher, Some(&path)).unwrap_err();
    assert!(matches!(err, Error::InvalidQos(3)));
}

#[test]
#[serial]
fn zero_poll_interval_is_rejected() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("pir.toml");
    fs::write(&path, "[sensor]\npoll_interval_ms = 0\n").expect("write config");

    let err = load_config(Role::Publisher, Some(&path)).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidSetting {
            key: "sensor.poll_interval_ms",
            ..
        }
    ));
}

#[test]
#[serial]
fn zero_ack_timeout_from_environment_is_rejected() {
    let err = temp_env::with_var("PIR_SHUTDOWN__ACK_TIMEOUT_MS", Some("0"), || {
        load_config(Role::Subscriber, None)
    })
    .unwrap_err();

    assert!(matches!(
        err,
        Error::InvalidSetting {
            key: "shutdown.ack_timeout_ms",
            ..
        }
    ));
}

#[test]
#[serial]
fn missing_explicit_file_is_an_error() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("absent.toml");

    let err = load_config(Role::Publisher, Some(&path)).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
#[serial]
fn command_line_wins() {
    let cli = Cli::try_parse_from([
        "pir-pub", "-h", "10.0.0.5", "-p", "8883", "-c", "porch", "-u", "pi", "--pw", "secret",
        "-t", "porch/pir", "-q", "2",
    ])
    .expect("parse flags");

    let cfg = temp_env::with_var("PIR_BROKER__HOST", Some("from-env"), || {
        load_with_cli(Role::Publisher, &cli)
    })
    .expect("load settings");

    assert_eq!(cfg.broker.host, "10.0.0.5");
    assert_eq!(cfg.broker.port, 8883);
    assert_eq!(cfg.broker.client_id, "porch");
    assert_eq!(cfg.broker.credentials(), Some(("pi", "secret")));
    assert_eq!(cfg.topic.name, "porch/pir");
    assert_eq!(cfg.topic.qos, 2);
}

#[test]
fn qos_flag_is_range_checked() {
    assert!(Cli::try_parse_from(["pir-sub", "-q", "3"]).is_err());
}

#[test]
fn log_level_defaults_to_info() {
    let cli = Cli::try_parse_from(["pir-sub"]).expect("parse flags");
    assert_eq!(cli.log_level, "info");
    assert!(cli.host.is_none());
}
