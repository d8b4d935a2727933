use buildnotify::cli::Cli;
use buildnotify::config::{Config, RoomConfig};
use buildnotify::core::RoomToken;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

#[test]
fn test_load_full_valid_config() {
    let file = config_file(
        r#"
        log_level = "debug"
        token_files = ["/etc/buildnotify/tokens.toml"]
        [publisher]
        api_base_url = "https://chat.example.com/v1"
        timeout_seconds = 3
        [tokens]
        TEAM = "platform"
        [[rooms]]
        name = "devops"
        room_id = "R1"
        token = "T1"
        [[rooms]]
        name = "release"
        room_id = "R2"
        token = "T2"
    "#,
    );

    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };

    let config = Config::load(&cli).unwrap();

    assert_eq!(config.log_level, "debug");
    assert_eq!(config.publisher.api_base_url, "https://chat.example.com/v1");
    assert_eq!(config.publisher.timeout_seconds, 3);
    assert_eq!(config.tokens.get("TEAM").map(String::as_str), Some("platform"));
    assert_eq!(config.token_files, vec![PathBuf::from("/etc/buildnotify/tokens.toml")]);
    assert_eq!(
        config.rooms[1],
        RoomConfig {
            name: "release".to_string(),
            room_id: "R2".to_string(),
            token: RoomToken::new("T2"),
        }
    );

    let rooms = config.rooms();
    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms[0].name(), "devops");
    assert_eq!(rooms[0].token().expose_secret(), "T1");
}

#[test]
fn test_load_default_values() {
    let file = config_file("");

    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };

    let config = Config::load(&cli).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_cli_overrides_file() {
    let file = config_file(
        r#"
        log_level = "debug"
        [publisher]
        api_base_url = "https://chat.example.com/v1"
        timeout_seconds = 3
    "#,
    );

    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        log_level: Some("warn".to_string()),
        api_base_url: Some("http://localhost:9000".to_string()),
        ..Default::default()
    };

    let config = Config::load(&cli).unwrap();
    assert_eq!(config.log_level, "warn");
    assert_eq!(config.publisher.api_base_url, "http://localhost:9000");
    assert_eq!(config.publisher.timeout_seconds, 3);
}

#[test]
fn test_invalid_value_type() {
    let file = config_file(
        r#"
        [publisher]
        timeout_seconds = "ten"
    "#,
    );

    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };

    assert!(Config::load(&cli).is_err());
}

#[test]
fn test_load_rooms_only() {
    let file = config_file(
        r#"
        log_level = "trace"
        [[rooms]]
        name = "ops"
        room_id = "R5"
        token = "T5"
    "#,
    );

    let rooms = Config::load_rooms(file.path()).unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].room_id(), "R5");
}
