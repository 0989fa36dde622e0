//! Integration tests for configuration loading and lifecycle events.

#![allow(unsafe_code)] // For env var manipulation in tests

use configloader::prelude::*;
use configloader::sources::ConfigSource;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::time::Duration;
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize, Clone, PartialEq)]
struct ServerConfig {
    port: u16,
    host: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
struct AppConfig {
    server: ServerConfig,
}

fn write_config(path: &Path, port: u16) {
    fs::write(
        path,
        format!("server:\n  port: {}\n  host: localhost\n", port),
    )
    .unwrap();
}

fn port_validator(config: &AppConfig) -> std::result::Result<(), ValidationError> {
    if config.server.port < 1024 {
        return Err(ValidationError::invalid_field(
            "server.port",
            "must be >= 1024",
        ));
    }
    Ok(())
}

/// Source whose port can be changed, or made to fail, between refreshes.
#[derive(Clone)]
struct SwitchableSource {
    port: Arc<parking_lot::Mutex<i64>>,
    broken: Arc<AtomicBool>,
}

impl SwitchableSource {
    fn new(port: i64) -> Self {
        Self {
            port: Arc::new(parking_lot::Mutex::new(port)),
            broken: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl ConfigSource for SwitchableSource {
    fn load(&self) -> Result<HashMap<String, config::Value>> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(ConfigError::LoadError("upstream unavailable".to_string()));
        }
        let mut values = HashMap::new();
        values.insert("server.port".to_string(), config::Value::from(*self.port.lock()));
        values.insert("server.host".to_string(), config::Value::from("switchable"));
        Ok(values)
    }

    fn name(&self) -> String {
        "switchable".to_string()
    }
}

#[test]
fn test_init_reaches_both_subscribers() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    write_config(&config_path, 8080);

    let registry = SubscriberRegistry::new();
    let config = ConfigHandle::builder()
        .with_file(&config_path)
        .with_registry(registry.clone())
        .build::<AppConfig>()
        .unwrap();

    let (over1, done1) = mpsc::channel();
    let (over2, done2) = mpsc::channel();
    let id1 = registry
        .subscribe(move |event| {
            over1.send(event.clone())?;
            Ok(())
        })
        .unwrap();
    let id2 = registry
        .subscribe(move |event| {
            over2.send(event.clone())?;
            Ok(())
        })
        .unwrap();
    assert_ne!(id1, id2);

    config.init();

    let got1 = done1.recv_timeout(TIMEOUT).unwrap();
    let got2 = done2.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(got1.kind(), EventKind::Inited);
    assert_eq!(got2.kind(), EventKind::Inited);
    assert_eq!(got1.data::<AppConfig>().unwrap().server.port, 8080);
    assert!(done1.try_recv().is_err());
    assert!(done2.try_recv().is_err());
}

#[test]
fn test_refresh_picks_up_file_changes() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    write_config(&config_path, 8080);

    let config = ConfigHandle::builder()
        .with_file(&config_path)
        .build::<AppConfig>()
        .unwrap();

    let (tx, rx) = mpsc::channel();
    config
        .subscribe(move |event| {
            let port = event.data::<AppConfig>().map(|cfg| cfg.server.port);
            tx.send((event.kind(), port))?;
            Ok(())
        })
        .unwrap();

    write_config(&config_path, 9090);
    config.refresh().unwrap();

    assert_eq!(
        rx.recv_timeout(TIMEOUT).unwrap(),
        (EventKind::Refreshed, Some(9090))
    );
    assert!(rx.try_recv().is_err());
    assert_eq!(config.get().server.port, 9090);
}

#[test]
fn test_failed_refresh_emits_nothing() {
    let source = SwitchableSource::new(8080);
    let config = ConfigHandle::builder()
        .with_source(source.clone())
        .build::<AppConfig>()
        .unwrap();

    let (tx, rx) = mpsc::channel();
    config
        .subscribe(move |event| {
            tx.send(event.kind())?;
            Ok(())
        })
        .unwrap();

    source.broken.store(true, Ordering::SeqCst);
    let err = config.refresh().unwrap_err();
    assert!(err.is_reload_error());
    assert!(err.to_string().contains("upstream unavailable"));
    assert!(rx.try_recv().is_err());
    assert_eq!(config.get().server.port, 8080);

    source.broken.store(false, Ordering::SeqCst);
    *source.port.lock() = 8181;
    config.refresh().unwrap();
    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), EventKind::Refreshed);
    assert_eq!(config.get().server.port, 8181);
}

#[test]
fn test_malformed_file_fails_refresh() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    write_config(&config_path, 8080);

    let config = ConfigHandle::builder()
        .with_file(&config_path)
        .build::<AppConfig>()
        .unwrap();

    let (tx, rx) = mpsc::channel();
    config
        .subscribe(move |event| {
            tx.send(event.kind())?;
            Ok(())
        })
        .unwrap();

    fs::write(&config_path, "server:\n  port: not-a-port\n").unwrap();
    assert!(config.refresh().is_err());
    assert!(rx.try_recv().is_err());
    assert_eq!(config.get().server.port, 8080);
}

#[test]
fn test_validation_on_build() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    write_config(&config_path, 80);

    let result = ConfigHandle::builder()
        .with_file(&config_path)
        .with_validation(port_validator)
        .build::<AppConfig>();

    let err = result.err().unwrap();
    assert!(err.to_string().contains("Configuration validation failed"));
}

#[test]
fn test_invalid_refresh_emits_nothing() {
    let source = SwitchableSource::new(8080);
    let config = ConfigHandle::builder()
        .with_source(source.clone())
        .with_validation(port_validator)
        .build::<AppConfig>()
        .unwrap();

    let (tx, rx) = mpsc::channel();
    config
        .subscribe(move |event| {
            tx.send(event.kind())?;
            Ok(())
        })
        .unwrap();

    *source.port.lock() = 443;
    let err = config.refresh().unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
    assert!(rx.try_recv().is_err());
    assert_eq!(config.get().server.port, 8080);
}

#[cfg(feature = "validation")]
impl Validate for AppConfig {
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        port_validator(self)
    }
}

#[cfg(feature = "validation")]
#[test]
fn test_validate_trait() {
    let source = SwitchableSource::new(22);
    let result = ConfigHandle::builder()
        .with_source(source)
        .with_validate::<AppConfig>()
        .build::<AppConfig>();
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));
}

#[test]
fn test_env_overrides_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    write_config(&config_path, 8080);

    unsafe {
        env::set_var("CONFIGLOADER_IT_SERVER__PORT", "9999");
    }

    let config = ConfigHandle::builder()
        .with_file(&config_path)
        .with_env_overrides("CONFIGLOADER_IT", "__")
        .build::<AppConfig>()
        .unwrap();

    unsafe {
        env::remove_var("CONFIGLOADER_IT_SERVER__PORT");
    }

    assert_eq!(config.get().server.port, 9999);
    assert_eq!(config.get().server.host, "localhost");
}

#[test]
fn test_failing_subscriber_does_not_fail_refresh() {
    let source = SwitchableSource::new(8080);
    let config = ConfigHandle::builder()
        .with_source(source.clone())
        .build::<AppConfig>()
        .unwrap();

    config.subscribe(|_| Err("cache rebuild failed".into())).unwrap();
    config
        .subscribe(|_| -> HandlerResult { panic!("subscriber bug") })
        .unwrap();
    let (tx, rx) = mpsc::channel();
    config
        .subscribe(move |event| {
            tx.send(event.kind())?;
            Ok(())
        })
        .unwrap();

    *source.port.lock() = 9000;
    config.refresh().unwrap();
    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), EventKind::Refreshed);
    assert_eq!(config.registry().subscriber_count(), 3);
}

#[test]
fn test_unsubscribed_handler_hears_nothing_more() {
    let config = ConfigHandle::new(1u32);
    let (tx, rx) = mpsc::channel();
    let id = config
        .subscribe(move |event| {
            tx.send(*event.data::<u32>().unwrap())?;
            Ok(())
        })
        .unwrap();

    config.update(2).unwrap();
    config.unsubscribe(id).unwrap();
    config.update(3).unwrap();

    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), 2);
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    assert!(matches!(
        config.unsubscribe(id),
        Err(ConfigError::SubscriberNotFound(_))
    ));
}

#[test]
fn test_ids_are_not_shared_between_registries() {
    let first = SubscriberRegistry::new();
    let second = SubscriberRegistry::new();

    let id = first.subscribe(|_| Ok(())).unwrap();
    assert!(matches!(
        second.unsubscribe(id),
        Err(ConfigError::SubscriberNotFound(missing)) if missing == id
    ));
    assert!(first.is_subscribed(id));
    assert_eq!(second.subscriber_count(), 0);
}

#[test]
fn test_handles_share_injected_registry() {
    let registry = SubscriberRegistry::new();
    let database = ConfigHandle::with_registry(String::from("postgres://db"), registry.clone());
    let limits = ConfigHandle::with_registry(100usize, registry.clone());

    let (tx, rx) = mpsc::channel();
    registry
        .subscribe(move |event| {
            let label = if event.data::<String>().is_some() {
                "database"
            } else if event.data::<usize>().is_some() {
                "limits"
            } else {
                "unknown"
            };
            tx.send(label)?;
            Ok(())
        })
        .unwrap();

    database.init();
    limits.init();

    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), "database");
    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), "limits");
}
