//! Example demonstrating lifecycle event subscriptions.
//!
//! This example shows how to:
//! - Subscribe independent observers to one registry
//! - Receive the configuration snapshot with each event
//! - Keep going when an observer fails
//! - Unsubscribe by id
//!
//! Run with: RUST_LOG=configloader=debug cargo run --example subscribers

use configloader::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize, Clone)]
struct AppConfig {
    port: u16,
    feature_flags: FeatureFlags,
}

#[derive(Debug, Deserialize, Clone)]
struct FeatureFlags {
    new_ui: bool,
    beta_features: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Lifecycle Event Example ===\n");

    let registry = SubscriberRegistry::new();
    let config = ConfigHandle::with_registry(
        AppConfig {
            port: 8080,
            feature_flags: FeatureFlags {
                new_ui: false,
                beta_features: false,
            },
        },
        registry.clone(),
    );

    let notifications = Arc::new(AtomicUsize::new(0));

    let notifications_clone = Arc::clone(&notifications);
    let logger = registry.subscribe(move |event| {
        let count = notifications_clone.fetch_add(1, Ordering::SeqCst) + 1;
        println!("[Logger] {} event (notification #{})", event.kind(), count);
        Ok(())
    })?;

    registry.subscribe(|event| {
        if let Some(cfg) = event.data::<AppConfig>() {
            println!(
                "[Flags] new_ui={}, beta_features={}",
                cfg.feature_flags.new_ui, cfg.feature_flags.beta_features
            );
        }
        Ok(())
    })?;

    registry.subscribe(|event| match event.kind() {
        EventKind::Refreshed => Err("metrics backend offline".into()),
        _ => Ok(()),
    })?;

    println!("Subscribers: {}\n", registry.subscriber_count());

    config.init();

    println!("\nEnabling the new UI...\n");
    config.update(AppConfig {
        port: 8080,
        feature_flags: FeatureFlags {
            new_ui: true,
            beta_features: false,
        },
    })?;

    println!("\nRemoving the logger...\n");
    registry.unsubscribe(logger)?;

    config.update(AppConfig {
        port: 9090,
        feature_flags: FeatureFlags {
            new_ui: true,
            beta_features: true,
        },
    })?;

    println!(
        "\nLogger saw {} notifications; current port {}",
        notifications.load(Ordering::SeqCst),
        config.get().port
    );

    if let Err(err) = registry.unsubscribe(logger) {
        println!("Second unsubscribe rejected: {}", err);
    }

    Ok(())
}
