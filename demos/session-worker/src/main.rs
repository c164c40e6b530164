//! Runnable demo: a session worker over the in-memory store and queue.
//!
//! Seeds one device with a registered tokencard binding, starts the
//! worker, publishes a handful of session requests (one good, one for an
//! unknown application, one expired), and prints each outcome.
//!
//! ```text
//! RUST_LOG=tokengate=debug cargo run -p session-worker
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Value, json};
use tokengate::{SessionWorker, WorkerConfig};
use tokengate_bus::{MemoryQueue, memory_queue};
use tokengate_protocol::{AppId, now_ms};
use tokengate_store::{AppBinding, Device, MemoryStore, STATUS_REGISTERED};

const DEVICE: &str = "thermostat-17";
const CARD: &str = "card-0042";

async fn seed(store: &MemoryStore) {
    store
        .insert_device(Device {
            id: DEVICE.into(),
            apps: Some(HashMap::from([(
                CARD.into(),
                AppBinding {
                    status: Some(STATUS_REGISTERED.into()),
                    session: None,
                },
            )])),
        })
        .await;
    store
        .insert_application(
            &AppId(CARD.into()),
            json!({
                "name": "home-thermostat",
                "version": { "major": 2, "minor": 1 }
            }),
        )
        .await;
}

fn request(card: &str, timestamp: u64, ttl: u64) -> Value {
    json!({
        "header": {
            "requestId": format!("req-{timestamp}"),
            "deviceId": DEVICE,
            "type": "session",
            "timestamp": timestamp,
            "ttl": ttl,
            "encryption": { "method": "aes-256-gcm", "tokencardId": card }
        },
        "body": { "timeout": 3600 }
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tokengate=info".into()),
        )
        .init();

    let store = Arc::new(MemoryStore::new());
    seed(&store).await;

    let (publisher, queue) = memory_queue();
    let worker = SessionWorker::<MemoryStore, MemoryQueue>::builder()
        .config(WorkerConfig {
            server_name: "demo-host".into(),
            ..Default::default()
        })
        .build(Arc::clone(&store), queue);
    let worker = tokio::spawn(worker.run());

    let requests = [
        ("well-formed request", request(CARD, now_ms(), 0)),
        ("unknown tokencard", request("card-9999", now_ms(), 0)),
        ("expired request", request(CARD, now_ms() - 120_000, 60)),
    ];
    for (label, body) in requests {
        let outcome = publisher.publish(serde_json::to_vec(&body)?);
        let reply: Value = serde_json::from_slice(&outcome.await?)?;
        println!("{label}: {reply}");
    }

    println!("\naction records written:");
    for action in store.actions().await {
        println!("  {}", serde_json::to_string(&action)?);
    }

    // Closing the publisher drains the queue and stops the worker.
    drop(publisher);
    worker.await??;
    Ok(())
}
