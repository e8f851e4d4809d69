//! Inbound trigger listener over real HTTP

mod common;

use serde_json::{Value, json};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use common::{EventLog, FakeRunner, RecordingSink, wait_until};
use ratescrape::browser::ContextId;
use ratescrape::message_bus::{MessageBus, TriggerServer};
use ratescrape::queue::{JobQueue, QueueSettings};

struct Harness {
    base: String,
    bus: MessageBus,
    sink: RecordingSink,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Drop for Harness {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn start(allowed_origins: &[&str]) -> Harness {
    let runner = FakeRunner {
        log: EventLog::default(),
        work: Duration::from_millis(5),
        failing: Default::default(),
    };
    let sink = RecordingSink::default();
    let queue = JobQueue::new(
        runner,
        sink.clone(),
        QueueSettings {
            job_await_timeout: Duration::from_secs(5),
            inter_job_delay: Duration::from_millis(10),
        },
        None,
    );
    let bus = MessageBus::default();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let server = TriggerServer::new(
        queue,
        bus.clone(),
        allowed_origins.iter().map(|o| o.to_string()).collect(),
        &base,
    );

    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(server.serve(listener, async move {
        let _ = rx.await;
    }));

    Harness {
        base,
        bus,
        sink,
        shutdown: Some(tx),
    }
}

fn start_scrape_body() -> Value {
    json!({
        "jobs": [
            {"id": "j1", "url": "https://www.booking.com/hotel/in/a.html", "competitorId": "c1"},
            {"url": "www.agoda.com/b.html", "competitorId": "c2"}
        ],
        "token": "tok-1"
    })
}

#[tokio::test]
async fn test_scrape_is_acknowledged_and_drained() {
    let harness = start(&[]).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/scrape", harness.base))
        .json(&start_scrape_body())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let ack: Value = response.json().await.unwrap();
    assert_eq!(ack["status"], "QUEUED");
    assert!(ack["count"].as_u64().unwrap() >= 1);

    let sink = harness.sink.clone();
    wait_until(move || sink.batches.lock().len() == 2).await;
    assert_eq!(harness.sink.batches.lock()[0].1.as_deref(), Some("tok-1"));
}

#[tokio::test]
async fn test_tagged_start_scrape_message() {
    let harness = start(&[]).await;
    let mut body = start_scrape_body();
    body["type"] = json!("START_SCRAPE");

    let ack: Value = reqwest::Client::new()
        .post(format!("{}/api/v1/messages", harness.base))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ack["status"], "QUEUED");
}

#[tokio::test]
async fn test_disallowed_origin_is_rejected() {
    let harness = start(&["https://app.example.com"]).await;
    let client = reqwest::Client::new();

    let rejected = client
        .post(format!("{}/api/v1/scrape", harness.base))
        .header("Origin", "https://evil.example")
        .json(&start_scrape_body())
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), 403);
    let body: Value = rejected.json().await.unwrap();
    assert_eq!(body["error"], "ORIGIN_NOT_ALLOWED");
    assert!(harness.sink.batches.lock().is_empty());

    let accepted = client
        .post(format!("{}/api/v1/scrape", harness.base))
        .header("Origin", "https://app.example.com")
        .json(&start_scrape_body())
        .send()
        .await
        .unwrap();
    assert_eq!(accepted.status(), 200);
}

#[tokio::test]
async fn test_scrape_result_reaches_listener() {
    let harness = start(&[]).await;
    let mut listener = harness.bus.listen(ContextId::from("ctx-A"));
    let client = reqwest::Client::new();

    let body = json!({
        "type": "SCRAPE_RESULT",
        "contextId": "ctx-A",
        "results": [{
            "check_in_date": "2026-02-02",
            "price": 3100.0,
            "room_type": "Suite",
            "is_sold_out": false,
            "competitor_id": "c9"
        }]
    });
    let delivered: Value = client
        .post(format!("{}/api/v1/messages", harness.base))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(delivered["status"], "DELIVERED");

    let message = tokio::time::timeout(Duration::from_secs(5), listener.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(message.results[0].room_type, "Suite");

    drop(listener);
    let dropped = client
        .post(format!("{}/api/v1/messages", harness.base))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(dropped.status(), 202);
}

#[tokio::test]
async fn test_health_and_trigger_script() {
    let harness = start(&[]).await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(format!("{}/api/v1/health", harness.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["pending"], 0);
    assert_eq!(health["has_token"], false);

    let script = client
        .get(format!("{}/api/v1/trigger.js", harness.base))
        .send()
        .await
        .unwrap();
    assert!(
        script.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("application/javascript")
    );
    let script = script.text().await.unwrap();
    assert!(script.contains(&format!("{}/api/v1/messages", harness.base)));
    assert!(script.contains("START_SCRAPE"));
}

#[tokio::test]
async fn test_malformed_body_is_a_client_error() {
    let harness = start(&[]).await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/messages", harness.base))
        .header("content-type", "application/json")
        .body(r#"{"type":"SOMETHING_ELSE"}"#)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}
