//! Job-to-outcome behavior of the context orchestrator

mod common;

use std::time::Duration;

use common::{
    Behavior, FakeDriver, booking_price_page, booking_sold_out_page, job, loading_page,
    orchestrator, rate,
};
use ratescrape::MessageBus;
use ratescrape::browser::ContextId;
use ratescrape::config::ScrapeConfig;
use ratescrape::error::ErrorKind;
use ratescrape::message_bus::ScrapeResultMessage;
use ratescrape::orchestrator::{OrchestratorSettings, TabOrchestrator};

const BOOKING: &str = "https://www.booking.com/hotel/in/taj.html?checkin=2026-03-14";

#[tokio::test(start_paused = true)]
async fn test_missing_url_opens_nothing() {
    let driver = FakeDriver::new(Behavior::Pages(vec![loading_page()]));
    let orchestrator = orchestrator(driver.clone(), 30);

    for url in [None, Some("   ")] {
        let err = orchestrator.run_job(&job("j1", url)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingUrl);
    }
    assert_eq!(driver.opened(), 0);
    assert!(driver.log().events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_priced_page_resolves_and_closes() {
    let driver = FakeDriver::new(Behavior::Pages(vec![
        loading_page(),
        booking_price_page("₹ 9,250", "Deluxe Room"),
    ]));
    let orchestrator = orchestrator(driver.clone(), 30);

    let results = orchestrator.run_job(&job("j1", Some(BOOKING))).await.unwrap();

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.price, 9250.0);
    assert_eq!(result.room_type, "Deluxe Room");
    assert!(!result.is_sold_out);
    assert_eq!(result.check_in_date, "2026-03-14");
    assert_eq!(result.competitor_id, "comp-j1");
    assert_eq!(result.currency, "INR");

    assert_eq!(
        driver.log().events(),
        vec![
            format!("open ctx-1 {BOOKING}"),
            "inject ctx-1".to_string(),
            "close ctx-1".to_string(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_scheme_is_added_before_opening() {
    let driver = FakeDriver::new(Behavior::Pages(vec![booking_sold_out_page()]));
    let orchestrator = orchestrator(driver.clone(), 30);

    let results = orchestrator
        .run_job(&job("j1", Some("www.booking.com/hotel/in/taj.html")))
        .await
        .unwrap();

    assert!(results[0].is_sold_out);
    assert_eq!(results[0].price, 0.0);
    assert_eq!(
        driver.log().events()[0],
        "open ctx-1 https://www.booking.com/hotel/in/taj.html"
    );
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_budget_reports_sold_out() {
    let driver = FakeDriver::new(Behavior::Pages(vec![loading_page()]));
    let orchestrator = orchestrator(driver.clone(), 30);

    let results = orchestrator.run_job(&job("j1", Some(BOOKING))).await.unwrap();

    assert_eq!(driver.snapshots(), 8);
    assert_eq!(results[0].price, 0.0);
    assert!(results[0].is_sold_out);
    assert_eq!(results[0].room_type, "Timeout/Sold Out");
    assert_eq!(driver.log().count_prefix("close "), 1);
}

#[tokio::test(start_paused = true)]
async fn test_default_budget_survives_a_slow_load() {
    let config = ScrapeConfig::builder()
        .api_base_url("http://127.0.0.1:8001/api/v1")
        .build()
        .unwrap();
    let driver = FakeDriver::new(Behavior::Pages(vec![loading_page()]))
        .failing_load(config.page_load_timeout())
        .slow_snapshots(Duration::from_millis(500));
    let orchestrator = TabOrchestrator::new(
        driver.clone(),
        MessageBus::default(),
        OrchestratorSettings::from_config(&config),
    );

    let results = orchestrator.run_job(&job("j1", Some(BOOKING))).await.unwrap();

    assert_eq!(driver.snapshots(), 8);
    assert!(results[0].is_sold_out);
    assert_eq!(results[0].room_type, "Timeout/Sold Out");
    assert_eq!(driver.log().count_prefix("close ctx-1"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_open_failure_is_injection_failed() {
    let driver = FakeDriver::new(Behavior::FailOpen);
    let orchestrator = orchestrator(driver.clone(), 30);

    let err = orchestrator.run_job(&job("j1", Some(BOOKING))).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InjectionFailed);
    assert_eq!(driver.opened(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unparsable_url_opens_nothing() {
    let driver = FakeDriver::new(Behavior::Pages(vec![loading_page()]));
    let orchestrator = orchestrator(driver.clone(), 30);

    let err = orchestrator
        .run_job(&job("j1", Some("hotel page please")))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InjectionFailed);
    assert_eq!(driver.opened(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_injection_failure_closes_context() {
    let driver = FakeDriver::new(Behavior::FailInject);
    let orchestrator = orchestrator(driver.clone(), 30);

    let err = orchestrator.run_job(&job("j1", Some(BOOKING))).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InjectionFailed);
    assert_eq!(driver.snapshots(), 0);
    assert_eq!(
        driver.log().events(),
        vec![format!("open ctx-1 {BOOKING}"), "close ctx-1".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_silent_context_times_out_and_closes_once() {
    let driver = FakeDriver::new(Behavior::Hang);
    let orchestrator = orchestrator(driver.clone(), 30);
    let started = tokio::time::Instant::now();

    let err = orchestrator.run_job(&job("j1", Some(BOOKING))).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(started.elapsed() >= Duration::from_secs(30));

    // a late engine could not close the context a second time
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(driver.log().count_prefix("close ctx-1"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_foreign_results_are_ignored() {
    let driver = FakeDriver::new(Behavior::Hang);
    let orchestrator = orchestrator(driver.clone(), 30);
    let bus = orchestrator.bus().clone();

    let running = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.run_job(&job("j1", Some(BOOKING))).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    bus.publish(ScrapeResultMessage {
        context_id: ContextId::new("ctx-other"),
        results: vec![rate("intruder", 1.0)],
    })
    .unwrap();
    bus.publish(ScrapeResultMessage {
        context_id: ContextId::new("ctx-1"),
        results: vec![rate("comp-j1", 4321.0)],
    })
    .unwrap();

    let results = running.await.unwrap().unwrap();
    assert_eq!(results, vec![rate("comp-j1", 4321.0)]);
    assert!(bus.metrics().snapshot().ignored_foreign >= 1);
    assert_eq!(driver.log().count_prefix("close ctx-1"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_jobs_run_in_distinct_contexts() {
    let driver = FakeDriver::new(Behavior::Pages(vec![booking_price_page("₹ 100", "A")]));
    let orchestrator = orchestrator(driver.clone(), 30);

    orchestrator.run_job(&job("a", Some(BOOKING))).await.unwrap();
    orchestrator.run_job(&job("b", Some(BOOKING))).await.unwrap();

    let log = driver.log().events();
    assert_eq!(log[0], format!("open ctx-1 {BOOKING}"));
    assert_eq!(log[2], "close ctx-1");
    assert_eq!(log[3], format!("open ctx-2 {BOOKING}"));
    assert_eq!(log[5], "close ctx-2");
}
