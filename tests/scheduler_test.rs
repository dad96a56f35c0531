// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the feeder-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Integration tests for the polling scheduler
//!
//! All tests run on a paused tokio clock, so intervals are driven by virtual
//! time and the tests are deterministic regardless of host load.

use std::sync::Arc;
use std::time::Duration;

use feeder_telemetry::client::simulated::{SimulatedReadingsClient, SimulatedResponse};
use feeder_telemetry::config::PollingConfig;
use feeder_telemetry::telemetry::{
    create_shared_telemetry_state, DeviceSpec, MemoryHistoryStore, PollingScheduler, StartError,
    Zone,
};

const INTERVAL_MS: u64 = 5000;

fn build_scheduler(
    client: Arc<SimulatedReadingsClient>,
) -> (PollingScheduler, Arc<MemoryHistoryStore>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let history = Arc::new(MemoryHistoryStore::new(100));
    let scheduler = PollingScheduler::new(
        create_shared_telemetry_state(),
        client,
        history.clone(),
        &PollingConfig::default(),
    );
    (scheduler, history)
}

/// Let spawned tasks run and the virtual clock advance.
async fn settle(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn test_shared_registrar_is_fetched_once_per_cycle() {
    let client = Arc::new(SimulatedReadingsClient::new(0, 4));
    let (scheduler, _) = build_scheduler(client.clone());

    let device = DeviceSpec::shared("dev", "reg-shared", INTERVAL_MS);
    scheduler.start(&device).await.unwrap();

    // Initial fetch fires immediately, exactly once despite two zones
    settle(10).await;
    assert_eq!(client.fetch_count("reg-shared").await, 1);
    assert_eq!(scheduler.state().read().await.cycle_count("dev"), 1);

    settle(INTERVAL_MS + 50).await;
    assert_eq!(client.fetch_count("reg-shared").await, 2);
    assert_eq!(scheduler.state().read().await.cycle_count("dev"), 2);

    settle(INTERVAL_MS + 50).await;
    assert_eq!(client.fetch_count("reg-shared").await, 3);
    assert_eq!(scheduler.state().read().await.cycle_count("dev"), 3);

    scheduler.stop("dev").await;
}

#[tokio::test(start_paused = true)]
async fn test_read_failures_escalate_then_recover() {
    let client = Arc::new(SimulatedReadingsClient::new(100, 10));
    client
        .enqueue(
            "reg-d",
            [
                SimulatedResponse::ReadFailure,
                SimulatedResponse::ReadFailure,
                SimulatedResponse::ReadFailure,
            ],
        )
        .await;
    let (scheduler, history) = build_scheduler(client.clone());

    let device = DeviceSpec::shared("device-d", "reg-d", INTERVAL_MS);
    scheduler.start(&device).await.unwrap();
    settle(10).await;

    // First failure: flagged on both zones, not yet critical
    {
        let state = scheduler.state();
        let state = state.read().await;
        assert!(state.is_flagged("device-d", Zone::Superior));
        assert!(state.is_flagged("device-d", Zone::Inferior));
        assert!(!state.is_critical("device-d", Zone::Superior));
        assert_eq!(state.register_value("device-d", 100), None);
    }

    // Third consecutive failure: critical on both zones
    settle(2 * INTERVAL_MS + 50).await;
    {
        let state = scheduler.state();
        let state = state.read().await;
        assert!(state.is_critical("device-d", Zone::Superior));
        assert!(state.is_critical("device-d", Zone::Inferior));
        // Read failures never feed the connectivity banner
        assert!(!state.connectivity_problem());
    }

    // Script exhausted: the next cycle succeeds and clears the escalation
    settle(INTERVAL_MS + 50).await;
    {
        let state = scheduler.state();
        let state = state.read().await;
        assert!(!state.is_flagged("device-d", Zone::Superior));
        assert!(!state.is_flagged("device-d", Zone::Inferior));
        for address in 100..110 {
            assert!(
                state.register_value("device-d", address).is_some(),
                "register {} missing after recovery",
                address
            );
        }
    }

    // The merged reading was forwarded to history, once per zone
    let entries = history.recent("device-d", 10).await;
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.registrar_id == "reg-d"));

    scheduler.stop("device-d").await;
}

#[tokio::test(start_paused = true)]
async fn test_transport_failure_isolated_to_its_registrar() {
    let client = Arc::new(SimulatedReadingsClient::new(200, 4));
    client
        .enqueue("reg-e2", [SimulatedResponse::TransportFailure])
        .await;
    let (scheduler, _) = build_scheduler(client.clone());

    let device = DeviceSpec::split("device-e", "reg-e1", "reg-e2", INTERVAL_MS);
    scheduler.start(&device).await.unwrap();
    settle(10).await;

    {
        let state = scheduler.state();
        let state = state.read().await;
        // Superior's registrar succeeded: its values are visible
        assert!(state.register_value("device-e", 200).is_some());
        assert!(!state.is_flagged("device-e", Zone::Superior));
        // Inferior's transport failure does not touch its read streak
        assert_eq!(state.zone_streaks("device-e", Zone::Inferior).read, 0);
        assert!(!state.is_flagged("device-e", Zone::Inferior));
        // But the fleet-wide banner is up
        assert!(state.connectivity_problem());
    }

    // Next cycle: reg-e2 recovers and the banner clears
    settle(INTERVAL_MS + 50).await;
    {
        let state = scheduler.state();
        let state = state.read().await;
        assert!(!state.connectivity_problem());
    }

    scheduler.stop("device-e").await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_fences_out_in_flight_fetch() {
    let client =
        Arc::new(SimulatedReadingsClient::new(0, 4).with_latency(Duration::from_millis(1000)));
    let (scheduler, _) = build_scheduler(client.clone());

    let device = DeviceSpec::shared("dev", "reg", INTERVAL_MS);
    scheduler.start(&device).await.unwrap();

    // The initial fetch is in flight behind the simulated latency
    settle(10).await;
    assert_eq!(client.fetch_count("reg").await, 1);

    scheduler.stop("dev").await;
    assert!(!scheduler.is_running("dev").await);

    // Long after the in-flight fetch would have resolved, nothing revived
    settle(3 * INTERVAL_MS).await;
    let state = scheduler.state();
    let state = state.read().await;
    assert!(!state.is_running("dev"));
    assert!(state.snapshot("dev").is_none());
    assert_eq!(state.cycle_count("dev"), 0);
    assert!(!state.connectivity_problem());
}

#[tokio::test(start_paused = true)]
async fn test_restart_does_not_duplicate_timers() {
    let client = Arc::new(SimulatedReadingsClient::new(0, 4));
    let (scheduler, _) = build_scheduler(client.clone());

    let device = DeviceSpec::shared("dev", "reg", INTERVAL_MS);
    scheduler.start(&device).await.unwrap();
    settle(10).await;
    assert_eq!(client.fetch_count("reg").await, 1);

    // Restart: old tasks die, counter resets, one new initial fetch
    scheduler.start(&device).await.unwrap();
    settle(10).await;
    assert_eq!(client.fetch_count("reg").await, 2);
    assert_eq!(scheduler.state().read().await.cycle_count("dev"), 1);

    // One interval later exactly one periodic fetch happened
    settle(INTERVAL_MS + 50).await;
    assert_eq!(client.fetch_count("reg").await, 3);
    assert_eq!(scheduler.state().read().await.cycle_count("dev"), 2);

    scheduler.stop("dev").await;
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_starts_leave_single_set_of_timers() {
    let client = Arc::new(SimulatedReadingsClient::new(0, 4));
    let (scheduler, _) = build_scheduler(client.clone());

    // Both starts race for the same device; whichever loses must have its
    // tasks fully torn down, not orphaned
    let device = DeviceSpec::shared("dev", "reg", INTERVAL_MS);
    let (first, second) = tokio::join!(scheduler.start(&device), scheduler.start(&device));
    first.unwrap();
    second.unwrap();

    settle(10).await;
    let after_start = client.fetch_count("reg").await;
    assert_eq!(scheduler.state().read().await.cycle_count("dev"), 1);

    // Exactly one periodic fetch and one counter tick per interval survive
    settle(INTERVAL_MS + 50).await;
    assert_eq!(client.fetch_count("reg").await, after_start + 1);
    assert_eq!(scheduler.state().read().await.cycle_count("dev"), 2);

    settle(INTERVAL_MS + 50).await;
    assert_eq!(client.fetch_count("reg").await, after_start + 2);
    assert_eq!(scheduler.state().read().await.cycle_count("dev"), 3);

    scheduler.stop("dev").await;
}

#[tokio::test(start_paused = true)]
async fn test_toggle_starts_then_stops() {
    let client = Arc::new(SimulatedReadingsClient::new(0, 4));
    let (scheduler, _) = build_scheduler(client);

    let device = DeviceSpec::shared("dev", "reg", INTERVAL_MS);
    assert!(scheduler.toggle(&device).await.unwrap());
    assert!(scheduler.is_running("dev").await);

    assert!(!scheduler.toggle(&device).await.unwrap());
    assert!(!scheduler.is_running("dev").await);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_all_devices() {
    let client = Arc::new(SimulatedReadingsClient::new(0, 4));
    let (scheduler, _) = build_scheduler(client);

    scheduler
        .start(&DeviceSpec::shared("a", "reg-a", INTERVAL_MS))
        .await
        .unwrap();
    scheduler
        .start(&DeviceSpec::shared("b", "reg-b", INTERVAL_MS))
        .await
        .unwrap();
    settle(10).await;

    scheduler.shutdown().await;
    assert!(!scheduler.is_running("a").await);
    assert!(!scheduler.is_running("b").await);
    assert!(scheduler
        .state()
        .read()
        .await
        .running_device_ids()
        .is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_start_rejects_unconfigured_devices() {
    let client = Arc::new(SimulatedReadingsClient::new(0, 4));
    let (scheduler, _) = build_scheduler(client);

    let no_registrar = DeviceSpec {
        id: "bare".to_string(),
        poll_interval_ms: Some(INTERVAL_MS),
        card_design: Default::default(),
        legacy_registrar_id: None,
    };
    assert_eq!(
        scheduler.start(&no_registrar).await,
        Err(StartError::NotConfigured("bare".to_string()))
    );

    let no_interval = DeviceSpec {
        poll_interval_ms: None,
        ..DeviceSpec::shared("slow", "reg", INTERVAL_MS)
    };
    assert_eq!(
        scheduler.start(&no_interval).await,
        Err(StartError::MissingInterval("slow".to_string()))
    );

    assert!(!scheduler.is_running("bare").await);
    assert!(!scheduler.is_running("slow").await);
}
