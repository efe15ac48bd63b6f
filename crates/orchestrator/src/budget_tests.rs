// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicU32, Ordering};
use warden_adapters::{FakeUsageEndpoint, UsageWindow};
use warden_core::FakeClock;

struct InstantSleeper {
    slept: AtomicU32,
}

#[async_trait::async_trait]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, _duration: Duration) {
        self.slept.fetch_add(1, Ordering::SeqCst);
    }
}

fn thresholds() -> BudgetThresholds {
    BudgetThresholds { wind_down: 0.80, critical: 0.90, resume: 0.50 }
}

fn report(five_hour: f64, resets_at_ms: u64) -> UsageReport {
    UsageReport {
        five_hour: UsageWindow { utilization: five_hour, resets_at_ms },
        seven_day: UsageWindow { utilization: 0.1, resets_at_ms },
    }
}

#[tokio::test]
async fn poll_fires_callback_only_on_threshold_crossing() {
    let endpoint = FakeUsageEndpoint::new();
    let monitor = BudgetMonitor::new(
        Arc::new(endpoint.clone()),
        FakeClock::new(),
        Arc::new(TokioSleeper),
        thresholds(),
    );

    let crossings: Arc<Mutex<Vec<(bool, bool)>>> = Arc::new(Mutex::new(Vec::new()));
    let recorder = {
        let crossings = crossings.clone();
        move |_: &UsageReport, wd: bool, crit: bool| crossings.lock().push((wd, crit))
    };

    endpoint.set_report(report(0.5, 0));
    monitor.poll(&recorder).await.unwrap();
    assert!(!monitor.is_wind_down());

    endpoint.set_report(report(0.85, 0));
    monitor.poll(&recorder).await.unwrap();
    assert!(monitor.is_wind_down());
    assert!(!monitor.is_critical());

    // Staying above wind-down without crossing critical fires no further callback.
    endpoint.set_report(report(0.86, 0));
    monitor.poll(&recorder).await.unwrap();

    endpoint.set_report(report(0.95, 0));
    monitor.poll(&recorder).await.unwrap();
    assert!(monitor.is_critical());

    let log = crossings.lock().clone();
    assert_eq!(log, vec![(false, false), (true, false), (false, false), (false, true)]);
}

#[tokio::test]
async fn wait_for_reset_blocks_until_past_reset_and_below_resume() {
    let endpoint = FakeUsageEndpoint::new();
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_000_000);
    let sleeper = Arc::new(InstantSleeper { slept: AtomicU32::new(0) });
    let monitor =
        BudgetMonitor::new(Arc::new(endpoint.clone()), clock.clone(), sleeper.clone(), thresholds());

    // Still above resume threshold even though reset time has passed.
    endpoint.set_report(report(0.95, 999_999));

    // Spawn the wait, then flip to a passing report after the first sleep.
    let monitor_arc = Arc::new(monitor);
    let waiter = monitor_arc.clone();
    let handle = tokio::spawn(async move { waiter.wait_for_reset().await });

    tokio::task::yield_now().await;
    endpoint.set_report(report(0.3, 999_999));
    let result = handle.await.unwrap().unwrap();
    assert!(result.five_hour.utilization < 0.5);
    assert!(sleeper.slept.load(Ordering::SeqCst) >= 1);
}
