// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Polls the external usage endpoint and classifies utilization against the
//! wind-down/critical/resume thresholds. Never makes a control decision
//! itself — callers (the Cycle Engine's execute step) read `is_wind_down`/
//! `is_critical` and act; this module only observes and reports.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use warden_adapters::{UsageEndpoint, UsageReport};
use warden_core::Clock;

use crate::error::OrchestratorError;

/// Injectable real-time sleep so `wait_for_reset`'s 60s-increment polling
/// loop can be driven by an instant fake in tests without actually
/// sleeping.
#[async_trait::async_trait]
pub trait Sleeper: Send + Sync + 'static {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait::async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

pub struct BudgetThresholds {
    pub wind_down: f64,
    pub critical: f64,
    pub resume: f64,
}

/// Called every poll with the freshly-fetched report and whether it crossed
/// wind-down or critical on this poll.
pub trait BudgetCallback: Send + Sync + 'static {
    fn on_poll(&self, report: &UsageReport, crossed_wind_down: bool, crossed_critical: bool);
}

impl<F: Fn(&UsageReport, bool, bool) + Send + Sync + 'static> BudgetCallback for F {
    fn on_poll(&self, report: &UsageReport, crossed_wind_down: bool, crossed_critical: bool) {
        self(report, crossed_wind_down, crossed_critical)
    }
}

pub struct BudgetMonitor<C: Clock> {
    endpoint: Arc<dyn UsageEndpoint>,
    clock: C,
    sleeper: Arc<dyn Sleeper>,
    thresholds: BudgetThresholds,
    last: Mutex<Option<UsageReport>>,
}

/// The binding utilization for threshold checks: the more constrained of
/// the two rolling windows, since either one hitting its ceiling blocks
/// further work regardless of the other.
fn binding_utilization(report: &UsageReport) -> f64 {
    report.five_hour.utilization.max(report.seven_day.utilization)
}

impl<C: Clock> BudgetMonitor<C> {
    pub fn new(
        endpoint: Arc<dyn UsageEndpoint>,
        clock: C,
        sleeper: Arc<dyn Sleeper>,
        thresholds: BudgetThresholds,
    ) -> Self {
        Self { endpoint, clock, sleeper, thresholds, last: Mutex::new(None) }
    }

    /// Fetch the latest usage report, update internal state, and invoke
    /// `callback` if a threshold was crossed on this poll relative to the
    /// previous one.
    pub async fn poll(&self, callback: &dyn BudgetCallback) -> Result<UsageReport, OrchestratorError> {
        let report = self.endpoint.fetch().await?;
        let utilization = binding_utilization(&report);
        let previous = self.last.lock().clone();
        let was_wind_down = previous.as_ref().is_some_and(|p| binding_utilization(p) >= self.thresholds.wind_down);
        let was_critical = previous.as_ref().is_some_and(|p| binding_utilization(p) >= self.thresholds.critical);
        let crossed_wind_down = !was_wind_down && utilization >= self.thresholds.wind_down;
        let crossed_critical = !was_critical && utilization >= self.thresholds.critical;
        *self.last.lock() = Some(report.clone());
        callback.on_poll(&report, crossed_wind_down, crossed_critical);
        Ok(report)
    }

    pub fn is_wind_down(&self) -> bool {
        self.last.lock().as_ref().is_some_and(|r| binding_utilization(r) >= self.thresholds.wind_down)
    }

    pub fn is_critical(&self) -> bool {
        self.last.lock().as_ref().is_some_and(|r| binding_utilization(r) >= self.thresholds.critical)
    }

    pub fn last_report(&self) -> Option<UsageReport> {
        self.last.lock().clone()
    }

    /// Block until the binding reset timestamp has passed *and* a fresh
    /// poll shows utilization below the resume threshold. Retries in 60s
    /// increments otherwise — resuming early on a stale cached report
    /// would just re-trip wind-down on the next poll.
    pub async fn wait_for_reset(&self) -> Result<UsageReport, OrchestratorError> {
        loop {
            let report = self.endpoint.fetch().await?;
            *self.last.lock() = Some(report.clone());
            let resets_at_ms = report.five_hour.resets_at_ms.max(report.seven_day.resets_at_ms);
            let past_reset = self.clock.epoch_ms() >= resets_at_ms;
            let below_resume = binding_utilization(&report) < self.thresholds.resume;
            if past_reset && below_resume {
                return Ok(report);
            }
            self.sleeper.sleep(Duration::from_secs(60)).await;
        }
    }
}

#[cfg(test)]
#[path = "budget_tests.rs"]
mod tests;
