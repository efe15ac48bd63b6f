// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Polls the external usage endpoint the Budget Monitor watches.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AdapterError;

/// One rolling usage window, normalized to a `[0, 1]` utilization fraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsageWindow {
    pub utilization: f64,
    pub resets_at_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsageReport {
    pub five_hour: UsageWindow,
    pub seven_day: UsageWindow,
}

#[async_trait]
pub trait UsageEndpoint: Send + Sync + 'static {
    /// Fetch the current usage report. The endpoint reports utilization as a
    /// 0-100 percentage; implementations normalize to `[0, 1]` before
    /// returning so callers never see raw percentages.
    async fn fetch(&self) -> Result<UsageReport, AdapterError>;
}

#[derive(Deserialize)]
struct RawReport {
    five_hour: RawWindow,
    seven_day: RawWindow,
}

#[derive(Deserialize)]
struct RawWindow {
    utilization: f64,
    resets_at: u64,
}

fn normalize(raw: RawWindow) -> UsageWindow {
    UsageWindow { utilization: (raw.utilization / 100.0).clamp(0.0, 1.0), resets_at_ms: raw.resets_at }
}

pub struct HttpUsageEndpoint {
    client: reqwest::Client,
    url: String,
    bearer_token: String,
}

impl HttpUsageEndpoint {
    pub fn new(url: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), url: url.into(), bearer_token: bearer_token.into() }
    }
}

#[async_trait]
impl UsageEndpoint for HttpUsageEndpoint {
    async fn fetch(&self) -> Result<UsageReport, AdapterError> {
        let response = self
            .client
            .get(&self.url)
            .bearer_auth(&self.bearer_token)
            .send()
            .await?
            .error_for_status()?;
        let raw: RawReport = response.json().await?;
        Ok(UsageReport { five_hour: normalize(raw.five_hour), seven_day: normalize(raw.seven_day) })
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use std::sync::Arc;
    use parking_lot::Mutex;

    #[derive(Clone)]
    pub struct FakeUsageEndpoint {
        report: Arc<Mutex<UsageReport>>,
        poll_count: Arc<Mutex<u32>>,
    }

    impl Default for FakeUsageEndpoint {
        fn default() -> Self {
            let zero = UsageWindow { utilization: 0.0, resets_at_ms: 0 };
            Self {
                report: Arc::new(Mutex::new(UsageReport { five_hour: zero, seven_day: zero })),
                poll_count: Arc::new(Mutex::new(0)),
            }
        }
    }

    impl FakeUsageEndpoint {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_report(&self, report: UsageReport) {
            *self.report.lock() = report;
        }

        pub fn poll_count(&self) -> u32 {
            *self.poll_count.lock()
        }
    }

    #[async_trait]
    impl UsageEndpoint for FakeUsageEndpoint {
        async fn fetch(&self) -> Result<UsageReport, AdapterError> {
            *self.poll_count.lock() += 1;
            Ok(*self.report.lock())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeUsageEndpoint;

#[cfg(test)]
#[path = "usage_tests.rs"]
mod tests;
