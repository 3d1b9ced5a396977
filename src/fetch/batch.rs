//! Batch download orchestration
//!
//! One task per package, all running concurrently under a single limiter.
//! The batch waits for every task; a failure never cancels its siblings.

use super::download::{DownloadOutcome, Fetcher, PackageRequest};
use super::error::FetchError;
use crate::core::output;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Outcomes of a batch, in the same order as the requests.
#[derive(Debug)]
pub struct BatchReport {
    outcomes: Vec<(PackageRequest, DownloadOutcome)>,
}

impl BatchReport {
    pub fn outcomes(&self) -> &[(PackageRequest, DownloadOutcome)] {
        &self.outcomes
    }

    /// Outcome for a package file name.
    pub fn get(&self, file: &str) -> Option<&DownloadOutcome> {
        self.outcomes
            .iter()
            .find(|(request, _)| request.file() == file)
            .map(|(_, outcome)| outcome)
    }

    /// File names of the packages that failed.
    pub fn failed(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| !outcome.is_success())
            .map(|(request, _)| request.file())
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|(_, outcome)| outcome.is_success())
    }

    pub fn total_bytes(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|(_, outcome)| outcome.bytes_transferred())
            .sum()
    }

    /// The downloaded requests, or `BatchFailed` naming every failure.
    pub fn into_result(self) -> Result<Vec<PackageRequest>, FetchError> {
        let failed: Vec<String> = self.failed().into_iter().map(str::to_string).collect();
        if !failed.is_empty() {
            return Err(FetchError::BatchFailed(failed));
        }
        Ok(self.outcomes.into_iter().map(|(request, _)| request).collect())
    }
}

impl Fetcher {
    /// Download every request with at most `max_concurrency` in flight.
    ///
    /// Each failing package is reported by name once the whole batch settles.
    pub async fn download_all(&self, requests: Vec<PackageRequest>, max_concurrency: usize) -> BatchReport {
        let limiter = Arc::new(Semaphore::new(max_concurrency.clamp(1, Semaphore::MAX_PERMITS)));

        let handles: Vec<_> = requests
            .iter()
            .cloned()
            .map(|request| {
                let fetcher = self.clone();
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { fetcher.download(request, limiter).await })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(requests.len());
        for (request, handle) in requests.into_iter().zip(handles) {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => DownloadOutcome::Failure(FetchError::Task {
                    package: request.file().to_string(),
                    message: e.to_string(),
                }),
            };
            outcomes.push((request, outcome));
        }

        for (request, outcome) in &outcomes {
            if let Some(e) = outcome.error() {
                output::error(&format!("{}: {}", request.file(), e));
            }
        }

        BatchReport { outcomes }
    }
}
