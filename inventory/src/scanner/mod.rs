//! Fleet scan engine: a fixed pool of workers claiming hosts from a
//! shared cursor. Result order follows worker scheduling and is not
//! guaranteed; exactly one record is produced per configured host, even
//! after cancellation.

pub mod host;

use crate::config::{Config, HostSpec};
use common::error::InventoryError;
use common::hardware::HostRecord;
use common::stats::BatchStats;
use host::HostScanner;
use log::info;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub struct Scanner {
    hosts: Arc<Vec<HostSpec>>,
    concurrency: usize,
    host_scanner: Arc<HostScanner>,
}

impl Scanner {
    pub fn new(config: &Config) -> Result<Self, InventoryError> {
        Ok(Scanner {
            hosts: Arc::new(config.hosts.clone()),
            concurrency: config.concurrency(),
            host_scanner: Arc::new(HostScanner::new(config)?),
        })
    }

    /// Scan every configured host and return all records plus batch
    /// statistics. Cancelling the token turns in-flight and queued scans
    /// into records with `error = Cancelled`.
    pub async fn scan_all(&self, cancel: &CancellationToken) -> (Vec<HostRecord>, BatchStats) {
        info!(
            "[scanner] Starting parallel scan: {} hosts, concurrency {}",
            self.hosts.len(),
            self.concurrency
        );

        let started = Instant::now();

        if self.hosts.is_empty() {
            return (Vec::new(), BatchStats::default());
        }

        let (tx, mut rx) = mpsc::channel::<(HostRecord, Duration)>(self.hosts.len());
        let cursor = Arc::new(AtomicUsize::new(0));

        let worker_count = self.concurrency.min(self.hosts.len());
        for _ in 0..worker_count {
            let hosts = Arc::clone(&self.hosts);
            let cursor = Arc::clone(&cursor);
            let host_scanner = Arc::clone(&self.host_scanner);
            let cancel = cancel.clone();
            let tx = tx.clone();

            tokio::spawn(async move {
                loop {
                    let index = cursor.fetch_add(1, Ordering::SeqCst);
                    if index >= hosts.len() {
                        break;
                    }
                    let spec = &hosts[index];

                    // Queued items are still consumed after cancellation so
                    // every host ends up with exactly one record.
                    if cancel.is_cancelled() {
                        let record = HostRecord::failed(
                            &spec.host,
                            spec.display_name.clone(),
                            InventoryError::Cancelled,
                        );
                        if tx.send((record, Duration::ZERO)).await.is_err() {
                            break;
                        }
                        continue;
                    }

                    let begun = Instant::now();
                    let record = host_scanner.scan_host(&cancel, spec).await;
                    if tx.send((record, begun.elapsed())).await.is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        let mut records = Vec::with_capacity(self.hosts.len());
        let mut durations = Vec::with_capacity(self.hosts.len());
        while let Some((record, duration)) = rx.recv().await {
            records.push(record);
            durations.push(duration);
        }

        let stats = calculate_stats(&records, &durations, started.elapsed());

        info!(
            "[scanner] Scan completed: {}/{} successful in {:?}",
            stats.successful_count, stats.total_hosts, stats.total_duration
        );

        (records, stats)
    }

    /// Check reachability and credentials for every host without
    /// collecting inventory. Only the service root is fetched.
    pub async fn validate_connections(
        &self,
        cancel: &CancellationToken,
    ) -> HashMap<String, Option<InventoryError>> {
        info!(
            "[scanner] Validating connections to {} hosts",
            self.hosts.len()
        );

        if self.hosts.is_empty() {
            return HashMap::new();
        }

        let (tx, mut rx) = mpsc::channel::<(String, Option<InventoryError>)>(self.hosts.len());
        let cursor = Arc::new(AtomicUsize::new(0));

        let worker_count = self.concurrency.min(self.hosts.len());
        for _ in 0..worker_count {
            let hosts = Arc::clone(&self.hosts);
            let cursor = Arc::clone(&cursor);
            let host_scanner = Arc::clone(&self.host_scanner);
            let cancel = cancel.clone();
            let tx = tx.clone();

            tokio::spawn(async move {
                loop {
                    let index = cursor.fetch_add(1, Ordering::SeqCst);
                    if index >= hosts.len() {
                        break;
                    }
                    let spec = &hosts[index];

                    let outcome = if cancel.is_cancelled() {
                        Some(InventoryError::Cancelled)
                    } else {
                        host_scanner.validate_connection(&cancel, spec).await
                    };

                    if tx.send((spec.host.clone(), outcome)).await.is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        let mut results = HashMap::with_capacity(self.hosts.len());
        while let Some((host, outcome)) = rx.recv().await {
            results.insert(host, outcome);
        }

        results
    }
}

fn calculate_stats(
    records: &[HostRecord],
    durations: &[Duration],
    total_duration: Duration,
) -> BatchStats {
    let mut stats = BatchStats {
        total_hosts: records.len(),
        total_duration,
        ..Default::default()
    };

    if records.is_empty() {
        return stats;
    }

    for record in records {
        if record.is_valid() {
            stats.successful_count += 1;
        } else {
            stats.failed_count += 1;
        }
    }

    if !durations.is_empty() {
        let mut sum = Duration::ZERO;
        let mut fastest = durations[0];
        let mut slowest = durations[0];
        for duration in durations {
            sum += *duration;
            if *duration < fastest {
                fastest = *duration;
            }
            if *duration > slowest {
                slowest = *duration;
            }
        }
        stats.average_duration = sum / durations.len() as u32;
        stats.fastest_duration = fastest;
        stats.slowest_duration = slowest;
    }

    stats
}
