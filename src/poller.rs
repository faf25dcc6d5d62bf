//! Modem polling and gauge updates.
//!
//! One poll cycle is strictly sequential: fetch the status page, extract
//! both channel tables, walk their records, parse values, set gauges, then
//! publish the status snapshot. Cycles never overlap and nothing built in
//! one cycle outlives it except the gauge values and the snapshot.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::config::ModemConfig;
use crate::locator::Locator;
use crate::mapping::{downstream_reading, upstream_reading};
use crate::metrics::ModemMetrics;
use crate::status::{self, SharedStatus, TableStatus};
use crate::table::{Table, TableError};

/// Error type for poll cycles.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// Transport failure reaching the modem; transient, the next tick retries.
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),
    /// Structural table inconsistency; aborts the cycle loudly rather than
    /// writing mis-keyed gauge values.
    #[error("table inconsistency: {0}")]
    Table(#[from] TableError),
    /// Rejected at construction time.
    #[error("invalid poller configuration: {0}")]
    Config(String),
}

/// Polls one modem's status page on a fixed interval.
pub struct ModemPoller {
    client: Client,
    source_url: String,
    downstream: Locator,
    upstream: Locator,
    interval: Duration,
    metrics: Arc<ModemMetrics>,
    status: SharedStatus,
}

impl ModemPoller {
    /// Create a poller from validated configuration.
    pub fn new(
        config: &ModemConfig,
        metrics: Arc<ModemMetrics>,
        status: SharedStatus,
    ) -> Result<Self, PollError> {
        let downstream: Locator = config
            .downstream_locator
            .parse()
            .map_err(|e: crate::locator::LocatorError| PollError::Config(e.to_string()))?;
        let upstream: Locator = config
            .upstream_locator
            .parse()
            .map_err(|e: crate::locator::LocatorError| PollError::Config(e.to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            source_url: config.source_url.clone(),
            downstream,
            upstream,
            interval: Duration::from_secs(config.poll_interval_secs),
            metrics,
            status,
        })
    }

    /// Run the polling loop until the shutdown signal flips.
    ///
    /// A failed cycle is logged and counted; it never terminates the loop
    /// and the next tick proceeds regardless.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);

        info!(
            url = %self.source_url,
            interval_secs = self.interval.as_secs(),
            "Starting modem poller"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.poll_once().await {
                        Ok((downstream, upstream)) => {
                            debug!(downstream, upstream, "Poll cycle completed");
                        }
                        Err(e) => {
                            error!("Poll cycle failed: {}", e);
                            self.metrics.cycle_failed();
                            self.status.write().last_error = Some(e.to_string());
                        }
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Modem poller stopped");
    }

    /// Execute one full poll cycle, returning the channel counts.
    pub async fn poll_once(&self) -> Result<(usize, usize), PollError> {
        let document = self.fetch().await?;
        Ok(self.process_document(&document)?)
    }

    async fn fetch(&self) -> Result<String, reqwest::Error> {
        let response = self
            .client
            .get(&self.source_url)
            .send()
            .await?
            .error_for_status()?;
        response.text().await
    }

    /// Extract both tables from a fetched document and update gauges and
    /// the status snapshot. Split out from [`Self::poll_once`] so the whole
    /// pipeline is exercisable against fixture documents.
    pub fn process_document(&self, document: &str) -> Result<(usize, usize), TableError> {
        let downstream_table = Table::extract(document, &self.downstream);
        let upstream_table = Table::extract(document, &self.upstream);

        let mut downstream = 0;
        for record in downstream_table.records() {
            let reading = downstream_reading(&record?);
            self.metrics.record_downstream(&reading);
            downstream += 1;
        }

        let mut upstream = 0;
        for record in upstream_table.records() {
            let reading = upstream_reading(&record?);
            self.metrics.record_upstream(&reading);
            upstream += 1;
        }

        self.metrics.cycle_completed(downstream, upstream);

        let mut snapshot = self.status.write();
        snapshot.last_poll_unix = Some(status::now_unix());
        snapshot.last_error = None;
        snapshot.cycles += 1;
        snapshot.downstream = table_status(&downstream_table);
        snapshot.upstream = table_status(&upstream_table);

        Ok((downstream, upstream))
    }
}

fn table_status(table: &Table) -> TableStatus {
    match table.rows().split_first() {
        Some((header, channels)) => TableStatus {
            header: header.clone(),
            channels: channels.to_vec(),
        },
        None => TableStatus::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ModemMetrics;
    use prometheus_client::encoding::text::encode;
    use prometheus_client::registry::Registry;

    fn make_poller() -> (ModemPoller, Arc<Registry>, SharedStatus) {
        let mut registry = Registry::default();
        let metrics = Arc::new(ModemMetrics::new(&mut registry));
        let status = status::shared("http://modem/status_cgi");
        let config = ModemConfig {
            downstream_locator: "//table[1]/tbody".to_string(),
            upstream_locator: "//table[2]/tbody".to_string(),
            ..ModemConfig::default()
        };
        let poller = ModemPoller::new(&config, metrics, status.clone()).unwrap();
        (poller, Arc::new(registry), status)
    }

    const DOC: &str = "\
        <table><tbody>\
        <tr><td></td><td>DCID</td><td>Freq</td><td>Power</td><td>SNR</td>\
            <td>Modulation</td><td>Octets</td><td>Correcteds</td><td>Uncorrectables</td></tr>\
        <tr><td>Downstream 1</td><td>73</td><td>114.00 MHz</td><td>0.82 dBmV</td>\
            <td>32.77 dB</td><td>256QAM</td><td>1144704283</td><td>760100388</td><td>26454645</td></tr>\
        </tbody></table>\
        <table><tbody>\
        <tr><td></td><td>UCID</td><td>Freq</td><td>Power</td></tr>\
        <tr><td>Upstream 1</td><td>5</td><td>36.00 MHz</td><td>46.50 dBmV</td></tr>\
        </tbody></table>";

    #[test]
    fn test_process_document_updates_gauges_and_snapshot() {
        let (poller, registry, status) = make_poller();

        let (downstream, upstream) = poller.process_document(DOC).unwrap();
        assert_eq!((downstream, upstream), (1, 1));

        let mut out = String::new();
        encode(&mut out, &registry).unwrap();
        assert!(out.lines().any(|l| l.starts_with("downstream_snr{")
            && l.contains("name=\"Downstream 1\"")
            && l.ends_with(" 32.77")));
        assert!(out.lines().any(|l| l.starts_with("upstream_freq{")
            && l.contains("id=\"5\"")
            && l.ends_with(" 36.0")));

        let snapshot = status.read();
        assert!(snapshot.ready());
        assert_eq!(snapshot.cycles, 1);
        assert!(snapshot.last_error.is_none());
        assert_eq!(snapshot.downstream.channels.len(), 1);
        assert_eq!(snapshot.upstream.header[1], "UCID");
    }

    #[test]
    fn test_process_document_locator_miss_reports_nothing() {
        let (poller, _registry, status) = make_poller();

        let (downstream, upstream) = poller.process_document("<html></html>").unwrap();
        assert_eq!((downstream, upstream), (0, 0));

        // An empty page is "nothing to report", still a completed cycle.
        let snapshot = status.read();
        assert_eq!(snapshot.cycles, 1);
        assert!(snapshot.downstream.channels.is_empty());
    }

    #[test]
    fn test_process_document_row_mismatch_fails_cycle() {
        let (poller, _registry, status) = make_poller();

        let doc = "<table><tbody>\
                   <tr><td></td><td>DCID</td><td>Freq</td></tr>\
                   <tr><td>Downstream 1</td><td>73</td></tr>\
                   </tbody></table>";
        let err = poller.process_document(doc).unwrap_err();
        assert!(matches!(err, TableError::RowLength { .. }));

        // The snapshot keeps its previous state; run() records the error.
        assert_eq!(status.read().cycles, 0);
    }
}
