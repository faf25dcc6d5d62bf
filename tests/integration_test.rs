//! Integration tests for the modem exporter.
//!
//! These run the full extraction pipeline — fixture document → tables →
//! records → parsed values → registered gauges — and check the rendered
//! exposition output, without touching the network.

use std::sync::Arc;

use prometheus_client::encoding::text::encode;
use prometheus_client::registry::Registry;

use arris_mon::config::ModemConfig;
use arris_mon::{Locator, ModemMetrics, ModemPoller, Table, status};

const SAMPLE: &str = include_str!("fixtures/sample_status.html");

fn make_poller() -> (ModemPoller, Arc<Registry>, status::SharedStatus) {
    let mut registry = Registry::default();
    let metrics = Arc::new(ModemMetrics::new(&mut registry));
    let shared = status::shared("http://192.168.100.1/cgi-bin/status_cgi");
    let poller = ModemPoller::new(&ModemConfig::default(), metrics, shared.clone()).unwrap();
    (poller, Arc::new(registry), shared)
}

/// Find the sample value for `name{id="..",name=".."}` in exposition output.
fn metric_value(output: &str, metric: &str, id: &str, channel: &str) -> Option<f64> {
    output
        .lines()
        .find(|line| {
            line.starts_with(&format!("{metric}{{"))
                && line.contains(&format!("id=\"{id}\""))
                && line.contains(&format!("name=\"{channel}\""))
        })
        .and_then(|line| line.rsplit(' ').next())
        .and_then(|value| value.parse().ok())
}

#[test]
fn test_sample_page_table_extraction() {
    let downstream: Locator = "//table[2]/tbody".parse().unwrap();
    let table = Table::extract(SAMPLE, &downstream);

    assert_eq!(table.channel_count(), 4);
    assert_eq!(
        table.header().unwrap(),
        [
            "",
            "DCID",
            "Freq",
            "Power",
            "SNR",
            "Modulation",
            "Octets",
            "Correcteds",
            "Uncorrectables"
        ]
    );
    assert_eq!(
        table.rows()[1],
        vec![
            "Downstream 1",
            "73",
            "114.00 MHz",
            "0.82 dBmV",
            "32.77 dB",
            "256QAM",
            "1144704283",
            "760100388",
            "26454645"
        ]
    );

    // Extraction is pure: a second pass over the same inputs is equal.
    assert_eq!(table, Table::extract(SAMPLE, &downstream));

    let upstream: Locator = "//table[4]/tbody".parse().unwrap();
    let table = Table::extract(SAMPLE, &upstream);
    assert_eq!(table.channel_count(), 2);
    assert_eq!(
        table.rows()[1],
        vec![
            "Upstream 1",
            "5",
            "36.00 MHz",
            "46.50 dBmV",
            "DOCSIS2.0 (ATDMA)",
            "5120 kSym/s",
            "32QAM"
        ]
    );
}

#[test]
fn test_sample_page_end_to_end_metrics() {
    let (poller, registry, shared) = make_poller();

    let (downstream, upstream) = poller.process_document(SAMPLE).unwrap();
    assert_eq!((downstream, upstream), (4, 2));

    let mut output = String::new();
    encode(&mut output, &registry).unwrap();

    // Downstream 1: all six metrics, labeled id=73.
    let m = |metric| metric_value(&output, metric, "73", "Downstream 1");
    assert_eq!(m("downstream_freq"), Some(114.00));
    assert_eq!(m("downstream_power"), Some(0.82));
    assert_eq!(m("downstream_snr"), Some(32.77));
    assert_eq!(m("downstream_octets"), Some(1144704283.0));
    assert_eq!(m("downstream_correcteds"), Some(760100388.0));
    assert_eq!(m("downstream_uncorrectables"), Some(26454645.0));

    // Other downstream channels are present too.
    assert_eq!(
        metric_value(&output, "downstream_freq", "76", "Downstream 4"),
        Some(138.00)
    );

    // Upstream 1: the two upstream metrics, labeled id=5.
    assert_eq!(
        metric_value(&output, "upstream_freq", "5", "Upstream 1"),
        Some(36.00)
    );
    assert_eq!(
        metric_value(&output, "upstream_power", "5", "Upstream 1"),
        Some(46.50)
    );
    assert_eq!(
        metric_value(&output, "upstream_freq", "6", "Upstream 2"),
        Some(44.00)
    );

    // Cycle bookkeeping.
    assert!(output.contains("modem_downstream_channels 4"));
    assert!(output.contains("modem_upstream_channels 2"));
    assert!(output.contains("modem_poll_cycles_total 1"));

    let snapshot = shared.read();
    assert!(snapshot.ready());
    assert_eq!(snapshot.downstream.channels.len(), 4);
    assert_eq!(snapshot.upstream.channels.len(), 2);
    assert_eq!(snapshot.upstream.channels[0][0], "Upstream 1");
}

#[test]
fn test_second_cycle_overwrites_gauges() {
    let (poller, registry, _shared) = make_poller();

    poller.process_document(SAMPLE).unwrap();

    // Same channels, new counter readings on the next cycle.
    let updated = SAMPLE.replace("1144704283", "1144804283");
    poller.process_document(&updated).unwrap();

    let mut output = String::new();
    encode(&mut output, &registry).unwrap();
    assert_eq!(
        metric_value(&output, "downstream_octets", "73", "Downstream 1"),
        Some(1144804283.0)
    );
    assert!(output.contains("modem_poll_cycles_total 2"));
}

#[test]
fn test_short_document_reports_zero_channels() {
    let (poller, registry, shared) = make_poller();

    // Only one table: both default locators miss.
    let doc = "<html><table><tbody><tr><td>CM Status:</td><td>OPERATIONAL</td></tr></tbody></table></html>";
    let (downstream, upstream) = poller.process_document(doc).unwrap();
    assert_eq!((downstream, upstream), (0, 0));

    let mut output = String::new();
    encode(&mut output, &registry).unwrap();
    assert!(output.contains("modem_downstream_channels 0"));
    assert!(shared.read().ready());
}
