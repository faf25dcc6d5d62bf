//! Prometheus gauge wiring for channel metrics.
//!
//! All gauges are created and registered once at startup against an
//! explicit [`Registry`] handle; poll cycles only write values. Every
//! channel gauge carries the same label pair: the channel id (`DCID`/`UCID`
//! column) and the channel name (the unlabeled leading column).

use std::sync::atomic::AtomicU64;

use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

use crate::mapping::{DownstreamReading, UpstreamReading};

/// Labels identifying one channel's time series.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ChannelLabels {
    /// Channel id, from the `DCID`/`UCID` column.
    pub id: String,
    /// Channel name, e.g. `"Downstream 1"`.
    pub name: String,
}

type ChannelGauge = Family<ChannelLabels, Gauge<f64, AtomicU64>>;

/// The exporter's metric set.
pub struct ModemMetrics {
    downstream_freq: ChannelGauge,
    downstream_power: ChannelGauge,
    downstream_snr: ChannelGauge,
    downstream_octets: ChannelGauge,
    downstream_correcteds: ChannelGauge,
    downstream_uncorrectables: ChannelGauge,
    upstream_freq: ChannelGauge,
    upstream_power: ChannelGauge,

    downstream_channels: Gauge,
    upstream_channels: Gauge,
    poll_cycles: Counter,
    poll_errors: Counter,
}

impl ModemMetrics {
    /// Create the metric set and register everything into `registry`.
    pub fn new(registry: &mut Registry) -> Self {
        let metrics = Self {
            downstream_freq: ChannelGauge::default(),
            downstream_power: ChannelGauge::default(),
            downstream_snr: ChannelGauge::default(),
            downstream_octets: ChannelGauge::default(),
            downstream_correcteds: ChannelGauge::default(),
            downstream_uncorrectables: ChannelGauge::default(),
            upstream_freq: ChannelGauge::default(),
            upstream_power: ChannelGauge::default(),
            downstream_channels: Gauge::default(),
            upstream_channels: Gauge::default(),
            poll_cycles: Counter::default(),
            poll_errors: Counter::default(),
        };

        registry.register(
            "downstream_freq",
            "Downstream channel frequency in MHz",
            metrics.downstream_freq.clone(),
        );
        registry.register(
            "downstream_power",
            "Downstream channel power in dBmV",
            metrics.downstream_power.clone(),
        );
        registry.register(
            "downstream_snr",
            "Downstream channel signal-to-noise ratio in dB",
            metrics.downstream_snr.clone(),
        );
        registry.register(
            "downstream_octets",
            "Downstream channel octets received",
            metrics.downstream_octets.clone(),
        );
        registry.register(
            "downstream_correcteds",
            "Downstream channel corrected errors",
            metrics.downstream_correcteds.clone(),
        );
        registry.register(
            "downstream_uncorrectables",
            "Downstream channel uncorrectable errors",
            metrics.downstream_uncorrectables.clone(),
        );
        registry.register(
            "upstream_freq",
            "Upstream channel frequency in MHz",
            metrics.upstream_freq.clone(),
        );
        registry.register(
            "upstream_power",
            "Upstream channel power in dBmV",
            metrics.upstream_power.clone(),
        );

        registry.register(
            "modem_downstream_channels",
            "Downstream channels seen in the last completed poll cycle",
            metrics.downstream_channels.clone(),
        );
        registry.register(
            "modem_upstream_channels",
            "Upstream channels seen in the last completed poll cycle",
            metrics.upstream_channels.clone(),
        );
        // Counters are encoded with the `_total` suffix appended.
        registry.register(
            "modem_poll_cycles",
            "Completed poll cycles",
            metrics.poll_cycles.clone(),
        );
        registry.register(
            "modem_poll_errors",
            "Poll cycles aborted by an error",
            metrics.poll_errors.clone(),
        );

        metrics
    }

    /// Write one downstream channel's six gauges.
    pub fn record_downstream(&self, reading: &DownstreamReading) {
        let labels = ChannelLabels {
            id: reading.id.clone(),
            name: reading.name.clone(),
        };
        self.downstream_freq.get_or_create(&labels).set(reading.freq);
        self.downstream_power
            .get_or_create(&labels)
            .set(reading.power);
        self.downstream_snr.get_or_create(&labels).set(reading.snr);
        self.downstream_octets
            .get_or_create(&labels)
            .set(reading.octets);
        self.downstream_correcteds
            .get_or_create(&labels)
            .set(reading.correcteds);
        self.downstream_uncorrectables
            .get_or_create(&labels)
            .set(reading.uncorrectables);
    }

    /// Write one upstream channel's two gauges.
    pub fn record_upstream(&self, reading: &UpstreamReading) {
        let labels = ChannelLabels {
            id: reading.id.clone(),
            name: reading.name.clone(),
        };
        self.upstream_freq.get_or_create(&labels).set(reading.freq);
        self.upstream_power
            .get_or_create(&labels)
            .set(reading.power);
    }

    /// Account for a completed cycle and its channel counts.
    pub fn cycle_completed(&self, downstream: usize, upstream: usize) {
        self.downstream_channels.set(downstream as i64);
        self.upstream_channels.set(upstream as i64);
        self.poll_cycles.inc();
    }

    /// Account for a cycle aborted by an error.
    pub fn cycle_failed(&self) {
        self.poll_errors.inc();
    }
}
