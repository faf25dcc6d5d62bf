//! Prometheus exporter for Arris cable modem channel diagnostics.
//!
//! This crate polls a cable modem's diagnostic status page, extracts the
//! downstream and upstream channel tables from the HTML, and exposes the
//! per-channel figures as labeled Prometheus gauges via an HTTP `/metrics`
//! endpoint, alongside a human-readable status page.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │   Cable Modem   │────>│     Poller      │────>│   HTTP Server   │
//! │  (status page)  │     │ (table→gauges)  │     │ (/metrics, /)   │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! Each poll cycle fetches the status page, locates the two table regions
//! via XPath-style locators (`//table[2]/tbody`, `//table[4]/tbody` by
//! default), turns every data row into a field-name→value [`Record`], and
//! writes the parsed values into gauges labeled by channel id and name.
//!
//! # Usage
//!
//! Run the exporter binary, optionally with a configuration file:
//!
//! ```bash
//! arris-mon --config arris-mon.json5 --source http://192.168.100.1/cgi-bin/status_cgi
//! ```
//!
//! # Configuration
//!
//! See [`config::MonitorConfig`] for configuration options.

pub mod config;
pub mod html;
pub mod http;
pub mod locator;
pub mod mapping;
pub mod metrics;
pub mod poller;
pub mod status;
pub mod table;

pub use config::MonitorConfig;
pub use http::HttpServer;
pub use locator::Locator;
pub use metrics::ModemMetrics;
pub use poller::ModemPoller;
pub use status::{SharedStatus, StatusSnapshot};
pub use table::{Record, Table};
