//! Outcome reports handed to whoever is listening to the chain.

use std::fmt;
use tracing::{error, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportLevel {
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub level: ReportLevel,
    pub message: String,
}

impl Report {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: ReportLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ReportLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Sink for chain reports. Formatting and delivery are up to the implementor.
pub trait Reporter: Send + Sync {
    fn report(&self, report: &Report);
}

/// Default reporter: forwards every report as a `tracing` event.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, report: &Report) {
        match report.level {
            ReportLevel::Info => info!(target: "ledger_core::chain", "{}", report.message),
            ReportLevel::Error => error!(target: "ledger_core::chain", "{}", report.message),
        }
    }
}
