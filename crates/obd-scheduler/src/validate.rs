//! Schedule Validation
//!
//! Checks every scheduled name against the command catalog. Unknown names
//! are reported once per occurrence and left in place; the connection
//! manager skips them at runtime.

use crate::config::ScheduleConfig;
use obd_protocol::Catalog;
use serde::Serialize;
use tracing::{info, warn};

/// A scheduled name no catalog defines
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownName {
    /// List the name appears in
    pub list: &'static str,
    /// Position within that list
    pub index: usize,
    pub name: String,
}

/// Result of checking a schedule against a catalog
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub unknown: Vec<UnknownName>,
    /// Names defined in both the built-in and custom tables
    pub duplicate_names: Vec<&'static str>,
    /// Custom commands sending the same request as a built-in one
    pub shared_requests: Vec<(&'static str, &'static str)>,
}

impl ValidationReport {
    /// Whether every scheduled name resolves and the catalog is consistent
    pub fn is_clean(&self) -> bool {
        self.unknown.is_empty() && self.duplicate_names.is_empty()
    }
}

/// Check `schedule` against `catalog`, logging each problem found
pub fn validate(schedule: &ScheduleConfig, catalog: &Catalog) -> ValidationReport {
    let mut report = ValidationReport {
        duplicate_names: catalog.duplicate_names(),
        shared_requests: catalog.shared_requests(),
        ..ValidationReport::default()
    };

    for name in &report.duplicate_names {
        warn!("Command {} is defined in both the built-in and custom tables", name);
    }
    for (custom, builtin) in &report.shared_requests {
        info!("Custom command {} sends the same request as {}", custom, builtin);
    }

    let lists = [
        ("startup", &schedule.startup),
        ("housekeeping", &schedule.housekeeping),
        ("cycle", &schedule.cycle),
    ];
    for (list, names) in lists {
        for (index, name) in names.iter().enumerate() {
            if !catalog.contains(name) {
                warn!(
                    "Unknown command {} in {} list (position {}), it will be skipped",
                    name,
                    list,
                    index + 1
                );
                report.unknown.push(UnknownName {
                    list,
                    index,
                    name: name.clone(),
                });
            }
        }
    }

    info!(
        "Schedule checked: {} names, {} unknown",
        schedule.names().count(),
        report.unknown.len()
    );
    report
}
