//! Operator commands run outside the HTTP server.

use crate::audit;
use crate::matcher::CaseMatcher;
use crate::store::{PurgeCounts, Store, StoreError};
use crate::urn::{Urn, UrnRules};
use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use std::fmt;
use std::io::BufRead;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MaintenanceError {
    #[error("could not read URN list: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Counts for one `#` headed block of a URN list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SectionCounts {
    /// The header line without its `#`. Empty for URNs listed before the
    /// first header.
    pub title: String,
    pub matched: usize,
    pub missed: usize,
    /// Entries that found no case, as written in the list.
    pub failed: Vec<String>,
}

impl SectionCounts {
    fn titled(title: &str) -> Self {
        SectionCounts {
            title: title.to_string(),
            ..SectionCounts::default()
        }
    }

    fn is_empty(&self) -> bool {
        self.matched == 0 && self.missed == 0
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UrnCheckReport {
    pub sections: Vec<SectionCounts>,
}

impl UrnCheckReport {
    pub fn matched(&self) -> usize {
        self.sections.iter().map(|s| s.matched).sum()
    }

    pub fn missed(&self) -> usize {
        self.sections.iter().map(|s| s.missed).sum()
    }
}

impl fmt::Display for UrnCheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            if !section.title.is_empty() {
                writeln!(f, "# {}", section.title)?;
            }
            for entry in &section.failed {
                writeln!(f, "{} - failed", entry)?;
            }
            writeln!(f, "----------------")?;
            writeln!(f, "Matched {}", section.matched)?;
            writeln!(f, "Missed {}", section.missed)?;
            writeln!(f)?;
        }
        writeln!(f, "----------------")?;
        writeln!(f, "Total:")?;
        writeln!(f, "Matched {}", self.matched())?;
        write!(f, "Missed {}", self.missed())
    }
}

/// Checks which URNs in a list have a case.
///
/// One URN per line. A line starting with `#` opens a section and a blank
/// line closes it. Entries that do not parse count as missed.
pub fn check_urns<R: BufRead>(
    input: R,
    matcher: &CaseMatcher<'_>,
    rules: &UrnRules,
) -> Result<UrnCheckReport, MaintenanceError> {
    let mut report = UrnCheckReport::default();
    let mut current: Option<SectionCounts> = None;

    for line in input.lines() {
        let line = line?;
        let entry = line.trim();

        if entry.is_empty() {
            if let Some(section) = current.take().filter(|s| !s.is_empty()) {
                report.sections.push(section);
            }
        } else if let Some(title) = entry.strip_prefix('#') {
            if let Some(section) = current.take().filter(|s| !s.is_empty()) {
                report.sections.push(section);
            }
            current = Some(SectionCounts::titled(title.trim()));
        } else {
            let section = current.get_or_insert_with(SectionCounts::default);
            let found = match Urn::parse(entry, rules) {
                Ok(urn) => matcher.find(&urn, None)?.match_count() > 0,
                Err(e) => {
                    warn!("{:?} in URN list is not a URN: {}", entry, e);
                    false
                }
            };
            if found {
                section.matched += 1;
            } else {
                section.missed += 1;
                section.failed.push(entry.to_string());
            }
        }
    }
    if let Some(section) = current.filter(|s| !s.is_empty()) {
        report.sections.push(section);
    }

    info!(
        "checked URN list: {} matched, {} missed",
        report.matched(),
        report.missed()
    );
    Ok(report)
}

/// Result of re-hashing every stored audit event payload.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AuditCheck {
    pub checked: usize,
    /// Ids of events whose payload no longer matches its hash.
    pub mismatched: Vec<i64>,
}

pub fn verify_audit_events(store: &Store) -> Result<AuditCheck, StoreError> {
    let mut check = AuditCheck::default();
    for event in store.audit_events()? {
        check.checked += 1;
        if !audit::verify(&event) {
            warn!("audit event {} does not match its payload hash", event.id);
            check.mismatched.push(event.id);
        }
    }
    info!(
        "verified {} audit events, {} mismatched",
        check.checked,
        check.mismatched.len()
    );
    Ok(check)
}

/// Deletes everything created before `now - retention`.
pub fn purge(
    store: &mut Store,
    retention: Duration,
    now: DateTime<Utc>,
) -> Result<PurgeCounts, StoreError> {
    store.purge_before(now - retention)
}
