use std::collections::BTreeMap;

/// Counters collected over one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// URLs handed to the fetcher (every visit, whatever the outcome)
    pub pages_attempted: u64,

    /// Page records appended to the store
    pub pages_stored: u64,

    /// Visits that ended in a skip (policy, size, content type)
    pub pages_skipped: u64,

    /// Visits that exhausted their retries
    pub pages_failed: u64,

    /// Successful fetches whose record could not be stored
    pub store_errors: u64,

    /// Identity rotations requested
    pub rotations: u64,

    /// Visits per seed domain
    pub visits_by_domain: BTreeMap<String, u64>,
}

impl CrawlSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one visit against a domain
    pub fn record_visit(&mut self, domain: &str) {
        self.pages_attempted += 1;
        *self.visits_by_domain.entry(domain.to_string()).or_insert(0) += 1;
    }

    /// Returns the share of attempted pages that were stored, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.pages_attempted == 0 {
            return 0.0;
        }
        (self.pages_stored as f64 / self.pages_attempted as f64) * 100.0
    }
}
