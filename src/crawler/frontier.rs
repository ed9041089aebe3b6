//! Per-seed crawl frontier
//!
//! This module tracks, for a single seed domain:
//! - The pending queue of same-domain URLs (FIFO, so traversal is breadth-first)
//! - The visited set
//! - The page cap for the domain
//!
//! Invariants: a URL is never both visited and pending, the visited set never
//! grows past the cap, and only URLs on the seed's domain are ever queued.

use crate::url::CrawlTarget;
use std::collections::{HashSet, VecDeque};

/// Visited and pending URLs for one seed domain
#[derive(Debug, Clone)]
pub struct Frontier {
    /// Domain every queued URL must belong to
    domain: String,

    /// Pages allowed to be visited
    cap: usize,

    visited: HashSet<String>,

    /// Pending URLs in insertion order
    queue: VecDeque<CrawlTarget>,

    /// Membership index for `queue`
    pending: HashSet<String>,
}

impl Frontier {
    /// Starts a frontier holding only the seed
    ///
    /// # Arguments
    ///
    /// * `target` - The seed; its domain becomes the frontier's domain
    /// * `cap` - Maximum number of pages to visit
    pub fn seed(target: CrawlTarget, cap: usize) -> Self {
        let mut frontier = Self {
            domain: target.domain.clone(),
            cap,
            visited: HashSet::new(),
            queue: VecDeque::new(),
            pending: HashSet::new(),
        };
        frontier.pending.insert(target.url.clone());
        frontier.queue.push_back(target);
        frontier
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// True while something is pending and the cap is not reached
    pub fn has_work(&self) -> bool {
        !self.queue.is_empty() && self.visited.len() < self.cap
    }

    /// Removes and returns the oldest pending URL
    pub fn take_next(&mut self) -> Option<CrawlTarget> {
        let target = self.queue.pop_front()?;
        self.pending.remove(&target.url);
        Some(target)
    }

    /// Marks a URL visited and drops it from the pending queue
    ///
    /// Returns true if the URL is visited after the call (recording an
    /// already visited URL changes nothing), false if the cap refused it.
    pub fn record_visit(&mut self, url: &str) -> bool {
        if self.visited.contains(url) {
            return true;
        }
        if self.visited.len() >= self.cap {
            return false;
        }

        if self.pending.remove(url) {
            self.queue.retain(|t| t.url != url);
        }
        self.visited.insert(url.to_string());
        true
    }

    /// Queues a discovered URL
    ///
    /// Accepted only if it is on this frontier's domain and neither visited
    /// nor already pending. Returns true if it was queued.
    pub fn offer(&mut self, target: CrawlTarget) -> bool {
        if target.domain != self.domain
            || self.visited.contains(&target.url)
            || self.pending.contains(&target.url)
        {
            return false;
        }

        self.pending.insert(target.url.clone());
        self.queue.push_back(target);
        true
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }
}
