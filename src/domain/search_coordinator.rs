//! Live search orchestration shared by the child and guardian search
//! boxes.
//!
//! Every keystroke restarts the search. Lookups resolve out of order, so
//! each one captures a generation number when it launches; a result may
//! only commit while its generation is still the latest. Closing the
//! containing workflow bumps the generation once more, which both clears
//! the visible results and orphans anything still in flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Minimum term length before a query is issued at all.
pub const MIN_SEARCH_TERM_LEN: usize = 2;

/// Fixed page cap on search results.
pub const SEARCH_PAGE_SIZE: usize = 25;

/// Ticket captured when a search launches. Holds the generation the
/// search belongs to; commit checks it against the current generation.
#[derive(Debug, Clone)]
pub struct SearchTicket {
    generation: u64,
    pub term: String,
}

/// Coordinates overlapping searches for one result list.
#[derive(Clone)]
pub struct SearchCoordinator<T: Clone + Send> {
    generation: Arc<AtomicU64>,
    results: Arc<Mutex<Vec<T>>>,
}

impl<T: Clone + Send> SearchCoordinator<T> {
    pub fn new() -> Self {
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            results: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Start a new search. Supersedes every prior in-flight search.
    /// Returns `None` for terms below the minimum length, clearing the
    /// current results as well.
    pub fn begin(&self, term: &str) -> Option<SearchTicket> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let term = term.trim();
        if term.len() < MIN_SEARCH_TERM_LEN {
            self.results.lock().unwrap().clear();
            return None;
        }
        Some(SearchTicket {
            generation,
            term: term.to_string(),
        })
    }

    /// Commit results for a ticket. Returns false (and changes nothing)
    /// when a newer search has started since the ticket was issued.
    pub fn commit(&self, ticket: &SearchTicket, results: Vec<T>) -> bool {
        if ticket.generation != self.generation.load(Ordering::SeqCst) {
            log::debug!(
                "Discarding stale search results for '{}' (generation {})",
                ticket.term,
                ticket.generation
            );
            return false;
        }
        *self.results.lock().unwrap() = results;
        true
    }

    /// Whether a ticket is still the latest search.
    pub fn is_current(&self, ticket: &SearchTicket) -> bool {
        ticket.generation == self.generation.load(Ordering::SeqCst)
    }

    /// Clear results and orphan anything in flight, e.g. when the
    /// containing workflow closes.
    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.results.lock().unwrap().clear();
    }

    pub fn results(&self) -> Vec<T> {
        self.results.lock().unwrap().clone()
    }
}

impl<T: Clone + Send> Default for SearchCoordinator<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_term_issues_no_query_and_clears() {
        let coordinator: SearchCoordinator<String> = SearchCoordinator::new();

        let ticket = coordinator.begin("ana").unwrap();
        coordinator.commit(&ticket, vec!["Ana Lee".to_string()]);
        assert_eq!(coordinator.results().len(), 1);

        // One character: no ticket, and the stale results are gone.
        assert!(coordinator.begin("a").is_none());
        assert!(coordinator.results().is_empty());
    }

    #[test]
    fn test_two_character_term_issues_a_query() {
        let coordinator: SearchCoordinator<String> = SearchCoordinator::new();
        assert!(coordinator.begin("an").is_some());
    }

    #[test]
    fn test_slow_first_query_cannot_overwrite_second() {
        let coordinator: SearchCoordinator<String> = SearchCoordinator::new();

        let slow = coordinator.begin("ana").unwrap();
        let fast = coordinator.begin("anab").unwrap();

        // The faster, newer query lands first.
        assert!(coordinator.commit(&fast, vec!["Anabel Reyes".to_string()]));

        // The older query's late result must not overwrite it.
        assert!(!coordinator.commit(&slow, vec!["Ana Lee".to_string()]));
        assert_eq!(coordinator.results(), vec!["Anabel Reyes".to_string()]);
    }

    #[test]
    fn test_reset_orphans_in_flight_queries() {
        let coordinator: SearchCoordinator<String> = SearchCoordinator::new();
        let ticket = coordinator.begin("ana").unwrap();

        coordinator.reset();
        assert!(!coordinator.is_current(&ticket));
        assert!(!coordinator.commit(&ticket, vec!["Ana Lee".to_string()]));
        assert!(coordinator.results().is_empty());
    }

    #[test]
    fn test_term_is_trimmed_before_length_check() {
        let coordinator: SearchCoordinator<String> = SearchCoordinator::new();
        assert!(coordinator.begin("  a  ").is_none());
        let ticket = coordinator.begin("  an  ").unwrap();
        assert_eq!(ticket.term, "an");
    }
}
