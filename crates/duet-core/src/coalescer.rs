//! Autocomplete request coalescer.
//!
//! Turns a burst of local edits into one suggestion request once input has
//! been quiet for [`CoalescerConfig::quiet_period`]. Each dispatched request
//! gets a monotonically increasing id; a response is applied only when it
//! answers the most recent dispatch and no local edit happened since. Anything
//! else is stale and discarded, so a slow response can never surface a
//! suggestion for text the user has already moved past.

use std::{collections::BTreeSet, time::Duration};

use duet_proto::{AutocompleteRequest, AutocompleteResponse};

use crate::{env::Moment, state::SyncState, timer::Timer};

/// Quiet period after the last edit before a request fires.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(600);

/// Confidence a suggestion must strictly exceed to be shown.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Coalescer configuration
#[derive(Debug, Clone)]
pub struct CoalescerConfig {
    /// Debounce interval
    pub quiet_period: Duration,
    /// Minimum (exclusive) confidence for a suggestion to be offered
    pub confidence_threshold: f64,
}

impl Default for CoalescerConfig {
    fn default() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

/// A request ready to be sent to the suggestion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRequest {
    /// Id to quote back in [`Coalescer::complete`]
    pub id: u64,
    /// Service request body, snapshotted at dispatch time
    pub request: AutocompleteRequest,
}

/// Debounces local edits into suggestion requests.
#[derive(Debug, Clone)]
pub struct Coalescer<I> {
    config: CoalescerConfig,
    debounce: Timer<I>,
    next_id: u64,
    /// Request whose response may still be applied.
    current: Option<u64>,
    in_flight: BTreeSet<u64>,
}

impl<I: Moment> Coalescer<I> {
    /// Create an idle coalescer.
    pub fn new(config: CoalescerConfig) -> Self {
        Self { config, debounce: Timer::new(), next_id: 1, current: None, in_flight: BTreeSet::new() }
    }

    /// Earliest time [`Self::tick`] has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<I> {
        self.debounce.deadline()
    }

    /// Whether a debounced request is waiting to fire.
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.debounce.is_pending()
    }

    /// Number of requests dispatched and not yet completed.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// A local edit happened: restart the quiet period, drop the shown
    /// suggestion and invalidate any request already in flight.
    pub fn on_local_edit(&mut self, state: &mut SyncState, now: I) {
        self.debounce.schedule(now, self.config.quiet_period);
        self.current = None;
        state.clear_suggestion();
    }

    /// Fire the debounced request if the quiet period has elapsed.
    ///
    /// The request carries the buffer, cursor and language as they are now.
    pub fn tick(&mut self, state: &mut SyncState, now: I) -> Option<SuggestionRequest> {
        if !self.debounce.fire_if_due(now) {
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.current = Some(id);
        self.in_flight.insert(id);

        state.clear_suggestion();
        state.set_suggestion_loading(true);

        let request = AutocompleteRequest {
            code: state.buffer().to_owned(),
            cursor_position: state.cursor(),
            language: state.language(),
        };
        tracing::debug!(request_id = id, cursor = request.cursor_position, "dispatching suggestion request");

        Some(SuggestionRequest { id, request })
    }

    /// The service answered request `id` (or failed with `Err(reason)`).
    ///
    /// Returns `true` if a suggestion was offered.
    pub fn complete(
        &mut self,
        state: &mut SyncState,
        id: u64,
        outcome: Result<AutocompleteResponse, String>,
    ) -> bool {
        if !self.in_flight.remove(&id) {
            tracing::debug!(request_id = id, "completion for unknown request");
            return false;
        }
        state.set_suggestion_loading(!self.in_flight.is_empty());

        let is_current = self.current == Some(id);
        if is_current {
            self.current = None;
        }

        match outcome {
            Err(reason) => {
                tracing::warn!(request_id = id, %reason, "suggestion request failed");
                false
            },
            Ok(_) if !is_current => {
                tracing::debug!(request_id = id, "discarding stale suggestion");
                false
            },
            Ok(response) if response.confidence > self.config.confidence_threshold => {
                tracing::debug!(request_id = id, confidence = response.confidence, "suggestion offered");
                state.offer_suggestion(response.suggestion);
                true
            },
            Ok(response) => {
                tracing::debug!(
                    request_id = id,
                    confidence = response.confidence,
                    "suggestion below confidence threshold"
                );
                false
            },
        }
    }

    /// Cancel the debounce and forget all in-flight requests.
    pub fn reset(&mut self, state: &mut SyncState) {
        self.debounce.cancel();
        self.current = None;
        self.in_flight.clear();
        state.set_suggestion_loading(false);
    }
}
