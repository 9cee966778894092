//! Autocomplete collaborator seam.

use std::future::Future;

use duet_proto::{AutocompleteRequest, AutocompleteResponse};

use crate::error::ServiceError;

/// Anything that can answer an autocomplete request.
///
/// Implemented by the HTTP client in production and by in-memory mocks in
/// tests. Drivers call it when the client emits
/// [`ClientAction::RequestSuggestion`](crate::ClientAction::RequestSuggestion)
/// and feed the outcome back as
/// [`ClientEvent::SuggestionCompleted`](crate::ClientEvent::SuggestionCompleted).
pub trait SuggestionService: Send + Sync + 'static {
    /// Request a completion for `request`.
    fn suggest(
        &self,
        request: AutocompleteRequest,
    ) -> impl Future<Output = Result<AutocompleteResponse, ServiceError>> + Send;
}
