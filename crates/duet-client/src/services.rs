//! HTTP collaborators: room service and autocomplete service.
//!
//! Thin request/response glue. Failures are returned as [`ServiceError`] and
//! never retried here.

use std::time::Duration;

use duet_proto::{
    AutocompleteRequest, AutocompleteResponse, CreateRoomRequest, Language, RoomId, RoomInfo,
};
use serde::de::DeserializeOwned;

use crate::{error::ServiceError, service::SuggestionService};

/// API base used when none is configured.
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// TCP connect timeout for collaborator calls.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Whole-request timeout for collaborator calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Collection routes keep their trailing slash; the server redirects without it.
const CREATE_ROOM_PATH: &str = "rooms/";
const AUTOCOMPLETE_PATH: &str = "autocomplete/";

/// REST client for the room and autocomplete services.
#[derive(Debug, Clone)]
pub struct HttpServices {
    http: reqwest::Client,
    api_base: String,
}

impl HttpServices {
    /// Build a client for `api_base` (e.g. `http://localhost:8000`).
    ///
    /// # Errors
    ///
    /// - `ServiceError::Connect` if the HTTP client cannot be constructed
    pub fn new(api_base: impl Into<String>) -> Result<Self, ServiceError> {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ServiceError::Connect { url: api_base.clone(), detail: e.to_string() })?;
        Ok(Self { http, api_base })
    }

    /// API base URL without a trailing slash.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// `POST /rooms/`: create a room.
    ///
    /// # Errors
    ///
    /// - `ServiceError::Connect` on transport failure
    /// - `ServiceError::Status` on a non-2xx response
    /// - `ServiceError::Decode` if the body is not a room description
    pub async fn create_room(&self, language: Language) -> Result<RoomInfo, ServiceError> {
        let url = self.endpoint(CREATE_ROOM_PATH);
        let request = self.http.post(&url).json(&CreateRoomRequest { language });
        let info: RoomInfo = self.execute(url, request).await?;
        tracing::info!(room_id = %info.room_id, %language, "room created");
        Ok(info)
    }

    /// `GET /rooms/<id>`: look up a room.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_room`]; an unknown room is `Status { status: 404 }`.
    pub async fn get_room(&self, room_id: &RoomId) -> Result<RoomInfo, ServiceError> {
        let url = self.endpoint(&format!("rooms/{room_id}"));
        let request = self.http.get(&url);
        self.execute(url, request).await
    }

    /// `POST /autocomplete/`: ask for a completion.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_room`].
    pub async fn autocomplete(
        &self,
        request: &AutocompleteRequest,
    ) -> Result<AutocompleteResponse, ServiceError> {
        let url = self.endpoint(AUTOCOMPLETE_PATH);
        let builder = self.http.post(&url).json(request);
        self.execute(url, builder).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.api_base)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        url: String,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ServiceError> {
        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::Connect { url: url.clone(), detail: e.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status { status: status.as_u16(), url });
        }

        response.json::<T>().await.map_err(|e| ServiceError::Decode(e.to_string()))
    }
}

impl SuggestionService for HttpServices {
    async fn suggest(
        &self,
        request: AutocompleteRequest,
    ) -> Result<AutocompleteResponse, ServiceError> {
        self.autocomplete(&request).await
    }
}
