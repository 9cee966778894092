//! Generic runtime for room view orchestration.
//!
//! The Runtime drives the event loop, coordinating between:
//! - [`Client`]: room view state machine
//! - [`Driver`]: platform-specific I/O
//!
//! Events are handled strictly one at a time. After every input the runtime
//! ticks the client so due timers fire, and it sleeps no longer than the
//! client's next deadline.

use duet_client::{Client, ClientAction, ClientConfig, ClientEvent};
use duet_core::Environment;
use duet_proto::{Language, RoomId};

use crate::{Driver, DriverInput};

/// Generic runtime that orchestrates a Client and a Driver.
///
/// Dropping the runtime releases the transport and all timers even if
/// [`Runtime::run`] never finished.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `E`: Environment providing the clock
pub struct Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    driver: D,
    env: E,
    client: Client<E>,
    shut_down: bool,
}

impl<D, E> Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    /// Create a runtime for one room view.
    pub fn new(driver: D, env: E, room_id: RoomId, language: Language, config: ClientConfig) -> Self {
        let client = Client::new(env.clone(), room_id, language, config);
        Self { driver, env, client, shut_down: false }
    }

    /// Run the room view until the driver reports [`DriverInput::Quit`].
    ///
    /// The connection and timers are released on every exit path, including
    /// driver errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        let result = self.event_loop().await;
        self.shutdown();
        result
    }

    async fn event_loop(&mut self) -> Result<(), D::Error> {
        self.driver.render(self.client.state())?;
        self.dispatch(ClientEvent::Open)?;

        loop {
            let timeout = self.client.next_deadline().map(|deadline| deadline - self.env.now());

            match self.driver.next_input(timeout).await? {
                Some(DriverInput::Quit) => {
                    tracing::info!(room_id = %self.client.room_id(), "leaving room view");
                    return Ok(());
                },
                Some(DriverInput::Client(event)) => self.dispatch(event)?,
                None => {},
            }

            self.dispatch(ClientEvent::Tick)?;
        }
    }

    /// Feed one event to the client and execute what it asks for.
    fn dispatch(&mut self, event: ClientEvent) -> Result<(), D::Error> {
        let actions = self.client.handle(event);
        self.execute(actions)
    }

    fn execute(&mut self, actions: Vec<ClientAction>) -> Result<(), D::Error> {
        let mut render = false;

        for action in actions {
            match action {
                ClientAction::Connect { attempt, url } => self.driver.connect(attempt, &url),
                ClientAction::Transmit { attempt, payload } => {
                    if let Err(error) = self.driver.transmit(attempt, payload) {
                        tracing::warn!(attempt, %error, "failed to transmit frame");
                    }
                },
                ClientAction::Disconnect { attempt } => self.driver.disconnect(attempt),
                ClientAction::RequestSuggestion { request_id, request } => {
                    self.driver.request_suggestion(request_id, request);
                },
                ClientAction::StateChanged => render = true,
            }
        }

        if render {
            self.driver.render(self.client.state())?;
        }
        Ok(())
    }

    /// Close the room view and release driver resources. Idempotent.
    fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        for action in self.client.handle(ClientEvent::Close) {
            match action {
                ClientAction::Disconnect { attempt } => self.driver.disconnect(attempt),
                ClientAction::StateChanged => {
                    if let Err(error) = self.driver.render(self.client.state()) {
                        tracing::warn!(%error, "failed to render final state");
                    }
                },
                ClientAction::Connect { .. }
                | ClientAction::Transmit { .. }
                | ClientAction::RequestSuggestion { .. } => {
                    tracing::warn!(?action, "unexpected action during shutdown");
                },
            }
        }

        self.driver.stop();
    }
}

impl<D, E> Drop for Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    fn drop(&mut self) {
        self.shutdown();
    }
}
