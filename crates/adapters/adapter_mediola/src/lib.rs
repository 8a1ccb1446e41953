//! # mediola2mqtt-adapter-mediola
//!
//! Mediola adapter: implements the [`BlindHub`] port on top of the hub's
//! HTTP command API.
//!
//! ## Requests
//!
//! | Purpose | Query |
//! |---------|-------|
//! | Read state | `XC_FNC=refresher&adr={hex}` |
//! | Move | `XC_FNC=SendSC&type={kind}&data={hex}{code}` |
//!
//! Both go to `GET http://{host}/command`, with `XC_USER`/`XC_PASS` appended
//! when a password is configured.
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `mediola2mqtt-app` and `mediola2mqtt-domain`.

mod config;
pub mod envelope;
mod error;

pub use config::MediolaConfig;
pub use error::MediolaError;

use reqwest::header::CONNECTION;

use mediola2mqtt_app::ports::BlindHub;
use mediola2mqtt_domain::blind::Blind;
use mediola2mqtt_domain::command::BlindCommand;
use mediola2mqtt_domain::error::BridgeError;
use mediola2mqtt_domain::state::BlindState;

/// HTTP client for one Mediola hub.
pub struct MediolaClient {
    http: reqwest::Client,
    url: String,
    config: MediolaConfig,
}

impl MediolaClient {
    /// Create a client for the hub described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`MediolaError::Client`] if the HTTP client cannot be built.
    pub fn new(config: MediolaConfig) -> Result<Self, MediolaError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(MediolaError::Client)?;
        Ok(Self {
            http,
            url: config.command_url(),
            config,
        })
    }

    /// Issue one request and return the raw response body.
    async fn call(&self, mut params: Vec<(&'static str, String)>) -> Result<String, MediolaError> {
        if !self.config.password.is_empty() {
            params.push(("XC_USER", self.config.user.clone()));
            params.push(("XC_PASS", self.config.password.clone()));
        }
        let response = self
            .http
            .get(&self.url)
            .query(&params)
            .header(CONNECTION, "close")
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(MediolaError::Request)?;
        response.text().await.map_err(MediolaError::Request)
    }

    /// Read the state of `blind`, asking again while the hub answers
    /// without one.
    ///
    /// # Errors
    ///
    /// Returns [`MediolaError::Request`] when the hub cannot be reached.
    pub async fn fetch_state(&self, blind: &Blind) -> Result<BlindState, MediolaError> {
        let address = blind.address.to_hex();
        loop {
            let body = self
                .call(vec![
                    ("XC_FNC", "refresher".to_string()),
                    ("adr", address.clone()),
                ])
                .await?;
            if let Some(code) = envelope::state_code(&body) {
                let state = envelope::state_from_code(&code);
                tracing::trace!(%address, %code, %state, "hub reported state");
                return Ok(state);
            }
            tracing::debug!(%address, %body, "hub answered without a state, asking again");
            tokio::time::sleep(self.config.retry_delay()).await;
        }
    }

    /// Send a one-shot move request for `blind`.
    ///
    /// # Errors
    ///
    /// Returns [`MediolaError::Request`] when the hub cannot be reached.
    pub async fn send(&self, blind: &Blind, command: BlindCommand) -> Result<(), MediolaError> {
        let data = format!("{}{}", blind.address.to_hex(), envelope::command_code(command));
        let body = self
            .call(vec![
                ("XC_FNC", "SendSC".to_string()),
                ("type", blind.kind.clone()),
                ("data", data),
            ])
            .await?;
        tracing::trace!(address = %blind.address, %command, %body, "hub acknowledged command");
        Ok(())
    }
}

impl BlindHub for MediolaClient {
    async fn request_state(&self, blind: &Blind) -> Result<BlindState, BridgeError> {
        Ok(self.fetch_state(blind).await?)
    }

    async fn send_command(&self, blind: &Blind, command: BlindCommand) -> Result<(), BridgeError> {
        Ok(self.send(blind, command).await?)
    }
}
