//! SDP relay for the realtime voice connection

use secrecy::{ExposeSecret, SecretString};

use super::{ApiClient, segment};
use crate::{Error, Result};

impl ApiClient {
    /// Exchange a local SDP offer for the remote answer
    ///
    /// The ephemeral key is part of the path; the offer and answer travel as
    /// raw `application/sdp` bodies.
    ///
    /// # Errors
    ///
    /// Returns error if the relay rejects the offer or returns an empty answer
    pub async fn exchange_sdp(&self, ephemeral_key: &SecretString, offer: &str) -> Result<String> {
        let path = format!(
            "/api/realtime/session/{}",
            segment(ephemeral_key.expose_secret())
        );

        // Log the route without the key
        let builder = self
            .request(reqwest::Method::POST, &path)
            .header(reqwest::header::CONTENT_TYPE, "application/sdp")
            .body(offer.to_string());
        let response = self.send(builder, "/api/realtime/session/:ephemeralKey").await?;

        let answer = response.text().await?;
        if answer.trim().is_empty() {
            return Err(Error::Connection("relay returned an empty SDP answer".to_string()));
        }

        tracing::debug!(answer_bytes = answer.len(), "received SDP answer");
        Ok(answer)
    }
}
