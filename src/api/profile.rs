//! Comprehensive profile endpoints

use serde::Deserialize;

use super::ApiClient;
use crate::Result;
use crate::profile::ComprehensiveProfile;

/// Response of the profile save endpoints
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProfileResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub completion_percentage: Option<f64>,
    #[serde(default)]
    pub saved_at: Option<String>,
}

impl ApiClient {
    /// Save the full profile document
    ///
    /// # Errors
    ///
    /// Returns error if the request fails
    pub async fn save_profile(&self, profile: &ComprehensiveProfile) -> Result<SaveProfileResponse> {
        let response: SaveProfileResponse =
            self.post_json("/api/comprehensive-profile", profile).await?;
        tracing::info!(
            completion = ?response.completion_percentage,
            "profile saved"
        );
        Ok(response)
    }

    /// Autosave a possibly incomplete profile document
    ///
    /// # Errors
    ///
    /// Returns error if the request fails
    pub async fn autosave_profile(
        &self,
        profile: &ComprehensiveProfile,
    ) -> Result<SaveProfileResponse> {
        self.post_json("/api/comprehensive-profile/autosave", profile)
            .await
    }
}
