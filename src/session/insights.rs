//! Career insights wizard
//!
//! `SourceSelection → Uploading → Analyzing → Results`, with `History`
//! reachable from selection and results. Failed requests emit an error
//! notice and return to the step the user acted from.

use crate::api::{
    AnalyzeDocumentRequest, ApiClient, CareerSuggestions, DocumentAnalysis, InsightHistoryEntry,
};
use crate::documents::DocumentUpload;
use crate::notice::Notifier;
use crate::profile::ComprehensiveProfile;
use crate::{Error, Result};

/// Analysis shown on the results step
#[derive(Debug, Clone)]
pub enum InsightResult {
    Profile(CareerSuggestions),
    Document(DocumentAnalysis),
    /// A saved analysis opened from history
    Saved(InsightHistoryEntry),
}

impl InsightResult {
    /// Generated paragraphs
    #[must_use]
    pub fn paragraphs(&self) -> &[String] {
        match self {
            Self::Profile(s) => &s.suggestions.paragraphs,
            Self::Document(a) => &a.suggestions.paragraphs,
            Self::Saved(e) => &e.suggestions.paragraphs,
        }
    }
}

/// Current step of the insights flow
#[derive(Debug, Clone)]
pub enum InsightsStep {
    SourceSelection,
    Uploading { file_name: String },
    Analyzing,
    Results(InsightResult),
    History(Vec<InsightHistoryEntry>),
}

/// Drives career insight generation
pub struct InsightsFlow {
    api: ApiClient,
    notifier: Notifier,
    language: String,
    step: InsightsStep,
}

impl InsightsFlow {
    #[must_use]
    pub fn new(api: ApiClient, notifier: Notifier, language: impl Into<String>) -> Self {
        Self {
            api,
            notifier,
            language: language.into(),
            step: InsightsStep::SourceSelection,
        }
    }

    #[must_use]
    pub const fn step(&self) -> &InsightsStep {
        &self.step
    }

    /// Whether profile-based analysis is enabled for `profile`
    #[must_use]
    pub fn can_analyze_profile(profile: &ComprehensiveProfile) -> bool {
        profile.has_profile()
    }

    /// Generate suggestions from the saved profile
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the profile is too incomplete, or the
    /// request error
    pub async fn analyze_profile(&mut self, profile: &ComprehensiveProfile) -> Result<&InsightResult> {
        let previous = self.require_selection()?;
        if !Self::can_analyze_profile(profile) {
            return Err(Error::Validation(
                "complete your profile before requesting insights".to_string(),
            ));
        }

        self.step = InsightsStep::Analyzing;
        match self.api.career_suggestions().await {
            Ok(suggestions) => self.show(InsightResult::Profile(suggestions)),
            Err(e) => Err(self.revert(previous, "Couldn't analyze profile", e)),
        }
    }

    /// Upload and analyze a document
    ///
    /// The document is validated before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an unsupported, empty, or oversized
    /// document, or the request error
    pub async fn analyze_document(
        &mut self,
        document: &DocumentUpload,
        save_to_history: bool,
    ) -> Result<&InsightResult> {
        let previous = self.require_selection()?;
        if let Err(e) = document.validate() {
            self.notifier.error("Unsupported document", e.to_string());
            return Err(e);
        }

        self.step = InsightsStep::Uploading {
            file_name: document.file_name.clone(),
        };
        let uploaded = match self.api.upload_document(document).await {
            Ok(uploaded) => uploaded,
            Err(e) => {
                return Err(self.revert(previous, "Upload failed", e));
            }
        };

        self.step = InsightsStep::Analyzing;
        let request = AnalyzeDocumentRequest::for_upload(&uploaded, &self.language, save_to_history);
        match self.api.analyze_document(&request).await {
            Ok(analysis) => self.show(InsightResult::Document(analysis)),
            Err(e) => Err(self.revert(previous, "Couldn't analyze document", e)),
        }
    }

    /// Show saved analyses
    ///
    /// # Errors
    ///
    /// Returns error while a request is in flight, or the request error
    pub async fn show_history(&mut self) -> Result<&[InsightHistoryEntry]> {
        let previous = match &self.step {
            InsightsStep::SourceSelection | InsightsStep::Results(_) | InsightsStep::History(_) => {
                self.step.clone()
            }
            InsightsStep::Uploading { .. } | InsightsStep::Analyzing => {
                return Err(Error::InvalidState("analysis in progress".to_string()));
            }
        };

        match self.api.insight_history().await {
            Ok(entries) => {
                self.step = InsightsStep::History(entries);
                match &self.step {
                    InsightsStep::History(entries) => Ok(entries),
                    _ => Err(Error::InvalidState("history missing".to_string())),
                }
            }
            Err(e) => Err(self.revert(previous, "Couldn't load history", e)),
        }
    }

    /// Open one saved analysis
    ///
    /// # Errors
    ///
    /// Returns error outside the history step, or the request error
    pub async fn open_history_entry(&mut self, id: &str) -> Result<&InsightResult> {
        if !matches!(self.step, InsightsStep::History(_)) {
            return Err(Error::InvalidState("history is not open".to_string()));
        }

        match self.api.insight_history_entry(id).await {
            Ok(entry) => self.show(InsightResult::Saved(entry)),
            Err(e) => {
                self.notifier.error("Couldn't open analysis", e.to_string());
                Err(e)
            }
        }
    }

    /// Delete one saved analysis and drop it from the list
    ///
    /// # Errors
    ///
    /// Returns error outside the history step, or the request error
    pub async fn delete_history_entry(&mut self, id: &str) -> Result<()> {
        if !matches!(self.step, InsightsStep::History(_)) {
            return Err(Error::InvalidState("history is not open".to_string()));
        }

        if let Err(e) = self.api.delete_insight_history_entry(id).await {
            self.notifier.error("Couldn't delete analysis", e.to_string());
            return Err(e);
        }

        if let InsightsStep::History(entries) = &mut self.step {
            entries.retain(|entry| entry.id != id);
        }
        self.notifier.info("Analysis deleted", "The saved analysis was removed.");
        Ok(())
    }

    /// Start a new analysis
    pub fn reset(&mut self) {
        self.step = InsightsStep::SourceSelection;
    }

    /// The step a failed analysis returns to
    fn require_selection(&self) -> Result<InsightsStep> {
        match self.step {
            InsightsStep::SourceSelection | InsightsStep::Results(_) => Ok(self.step.clone()),
            _ => Err(Error::InvalidState(
                "choose a source before analyzing".to_string(),
            )),
        }
    }

    fn show(&mut self, result: InsightResult) -> Result<&InsightResult> {
        tracing::debug!(paragraphs = result.paragraphs().len(), "insights ready");
        self.step = InsightsStep::Results(result);
        match &self.step {
            InsightsStep::Results(result) => Ok(result),
            _ => Err(Error::InvalidState("results missing".to_string())),
        }
    }

    fn revert(&mut self, to: InsightsStep, title: &str, e: Error) -> Error {
        self.notifier.error(title, e.to_string());
        self.step = to;
        e
    }
}
