//! Career insight endpoints

use serde::{Deserialize, Serialize};

use super::{ApiClient, segment};
use crate::documents::DocumentUpload;
use crate::{Error, Result};

/// Stored document returned by the upload endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedDocument {
    /// Server-side path used to reference the document in later calls
    pub file_path: String,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
}

/// Body of `POST /api/career-insights/analyze-document`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeDocumentRequest {
    pub file_path: String,
    pub file_name: String,
    pub language: String,
    pub save_to_history: bool,
}

impl AnalyzeDocumentRequest {
    /// Build an analysis request for an uploaded document
    #[must_use]
    pub fn for_upload(upload: &UploadedDocument, language: &str, save_to_history: bool) -> Self {
        Self {
            file_path: upload.file_path.clone(),
            file_name: upload.file_name.clone(),
            language: language.to_string(),
            save_to_history,
        }
    }
}

/// Generated insight text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestions {
    #[serde(default)]
    pub paragraphs: Vec<String>,
}

/// Result of a document analysis
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAnalysis {
    pub success: bool,
    #[serde(default)]
    pub suggestions: Suggestions,
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub analysis_id: Option<String>,
}

/// Profile-based career suggestions
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerSuggestions {
    #[serde(default)]
    pub suggestions: Suggestions,
    #[serde(default)]
    pub generated_at: Option<String>,
}

/// A saved analysis
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightHistoryEntry {
    pub id: String,
    /// "profile" or "document"
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub suggestions: Suggestions,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// The history endpoint answers with either a bare list or `{ "history": [...] }`
#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryBody {
    List(Vec<InsightHistoryEntry>),
    Wrapped { history: Vec<InsightHistoryEntry> },
}

/// Single entries may come wrapped as `{ "entry": {...} }`
#[derive(Deserialize)]
#[serde(untagged)]
enum EntryBody {
    Wrapped { entry: InsightHistoryEntry },
    Bare(InsightHistoryEntry),
}

impl ApiClient {
    /// Upload a document for analysis
    ///
    /// The document is validated first; nothing is sent if it is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for unsupported or oversized documents,
    /// or an API/HTTP error if the upload fails
    pub async fn upload_document(&self, doc: &DocumentUpload) -> Result<UploadedDocument> {
        doc.validate()?;

        tracing::debug!(
            file_name = %doc.file_name,
            size = doc.bytes.len(),
            "uploading document"
        );

        let part = reqwest::multipart::Part::bytes(doc.bytes.clone())
            .file_name(doc.file_name.clone())
            .mime_str(&doc.mime_type)
            .map_err(|e| Error::Validation(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let path = "/api/career-insights/upload";
        let response = self
            .send(
                self.request(reqwest::Method::POST, path).multipart(form),
                path,
            )
            .await?;
        let uploaded: UploadedDocument = response.json().await?;

        tracing::info!(file_path = %uploaded.file_path, "document uploaded");
        Ok(uploaded)
    }

    /// Analyze a previously uploaded document
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the backend reports failure
    pub async fn analyze_document(
        &self,
        request: &AnalyzeDocumentRequest,
    ) -> Result<DocumentAnalysis> {
        let analysis: DocumentAnalysis = self
            .post_json("/api/career-insights/analyze-document", request)
            .await?;

        if !analysis.success {
            return Err(Error::Api {
                status: 200,
                message: "document analysis was not successful".to_string(),
            });
        }

        Ok(analysis)
    }

    /// Fetch suggestions generated from the stored profile
    ///
    /// # Errors
    ///
    /// Returns error if the request fails
    pub async fn career_suggestions(&self) -> Result<CareerSuggestions> {
        self.get_json("/api/career-suggestions").await
    }

    /// List saved analyses
    ///
    /// # Errors
    ///
    /// Returns error if the request fails
    pub async fn insight_history(&self) -> Result<Vec<InsightHistoryEntry>> {
        let body: HistoryBody = self.get_json("/api/career-insights/history").await?;
        Ok(match body {
            HistoryBody::List(entries) | HistoryBody::Wrapped { history: entries } => entries,
        })
    }

    /// Fetch one saved analysis
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the entry does not exist
    pub async fn insight_history_entry(&self, id: &str) -> Result<InsightHistoryEntry> {
        let body: EntryBody = self
            .get_json(&format!("/api/career-insights/history/{}", segment(id)))
            .await?;
        Ok(match body {
            EntryBody::Wrapped { entry } | EntryBody::Bare(entry) => entry,
        })
    }

    /// Delete one saved analysis
    ///
    /// # Errors
    ///
    /// Returns error if the request fails
    pub async fn delete_insight_history_entry(&self, id: &str) -> Result<()> {
        self.delete(&format!("/api/career-insights/history/{}", segment(id)))
            .await
    }
}
