use serde::{Deserialize, Serialize};

use crate::constants::{COMMAND_FIELD, Command, MediaCategory};
use crate::types::{MediaId, ProcessingError, ProcessingState};

/// Ordered list of string form fields for one request.
pub type FormFields = Vec<(&'static str, String)>;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// INIT request parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitRequest {
    pub total_bytes: u64,
    pub content_type: String,
    pub media_category: Option<MediaCategory>,
}

impl InitRequest {
    /// Builds an INIT request, deriving the media category from `content_type`.
    pub fn new(total_bytes: u64, content_type: impl Into<String>) -> Self {
        let content_type = content_type.into();
        let media_category = MediaCategory::from_content_type(&content_type);
        Self {
            total_bytes,
            content_type,
            media_category,
        }
    }

    /// Url-encoded form body fields. `media_category` is omitted when unset.
    pub fn form_fields(&self) -> FormFields {
        let mut fields = vec![
            (COMMAND_FIELD, Command::Init.as_str().to_string()),
            ("total_bytes", self.total_bytes.to_string()),
            ("content_type", self.content_type.clone()),
        ];
        if let Some(category) = self.media_category {
            fields.push(("media_category", category.as_str().to_string()));
        }
        fields
    }
}

/// String fields sent alongside the binary part of an APPEND.
pub fn append_fields(media_id: MediaId, segment_index: u32) -> FormFields {
    vec![
        (COMMAND_FIELD, Command::Append.as_str().to_string()),
        ("media_id", media_id.to_string()),
        ("segment_index", segment_index.to_string()),
    ]
}

/// Url-encoded form body fields for FINALIZE.
pub fn finalize_fields(media_id: MediaId) -> FormFields {
    vec![
        (COMMAND_FIELD, Command::Finalize.as_str().to_string()),
        ("media_id", media_id.to_string()),
    ]
}

/// Query string parameters for STATUS.
pub fn status_query(media_id: MediaId) -> FormFields {
    vec![
        (COMMAND_FIELD, Command::Status.as_str().to_string()),
        ("media_id", media_id.to_string()),
    ]
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// INIT success body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitResponse {
    pub media_id: MediaId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_id_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_after_secs: Option<u64>,
}

/// Processing block returned by FINALIZE for asynchronously processed media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizeProcessingInfo {
    pub state: ProcessingState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_after_secs: Option<u64>,
}

/// FINALIZE success body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizeResponse {
    pub media_id: MediaId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_id_string: Option<String>,
    #[serde(default)]
    pub expires_after_secs: u64,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_info: Option<FinalizeProcessingInfo>,
}

impl FinalizeResponse {
    /// True when the service asked the client to poll STATUS.
    pub fn needs_processing_wait(&self) -> bool {
        self.processing_info.is_some()
    }
}

/// Processing snapshot carried by a STATUS response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingInfo {
    pub state: ProcessingState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_percent: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_after_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ProcessingError>,
}

/// STATUS success body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub media_id: MediaId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_id_string: Option<String>,
    pub processing_info: ProcessingInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field<'a>(fields: &'a FormFields, name: &str) -> Option<&'a str> {
        fields
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn init_fields_with_category() {
        let req = InitRequest::new(10 * 1024 * 1024, "video/mp4");
        let fields = req.form_fields();
        assert_eq!(field(&fields, "command"), Some("INIT"));
        assert_eq!(field(&fields, "total_bytes"), Some("10485760"));
        assert_eq!(field(&fields, "content_type"), Some("video/mp4"));
        assert_eq!(field(&fields, "media_category"), Some("tweet_video"));
    }

    #[test]
    fn init_fields_without_category() {
        let req = InitRequest::new(5, "application/octet-stream");
        assert_eq!(req.media_category, None);
        assert_eq!(field(&req.form_fields(), "media_category"), None);
    }

    #[test]
    fn append_and_finalize_fields() {
        let id = MediaId::new(99);
        let append = append_fields(id, 3);
        assert_eq!(field(&append, "command"), Some("APPEND"));
        assert_eq!(field(&append, "media_id"), Some("99"));
        assert_eq!(field(&append, "segment_index"), Some("3"));

        let fin = finalize_fields(id);
        assert_eq!(field(&fin, "command"), Some("FINALIZE"));
        assert_eq!(field(&fin, "media_id"), Some("99"));

        let status = status_query(id);
        assert_eq!(field(&status, "command"), Some("STATUS"));
    }

    #[test]
    fn init_response_decodes() {
        let json = r#"{"media_id":710511363345354753,"media_id_string":"710511363345354753","expires_after_secs":86400}"#;
        let resp: InitResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.media_id, MediaId::new(710511363345354753));
        assert_eq!(resp.expires_after_secs, Some(86400));
    }

    #[test]
    fn finalize_without_processing_info() {
        let json = r#"{"media_id":1,"media_id_string":"1","expires_after_secs":86400,"size":11065}"#;
        let resp: FinalizeResponse = serde_json::from_str(json).unwrap();
        assert!(!resp.needs_processing_wait());
        assert_eq!(resp.size, 11065);
    }

    #[test]
    fn finalize_with_processing_info() {
        let json = r#"{"media_id":1,"size":11065,"expires_after_secs":86400,
            "processing_info":{"state":"pending","check_after_secs":5}}"#;
        let resp: FinalizeResponse = serde_json::from_str(json).unwrap();
        assert!(resp.needs_processing_wait());
        let info = resp.processing_info.unwrap();
        assert_eq!(info.state, ProcessingState::Pending);
        assert_eq!(info.check_after_secs, Some(5));
    }

    #[test]
    fn status_in_progress() {
        let json = r#"{"media_id":7,"media_id_string":"7",
            "processing_info":{"state":"in_progress","check_after_secs":10,"progress_percent":8}}"#;
        let resp: StatusResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.processing_info.state, ProcessingState::InProgress);
        assert_eq!(resp.processing_info.progress_percent, Some(8));
        assert_eq!(resp.processing_info.check_after_secs, Some(10));
        assert!(resp.processing_info.error.is_none());
    }

    #[test]
    fn status_failed_with_error() {
        let json = r#"{"media_id":"7","processing_info":{"state":"failed","progress_percent":100,
            "error":{"code":1,"name":"InvalidMedia","message":"Unsupported video format"}}}"#;
        let resp: StatusResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.media_id, MediaId::new(7));
        let err = resp.processing_info.error.unwrap();
        assert_eq!(err.name, "InvalidMedia");
        assert_eq!(err.message, "Unsupported video format");
    }

    #[test]
    fn status_missing_processing_info_is_error() {
        assert!(serde_json::from_str::<StatusResponse>(r#"{"media_id":7}"#).is_err());
    }
}
