use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Most image parts a single submission may carry.
pub const MAX_IMAGES: usize = 5;

/// One stored survey submission. The four answer groups are kept as
/// submitted; nothing here looks inside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SurveyRecord {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub demographics: Value,
    pub awareness: Value,
    pub readiness: Value,
    pub text_answers: Value,
    pub images: Vec<String>, // hosted URLs, in upload order
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A survey that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSurvey {
    pub demographics: Value,
    pub awareness: Value,
    pub readiness: Value,
    pub text_answers: Value,
    pub images: Vec<String>,
}

impl NewSurvey {
    pub fn into_record(self, id: Uuid, created_at: chrono::DateTime<chrono::Utc>) -> SurveyRecord {
        SurveyRecord {
            id,
            demographics: self.demographics,
            awareness: self.awareness,
            readiness: self.readiness,
            text_answers: self.text_answers,
            images: self.images,
            created_at,
        }
    }
}

/// An image part buffered from the multipart body, waiting to be uploaded.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
