use std::fmt;

/// Why a survey request failed. Callers only ever see a generic message;
/// the variant is kept for the logs.
#[derive(Debug)]
pub enum SurveyError {
    /// The request body could not be turned into a survey: unreadable
    /// multipart data, too many images, a missing field or malformed JSON.
    Decode(String),
    Upload(anyhow::Error),
    Store(anyhow::Error),
}

impl SurveyError {
    pub fn kind(&self) -> &'static str {
        match self {
            SurveyError::Decode(_) => "decode",
            SurveyError::Upload(_) => "upload",
            SurveyError::Store(_) => "store",
        }
    }
}

impl fmt::Display for SurveyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurveyError::Decode(msg) => write!(f, "Decode error: {msg}"),
            SurveyError::Upload(err) => write!(f, "Upload error: {err:#}"),
            SurveyError::Store(err) => write!(f, "Store error: {err:#}"),
        }
    }
}

impl std::error::Error for SurveyError {}
