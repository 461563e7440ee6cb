use crate::database::AppState;
use crate::error::SurveyError;
use crate::models::{ImageUpload, MessageResponse, NewSurvey, SurveyRecord, MAX_IMAGES};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

pub const IMAGES_FIELD: &str = "images";
pub const TEXT_FIELDS: [&str; 4] = ["demographics", "awareness", "readiness", "textAnswers"];

pub const SUBMIT_OK_MESSAGE: &str = "Survey with files saved successfully!";
pub const SUBMIT_FAILED_MESSAGE: &str = "Failed to save survey with images.";
pub const LIST_FAILED_MESSAGE: &str = "Failed to fetch surveys.";

/// The multipart body, buffered: image parts in arrival order and the raw
/// text of the known answer fields.
#[derive(Debug, Default)]
struct SurveyForm {
    images: Vec<ImageUpload>,
    fields: [Option<String>; 4],
}

impl SurveyForm {
    fn decode(&self, name: &str) -> Result<Value, SurveyError> {
        let raw = TEXT_FIELDS
            .iter()
            .position(|field| *field == name)
            .and_then(|idx| self.fields[idx].as_deref())
            .ok_or_else(|| SurveyError::Decode(format!("missing field `{name}`")))?;

        serde_json::from_str(raw)
            .map_err(|e| SurveyError::Decode(format!("field `{name}` is not valid JSON: {e}")))
    }
}

async fn read_survey_form(mut multipart: Multipart) -> Result<SurveyForm, SurveyError> {
    let mut form = SurveyForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(SurveyError::Decode(format!("unreadable multipart body: {e}"))),
        };

        let name = field.name().unwrap_or_default().to_string();

        if name == IMAGES_FIELD {
            if form.images.len() == MAX_IMAGES {
                return Err(SurveyError::Decode(format!(
                    "more than {MAX_IMAGES} `{IMAGES_FIELD}` parts"
                )));
            }

            let file_name = field
                .file_name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}.jpg", uuid::Uuid::new_v4()));
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| SurveyError::Decode(format!("failed to read {file_name}: {e}")))?;

            form.images.push(ImageUpload {
                file_name,
                content_type,
                data,
            });
            continue;
        }

        if let Some(idx) = TEXT_FIELDS.iter().position(|known| *known == name) {
            let text = field
                .text()
                .await
                .map_err(|e| SurveyError::Decode(format!("failed to read `{name}`: {e}")))?;
            form.fields[idx] = Some(text);
        } else if field.file_name().is_some() {
            return Err(SurveyError::Decode(format!("unexpected file field `{name}`")));
        } else {
            tracing::debug!("Ignoring unknown form field `{}`", name);
        }
    }

    Ok(form)
}

async fn submit_survey(state: &AppState, multipart: Multipart) -> Result<SurveyRecord, SurveyError> {
    let mut form = read_survey_form(multipart).await?;

    let mut image_urls = Vec::with_capacity(form.images.len());
    for image in std::mem::take(&mut form.images) {
        let url = state
            .uploader
            .upload_image(image)
            .await
            .map_err(SurveyError::Upload)?;
        image_urls.push(url);
    }

    let survey = NewSurvey {
        demographics: form.decode("demographics")?,
        awareness: form.decode("awareness")?,
        readiness: form.decode("readiness")?,
        text_answers: form.decode("textAnswers")?,
        images: image_urls,
    };

    state
        .store
        .insert_survey(survey)
        .await
        .map_err(SurveyError::Store)
}

pub async fn submit_survey_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> impl IntoResponse {
    let result = match multipart {
        Ok(multipart) => submit_survey(&state, multipart).await,
        Err(rejection) => Err(SurveyError::Decode(rejection.body_text())),
    };

    match result {
        Ok(record) => {
            tracing::info!(
                "Survey {} saved with {} images",
                record.id,
                record.images.len()
            );
            (
                StatusCode::CREATED,
                Json(MessageResponse::new(SUBMIT_OK_MESSAGE)),
            )
        }
        Err(e) => {
            tracing::error!(kind = e.kind(), "Survey upload error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse::new(SUBMIT_FAILED_MESSAGE)),
            )
        }
    }
}

pub async fn list_surveys_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.list_surveys().await {
        Ok(surveys) => (StatusCode::OK, Json(surveys)).into_response(),
        Err(e) => {
            tracing::error!(kind = "store", "Failed to fetch surveys: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse::new(LIST_FAILED_MESSAGE)),
            )
                .into_response()
        }
    }
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
