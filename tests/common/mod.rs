#![allow(dead_code)]

use anyhow::{anyhow, Result};
use axum::{
    async_trait,
    body::Body,
    http::{Request, Response},
    Router,
};
use http_body_util::BodyExt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use survey_intake::cors::OriginAllowList;
use survey_intake::database::{AppState, SurveyStore};
use survey_intake::models::{ImageUpload, NewSurvey, SurveyRecord};
use survey_intake::storage::MediaUploader;
use tower::ServiceExt;

pub const MEDIA_HOST: &str = "https://res.cloudinary.com/demo/image/upload/survey_uploads/";
pub const ALLOWED_ORIGIN: &str = "http://localhost:3000";
pub const BOUNDARY: &str = "survey-test-boundary";

#[derive(Default)]
pub struct MemorySurveyStore {
    records: Mutex<Vec<SurveyRecord>>,
    pub fail: AtomicBool,
}

impl MemorySurveyStore {
    pub fn records(&self) -> Vec<SurveyRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl SurveyStore for MemorySurveyStore {
    async fn insert_survey(&self, survey: NewSurvey) -> Result<SurveyRecord> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("store unavailable"));
        }
        let record = survey.into_record(uuid::Uuid::new_v4(), chrono::Utc::now());
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn list_surveys(&self) -> Result<Vec<SurveyRecord>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("store unavailable"));
        }
        Ok(self.records())
    }
}

/// Hands out URLs on the media host, remembering the file names it saw.
#[derive(Default)]
pub struct FakeUploader {
    uploaded: Mutex<Vec<String>>,
    calls: AtomicUsize,
    /// Fail the upload with this (1-based) call number.
    pub fail_on_call: Mutex<Option<usize>>,
}

impl FakeUploader {
    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaUploader for FakeUploader {
    async fn upload_image(&self, image: ImageUpload) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if *self.fail_on_call.lock().unwrap() == Some(call) {
            return Err(anyhow!("media host timed out"));
        }
        self.uploaded.lock().unwrap().push(image.file_name.clone());
        Ok(format!("{MEDIA_HOST}{}", image.file_name))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemorySurveyStore>,
    pub uploader: Arc<FakeUploader>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemorySurveyStore::default());
        let uploader = Arc::new(FakeUploader::default());
        let state = AppState {
            store: store.clone(),
            uploader: uploader.clone(),
        };
        let allow_list = OriginAllowList::new([ALLOWED_ORIGIN, "https://mishukinfo.com"]);
        let router = survey_intake::create_router(state, allow_list, 1024 * 1024);
        Self {
            router,
            store,
            uploader,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Builds a multipart body by hand so tests control every part.
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn survey_fields(self) -> Self {
        self.text("demographics", r#"{"age":30}"#)
            .text("awareness", r#"{"heard":true}"#)
            .text("readiness", r#"{"score":5}"#)
            .text("textAnswers", r#"{"q1":"fine"}"#)
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}

pub fn submit_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/survey")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn list_request() -> Request<Body> {
    Request::builder()
        .uri("/get/surveys")
        .body(Body::empty())
        .unwrap()
}
