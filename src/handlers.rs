use std::time::Instant;

use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use tracing::Instrument;
use uuid::Uuid;

use crate::classifier;
use crate::config::Mode;
use crate::error::{ApiError, Result};
use crate::models::{
    mock_reports, DiseaseClass, HealthResponse, InfoResponse, PingResponse, PredictionResponse,
};
use crate::preprocess;
use crate::state::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(root)))
        .service(web::resource("/ping").route(web::get().to(ping)))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/predict").route(web::post().to(predict)));
}

pub async fn ping() -> HttpResponse {
    HttpResponse::Ok().json(PingResponse {
        message: "Hello, I am alive!".to_string(),
    })
}

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        mode: state.mode().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn root(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(InfoResponse {
        message: "Potato Disease Detection API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        mode: state.mode().to_string(),
        classes: DiseaseClass::ALL
            .iter()
            .map(|c| c.label().to_string())
            .collect(),
    })
}

pub async fn predict(state: web::Data<AppState>, mut payload: Multipart) -> Result<HttpResponse> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("predict", %request_id, mode = %state.mode());

    async move {
        match state.mode() {
            Mode::Mock => {
                drain(&mut payload).await?;
                tracing::info!("returning mock predictions");
                Ok(HttpResponse::Ok().json(mock_reports()))
            }
            Mode::Model => predict_with_model(&state, &mut payload).await,
        }
    }
    .instrument(span)
    .await
}

async fn predict_with_model(state: &AppState, payload: &mut Multipart) -> Result<HttpResponse> {
    let upload = read_upload(payload, state.settings.max_upload_bytes)
        .await?
        .ok_or(ApiError::MissingFile)?;

    if !upload.is_image() {
        return Err(ApiError::NotAnImage(upload.content_type));
    }

    let model = state
        .classifier
        .clone()
        .ok_or_else(|| ApiError::Internal("no model loaded".to_string()))?;
    let input_size = state.settings.input_size;
    let filename = upload.filename.clone().unwrap_or_default();
    let size = upload.bytes.len();
    let started = Instant::now();

    let prediction = web::block(move || {
        let input = preprocess::prepare(&upload.bytes, input_size)?;
        classifier::classify(model.as_ref(), input)
    })
    .await??;

    tracing::info!(
        filename = %filename,
        bytes = size,
        disease = %prediction.class,
        confidence = prediction.confidence,
        probabilities = ?prediction.probabilities,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "prediction complete"
    );

    Ok(HttpResponse::Ok().json(PredictionResponse {
        disease: prediction.class.label().to_string(),
        confidence: prediction.confidence,
    }))
}

/// The file part of a multipart upload.
#[derive(Debug)]
pub struct Upload {
    pub content_type: String,
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

/// Pick the part named `file`, falling back to the first part carrying a filename.
async fn read_upload(payload: &mut Multipart, limit: usize) -> Result<Option<Upload>> {
    let mut upload: Option<Upload> = None;
    let mut found_named = false;

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let disposition = field.content_disposition();
        let named_file = disposition.get_name() == Some("file");
        let filename = disposition.get_filename().map(str::to_string);

        let wanted = !found_named && (named_file || (upload.is_none() && filename.is_some()));
        if !wanted {
            skip_field(&mut field).await?;
            continue;
        }

        let content_type = field.content_type().to_string();
        let bytes = read_field(&mut field, limit).await?;
        found_named = named_file;
        upload = Some(Upload {
            content_type,
            filename,
            bytes,
        });
    }

    Ok(upload)
}

async fn read_field(field: &mut Field, limit: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let data = chunk?;
        if bytes.len() + data.len() > limit {
            return Err(ApiError::UploadTooLarge(limit));
        }
        bytes.extend_from_slice(&data);
    }
    Ok(bytes)
}

async fn skip_field(field: &mut Field) -> Result<()> {
    while let Some(chunk) = field.next().await {
        chunk?;
    }
    Ok(())
}

async fn drain(payload: &mut Multipart) -> Result<()> {
    while let Some(item) = payload.next().await {
        let mut field = item?;
        skip_field(&mut field).await?;
    }
    Ok(())
}
