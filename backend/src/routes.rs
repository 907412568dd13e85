use actix_web::error::InternalError;
use actix_web::{http::StatusCode, web, HttpResponse, Responder, ResponseError};
use log::{error, info, warn};
use std::time::Instant;
use thiserror::Error;

use crate::error::PredictionError;
use crate::features::CANONICAL_FEATURES;
use crate::models::{
    BatchPredictionRequest, BatchPredictionResponse, ClientData, ErrorResponse, FeaturesResponse,
    ModelInfo, PredictionResponse, StatusResponse,
};
use crate::predictor::Predictor;

pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Failures surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Prediction(#[from] PredictionError),

    #[error("prediction worker failed: {0}")]
    Blocking(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(self.to_string()))
    }
}

/// JSON extractor settings: body limit plus FastAPI-style 422 rejections.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            warn!("Rejected request body: {}", err);
            let response =
                HttpResponse::UnprocessableEntity().json(ErrorResponse::new(err.to_string()));
            InternalError::from_response(err, response).into()
        })
}

/// Register every API route on an app or scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(read_root))
        .route("/health", web::get().to(health_check))
        .route("/predict", web::post().to(predict_income))
        .route("/predict/batch", web::post().to(predict_batch))
        .route("/features", web::get().to(get_features))
        .route("/model/info", web::get().to(get_model_info));
}

async fn read_root() -> impl Responder {
    HttpResponse::Ok().json(StatusResponse {
        message: Some("Income Prediction Service is running".to_string()),
        status: "healthy".to_string(),
    })
}

async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(StatusResponse {
        message: None,
        status: "ok".to_string(),
    })
}

/// Single-client scoring. Labels are not encoded on this route; see `Predictor::predict`.
async fn predict_income(
    predictor: web::Data<Predictor>,
    body: web::Json<ClientData>,
) -> Result<HttpResponse, ApiError> {
    let start_time = Instant::now();
    let record = body.into_inner().to_record()?;

    let predictor = predictor.into_inner();
    let income = web::block(move || predictor.predict(&record))
        .await
        .map_err(|e| ApiError::Blocking(e.to_string()))?
        .map_err(|e| {
            error!("Income prediction failed: {}", e);
            e
        })?;

    info!(
        "Predicted income {:.2} in {} ms",
        income,
        start_time.elapsed().as_millis()
    );
    Ok(HttpResponse::Ok().json(PredictionResponse {
        predicted_income: income,
    }))
}

async fn predict_batch(
    predictor: web::Data<Predictor>,
    body: web::Json<BatchPredictionRequest>,
) -> Result<HttpResponse, ApiError> {
    let start_time = Instant::now();
    let records = body
        .into_inner()
        .clients
        .iter()
        .map(ClientData::to_record)
        .collect::<Result<Vec<_>, _>>()?;
    info!("Batch prediction request: {} clients", records.len());

    let predictor = predictor.into_inner();
    let batch = web::block(move || predictor.predict_batch(&records))
        .await
        .map_err(|e| ApiError::Blocking(e.to_string()))?
        .map_err(|e| {
            error!("Batch income prediction failed: {}", e);
            e
        })?;

    info!(
        "Batch prediction done: {} results in {} ms",
        batch.total_count(),
        start_time.elapsed().as_millis()
    );
    let total_count = batch.total_count();
    Ok(HttpResponse::Ok().json(BatchPredictionResponse {
        predictions: batch
            .incomes
            .into_iter()
            .map(|predicted_income| PredictionResponse { predicted_income })
            .collect(),
        total_count,
        encoding_gaps: batch.gaps,
    }))
}

async fn get_features() -> impl Responder {
    HttpResponse::Ok().json(FeaturesResponse {
        features: CANONICAL_FEATURES.iter().map(|f| f.to_string()).collect(),
        version: SERVICE_VERSION.to_string(),
    })
}

async fn get_model_info(predictor: web::Data<Predictor>) -> impl Responder {
    let (status, placeholder_income) = if predictor.has_scorer() {
        ("loaded", None)
    } else {
        ("placeholder", Some(predictor.placeholder()))
    };
    HttpResponse::Ok().json(ModelInfo {
        model_name: "Income Prediction Model".to_string(),
        version: SERVICE_VERSION.to_string(),
        status: status.to_string(),
        scorer: predictor.scorer_description(),
        placeholder_income,
        input_features: CANONICAL_FEATURES.len(),
    })
}
