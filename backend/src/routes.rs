use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, HttpResponse, Responder};
use log::error;
use serde_json::Value;

use crate::error::{json_error_handler, ApiError};
use crate::inference::{predict_status, Classifier};
use crate::models::{LoanApplication, WelcomeMessage};

/// Shared per-process state. The classifier is `None` when the artifact
/// failed to load at startup.
#[derive(Clone, Default)]
pub struct AppState {
    classifier: Option<Arc<dyn Classifier>>,
}

impl AppState {
    pub fn new(classifier: Option<Arc<dyn Classifier>>) -> Self {
        AppState { classifier }
    }

    pub fn is_model_loaded(&self) -> bool {
        self.classifier.is_some()
    }
}

async fn read_root() -> impl Responder {
    HttpResponse::Ok().json(WelcomeMessage::default())
}

async fn predict(
    state: web::Data<AppState>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let application = LoanApplication::from_json(&body)?;
    let classifier = state.classifier.clone().ok_or(ApiError::ModelNotLoaded)?;

    let result = web::block(move || predict_status(classifier.as_ref(), &application))
        .await
        .map_err(|e| {
            error!("Prediction worker failed: {}", e);
            ApiError::Internal(e.to_string())
        })?
        .map_err(|e| {
            error!("Prediction failed: {}", e);
            ApiError::from(e)
        })?;

    Ok(HttpResponse::Ok().json(result))
}

async fn method_not_allowed() -> Result<HttpResponse, ApiError> {
    Err(ApiError::MethodNotAllowed)
}

pub async fn not_found() -> Result<HttpResponse, ApiError> {
    Err(ApiError::NotFound)
}

/// Development-wide-open policy: any origin, method and header.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}

pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .content_type_required(false)
        .error_handler(json_error_handler)
}

/// Registers the API routes. Shared by the server and the tests so both
/// run the same app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/")
            .route(web::get().to(read_root))
            .default_service(web::to(method_not_allowed)),
    )
    .service(
        web::resource("/predict")
            .route(web::post().to(predict))
            .default_service(web::to(method_not_allowed)),
    );
}
