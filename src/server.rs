use actix_web::{http::StatusCode, web, App, HttpResponse, HttpServer};
use serde_json::json;
use std::sync::Arc;

use crate::{
    client::{GenerationClient, RefinementClient},
    error::{AdForgeError, Result},
    models::{
        CampaignRequestBody, CampaignResponseBody, CopyField, GenerationRequest, ImageAsset,
        RefineRequest, RefineRequestBody, StylePreset,
    },
};

const JSON_LIMIT_BYTES: usize = 20 * 1024 * 1024;

/// Anything that can serve both the Generate and Refine contracts.
pub trait CampaignBackend: GenerationClient + RefinementClient {}

impl<T: GenerationClient + RefinementClient> CampaignBackend for T {}

pub struct AppState {
    backend: Arc<dyn CampaignBackend>,
}

impl AppState {
    pub fn new(backend: Arc<dyn CampaignBackend>) -> Self {
        Self { backend }
    }
}

fn failure(status: StatusCode, detail: String) -> HttpResponse {
    HttpResponse::build(status).json(json!({ "detail": detail }))
}

async fn root() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "name": "AdForge API", "status": "running" }))
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "healthy" }))
}

async fn generate_campaign(
    state: web::Data<AppState>,
    body: web::Json<CampaignRequestBody>,
) -> HttpResponse {
    let body = body.into_inner();
    let image = match ImageAsset::from_base64(&body.image) {
        Ok(image) => image,
        Err(e) => return failure(StatusCode::BAD_REQUEST, e.to_string()),
    };
    let request = GenerationRequest {
        image,
        style: body
            .style
            .as_deref()
            .map(StylePreset::from_name_lossy)
            .unwrap_or_default(),
        creative_brief: body.creative_brief,
    };

    match state.backend.generate(request).await {
        Ok(result) => HttpResponse::Ok().json(CampaignResponseBody::from(result)),
        Err(e) => {
            log::error!("Campaign generation failed: {}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn refine_copy(
    state: web::Data<AppState>,
    body: web::Json<RefineRequestBody>,
) -> HttpResponse {
    let body = body.into_inner();
    let field = match body.context.parse::<CopyField>() {
        Ok(field) => field,
        Err(e) => return failure(StatusCode::BAD_REQUEST, e.to_string()),
    };
    let request = RefineRequest {
        current_text: body.current_text,
        instruction: body.refinement_prompt,
        field,
    };

    match state.backend.refine(request).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::error!("Refinement failed: {}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(JSON_LIMIT_BYTES))
        .route("/", web::get().to(root))
        .route("/health", web::get().to(health))
        .route("/api/campaign", web::post().to(generate_campaign))
        .route("/api/refine", web::post().to(refine_copy));
}

pub async fn run(backend: Arc<dyn CampaignBackend>, port: u16) -> Result<()> {
    let state = web::Data::new(AppState::new(backend));
    log::info!("🌐 AdForge API listening on http://0.0.0.0:{}", port);

    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind(("0.0.0.0", port))
        .map_err(|e| AdForgeError::ConfigError(format!("cannot bind port {}: {}", port, e)))?
        .run()
        .await
        .map_err(|e| AdForgeError::InternalError(e.to_string()))
}
