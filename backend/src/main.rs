use actix_cors::Cors;
use actix_files::Files;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{web, App, HttpResponse, HttpServer};
use log::{error, info, warn};
use std::sync::Arc;

use income_backend::config::{AppConfig, ScorerKind};
use income_backend::inference::OnnxScorer;
use income_backend::models::ErrorResponse;
use income_backend::routes;
use income_backend::{Predictor, Scorer};

fn build_predictor(config: &AppConfig) -> anyhow::Result<Predictor> {
    let scorer: Option<Arc<dyn Scorer>> = match config.scorer {
        ScorerKind::Onnx => {
            let scorer = OnnxScorer::load(&config.model_path)?;
            info!("ONNX model loaded from {}", scorer.path().display());
            Some(Arc::new(scorer))
        }
        ScorerKind::Placeholder => {
            warn!(
                "No scorer configured, every prediction returns {}",
                config.placeholder_income
            );
            None
        }
    };
    Ok(Predictor::new(scorer, config.placeholder_income))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .format_module_path(false)
        .init();

    info!("Starting Income Prediction Service v{}", routes::SERVICE_VERSION);

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
        }
    };

    let predictor = match build_predictor(&config) {
        Ok(predictor) => predictor,
        Err(e) => {
            error!("Unable to load the model: {:#}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::NotFound, e));
        }
    };
    let predictor_data = web::Data::new(predictor);

    let bind_address = config.bind_address();
    let static_dir = config.static_dir.clone();
    let serve_static = static_dir.is_dir();
    let json_limit = config.json_limit_bytes;

    info!("Listening on http://{}", bind_address);
    info!("Workers: {}", config.workers);
    info!("Endpoints:");
    info!("   GET  /               - service status");
    info!("   GET  /health         - health check");
    info!("   POST /predict        - single prediction");
    info!("   POST /predict/batch  - batch prediction");
    info!("   GET  /features       - model feature list");
    info!("   GET  /model/info     - model information");
    if serve_static {
        info!("   GET  /static/*       - {}", static_dir.display());
    }

    HttpServer::new(move || {
        let mut app = App::new()
            .wrap(Logger::default())
            .wrap(DefaultHeaders::new().add(("X-Content-Type-Options", "nosniff")))
            .wrap(Cors::permissive())
            .app_data(predictor_data.clone())
            .app_data(routes::json_config(json_limit))
            .configure(routes::configure);
        if serve_static {
            app = app.service(Files::new("/static", &static_dir).prefer_utf8(true));
        }
        app.default_service(web::route().to(|| async {
            HttpResponse::NotFound().json(ErrorResponse::new("Not Found"))
        }))
    })
    .workers(config.workers)
    .bind(&bind_address)?
    .run()
    .await
}
