//! HTTP server core implementation

use crate::config::{Config, ServerConfig};
use crate::server::routes;
use crate::server::state::AppState;
use crate::services::delivery::{LaneWorker, lane_workers};
use crate::services::pricing::PricingService;
use crate::storage::StorageLayer;
use crate::utils::error::{GatewayError, Result};
use actix_web::{App, HttpServer as ActixHttpServer, middleware::DefaultHeaders, web};
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;

/// HTTP server
pub struct HttpServer {
    /// Server configuration
    config: ServerConfig,
    /// Application state
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Creating HTTP server");

        let storage = StorageLayer::new(config.storage(), config.queue()).await?;
        let pricing = PricingService::from_config(config.pricing()).await?;
        let state = AppState::new(config.clone(), storage, pricing)?;

        Ok(Self {
            config: config.server().clone(),
            state,
        })
    }

    /// Create the Actix-web application
    pub fn create_app(
        state: web::Data<AppState>,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let max_body_size = state.config.server().max_body_size;

        App::new()
            .app_data(state)
            .app_data(web::PayloadConfig::new(max_body_size))
            .app_data(web::JsonConfig::default().limit(max_body_size))
            .wrap(TracingLogger::default())
            .wrap(DefaultHeaders::new().add(("Server", "llm-meter")))
            .configure(routes::configure_routes)
    }

    /// Start the lane workers, when this instance consumes
    fn start_workers(&self) -> Vec<Arc<LaneWorker>> {
        let queue = self.state.config.queue();
        if !queue.consume {
            info!("Queue consumption disabled on this instance");
            return Vec::new();
        }
        let workers = lane_workers(&self.state.storage, queue);
        for worker in &workers {
            worker.clone().spawn();
        }
        workers
    }

    /// Start the HTTP server
    pub async fn start(self) -> Result<()> {
        let bind_addr = self.config.address();
        let port = self.config.port;

        info!("Starting HTTP server on {}", bind_addr);

        let workers = self.start_workers();
        let state = web::Data::new(self.state);

        let server = ActixHttpServer::new(move || Self::create_app(state.clone()))
            .workers(self.config.worker_count())
            .bind(&bind_addr)
            .map_err(|e| Self::format_bind_error(e, &bind_addr, port))?
            .run();

        info!("HTTP server listening on {}", bind_addr);

        let outcome = server
            .await
            .map_err(|e| GatewayError::internal(format!("Server error: {}", e)));

        for worker in &workers {
            worker.stop();
        }
        info!("HTTP server stopped");
        outcome
    }
}
