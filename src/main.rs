//! Air Quality Index Service
//!
//! REST backend for air quality index calculation, record history and
//! synthetic pollutant data.

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use airindex::config::Settings;
use airindex::handlers::{self, ApiSettings};
use airindex::seed::seed_state;
use airindex::state::AppState;
use airindex::synthetic::SyntheticFeed;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenv::dotenv().ok();

    // Logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,airindex=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json())
        .init();

    // Load configuration
    let settings = Settings::from_env().context("Failed to load configuration")?;
    let bind_address = format!("{}:{}", settings.server.host, settings.server.port);

    info!("Starting air quality index backend");
    info!("Binding server to {}", bind_address);

    // Shared application state
    let mut state = AppState::new();
    if settings.seed.enabled {
        let mut rng = StdRng::from_entropy();
        seed_state(&mut state, &mut rng, chrono::Utc::now(), &settings.seed);
    }
    let app_state = Arc::new(RwLock::new(state));

    // ---------------------------------------------------------------------
    // Synthetic feed background task
    // ---------------------------------------------------------------------
    if settings.generator.feed_interval_ms > 0 {
        let feed_state = app_state.clone();
        let feed = SyntheticFeed::new(
            settings.generator.feed_interval_ms,
            settings.generator.missing_probability,
            settings.seed.stations,
        );

        actix_rt::spawn(async move {
            feed.run(feed_state).await;
        });
    }

    let api_settings = ApiSettings {
        missing_probability: settings.generator.missing_probability,
    };

    // ---------------------------------------------------------------------
    // HTTP server
    // ---------------------------------------------------------------------
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::Data::new(api_settings))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure_routes)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run()
    .await
    .context("HTTP server terminated with an error")
}
