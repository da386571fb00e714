use std::convert::Infallible;

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures_util::stream::Stream;
use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dinner_core::domain::config::WidgetConfig;
use dinner_core::domain::votes::{VoteLedger, VoteTally};
use dinner_core::notify::Inbound;
use dinner_core::pipeline::Generator;
use dinner_core::service::{spawn_refresh_loop, DeliveredPlan, DinnerService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = dinner_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let generator = Generator::from_settings(&settings)?;
    let service = DinnerService::new(generator, VoteLedger::new());

    let widget = WidgetConfig::from_env();
    let refresh = match widget.generation_config() {
        Ok(_) => Some(spawn_refresh_loop(service.clone(), widget)),
        Err(e) => {
            tracing::warn!(error = %e, "no widget configuration in environment; waiting for FETCH_WHATSFORDINNER");
            None
        }
    };

    let app = router(service);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = refresh {
        handle.abort();
    }
    Ok(())
}

fn router(service: DinnerService) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/notifications", post(post_notification))
        .route("/events", get(events))
        .route("/plan/latest", get(get_latest_plan))
        .route("/votes/:date", get(get_votes))
        .with_state(service)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn post_notification(
    State(service): State<DinnerService>,
    Json(inbound): Json<Inbound>,
) -> StatusCode {
    service.handle(inbound).await;
    StatusCode::ACCEPTED
}

async fn events(
    State(service): State<DinnerService>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = service.subscribe();

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(notification) => match serde_json::to_string(&notification) {
                    Ok(data) => {
                        yield Ok(Event::default().event(notification.name()).data(data));
                    }
                    Err(e) => {
                        let err = anyhow::Error::new(e);
                        sentry_anyhow::capture_anyhow(&err);
                        tracing::error!(error = %err, "failed to encode outbound notification");
                    }
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "display subscriber lagged; notifications dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn get_latest_plan(
    State(service): State<DinnerService>,
) -> Result<Json<DeliveredPlan>, StatusCode> {
    service
        .latest_plan()
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn get_votes(
    State(service): State<DinnerService>,
    Path(date): Path<String>,
) -> Json<VoteTally> {
    Json(service.tally(&date).await)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &dinner_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
