use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};

use crate::app::App;

mod activism;
mod contact;
mod error;
mod media;
mod posts;
mod sync;

pub use error::AppError;

pub fn router(app: App) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/posts", get(posts::list_posts))
        .route("/api/posts/:slug", get(posts::get_post))
        .route("/api/tags", get(posts::list_tags))
        .route("/api/media/:id", get(media::get_media))
        .route("/api/contact", post(contact::send_contact))
        .route("/api/sync-telegram", get(sync::sync_telegram))
        .route("/api/activism", get(activism::activism))
        .route("/rss.xml", get(posts::rss_feed))
        .layer(cors)
        .with_state(app)
}

pub async fn serve(app: App) -> anyhow::Result<()> {
    let address = app.settings().http.bind.clone();
    log::info!("binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    log::info!("server running on {address}");

    axum::serve(listener, router(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
        log::info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                log::info!("received terminate signal, shutting down");
            }
            Err(err) => {
                log::error!("failed to install signal handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
