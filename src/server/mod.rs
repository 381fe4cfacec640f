use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::Settings;
use crate::devserver::{PreparedUrls, UdpLanProbe, prepare_urls};

#[derive(Clone)]
struct AppState {
    catalog: Arc<Catalog>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct TrailerBody<'a> {
    #[serde(rename = "type")]
    mime_type: &'a str,
    url: &'a str,
}

pub fn router(catalog: Arc<Catalog>) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/api/movies", get(handle_movies))
        .route("/api/movies/:id", get(handle_movie))
        .route("/api/actors/:name", get(handle_actor))
        .route("/api/trailers/:id", get(handle_trailer))
        .with_state(AppState { catalog })
}

pub async fn run_dev_server(settings: &Settings, catalog: Catalog) -> Result<()> {
    let bind = settings.bind_address();
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind dev server to `{bind}`"))?;
    let local_addr = listener.local_addr().ok();

    info!(
        requested_bind = %bind,
        bound_addr = local_addr.map(|addr| addr.to_string()),
        movies = catalog.movies.len(),
        actors = catalog.actors.len(),
        "starting dev server"
    );

    let port = local_addr.map(|addr| addr.port()).unwrap_or(settings.port);
    let urls = prepare_urls(
        settings.protocol.as_str(),
        &settings.host,
        port,
        None,
        &UdpLanProbe,
    );
    print_banner(&urls);

    axum::serve(listener, router(Arc::new(catalog)))
        .await
        .context("dev server exited with an error")
}

pub fn print_banner(urls: &PreparedUrls) {
    println!("You can now view the catalog in the browser.");
    println!();
    match &urls.lan_url_for_terminal {
        Some(lan_url) => {
            println!("  Local:            {}", urls.local_url_for_terminal);
            println!("  On Your Network:  {lan_url}");
        }
        None => println!("  {}", urls.local_url_for_terminal),
    }
    println!();
}

async fn handle_health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn handle_movies(State(state): State<AppState>) -> Response {
    (StatusCode::OK, Json(&state.catalog.movies)).into_response()
}

async fn handle_movie(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.catalog.movie(&id) {
        Some(movie) => (StatusCode::OK, Json(movie)).into_response(),
        None => not_found(format!("unknown movie `{id}`")),
    }
}

async fn handle_actor(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.catalog.actor(&name) {
        Some(actor) => (StatusCode::OK, Json(actor)).into_response(),
        None => not_found(format!("unknown actor `{name}`")),
    }
}

async fn handle_trailer(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.catalog.trailer(&id) {
        Some(trailer) => (
            StatusCode::OK,
            Json(TrailerBody {
                mime_type: &trailer.mime_type,
                url: &trailer.url,
            }),
        )
            .into_response(),
        None => not_found(format!("no trailer for `{id}`")),
    }
}

fn not_found(error: String) -> Response {
    debug!(error = %error, "catalog lookup missed");
    (StatusCode::NOT_FOUND, Json(ErrorBody { error })).into_response()
}
