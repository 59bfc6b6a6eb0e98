//! Local HTTP surface: trigger a scrape, export results, fetch single files.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::archive::zip_dir;
use crate::config::Config;
use crate::jobs::JobScraper;
use crate::process::BatchFetcher;
use crate::request::{AssetFetcher, HttpAssetFetcher};
use crate::session::{HomepageSession, SessionMinter};
use crate::storage::ArtifactDir;
use crate::{Error, GroupId, Result};

pub const JOBS_ZIP_NAME: &str = "naukri-jsons.zip";
pub const GIFS_ZIP_NAME: &str = "naukri-gifs.zip";

pub struct AppState {
    pub jobs: JobScraper,
    pub gifs: BatchFetcher,
    /// Groups `/scrape` walks through.
    pub group_ids: Vec<GroupId>,
    /// Groups `/scrape-gifs` downloads logos for.
    pub logo_ids: Vec<GroupId>,
}

impl AppState {
    /// Wires the real network clients from the config.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let minter: Arc<dyn SessionMinter> = Arc::new(HomepageSession::new(
            cfg.portal_home_url.as_str(),
            cfg.request_timeout(),
        )?);
        let jobs = JobScraper::new(
            minter,
            cfg.jobs_api_url.as_str(),
            ArtifactDir::new(&cfg.scraped_dir, "json"),
            cfg.request_timeout(),
        )?
        .with_results_per_page(cfg.results_per_page);

        let fetcher: Arc<dyn AssetFetcher> = Arc::new(HttpAssetFetcher::new(
            cfg.logo_base_url.as_str(),
            cfg.request_timeout(),
        )?);
        let gifs = BatchFetcher::new(
            fetcher,
            ArtifactDir::new(&cfg.gif_dir, "gif"),
            cfg.fetch_settings(),
        );

        Ok(Self {
            jobs,
            gifs,
            group_ids: cfg.group_ids.clone(),
            logo_ids: cfg.logo_ids.clone(),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let scraped = ServeDir::new(state.jobs.dir().root());
    let gifs = ServeDir::new(state.gifs.dir().root());

    Router::new()
        .route("/", get(home))
        .route("/scrape", get(scrape))
        .route("/download-all", get(download_all))
        .route("/scrape-gifs", get(scrape_gifs))
        .route("/download-gifs", get(download_gifs))
        .nest_service("/gifs", gifs)
        // Scraped listings are reachable as `/<group_id>.json`.
        .fallback_service(scraped)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Creates the output directories and serves until the listener dies.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    state.jobs.dir().ensure().await?;
    state.gifs.dir().ensure().await?;

    let listener = TcpListener::bind(addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);
    axum::serve(listener, router(state).into_make_service()).await?;
    Ok(())
}

async fn home() -> Html<&'static str> {
    Html(
        r#"
    <h2>Naukri Scraper</h2>
    <p><a href="/scrape">Run Scraper</a></p>
    <p><a href="/download-all">Download All JSONs (ZIP)</a></p>
    <p><a href="/scrape-gifs">Scrape GIF Logos</a></p>
    <p><a href="/download-gifs">Download All GIFs (ZIP)</a></p>
    <p>Once scraped, you can also access individual files like: <code>/4632583.json</code> or <code>/gifs/4590793.gif</code></p>
"#,
    )
}

async fn scrape(State(state): State<Arc<AppState>>) -> Result<Html<&'static str>> {
    state.jobs.scrape_all(&state.group_ids).await?;
    Ok(Html(
        r#"
    Scraping complete.<br>
    <a href="/">Go back</a><br>
    <a href="/download-all">Download All JSON Files</a>
"#,
    ))
}

/// Acknowledges once every batch is done, whatever the per-id results. Counts only go to the log.
async fn scrape_gifs(State(state): State<Arc<AppState>>) -> Result<Html<&'static str>> {
    state.gifs.run(&state.logo_ids).await?;
    Ok(Html(r#"All GIF scraping done! <a href="/">Go Home</a>"#))
}

async fn download_all(State(state): State<Arc<AppState>>) -> Result<Response> {
    zip_response(state.jobs.dir().root(), JOBS_ZIP_NAME).await
}

async fn download_gifs(State(state): State<Arc<AppState>>) -> Result<Response> {
    zip_response(state.gifs.dir().root(), GIFS_ZIP_NAME).await
}

async fn zip_response(dir: &Path, file_name: &str) -> Result<Response> {
    let bytes = zip_dir(dir.to_path_buf()).await?;
    let disposition = format!("attachment; filename=\"{file_name}\"");
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip"),
            (header::CONTENT_DISPOSITION, disposition.as_str()),
        ],
        bytes,
    )
        .into_response())
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        error!("Request failed: {self}");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}
