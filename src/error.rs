use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tokio Join Error, couldn't await a task! {0}")]
    RuntimeJoin(#[from] tokio::task::JoinError),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("The portal home page didn't hand out any session cookies.")]
    SessionNoCookies,

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Zip Error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Artifact path has no file name: {0}")]
    BadArtifactPath(String),
}
