//! PORTAL SCRAPER
//! Two jobs behind one local server:
//!  -   group logos, downloaded in batches under a concurrency limit (`process`)
//!  -   job listings per group, fetched from the portal search API (`jobs`)
//!
//! Every artifact lands in a flat directory as `<group_id>.<ext>`. A file being
//! there is the only record that the work for that id is done.

mod archive;
pub mod batch;
pub mod config;
mod error;
pub mod jobs;
pub mod logging;
mod macros;
mod parse;
pub mod process;
pub mod request;
pub mod server;
pub mod session;
pub mod storage;

pub use error::{Error, Result};

/// Numeric group id, names both the remote asset and the local file.
pub type GroupId = u64;

/// Ids per batch. Bounds memory and log noise, unrelated to `CONCURRENCY_LIMIT`.
pub const CHUNK_SIZE: usize = 500;
/// Fetches allowed in flight at once.
pub const CONCURRENCY_LIMIT: usize = 5;
/// Attempts per id, the first one included.
pub const MAX_ATTEMPTS: u32 = 3;
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
/// The search API refuses anything above this.
pub const RESULTS_PER_PAGE: u32 = 100;

pub const LOGO_BASE_URL: &str = "https://img.naukimg.com/logo_images/groups/v1";
pub const JOBS_API_URL: &str = "https://www.naukri.com/jobapi/v3/search";
pub const PORTAL_HOME_URL: &str = "https://www.naukri.com";

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";
