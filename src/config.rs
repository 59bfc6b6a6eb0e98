use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::builder::TypedValueParser;
use clap::Parser;

use crate::process::FetchSettings;
use crate::{
    GroupId, CHUNK_SIZE, CONCURRENCY_LIMIT, JOBS_API_URL, LOGO_BASE_URL, MAX_ATTEMPTS,
    PORTAL_HOME_URL, REQUEST_TIMEOUT_SECS, RESULTS_PER_PAGE,
};

/// Runtime configuration, read from the command line with environment fallbacks.
#[derive(Debug, Clone, Parser)]
#[command(name = "portal-scrap", version, about)]
pub struct Config {
    #[arg(long, env = "BIND_HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Where job listing JSON files are written and served from.
    #[arg(long, env = "SCRAPED_DIR", default_value = "scraped")]
    pub scraped_dir: PathBuf,
    /// Where group logos are written.
    #[arg(long, env = "GIF_DIR", default_value = "gifs")]
    pub gif_dir: PathBuf,

    /// Group ids whose job listings `/scrape` fetches.
    #[arg(
        long = "group-id",
        env = "GROUP_IDS",
        value_delimiter = ',',
        default_values_t = [4632583u64, 5947482]
    )]
    pub group_ids: Vec<GroupId>,
    /// Group ids whose logos `/scrape-gifs` downloads.
    #[arg(
        long = "logo-id",
        env = "LOGO_IDS",
        value_delimiter = ',',
        default_values_t = [4590793u64, 4590835]
    )]
    pub logo_ids: Vec<GroupId>,

    #[arg(long, env = "CONCURRENCY", default_value_t = CONCURRENCY_LIMIT,
        value_parser = clap::value_parser!(u64).range(1..).map(|n| n as usize))]
    pub concurrency: usize,
    #[arg(long, env = "CHUNK_SIZE", default_value_t = CHUNK_SIZE,
        value_parser = clap::value_parser!(u64).range(1..).map(|n| n as usize))]
    pub chunk_size: usize,
    #[arg(long, env = "MAX_ATTEMPTS", default_value_t = MAX_ATTEMPTS,
        value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: u32,
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = REQUEST_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..))]
    pub request_timeout_secs: u64,

    #[arg(long, env = "LOGO_BASE_URL", default_value = LOGO_BASE_URL)]
    pub logo_base_url: String,
    #[arg(long, env = "JOBS_API_URL", default_value = JOBS_API_URL)]
    pub jobs_api_url: String,
    #[arg(long, env = "PORTAL_HOME_URL", default_value = PORTAL_HOME_URL)]
    pub portal_home_url: String,
    #[arg(long, env = "RESULTS_PER_PAGE", default_value_t = RESULTS_PER_PAGE,
        value_parser = clap::value_parser!(u32).range(1..=RESULTS_PER_PAGE as i64))]
    pub results_per_page: u32,
}

impl Config {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            concurrency: self.concurrency,
            chunk_size: self.chunk_size,
            max_attempts: self.max_attempts,
        }
    }
}
