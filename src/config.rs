use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::Parser;

use crate::data::messages::MESSAGES_FILE;
use crate::error::{DashError, Result};
use crate::policy::DEFAULT_MAX_AGE_MINUTES;
use crate::schedule::PollSchedule;

#[derive(Parser, Debug, Clone)]
#[command(name = "home-dash")]
#[command(about = "Home dashboard API and e-ink image server")]
pub struct Config {
    /// HTTP listen address
    #[arg(long, env = "DASH_LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: SocketAddr,

    /// Directory holding the JSON snapshots written by the fetchers
    #[arg(long, env = "DASHBOARD_INPUT_DIR")]
    pub dashboard_input_dir: PathBuf,

    /// Daily messages file (defaults to messages.json in the input directory)
    #[arg(long, env = "MESSAGES_FILE")]
    pub messages_file: Option<PathBuf>,

    /// Directory with the vehicle state icons
    #[arg(long, env = "LEAF_IMAGE_DIR", default_value = "./leaf_images")]
    pub leaf_image_dir: PathBuf,

    /// Temperature sensor shown on the dashboard
    #[arg(long, env = "DASH_TEMPERATURE_SENSOR", default_value = "pistat-0")]
    pub temperature_sensor: String,

    /// Seconds an unused cache entry is kept
    #[arg(long, env = "DASH_CACHE_TTL_SECS", default_value = "600")]
    pub cache_ttl_secs: u64,

    /// Minutes after which a cached image is re-rendered regardless of content
    #[arg(long, env = "DASH_MAX_SNAPSHOT_AGE_MINS", default_value_t = DEFAULT_MAX_AGE_MINUTES)]
    pub max_snapshot_age_mins: i64,

    /// Poll delay in minutes outside the quiet window
    #[arg(long, env = "DASH_ACTIVE_POLL_MINS", default_value = "5")]
    pub active_poll_mins: u32,

    /// Hour the quiet window starts
    #[arg(long, env = "DASH_QUIET_START_HOUR", default_value = "22")]
    pub quiet_start_hour: u32,

    /// Hour the quiet window ends and clients wake up
    #[arg(long, env = "DASH_QUIET_END_HOUR", default_value = "6")]
    pub quiet_end_hour: u32,

    #[arg(long, env = "DASH_JPEG_QUALITY", default_value = "90")]
    pub jpeg_quality: u8,
}

impl Config {
    pub fn messages_path(&self) -> PathBuf {
        self.messages_file
            .clone()
            .unwrap_or_else(|| self.dashboard_input_dir.join(MESSAGES_FILE))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn max_snapshot_age(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.max_snapshot_age_mins)
    }

    pub fn poll_schedule(&self) -> PollSchedule {
        PollSchedule {
            active_minutes: self.active_poll_mins,
            quiet_start_hour: self.quiet_start_hour,
            quiet_end_hour: self.quiet_end_hour,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.dashboard_input_dir.is_dir() {
            return Err(DashError::Config(format!(
                "DASHBOARD_INPUT_DIR {} does not exist or is not a directory",
                self.dashboard_input_dir.display()
            )));
        }
        if self.cache_ttl_secs == 0 {
            return Err(DashError::Config("cache TTL must be positive".into()));
        }
        if self.max_snapshot_age_mins <= 0 {
            return Err(DashError::Config("max snapshot age must be positive".into()));
        }
        for hour in [self.quiet_start_hour, self.quiet_end_hour] {
            if hour >= 24 {
                return Err(DashError::Config(format!("invalid hour {hour}")));
            }
        }
        Ok(())
    }
}
