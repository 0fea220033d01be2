use std::{path::PathBuf, time::Duration};

use aigis_advisor::AdvisorConfig;
use aigis_hal::HalConfig;
use aigis_link::LinkConfig;
use aigis_webui::UiConfig;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "aigis", about = "Telemetry and command server for a search-and-rescue UAV")]
pub struct MainArgs {
    #[clap(long, env = "AIGIS_WEBUI_PORT", default_value = "8000")]
    pub webui_port: u16,

    /// Vehicle link, `tcp:<host>:<port>` or `udp:<host>:<port>`
    #[clap(long, env = "AIGIS_HARDWARE_TARGET")]
    pub hardware_target: Option<String>,

    /// Try to connect to the hardware target on startup
    #[clap(long, env = "AIGIS_AUTO_CONNECT", default_value = "false")]
    pub auto_connect: bool,

    /// Without a key advisories come from local heuristics
    #[clap(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[clap(long, env = "AIGIS_GEMINI_MODEL", default_value = "gemini-1.5-flash")]
    pub gemini_model: String,

    #[clap(long, env = "AIGIS_ADVISORY_COOLDOWN_SECS", default_value = "10")]
    pub advisory_cooldown_secs: u64,

    /// Directory with the UI build to serve at `/`
    #[clap(long, env = "AIGIS_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    #[clap(long, env = "AIGIS_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl MainArgs {
    pub fn hal_config(&self) -> HalConfig {
        HalConfig {
            advisory_cooldown: Duration::from_secs(self.advisory_cooldown_secs),
            ..Default::default()
        }
    }

    pub fn advisor_config(&self) -> AdvisorConfig {
        AdvisorConfig {
            api_key: self.gemini_api_key.clone(),
            model: self.gemini_model.clone(),
            ..Default::default()
        }
    }

    /// The link to open on startup, if any.
    pub fn link_config(&self) -> Option<LinkConfig> {
        match (&self.hardware_target, self.auto_connect) {
            (Some(target), true) => Some(LinkConfig::new(target.clone())),
            (Some(target), false) => {
                log::info!("Hardware target {} configured but auto-connect is off", target);
                None
            }
            (None, true) => {
                log::warn!("Auto-connect requested without a hardware target");
                None
            }
            (None, false) => None,
        }
    }

    pub fn ui_config(&self) -> UiConfig {
        UiConfig {
            port: self.webui_port,
            static_dir: self.static_dir.clone(),
        }
    }
}
