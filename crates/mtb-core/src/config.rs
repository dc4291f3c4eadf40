use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use clap::Parser;
use tracing::{debug, info};

use crate::{domain::RepoRef, errors::Error, Result};

pub const ENV_DISCORD_SERVER_ID: &str = "DISCORD_SERVER_ID";
pub const ENV_DISCORD_TOKEN: &str = "DISCORD_TOKEN";
pub const ENV_DISCORD_APPLICATION_ID: &str = "DISCORD_APPLICATION_ID";
pub const ENV_DISCORD_PUBLIC_KEY: &str = "DISCORD_PUBLIC_KEY";
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_CONFIG_PATH: &str = "CONFIG_PATH";
pub const ENV_FAQ_PATH: &str = "FAQ_PATH";
pub const ENV_HEALTHCHECK_PORT: &str = "HEALTHCHECK_PORT";
pub const ENV_ENVIRONMENT: &str = "ENV";

pub const DEFAULT_HEALTHCHECK_PORT: u16 = 8080;
pub const DEFAULT_FAQ_PATH: &str = "faq.yaml";
pub const DEFAULT_ENVIRONMENT: &str = "dev";
pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);
const DEFAULT_GITHUB_TIMEOUT: Duration = Duration::from_secs(10);

/// Command-line overrides. Every flag wins over the environment.
#[derive(Clone, Debug, Default, Parser)]
#[command(name = "mtb", about = "Discord bot that files GitHub issues and answers FAQ/changelog queries")]
pub struct Flags {
    /// Discord server (guild) ID
    #[arg(long)]
    pub server_id: Option<String>,

    /// Discord bot access token
    #[arg(long)]
    pub discord_token: Option<String>,

    /// Discord application ID
    #[arg(long)]
    pub application_id: Option<String>,

    /// Discord application public key (hex)
    #[arg(long)]
    pub public_key: Option<String>,

    /// GitHub access token
    #[arg(long)]
    pub github_token: Option<String>,

    /// Location of modal yaml configuration file
    #[arg(long)]
    pub config_path: Option<PathBuf>,

    /// Location of FAQ yaml file
    #[arg(long)]
    pub faq_path: Option<PathBuf>,

    /// HTTP server port (interactions + health check)
    #[arg(long)]
    pub healthcheck_port: Option<u16>,

    /// Default GitHub repository as owner/repo
    #[arg(long)]
    pub repository: Option<String>,

    /// Remove Discord commands on shutdown
    #[arg(long)]
    pub remove_commands: bool,
}

/// Typed configuration for the bot.
#[derive(Clone, Debug)]
pub struct Config {
    // Discord
    pub server_id: String,
    pub discord_token: String,
    pub application_id: String,
    pub public_key: String,
    pub remove_commands: bool,

    // GitHub
    pub github_token: String,
    pub github_api_base: String,
    pub github_timeout: Duration,
    pub default_repository: Option<RepoRef>,

    // Files
    pub config_path: PathBuf,
    pub faq_path: PathBuf,

    // HTTP
    pub healthcheck_port: u16,

    // Caches
    pub release_cache_ttl: Duration,
    pub comparison_cache_ttl: Duration,
}

impl Config {
    /// Defaults, then `.env.{ENV}` (or `.env`), then the process environment,
    /// then command-line flags, then validation.
    pub fn load() -> Result<Self> {
        load_env_file();
        let flags = Flags::parse();
        let cfg = Self::from_sources(|key| env::var(key).ok(), flags)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build a config from an env-style lookup and parsed flags (no validation).
    pub fn from_sources(lookup: impl Fn(&str) -> Option<String>, flags: Flags) -> Result<Self> {
        let var = |key: &str| lookup(key).and_then(non_empty);

        let healthcheck_port = match flags.healthcheck_port {
            Some(p) => p,
            None => match var(ENV_HEALTHCHECK_PORT) {
                Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                    Error::Config(format!("{ENV_HEALTHCHECK_PORT} must be a port number: {raw}"))
                })?,
                None => DEFAULT_HEALTHCHECK_PORT,
            },
        };

        let default_repository = match flags.repository.or_else(|| var("GITHUB_REPOSITORY")) {
            Some(raw) => Some(RepoRef::parse(&raw).ok_or_else(|| {
                Error::Config(format!("invalid repository '{raw}', expected owner/repo"))
            })?),
            None => None,
        };

        let secs = |key: &str| var(key).and_then(|s| s.trim().parse::<u64>().ok());

        Ok(Self {
            server_id: flags
                .server_id
                .or_else(|| var(ENV_DISCORD_SERVER_ID))
                .unwrap_or_default(),
            discord_token: flags
                .discord_token
                .or_else(|| var(ENV_DISCORD_TOKEN))
                .unwrap_or_default(),
            application_id: flags
                .application_id
                .or_else(|| var(ENV_DISCORD_APPLICATION_ID))
                .unwrap_or_default(),
            public_key: flags
                .public_key
                .or_else(|| var(ENV_DISCORD_PUBLIC_KEY))
                .unwrap_or_default(),
            remove_commands: flags.remove_commands,
            github_token: flags
                .github_token
                .or_else(|| var(ENV_GITHUB_TOKEN))
                .unwrap_or_default(),
            github_api_base: var("GITHUB_API_URL")
                .unwrap_or_else(|| DEFAULT_GITHUB_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            github_timeout: var("GITHUB_TIMEOUT_MS")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_GITHUB_TIMEOUT),
            default_repository,
            config_path: flags
                .config_path
                .or_else(|| var(ENV_CONFIG_PATH).map(PathBuf::from))
                .unwrap_or_default(),
            faq_path: flags
                .faq_path
                .or_else(|| var(ENV_FAQ_PATH).map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FAQ_PATH)),
            healthcheck_port,
            release_cache_ttl: secs("RELEASE_CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CACHE_TTL),
            comparison_cache_ttl: secs("COMPARISON_CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CACHE_TTL),
        })
    }

    /// Check required values and that the modal config path is a file.
    pub fn validate(&self) -> Result<()> {
        let required = [
            (ENV_DISCORD_TOKEN, &self.discord_token),
            (ENV_DISCORD_SERVER_ID, &self.server_id),
            (ENV_DISCORD_APPLICATION_ID, &self.application_id),
            (ENV_DISCORD_PUBLIC_KEY, &self.public_key),
            (ENV_GITHUB_TOKEN, &self.github_token),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{name} is required")));
            }
        }

        if self.config_path.as_os_str().is_empty() {
            return Err(Error::Config(format!("{ENV_CONFIG_PATH} is required")));
        }
        match fs::metadata(&self.config_path) {
            Ok(md) if md.is_dir() => Err(Error::Config(format!(
                "{ENV_CONFIG_PATH} must be a file, not a directory: {}",
                self.config_path.display()
            ))),
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::Config(format!(
                "{ENV_CONFIG_PATH} file does not exist: {}",
                self.config_path.display()
            ))),
            Err(e) => Err(Error::Config(format!("{ENV_CONFIG_PATH} error: {e}"))),
        }
    }
}

/// Load `.env.{ENV}` (default `.env.dev`), falling back to `.env`.
fn load_env_file() {
    let environment = env_str(ENV_ENVIRONMENT)
        .and_then(non_empty)
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
    let env_file = format!(".env.{environment}");

    if load_dotenv_if_present(Path::new(&env_file)) {
        info!("Loaded configuration from {env_file}");
    } else if load_dotenv_if_present(Path::new(".env")) {
        info!("No {env_file} file found, loaded .env");
    } else {
        debug!("No .env file found, using system environment variables only");
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Returns whether the file existed.
fn load_dotenv_if_present(path: &Path) -> bool {
    let Ok(contents) = fs::read_to_string(path) else {
        return false;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
    true
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
