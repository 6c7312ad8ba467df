use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::Deserialize;

pub const DEFAULT_USER_HEADER: &str = "x-user-id";
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_MEDIA_API_BASE: &str = "https://api.cloudinary.com";
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Deserialize, Clone, Debug)]
pub struct Server {
    pub address: String,
    pub port: u16,
    /// Create and update bodies carry base64 images
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Mongo,
    Memory,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Storage {
    #[serde(default)]
    pub backend: StorageBackend,
    pub uri: Option<String>,
    pub database: Option<String>,
}

/// Media host credentials. Missing values are taken from the
/// `CLOUDINARY_*` environment variables.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Media {
    pub api_base: Option<String>,
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Auth {
    #[serde(default = "default_user_header")]
    pub user_header: String,
}

impl Default for Auth {
    fn default() -> Self {
        Auth { user_header: default_user_header() }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct Posts {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub enforce_ownership: bool,
}

impl Default for Posts {
    fn default() -> Self {
        Posts {
            page_size: default_page_size(),
            enforce_ownership: false,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone, Debug)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub server: Server,
    pub storage: Storage,
    #[serde(default)]
    pub media: Media,
    #[serde(default)]
    pub auth: Auth,
    #[serde(default)]
    pub posts: Posts,
    pub log: Option<Log>,
}

fn default_user_header() -> String {
    DEFAULT_USER_HEADER.to_string()
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn parse_path(path: PathBuf) -> io::Result<PathBuf> {
    if !path.starts_with("${exe_dir}") {
        return Ok(path);
    }

    let cur_exe = env::current_exe()?;
    let exe_dir = cur_exe.parent()
        .ok_or_else(|| io::Error::new(ErrorKind::NotFound, "Executable has no parent directory"))?;
    let str_path = path.to_string_lossy();
    Ok(PathBuf::from(str_path.replace("${exe_dir}", &exe_dir.to_string_lossy())))
}

impl Media {
    /// Fills the missing credentials from the environment.
    pub fn with_env_fallback(self) -> Media {
        let from_env = |value: Option<String>, key: &str| value.or_else(|| env::var(key).ok());
        Media {
            api_base: self.api_base,
            cloud_name: from_env(self.cloud_name, "CLOUDINARY_CLOUD_NAME"),
            api_key: from_env(self.api_key, "CLOUDINARY_API_KEY"),
            api_secret: from_env(self.api_secret, "CLOUDINARY_API_SECRET"),
        }
    }
}

pub fn parse_config(cfg_content: &str) -> io::Result<Config> {
    let mut cfg: Config = match toml::from_str::<Config>(cfg_content) {
        Ok(cfg) => cfg,
        Err(e) => return Err(io::Error::new(
            ErrorKind::InvalidData, format!("Error parsing configuration file: {}", e))),
    };

    if cfg.posts.page_size == 0 {
        return Err(io::Error::new(ErrorKind::InvalidData, "posts.page_size has to be greater than 0"));
    }

    if cfg.storage.backend == StorageBackend::Mongo && cfg.storage.uri.is_none() {
        return Err(io::Error::new(ErrorKind::InvalidData, "storage.uri is required for the mongo backend"));
    }

    if let Some(mut log) = cfg.log.take() {
        log.location = log.location.map(parse_path).transpose()?;
        cfg.log = Some(log);
    }

    cfg.media = cfg.media.with_env_fallback();

    Ok(cfg)
}

pub fn read_config(cfg_path: &Path) -> io::Result<Config> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => return Err(io::Error::new(e.kind(), format!("Error opening configuration file {}: {}", cfg_path.display(), e))),
    };

    parse_config(&cfg_content)
}
