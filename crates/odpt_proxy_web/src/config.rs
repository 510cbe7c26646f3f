use std::path::PathBuf;
use std::time::Duration;

use odpt_proxy_core::DEFAULT_API_BASE_URL;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8081";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
pub const ASSETS_DIR_NAME: &str = "assets";

/// Process configuration, read once at startup.
#[derive(Clone)]
pub struct ProxyConfig {
    pub addr: String,
    pub api_base_url: String,
    pub consumer_key: Option<String>,
    pub timeout: Duration,
    pub dataset_dirs: Vec<PathBuf>,
}

impl ProxyConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            addr: load_addr(&lookup),
            api_base_url: load_api_base_url(&lookup),
            consumer_key: load_consumer_key(&lookup),
            timeout: load_timeout(&lookup),
            dataset_dirs: load_dataset_dirs(&lookup),
        }
    }
}

impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("addr", &self.addr)
            .field("api_base_url", &self.api_base_url)
            .field("consumer_key", &self.consumer_key.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .field("dataset_dirs", &self.dataset_dirs)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn load_addr(lookup: &impl Fn(&str) -> Option<String>) -> String {
    non_empty(lookup("ODPT_PROXY_ADDR")).unwrap_or_else(|| DEFAULT_ADDR.to_string())
}

fn load_api_base_url(lookup: &impl Fn(&str) -> Option<String>) -> String {
    match non_empty(lookup("ODPT_API_BASE_URL")) {
        Some(value) => value.trim_end_matches('/').to_string(),
        None => DEFAULT_API_BASE_URL.to_string(),
    }
}

// Some deployments only expose the lowercase name.
fn load_consumer_key(lookup: &impl Fn(&str) -> Option<String>) -> Option<String> {
    non_empty(lookup("ODPT_CONSUMER_KEY")).or_else(|| non_empty(lookup("odpt_consumer_key")))
}

fn load_timeout(lookup: &impl Fn(&str) -> Option<String>) -> Duration {
    let seconds = non_empty(lookup("ODPT_PROXY_TIMEOUT_SECONDS"))
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|seconds| *seconds > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECONDS);
    Duration::from_secs(seconds)
}

fn load_dataset_dirs(lookup: &impl Fn(&str) -> Option<String>) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(dir) = non_empty(lookup("ODPT_PROXY_ASSETS_DIR")) {
        dirs.push(PathBuf::from(dir));
    }
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.join(ASSETS_DIR_NAME)))
    {
        dirs.push(exe_dir);
    }
    dirs.push(PathBuf::from(ASSETS_DIR_NAME));
    dirs
}
