use super::constant::*;
use crate::{hotspot::CachePolicy, Error, Result};
use serde::{Deserialize, Serialize};
use serde_json;
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AppConfig {
    // app_name represents the name of current running service.
    pub app_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            app_name: DEFAULT_APP_NAME.into(),
        }
    }
}

// LogConfig represent the configuration of logging in Sentinel.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LogConfig {
    // config_file is the log4rs configuration, only used with the `logger_log4rs` feature
    pub config_file: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            config_file: LOG_CONFIG_FILE.into(),
        }
    }
}

/// HotspotConfig represents the sizing and eviction policy of the hotspot statistic caches.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HotspotConfig {
    pub cache_policy: CachePolicy,
    /// the cache capacity of QPS rules is `params_capacity_base * duration_in_sec`,
    /// bounded by `params_max_capacity`
    pub params_capacity_base: usize,
    pub params_max_capacity: usize,
    /// the cache capacity of Concurrency rules
    pub concurrency_max_count: usize,
}

impl Default for HotspotConfig {
    fn default() -> Self {
        HotspotConfig {
            cache_policy: CachePolicy::default(),
            params_capacity_base: PARAMS_CAPACITY_BASE,
            params_max_capacity: PARAMS_MAX_CAPACITY,
            concurrency_max_count: CONCURRENCY_MAX_COUNT,
        }
    }
}

// SentinelConfig represent the general configuration of Sentinel.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SentinelConfig {
    pub app: AppConfig,
    pub log: LogConfig,
    pub hotspot: HotspotConfig,
    // use_cache_time indicates whether to cache time(ms), it is false by default
    pub use_cache_time: bool,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        SentinelConfig {
            use_cache_time: false,
            app: AppConfig::default(),
            log: LogConfig::default(),
            hotspot: HotspotConfig::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ConfigEntity {
    pub version: String,
    pub config: SentinelConfig,
}

impl Default for ConfigEntity {
    fn default() -> Self {
        ConfigEntity {
            version: SENTINEL_VERSION.into(),
            config: SentinelConfig::default(),
        }
    }
}

impl ConfigEntity {
    pub fn new() -> Self {
        ConfigEntity::default()
    }

    pub fn check(&self) -> Result<()> {
        if self.version.is_empty() {
            return Err(Error::msg("empty version"));
        }
        if self.config.app.app_name.is_empty() {
            return Err(Error::msg("empty app name"));
        }
        let hotspot = &self.config.hotspot;
        if hotspot.params_capacity_base == 0 {
            return Err(Error::msg(
                "illegal hotspot configuration: params_capacity_base is 0",
            ));
        }
        if hotspot.params_max_capacity == 0 {
            return Err(Error::msg(
                "illegal hotspot configuration: params_max_capacity is 0",
            ));
        }
        if hotspot.concurrency_max_count == 0 {
            return Err(Error::msg(
                "illegal hotspot configuration: concurrency_max_count is 0",
            ));
        }
        if hotspot.params_capacity_base > hotspot.params_max_capacity {
            return Err(Error::msg(
                "illegal hotspot configuration: params_capacity_base is larger than params_max_capacity",
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn app_name(&self) -> &str {
        &self.config.app.app_name
    }

    #[inline]
    pub fn hotspot(&self) -> &HotspotConfig {
        &self.config.hotspot
    }

    #[inline]
    pub fn log_config_file(&self) -> Option<String> {
        if self.config.log.config_file.is_empty() {
            None
        } else {
            Some(self.config.log.config_file.clone())
        }
    }

    #[inline]
    pub fn use_cache_time(&self) -> bool {
        self.config.use_cache_time
    }
}

impl fmt::Display for ConfigEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string_pretty(self) {
            Ok(fmtted) => write!(f, "{}", fmtted),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_is_valid() {
        let entity = ConfigEntity::new();
        entity.check().unwrap();
        assert_eq!(DEFAULT_APP_NAME, entity.app_name());
        assert_eq!(CachePolicy::TinyLfu, entity.hotspot().cache_policy);
        assert!(!entity.use_cache_time());
    }

    #[test]
    #[should_panic(expected = "empty app name")]
    fn empty_app_name() {
        let mut entity = ConfigEntity::new();
        entity.config.app.app_name = String::new();
        entity.check().unwrap();
    }

    #[test]
    #[should_panic(expected = "params_capacity_base is larger than params_max_capacity")]
    fn base_larger_than_max() {
        let mut entity = ConfigEntity::new();
        entity.config.hotspot.params_capacity_base = PARAMS_MAX_CAPACITY + 1;
        entity.check().unwrap();
    }

    #[test]
    #[should_panic(expected = "concurrency_max_count is 0")]
    fn zero_concurrency_capacity() {
        let mut entity = ConfigEntity::new();
        entity.config.hotspot.concurrency_max_count = 0;
        entity.check().unwrap();
    }
}
