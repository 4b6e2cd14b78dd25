// default app settings
pub const SENTINEL_VERSION: &str = "v1";
pub const DEFAULT_APP_NAME: &str = "unknown_service";
pub const APP_NAME_ENV_KEY: &str = "SENTINEL_APP_NAME";
pub const CACHE_POLICY_ENV_KEY: &str = "SENTINEL_HOTSPOT_CACHE_POLICY";
pub const CONF_FILE_PATH_ENV_KEY: &str = "SENTINEL_CONFIG_FILE_PATH";

// default hotspot settings
/// capacity of the per-rule statistic caches for one second of QPS statistic duration
pub const PARAMS_CAPACITY_BASE: usize = 4000;
pub const PARAMS_MAX_CAPACITY: usize = 20000;
pub const CONCURRENCY_MAX_COUNT: usize = 4000;

// default log settings
pub const DEFAULT_LOG_LEVEL: &str = "warn";
pub const LOG_CONFIG_FILE: &str = "testdata/config/log4rs.yaml";
