use super::{constant::*, ConfigEntity};
use crate::{hotspot::CachePolicy, logging, utils, Error, Result};
use serde_yaml;
use std::env;
use std::fs::File;
use std::io::prelude::*;
use std::path::Path;

// init_config_with_yaml loads general configuration from the YAML file under provided path.
// Priority: system environment > YAML file > default config
pub fn init_config_with_yaml(config_path: &str) -> Result<ConfigEntity> {
    let mut config_path = config_path.to_owned();
    if utils::is_blank(&config_path) {
        // If the config file path is absent, Sentinel will try to resolve it from the system env.
        config_path = env::var(CONF_FILE_PATH_ENV_KEY).unwrap_or_default();
    }
    let mut entity = if utils::is_blank(&config_path) {
        ConfigEntity::new()
    } else {
        ConfigEntity::from_yaml_file(&config_path)?
    };
    entity.override_from_env()?;
    Ok(entity)
}

impl ConfigEntity {
    /// `from_yaml_file` loads and validates the configuration in the given YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::msg(
                "Sentinel YAML configuration file does not exist!",
            ));
        }
        let mut file = File::open(path)?;
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        let entity = Self::from_yaml_str(&content)?;
        logging::info!(
            "[Config] Resolving Sentinel config from file, file {}",
            path.display()
        );
        Ok(entity)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let entity: ConfigEntity = serde_yaml::from_str(content)?;
        entity.check()?;
        Ok(entity)
    }

    /// `override_from_env` applies the items set in the system environment.
    pub fn override_from_env(&mut self) -> Result<()> {
        if let Ok(app_name) = env::var(APP_NAME_ENV_KEY) {
            if !utils::is_blank(&app_name) {
                self.config.app.app_name = app_name;
            }
        }
        if let Ok(policy) = env::var(CACHE_POLICY_ENV_KEY) {
            if !utils::is_blank(&policy) {
                self.config.hotspot.cache_policy = policy.parse::<CachePolicy>()?;
            }
        }
        self.check()
    }
}

pub fn init_log(entity: &ConfigEntity) {
    logging::logger_init(entity.log_config_file());
    logging::info!("[Config] App name resolved, appName {}", entity.app_name());
    logging::info!(
        "[Config] Print effective global config, globalConfig {:?}",
        entity
    );
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn from_yaml_str() {
        let content = r#"
version: v1
config:
  app:
    app_name: hotspot_demo
  hotspot:
    cache_policy: Lru
    params_capacity_base: 100
    params_max_capacity: 1000
"#;
        let entity = ConfigEntity::from_yaml_str(content).unwrap();
        assert_eq!("hotspot_demo", entity.app_name());
        assert_eq!(CachePolicy::Lru, entity.hotspot().cache_policy);
        assert_eq!(100, entity.hotspot().params_capacity_base);
        assert_eq!(1000, entity.hotspot().params_max_capacity);
        assert_eq!(CONCURRENCY_MAX_COUNT, entity.hotspot().concurrency_max_count);
    }

    #[test]
    fn from_invalid_yaml_str() {
        let content = r#"
version: v1
config:
  hotspot:
    params_capacity_base: 100
    params_max_capacity: 10
"#;
        assert!(ConfigEntity::from_yaml_str(content).is_err());
    }

    #[test]
    fn missing_file() {
        assert!(ConfigEntity::from_yaml_file("testdata/config/not_exist.yaml").is_err());
    }
}
