//! Initialization builds a `Sentinel` engine, including:
//! 1. resolve the config, from manually config or yaml file or env variable
//! 2. initialize the logger
//! 3. build the rule manager and the slot chain of the engine

use super::{build_slot_chain, config, config::ConfigEntity, EntryBuilder};
use crate::{
    base::{EntryContext, ParamsList, RuleCheckSlot, SentinelInput, SlotChain, TokenResult},
    hotspot, utils, Result,
};
use std::sync::Arc;

/// `init_default` initializes Sentinel using the configuration from system
/// environment and the default value.
#[inline]
pub fn init_default() -> Result<Sentinel> {
    Sentinel::from_yaml("")
}

/// `init_with_config` initializes Sentinel using given config.
#[inline]
pub fn init_with_config(config_entity: ConfigEntity) -> Result<Sentinel> {
    Sentinel::new(config_entity)
}

/// `init_with_config_file` loads Sentinel general configuration from the given YAML file
/// and initializes Sentinel.
#[inline]
pub fn init_with_config_file(config_path: &str) -> Result<Sentinel> {
    Sentinel::from_yaml(config_path)
}

/// Sentinel is an engine of hotspot param flow control.
/// It owns the rules, the statistic of the hot parameters and the slot chain the entries traverse.
/// Engines are independent of each other, share them by `Arc` across threads.
pub struct Sentinel {
    config: ConfigEntity,
    rule_manager: Arc<hotspot::RuleManager>,
    check_slot: hotspot::Slot,
    slot_chain: Arc<SlotChain>,
}

impl Default for Sentinel {
    fn default() -> Self {
        // the default config is always valid
        Self::with_checked_config(ConfigEntity::default())
    }
}

impl Sentinel {
    /// `new` checks the given config and builds the engine with it.
    pub fn new(config: ConfigEntity) -> Result<Self> {
        config.check()?;
        Ok(Self::with_checked_config(config))
    }

    /// `from_yaml` resolves the config from the YAML file and the system environment.
    /// A blank path falls back to the path in the `SENTINEL_CONFIG_FILE_PATH` environment variable,
    /// and then to the default config.
    pub fn from_yaml(config_path: &str) -> Result<Self> {
        let config = config::init_config_with_yaml(config_path)?;
        Self::new(config)
    }

    fn with_checked_config(config: ConfigEntity) -> Self {
        config::init_log(&config);
        if config.use_cache_time() {
            utils::start_time_ticker();
        }
        let rule_manager = Arc::new(hotspot::RuleManager::new(config.hotspot().clone()));
        let check_slot = hotspot::Slot::new(Arc::clone(&rule_manager));
        let slot_chain = Arc::new(build_slot_chain(Arc::clone(&rule_manager)));
        Sentinel {
            config,
            rule_manager,
            check_slot,
            slot_chain,
        }
    }

    pub fn config(&self) -> &ConfigEntity {
        &self.config
    }

    pub fn rule_manager(&self) -> &Arc<hotspot::RuleManager> {
        &self.rule_manager
    }

    pub fn slot_chain(&self) -> &Arc<SlotChain> {
        &self.slot_chain
    }

    /// `load_rules` replaces all the hotspot param flow rules of the engine.
    /// The returned `bool` indicates whether the rules changed.
    pub fn load_rules(&self, rules: Vec<Arc<hotspot::Rule>>) -> Result<bool> {
        self.rule_manager.load_rules(rules)
    }

    /// `get_rules` returns the rules bound to the live controllers of the resource.
    pub fn get_rules(&self, resource: &str) -> Vec<Arc<hotspot::Rule>> {
        self.rule_manager.get_rules_of_resource(resource)
    }

    pub fn clear_rules(&self) {
        self.rule_manager.clear_rules()
    }

    /// `entry` creates the builder of an entry on the resource.
    pub fn entry(&self, resource: &str) -> EntryBuilder {
        EntryBuilder::new(resource.into(), Arc::clone(&self.slot_chain))
    }

    /// `check` evaluates the hotspot param flow rules of the resource against the arguments.
    /// Unlike the entries, it records no statistic for the concurrency rules,
    /// and the required waiting has been done before it returns.
    pub fn check(&self, resource: &str, args: ParamsList, batch_count: u32) -> TokenResult {
        let mut ctx = EntryContext::new();
        ctx.set_resource(resource.into());
        let mut input = SentinelInput::new(batch_count);
        input.set_args(args);
        ctx.set_input(input);
        self.check_slot.check(&mut ctx)
    }
}
