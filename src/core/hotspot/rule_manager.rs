use super::*;
use crate::{base::SentinelRule, config::HotspotConfig, logging, utils, Error, Result};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, RwLock};

/// ControllerGenfn represents the Traffic Controller generator function of a specific control behavior.
/// The metric is either fresh or transplanted from a statistic reusable controller.
pub type ControllerGenfn = dyn Send + Sync + Fn(Arc<Rule>, Arc<ParamsMetric>) -> Arc<Controller>;

pub type ControllerMap = HashMap<String, Vec<Arc<Controller>>>;
pub type RuleMap = HashMap<String, Vec<Arc<Rule>>>;

pub(super) use gen_fns::*;

mod gen_fns {
    use super::*;

    pub(in super::super) fn gen_reject(rule: Arc<Rule>, metric: Arc<ParamsMetric>) -> Arc<Controller> {
        let checker: Box<dyn Checker> = match rule.metric_type {
            MetricType::Concurrency => Box::new(ConcurrencyChecker),
            MetricType::QPS => Box::new(RejectChecker),
        };
        Arc::new(Controller::new(rule, metric, checker))
    }

    pub(in super::super) fn gen_throttling(
        rule: Arc<Rule>,
        metric: Arc<ParamsMetric>,
    ) -> Arc<Controller> {
        let checker: Box<dyn Checker> = match rule.metric_type {
            MetricType::Concurrency => Box::new(ConcurrencyChecker),
            MetricType::QPS => Box::new(ThrottlingChecker),
        };
        Arc::new(Controller::new(rule, metric, checker))
    }
}

fn log_rule_update(map: &RuleMap) {
    if map.is_empty() {
        logging::info!("[HotspotRuleManager] Hotspot param flow rules were cleared")
    } else {
        logging::info!(
            "[HotspotRuleManager] Hotspot param flow rules were loaded: {:?}",
            map.values()
        )
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".into()
    }
}

fn valid_rules_of(rules: &[Arc<Rule>]) -> Vec<Arc<Rule>> {
    let mut valid_rules = Vec::with_capacity(rules.len());
    for rule in rules {
        match rule.is_valid() {
            Ok(_) => valid_rules.push(Arc::clone(rule)),
            Err(err) => logging::warn!(
                "[HotSpot onRuleUpdate] Ignoring invalid hotspot param flow rule {:?}, reason: {:?}",
                rule,
                err
            ),
        }
    }
    valid_rules
}

fn calculate_reuse_index_for(
    r: &Arc<Rule>,
    old_res_tcs: &[Arc<Controller>],
) -> (Option<usize>, Option<usize>) {
    // the index of equivalent rule in old traffic shaping controller slice
    let mut eq_idx = None;
    // the index of statistic reusable rule in old traffic shaping controller slice
    let mut reuse_stat_idx = None;

    for (idx, old_tc) in old_res_tcs.iter().enumerate() {
        let old_rule = old_tc.rule();
        if old_rule == r {
            // break if there is equivalent rule
            eq_idx = Some(idx);
            break;
        }
        // search the index of first stat reusable rule
        if reuse_stat_idx.is_none() && old_rule.is_stat_reusable(r) {
            reuse_stat_idx = Some(idx);
        }
    }
    (eq_idx, reuse_stat_idx)
}

/// RuleManager owns the hotspot param flow rules of an engine and the traffic shaping controllers built from them.
/// Checks read-lock the controller map, while the rule updates swap it as a whole.
// Locks are always acquired in the order `rule_map`, `controller_map`, `gen_fun_map`.
pub struct RuleManager {
    config: HotspotConfig,
    gen_fun_map: RwLock<HashMap<ControlStrategy, Box<ControllerGenfn>>>,
    controller_map: RwLock<ControllerMap>,
    rule_map: Mutex<RuleMap>,
}

impl Default for RuleManager {
    fn default() -> Self {
        Self::new(HotspotConfig::default())
    }
}

impl fmt::Debug for RuleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleManager")
            .field("config", &self.config)
            .field("controller_map", &self.controller_map)
            .finish()
    }
}

impl RuleManager {
    pub fn new(config: HotspotConfig) -> Self {
        // Initialize the traffic shaping controller generator map for existing control behaviors.
        let mut gen_fun_map: HashMap<ControlStrategy, Box<ControllerGenfn>> = HashMap::new();
        gen_fun_map.insert(ControlStrategy::Reject, Box::new(gen_reject));
        gen_fun_map.insert(ControlStrategy::Throttling, Box::new(gen_throttling));
        RuleManager {
            config,
            gen_fun_map: RwLock::new(gen_fun_map),
            controller_map: RwLock::new(HashMap::new()),
            rule_map: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &HotspotConfig {
        &self.config
    }

    pub fn get_traffic_controller_list_for(&self, res: &str) -> Vec<Arc<Controller>> {
        self.controller_map
            .read()
            .unwrap()
            .get(res)
            .cloned()
            .unwrap_or_default()
    }

    /// `load_rules` loads the given hotspot param flow rules to the rule manager, while all previous rules will be replaced.
    /// The returned `bool` indicates whether do real load operation, if the rules is the same with previous rules, return false.
    /// If building the controllers panics, the previous rules stay in effect and the panic is returned as an error.
    pub fn load_rules(&self, rules: Vec<Arc<Rule>>) -> Result<bool> {
        let mut rule_map: RuleMap = HashMap::new();
        for rule in rules {
            rule_map.entry(rule.resource.clone()).or_default().push(rule);
        }

        let mut global_rule_map = self.rule_map.lock().unwrap();
        if *global_rule_map == rule_map {
            logging::info!(
                "[HotSpot] Load rules is the same with current rules, so ignore load operation."
            );
            return Ok(false);
        }
        // when rule_map is different with global one, update the global one
        // ignore invalid rules
        let mut valid_rules_map = HashMap::with_capacity(rule_map.len());
        for (res, rules) in &rule_map {
            let valid_rules = valid_rules_of(rules);
            if !valid_rules.is_empty() {
                valid_rules_map.insert(res.clone(), valid_rules);
            }
        }

        let start = utils::curr_time_nanos();
        let mut controller_map = self.controller_map.write().unwrap();
        let mut valid_controller_map = HashMap::with_capacity(valid_rules_map.len());

        // build controller_map according to valid rules
        for (res, rules) in valid_rules_map.iter() {
            let mut old_res_tcs = controller_map.get(res).cloned().unwrap_or_default();
            let new_tcs_of_res =
                self.try_build_resource_traffic_shaping_controller(res, rules, &mut old_res_tcs)?;
            if !new_tcs_of_res.is_empty() {
                valid_controller_map.insert(res.clone(), new_tcs_of_res);
            }
        }
        *controller_map = valid_controller_map;
        *global_rule_map = rule_map;
        drop(controller_map);
        drop(global_rule_map);
        logging::debug!(
            "[HotSpot load_rules] Time statistic(ns) for updating hotspot param flow rule, time cost {}",
            utils::curr_time_nanos() - start
        );

        log_rule_update(&valid_rules_map);
        Ok(true)
    }

    /// `load_rules_of_resource` loads the given resource's hotspot param flow rules to the rule manager,
    /// while all previous resource's rules will be replaced.
    /// The returned value indicates whether do real load operation,
    /// if the rules is the same with previous resource's rules, return false.
    /// Empty `rules` clears the rules of the resource.
    pub fn load_rules_of_resource(&self, res: &str, rules: Vec<Arc<Rule>>) -> Result<bool> {
        if res.is_empty() {
            return Err(Error::msg("empty resource"));
        }
        let mut global_rule_map = self.rule_map.lock().unwrap();
        // clear resource rules
        if rules.is_empty() {
            global_rule_map.remove(res);
            self.controller_map.write().unwrap().remove(res);
            logging::info!("[HotSpot] clear resource level rules, resource {}", res);
            return Ok(true);
        }
        // load resource level rules
        if global_rule_map.get(res) == Some(&rules) {
            logging::info!("[HotSpot] Load resource level rules is the same with current resource level rules, so ignore load operation.");
            return Ok(false);
        }

        let valid_res_rules = valid_rules_of(&rules);
        // the `res` related rules changes, have to update
        let start = utils::curr_time_nanos();
        let mut global_controller_map = self.controller_map.write().unwrap();
        let mut old_res_tcs = global_controller_map.get(res).cloned().unwrap_or_default();
        let new_res_tcs = self.try_build_resource_traffic_shaping_controller(
            res,
            &valid_res_rules,
            &mut old_res_tcs,
        )?;

        if new_res_tcs.is_empty() {
            global_controller_map.remove(res);
        } else {
            global_controller_map.insert(res.into(), new_res_tcs);
        }
        global_rule_map.insert(res.into(), rules);
        logging::debug!(
            "[HotSpot load_rules_of_resource] Time statistic(ns) for updating hotspot param flow rule, timeCost: {}",
            utils::curr_time_nanos() - start
        );
        logging::info!(
            "[HotSpot] load resource level hotspot param rules, resource: {}, valid_res_rules: {:?}",
            res,
            valid_res_rules
        );
        Ok(true)
    }

    /// `append_rule` adds one rule to its resource, with fresh statistic.
    /// Returns false if an equal rule has been loaded, or the rule is invalid.
    pub fn append_rule(&self, rule: Arc<Rule>) -> bool {
        let mut global_rule_map = self.rule_map.lock().unwrap();
        if global_rule_map
            .get(&rule.resource)
            .map_or(false, |rules| rules.contains(&rule))
        {
            return false;
        }
        if let Err(err) = rule.is_valid() {
            logging::warn!(
                "[HotSpot append_rule] Ignoring invalid hotspot param flow rule {:?}, reason: {:?}",
                rule,
                err
            );
            return false;
        }
        let mut controller_map = self.controller_map.write().unwrap();
        let new_tcs_of_res = match self.try_build_resource_traffic_shaping_controller(
            &rule.resource,
            &[Arc::clone(&rule)],
            &mut Vec::new(),
        ) {
            Ok(tcs) => tcs,
            Err(err) => {
                logging::error!("[HotSpot append_rule] {:?}", err);
                return false;
            }
        };
        if new_tcs_of_res.is_empty() {
            return false;
        }
        controller_map
            .entry(rule.resource.clone())
            .or_default()
            .extend(new_tcs_of_res);
        global_rule_map
            .entry(rule.resource.clone())
            .or_default()
            .push(rule);
        true
    }

    /// `get_rules` returns all the rules bound to the live controllers.
    pub fn get_rules(&self) -> Vec<Arc<Rule>> {
        let mut rules = Vec::new();
        let controller_map = self.controller_map.read().unwrap();
        for controllers in controller_map.values() {
            for c in controllers {
                rules.push(Arc::clone(c.rule()));
            }
        }
        rules
    }

    /// `get_rules_of_resource` returns specific resource's rules, in the order of checking.
    pub fn get_rules_of_resource(&self, res: &str) -> Vec<Arc<Rule>> {
        let controller_map = self.controller_map.read().unwrap();
        match controller_map.get(res) {
            Some(controllers) => controllers.iter().map(|c| Arc::clone(c.rule())).collect(),
            None => Vec::new(),
        }
    }

    /// clear_rules clears all the rules in hotspot param flow module.
    pub fn clear_rules(&self) {
        let mut global_rule_map = self.rule_map.lock().unwrap();
        global_rule_map.clear();
        self.controller_map.write().unwrap().clear();
        log_rule_update(&global_rule_map);
    }

    /// `clear_rules_of_resource` clears resource level rules in hotspot param flow module.
    pub fn clear_rules_of_resource(&self, res: &str) {
        let mut global_rule_map = self.rule_map.lock().unwrap();
        global_rule_map.remove(res);
        self.controller_map.write().unwrap().remove(res);
    }

    /// `set_traffic_shaping_generator` sets the traffic controller generator for the given ControlStrategy.
    /// Note that modifying the generator of default control strategy is not allowed.
    pub fn set_traffic_shaping_generator(
        &self,
        control_strategy: ControlStrategy,
        generator: Box<ControllerGenfn>,
    ) -> Result<()> {
        match control_strategy {
            ControlStrategy::Custom(_) => {
                self.gen_fun_map
                    .write()
                    .unwrap()
                    .insert(control_strategy, generator);
                Ok(())
            }
            _ => Err(Error::msg(
                "Default control behaviors are not allowed to be modified.",
            )),
        }
    }

    pub fn remove_traffic_shaping_generator(&self, control_strategy: ControlStrategy) -> Result<()> {
        match control_strategy {
            ControlStrategy::Custom(_) => {
                self.gen_fun_map.write().unwrap().remove(&control_strategy);
                Ok(())
            }
            _ => Err(Error::msg(
                "Default control behaviors are not allowed to be removed.",
            )),
        }
    }

    fn try_build_resource_traffic_shaping_controller(
        &self,
        res: &str,
        rules_of_res: &[Arc<Rule>],
        old_res_tcs: &mut Vec<Arc<Controller>>,
    ) -> Result<Vec<Arc<Controller>>> {
        panic::catch_unwind(AssertUnwindSafe(|| {
            self.build_resource_traffic_shaping_controller(res, rules_of_res, old_res_tcs)
        }))
        .map_err(|payload| {
            let msg = format!(
                "panic when building hotspot traffic shaping controllers, resource: {}, reason: {}",
                res,
                panic_message(&*payload)
            );
            logging::error!("[HotSpot] {}", msg);
            Error::msg(msg)
        })
    }

    /// build_resource_traffic_shaping_controller builds Controller slice from rules. the resource of rules must be equals to res.
    /// The consumed controllers are removed from `old_res_tcs`, so that each of them is reused at most once.
    fn build_resource_traffic_shaping_controller(
        &self,
        res: &str,
        rules_of_res: &[Arc<Rule>],
        old_res_tcs: &mut Vec<Arc<Controller>>,
    ) -> Vec<Arc<Controller>> {
        let mut new_res_tcs = Vec::with_capacity(rules_of_res.len());
        for rule in rules_of_res {
            if res != rule.resource {
                logging::error!("[HotSpot build_resource_traffic_shaping_controller] Unmatched resource name, expect: {}, actual: {}, rule: {:?}", res, rule.resource, rule);
                continue;
            }
            let (eq_idx, reuse_stat_idx) = calculate_reuse_index_for(rule, old_res_tcs);

            // First check equals scenario
            if let Some(eq_idx) = eq_idx {
                // reuse the old tc
                new_res_tcs.push(old_res_tcs.remove(eq_idx));
                continue;
            }

            let gen_fun_map = self.gen_fun_map.read().unwrap();
            let generator = match gen_fun_map.get(&rule.control_strategy) {
                Some(generator) => generator,
                None => {
                    logging::error!("[HotSpot build_resource_traffic_shaping_controller] Ignoring the rule due to unsupported control strategy, rule: {:?}", rule);
                    continue;
                }
            };

            let tc = match reuse_stat_idx {
                Some(reuse_stat_idx) => {
                    let metric = Arc::clone(old_res_tcs[reuse_stat_idx].metric());
                    // remove old tc from old_res_tcs
                    old_res_tcs.remove(reuse_stat_idx);
                    generator(Arc::clone(rule), metric)
                }
                None => generator(
                    Arc::clone(rule),
                    Arc::new(ParamsMetric::for_rule(rule, &self.config)),
                ),
            };
            new_res_tcs.push(tc);
        }
        new_res_tcs
    }
}
