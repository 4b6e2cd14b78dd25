pub mod concurrency;
pub mod reject;
pub mod throttling;

pub use concurrency::*;
pub use reject::*;
pub use throttling::*;

use super::*;
use crate::{
    base::{EntryContext, ParamKey, TokenResult},
    logging,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Traffic Shaping `Checker` performs checking according to current metrics and the traffic
/// shaping strategy, then yield the token result.
pub trait Checker: Send + Sync + std::fmt::Debug {
    fn do_check(&self, owner: &Controller, arg: &ParamKey, batch_count: u32) -> TokenResult;
}

/// Controller binds a rule, the statistic of the hot parameters and the checker of the strategy.
#[derive(Debug)]
pub struct Controller {
    rule: Arc<Rule>,
    metric: Arc<ParamsMetric>,
    /// decoded `specific_items` of the rule
    specific_items: HashMap<ParamKey, i64>,
    checker: Box<dyn Checker>,
}

impl Controller {
    /// Please refer to the generators in the `rule_manager`
    pub fn new(rule: Arc<Rule>, metric: Arc<ParamsMetric>, checker: Box<dyn Checker>) -> Self {
        let mut specific_items = HashMap::with_capacity(rule.specific_items.len());
        for item in &rule.specific_items {
            match item.param_key() {
                Ok(key) => {
                    specific_items.insert(key, item.threshold);
                }
                Err(err) => logging::warn!(
                    "[Controller new] Ignoring the specific item {:?} of rule {}, reason: {:?}",
                    item,
                    rule.id,
                    err
                ),
            }
        }
        Controller {
            rule,
            metric,
            specific_items,
            checker,
        }
    }

    pub fn metric(&self) -> &Arc<ParamsMetric> {
        &self.metric
    }

    pub fn rule(&self) -> &Arc<Rule> {
        &self.rule
    }

    pub fn param_index(&self) -> isize {
        self.rule.param_index
    }

    pub fn specific_items(&self) -> &HashMap<ParamKey, i64> {
        &self.specific_items
    }

    /// settings stored in the `specific_items` is prior to the `threshold` in `rule`
    pub fn threshold_of(&self, arg: &ParamKey) -> i64 {
        match self.specific_items.get(arg) {
            Some(threshold) => *threshold,
            None => self.rule.threshold,
        }
    }

    pub fn perform_checking(&self, arg: &ParamKey, batch_count: u32) -> TokenResult {
        self.checker.do_check(self, arg, batch_count)
    }

    /// ExtractArgs matches the arg from ctx based on Controller
    pub fn extract_args(&self, ctx: &EntryContext) -> Option<ParamKey> {
        if let Some(args) = self.extract_kv_args(ctx) {
            Some(args)
        } else {
            self.extract_list_args(ctx)
        }
    }

    fn extract_list_args(&self, ctx: &EntryContext) -> Option<ParamKey> {
        let args = ctx.input().args();
        match args {
            Some(args) => {
                let mut idx = self.rule.param_index;
                if idx < 0 {
                    idx += args.len() as isize;
                }
                if idx < 0 {
                    logging::debug!("[extract_args] The param index of hotspot traffic shaping controller is invalid, args: {:?}, param_index: {}", args, self.param_index());
                    None
                } else if idx as usize >= args.len() {
                    logging::debug!("[extract_args] The argument in index doesn't exist, args: {:?}, param_index: {}", args, self.param_index());
                    None
                } else {
                    Some(args[idx as usize].clone())
                }
            }
            None => {
                logging::debug!("[extract_args] The args of ctx is None");
                None
            }
        }
    }

    fn extract_kv_args(&self, ctx: &EntryContext) -> Option<ParamKey> {
        let key = self.rule.param_key.trim();
        if key.is_empty() {
            return None;
        }
        match ctx.input().attachments() {
            Some(attachments) => match attachments.get(key) {
                Some(value) => Some(value.clone()),
                None => {
                    logging::debug!("[extract_args] The extracted data does not exist, key: {:?}, attachments: {:?}", self.rule.param_key, attachments);
                    None
                }
            },
            None => {
                logging::debug!("[extract_args] The attachments of ctx is None");
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::base::{ParamKind, ParamsMap, SentinelInput};
    use crate::config::HotspotConfig;

    pub(crate) fn controller_with_metric(rule: Rule, metric: ParamsMetric) -> Controller {
        let rule = Arc::new(rule);
        let checker: Box<dyn Checker> = match (rule.metric_type, rule.control_strategy) {
            (MetricType::Concurrency, _) => Box::new(ConcurrencyChecker),
            (MetricType::QPS, ControlStrategy::Throttling) => Box::new(ThrottlingChecker),
            (MetricType::QPS, _) => Box::new(RejectChecker),
        };
        Controller::new(rule, Arc::new(metric), checker)
    }

    pub(crate) fn controller_of(rule: Rule) -> Controller {
        let metric = ParamsMetric::for_rule(&rule, &HotspotConfig::default());
        controller_with_metric(rule, metric)
    }

    fn ctx_with(args: Option<Vec<ParamKey>>, attachments: Option<ParamsMap>) -> EntryContext {
        let mut ctx = EntryContext::new();
        let mut input = SentinelInput::new(1);
        if let Some(args) = args {
            input.set_args(args);
        }
        if let Some(attachments) = attachments {
            input.set_attachments(attachments);
        }
        ctx.set_input(input);
        ctx
    }

    fn qps_rule(param_index: isize, param_key: &str) -> Rule {
        Rule {
            resource: "abc".into(),
            metric_type: MetricType::QPS,
            control_strategy: ControlStrategy::Reject,
            duration_in_sec: 1,
            param_index,
            param_key: param_key.into(),
            ..Default::default()
        }
    }

    #[test]
    fn specific_items_decoded() {
        let controller = controller_of(Rule {
            specific_items: vec![
                SpecificItem::new(ParamKind::Int, "100", 5),
                SpecificItem::new(ParamKind::Float, "1.5", 6),
                SpecificItem::new(ParamKind::Bool, "true", 7),
            ],
            threshold: 10,
            ..qps_rule(0, "")
        });
        assert_eq!(3, controller.specific_items().len());
        assert_eq!(5, controller.threshold_of(&ParamKey::from(100)));
        assert_eq!(6, controller.threshold_of(&ParamKey::from(1.500_000_1)));
        assert_eq!(7, controller.threshold_of(&ParamKey::from(true)));
        assert_eq!(10, controller.threshold_of(&ParamKey::from("100")));
    }

    #[test]
    fn extract_args_none() {
        let controller = controller_of(qps_rule(0, ""));
        let ctx = ctx_with(Some(Vec::new()), Some(ParamsMap::new()));
        assert!(controller.extract_args(&ctx).is_none());
        let ctx = ctx_with(None, None);
        assert!(controller.extract_args(&ctx).is_none());
    }

    #[test]
    fn extract_args_exist_kv() {
        let controller = controller_of(qps_rule(0, "test1"));
        let mut attachments = ParamsMap::new();
        attachments.insert("test1".into(), "v1".into());
        let ctx = ctx_with(Some(vec!["1".into(), "2".into()]), Some(attachments));
        assert_eq!(Some(ParamKey::from("v1")), controller.extract_args(&ctx));
    }

    #[test]
    fn extract_args_falls_back_to_list() {
        let controller = controller_of(qps_rule(1, "test2"));
        let mut attachments = ParamsMap::new();
        attachments.insert("test1".into(), "v1".into());
        let ctx = ctx_with(Some(vec!["1".into(), "2".into()]), Some(attachments));
        assert_eq!(Some(ParamKey::from("2")), controller.extract_args(&ctx));
    }

    #[test]
    fn extract_args_not_exist() {
        let controller = controller_of(qps_rule(10, "test2"));
        let mut attachments = ParamsMap::new();
        attachments.insert("test1".into(), "v1".into());
        let ctx = ctx_with(Some(vec!["1".into(), "2".into()]), Some(attachments));
        assert!(controller.extract_args(&ctx).is_none());
    }

    #[test]
    fn extract_args_negative_index() {
        let args: Vec<ParamKey> = vec![1.into(), 2.into(), 3.into(), 4.into()];
        let controller = controller_of(qps_rule(-1, ""));
        let ctx = ctx_with(Some(args.clone()), None);
        assert_eq!(Some(ParamKey::from(4)), controller.extract_args(&ctx));

        let controller = controller_of(qps_rule(-4, ""));
        assert_eq!(Some(ParamKey::from(1)), controller.extract_args(&ctx));

        let controller = controller_of(qps_rule(-10, ""));
        assert!(controller.extract_args(&ctx).is_none());
    }
}
