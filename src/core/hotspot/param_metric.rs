use super::*;
use crate::config::HotspotConfig;
use std::cmp::min;

/// ParamsMetric carries the real-time counters of the hot parameters of one rule.
#[derive(Debug)]
pub struct ParamsMetric {
    /// rule_time_counter records the last added token timestamp.
    pub rule_time_counter: Box<dyn CounterTrait>,
    /// rule_token_counter records the number of tokens.
    pub rule_token_counter: Box<dyn CounterTrait>,
    /// concurrency_counter records the real-time concurrency.
    pub concurrency_counter: Box<dyn CounterTrait>,
}

impl Default for ParamsMetric {
    fn default() -> Self {
        ParamsMetric {
            rule_time_counter: Box::new(Counter::default()),
            rule_token_counter: Box::new(Counter::default()),
            concurrency_counter: Box::new(Counter::default()),
        }
    }
}

impl ParamsMetric {
    /// `for_rule` builds the counters needed by the metric type of the rule.
    pub fn for_rule(rule: &Rule, config: &HotspotConfig) -> Self {
        let capacity = params_capacity_for(rule, config);
        match rule.metric_type {
            MetricType::QPS => ParamsMetric {
                rule_time_counter: new_counter(config.cache_policy, capacity),
                rule_token_counter: new_counter(config.cache_policy, capacity),
                ..Default::default()
            },
            MetricType::Concurrency => ParamsMetric {
                concurrency_counter: new_counter(config.cache_policy, capacity),
                ..Default::default()
            },
        }
    }
}

/// `params_capacity_for` returns the capacity of the statistic caches of the rule.
pub fn params_capacity_for(rule: &Rule, config: &HotspotConfig) -> usize {
    if rule.params_max_capacity > 0 {
        return rule.params_max_capacity;
    }
    match rule.metric_type {
        MetricType::QPS => {
            if rule.duration_in_sec <= 0 {
                // in fact, this invalid rule won't be loaded
                config.params_max_capacity
            } else {
                min(
                    config.params_max_capacity,
                    config
                        .params_capacity_base
                        .saturating_mul(rule.duration_in_sec as usize),
                )
            }
        }
        MetricType::Concurrency => config.concurrency_max_count,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::ParamKey;
    use crate::config::{CONCURRENCY_MAX_COUNT, PARAMS_CAPACITY_BASE, PARAMS_MAX_CAPACITY};

    #[test]
    fn capacity() {
        let config = HotspotConfig::default();
        let mut rule = Rule {
            resource: "abc".into(),
            metric_type: MetricType::QPS,
            duration_in_sec: 1,
            ..Default::default()
        };
        assert_eq!(PARAMS_CAPACITY_BASE, params_capacity_for(&rule, &config));
        rule.duration_in_sec = 10;
        assert_eq!(PARAMS_MAX_CAPACITY, params_capacity_for(&rule, &config));
        rule.params_max_capacity = 100;
        assert_eq!(100, params_capacity_for(&rule, &config));

        let rule = Rule {
            resource: "abc".into(),
            metric_type: MetricType::Concurrency,
            ..Default::default()
        };
        assert_eq!(CONCURRENCY_MAX_COUNT, params_capacity_for(&rule, &config));
    }

    #[test]
    fn construct_qps() {
        let rule = Rule {
            resource: "abc".into(),
            metric_type: MetricType::QPS,
            duration_in_sec: 10,
            ..Default::default()
        };
        for policy in &[CachePolicy::Lru, CachePolicy::TinyLfu] {
            let config = HotspotConfig {
                cache_policy: *policy,
                ..Default::default()
            };
            let metric = ParamsMetric::for_rule(&rule, &config);
            for i in 0..30000 {
                metric
                    .rule_token_counter
                    .add_if_absent(ParamKey::from(i), 0);
                metric.rule_time_counter.add_if_absent(ParamKey::from(i), 0);
            }
            assert!(metric.rule_token_counter.len() <= PARAMS_MAX_CAPACITY);
            assert!(metric.rule_time_counter.len() <= PARAMS_MAX_CAPACITY);
            assert_eq!(PARAMS_MAX_CAPACITY, metric.rule_time_counter.cap());
            assert_eq!(0, metric.concurrency_counter.cap());
        }
    }

    #[test]
    fn construct_concurrency() {
        let rule = Rule {
            resource: "abc".into(),
            metric_type: MetricType::Concurrency,
            params_max_capacity: 100,
            ..Default::default()
        };
        let config = HotspotConfig {
            cache_policy: CachePolicy::Lru,
            ..Default::default()
        };
        let metric = ParamsMetric::for_rule(&rule, &config);
        for i in 0..200 {
            metric.concurrency_counter.add_if_absent(ParamKey::from(i), 0);
        }
        assert_eq!(100, metric.concurrency_counter.len());
        assert_eq!(0, metric.rule_time_counter.cap());
    }
}
