use crate::{
    base::{ParamKey, ParamKind, SentinelRule},
    Error,
};
use serde::{Deserialize, Serialize};
use serde_json;
use std::collections::HashSet;
use std::fmt;

/// ControlStrategy indicates the traffic shaping strategy.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, Hash, Eq)]
pub enum ControlStrategy {
    Reject,
    Throttling,
    #[serde(skip)]
    Custom(u8),
}

impl Default for ControlStrategy {
    fn default() -> Self {
        ControlStrategy::Reject
    }
}

// MetricType represents the target metric type.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, Hash, Eq)]
pub enum MetricType {
    /// Concurrency represents concurrency count.
    Concurrency,
    /// QPS represents request count per second.
    QPS,
}

impl Default for MetricType {
    fn default() -> Self {
        MetricType::Concurrency
    }
}

/// SpecificItem is a configured threshold for one concrete value of the hot parameter.
/// The value is kept in its textual form, and decoded according to `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecificItem {
    pub kind: ParamKind,
    pub value: String,
    pub threshold: i64,
}

impl SpecificItem {
    pub fn new<V: Into<String>>(kind: ParamKind, value: V, threshold: i64) -> Self {
        SpecificItem {
            kind,
            value: value.into(),
            threshold,
        }
    }

    pub fn param_key(&self) -> crate::Result<ParamKey> {
        ParamKey::parse(self.kind, &self.value)
    }
}

/// Rule represents the hotspot(frequent) parameter flow control rule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    /// `id` is the unique id
    pub id: String,
    /// `resource` is the resource name
    pub resource: String,
    /// `metric_type` indicates the metric type for checking logic.
    /// For Concurrency metric, hotspot module will check the each hot parameter's concurrency,
    /// if concurrency exceeds the threshold, reject the traffic directly.
    /// For QPS metric, hotspot module will check the each hot parameter's QPS,
    /// the `control_strategy` decides the behavior of traffic shaping controller
    pub metric_type: MetricType,
    /// `control_strategy` indicates the traffic shaping behaviour.
    /// `control_strategy` only takes effect when `metric_type` is QPS
    pub control_strategy: ControlStrategy,
    /// `param_index` is the index in context arguments slice.
    /// A negative `param_index` counts from the end of the arguments.
    pub param_index: isize,
    /// `param_key` is the key in EntryContext.Input.Attachments map.
    /// `param_key` can be used as a supplement to `param_index` to facilitate rules to quickly obtain parameter from a large number of parameters
    /// `param_key` is mutually exclusive with `param_index`, `param_key` has the higher priority than `param_index`
    pub param_key: String,
    /// threshold is the threshold to trigger rejection
    pub threshold: i64,
    /// max_queueing_time_ms only takes effect when `control_strategy` is `Throttling` and `metric_type` is `QPS`
    pub max_queueing_time_ms: i64,
    /// `burst_count` is the silent count
    /// `burst_count` only takes effect when `control_strategy` is `Reject` and `metric_type` is `QPS`
    pub burst_count: i64,
    /// `duration_in_sec` is the time interval in statistic
    /// `duration_in_sec` only takes effect when `metric_type` is QPS
    pub duration_in_sec: i64,
    /// `params_max_capacity` is the max capacity of cache statistic
    pub params_max_capacity: usize,
    /// `specific_items` indicates the special threshold for specific value
    pub specific_items: Vec<SpecificItem>,
}

impl Default for Rule {
    fn default() -> Self {
        Rule {
            id: uuid::Uuid::new_v4().to_string(),
            resource: String::default(),
            metric_type: MetricType::default(),
            control_strategy: ControlStrategy::default(),
            param_index: 0,
            param_key: String::default(),
            threshold: 0,
            max_queueing_time_ms: 0,
            burst_count: 0,
            duration_in_sec: 0,
            params_max_capacity: 0,
            specific_items: Vec::new(),
        }
    }
}

impl Rule {
    /// Two rules are statistic reusable if they would track the same statistic,
    /// even though the thresholds differ.
    pub fn is_stat_reusable(&self, other: &Self) -> bool {
        self.resource == other.resource
            && self.control_strategy == other.control_strategy
            && self.params_max_capacity == other.params_max_capacity
            && self.duration_in_sec == other.duration_in_sec
            && self.metric_type == other.metric_type
    }

    fn specific_items_eq(&self, other: &Self) -> bool {
        if self.specific_items.len() != other.specific_items.len() {
            return false;
        }
        let items: HashSet<&SpecificItem> = self.specific_items.iter().collect();
        let other_items: HashSet<&SpecificItem> = other.specific_items.iter().collect();
        items == other_items
    }
}

impl SentinelRule for Rule {
    fn resource_name(&self) -> String {
        self.resource.clone()
    }

    fn is_valid(&self) -> crate::Result<()> {
        if self.resource.is_empty() {
            return Err(Error::msg("empty resource name"));
        }
        if self.threshold < 0 {
            return Err(Error::msg("negative threshold"));
        }
        if self.duration_in_sec < 0 {
            return Err(Error::msg("negative duration"));
        }
        if self.metric_type == MetricType::QPS && self.duration_in_sec == 0 {
            return Err(Error::msg("invalid duration"));
        }
        if self.param_index > 0 && !self.param_key.is_empty() {
            return Err(Error::msg(
                "param index and param key are mutually exclusive",
            ));
        }
        if self.metric_type == MetricType::Concurrency
            && self.control_strategy == ControlStrategy::Throttling
        {
            return Err(Error::msg(
                "unsupported combination of Concurrency metric and Throttling strategy",
            ));
        }
        match self.control_strategy {
            ControlStrategy::Reject if self.burst_count < 0 => {
                return Err(Error::msg("invalid burst count"));
            }
            ControlStrategy::Throttling if self.max_queueing_time_ms < 0 => {
                return Err(Error::msg("invalid max queueing time"));
            }
            _ => {}
        }
        for item in &self.specific_items {
            item.param_key().map_err(|err| {
                Error::msg(format!("invalid specific item {:?}: {}", item, err))
            })?;
        }
        Ok(())
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        let base_check = self.resource == other.resource
            && self.metric_type == other.metric_type
            && self.control_strategy == other.control_strategy
            && self.params_max_capacity == other.params_max_capacity
            && self.param_index == other.param_index
            && self.param_key == other.param_key
            && self.threshold == other.threshold
            && self.duration_in_sec == other.duration_in_sec
            && self.specific_items_eq(other);
        base_check
            && match self.control_strategy {
                ControlStrategy::Reject => self.burst_count == other.burst_count,
                ControlStrategy::Throttling => {
                    self.max_queueing_time_ms == other.max_queueing_time_ms
                }
                ControlStrategy::Custom(_) => {
                    self.burst_count == other.burst_count
                        && self.max_queueing_time_ms == other.max_queueing_time_ms
                }
            }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string_pretty(self) {
            Ok(fmtted) => write!(f, "{}", fmtted),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}
