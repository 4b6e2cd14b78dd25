use super::SentinelRule;
use crate::utils::AsAny;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// The value observed when a call is blocked, e.g. the remaining tokens
/// of a parameter value or its live concurrency.
/// Downcast it by `as_any_arc()`.
pub trait SnapshotTrait: Any + fmt::Debug + AsAny + Send + Sync {}
impl<T: Any + fmt::Debug + AsAny + Send + Sync> SnapshotTrait for T {}
pub type Snapshot = dyn SnapshotTrait;

/// The kind of strategy that blocked a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    HotSpotParamFlow,
    /// raised by a checker built for `ControlStrategy::Custom`
    Custom(u8),
}

impl Default for BlockType {
    fn default() -> Self {
        BlockType::HotSpotParamFlow
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockType::HotSpotParamFlow => f.write_str("HotSpotParamFlow"),
            BlockType::Custom(id) => write!(f, "Custom({})", id),
        }
    }
}

/// BlockError is returned instead of an entry when a call is blocked.
/// It keeps the rule that blocked the call and the snapshot of the statistic at that moment.
#[derive(Debug, Clone, Default)]
pub struct BlockError {
    block_type: BlockType,
    msg: String,
    rule: Option<Arc<dyn SentinelRule>>,
    snapshot: Option<Arc<Snapshot>>,
}

impl PartialEq for BlockError {
    fn eq(&self, other: &BlockError) -> bool {
        self.block_type == other.block_type && self.msg == other.msg
    }
}

impl BlockError {
    pub fn new<M: Into<String>>(block_type: BlockType, msg: M) -> Self {
        BlockError {
            block_type,
            msg: msg.into(),
            ..Default::default()
        }
    }

    pub fn new_with_cause(
        block_type: BlockType,
        msg: String,
        rule: Arc<dyn SentinelRule>,
        snapshot: Arc<Snapshot>,
    ) -> Self {
        BlockError {
            block_type,
            msg,
            rule: Some(rule),
            snapshot: Some(snapshot),
        }
    }

    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    pub fn block_msg(&self) -> &str {
        &self.msg
    }

    pub fn triggered_rule(&self) -> Option<Arc<dyn SentinelRule>> {
        self.rule.as_ref().map(Arc::clone)
    }

    pub fn triggered_value(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.as_ref().map(Arc::clone)
    }

    /// The resource of the triggered rule.
    pub fn resource(&self) -> Option<String> {
        self.rule.as_ref().map(|rule| rule.resource_name())
    }
}

impl fmt::Display for BlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blocked by {}", self.block_type)?;
        if let Some(resource) = self.resource() {
            write!(f, " on {}", resource)?;
        }
        if !self.msg.is_empty() {
            write!(f, ": {}", self.msg)?;
        }
        Ok(())
    }
}

impl std::error::Error for BlockError {}
