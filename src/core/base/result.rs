use super::{BlockError, BlockType, SentinelRule, Snapshot};
use std::fmt;
use std::sync::Arc;

/// The outcome of checking a call against the hotspot rules.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenResult {
    Pass,
    Blocked(BlockError),
    /// the caller sleeps for the milliseconds, then the call passes
    Wait(u64),
}

impl Default for TokenResult {
    fn default() -> Self {
        TokenResult::Pass
    }
}

impl From<BlockError> for TokenResult {
    fn from(err: BlockError) -> Self {
        TokenResult::Blocked(err)
    }
}

impl TokenResult {
    pub fn new_pass() -> Self {
        TokenResult::Pass
    }

    pub fn new_should_wait(ms_to_wait: u64) -> Self {
        TokenResult::Wait(ms_to_wait)
    }

    pub fn new_blocked<M: Into<String>>(block_type: BlockType, msg: M) -> Self {
        BlockError::new(block_type, msg).into()
    }

    pub fn new_blocked_with_cause(
        block_type: BlockType,
        msg: String,
        rule: Arc<dyn SentinelRule>,
        snapshot: Arc<Snapshot>,
    ) -> Self {
        BlockError::new_with_cause(block_type, msg, rule, snapshot).into()
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, TokenResult::Pass)
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, TokenResult::Blocked(_))
    }

    pub fn is_wait(&self) -> bool {
        matches!(self, TokenResult::Wait(_))
    }

    pub fn block_err(&self) -> Option<&BlockError> {
        match self {
            TokenResult::Blocked(err) => Some(err),
            _ => None,
        }
    }

    /// Zero unless the result is `Wait`.
    pub fn ms_to_wait(&self) -> u64 {
        match self {
            TokenResult::Wait(ms) => *ms,
            _ => 0,
        }
    }
}

impl fmt::Display for TokenResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenResult::Pass => f.write_str("pass"),
            TokenResult::Blocked(err) => write!(f, "{}", err),
            TokenResult::Wait(ms) => write!(f, "wait {} ms", ms),
        }
    }
}
