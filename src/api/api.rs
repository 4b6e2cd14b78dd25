use crate::base::{
    BlockError, EntryContext, ParamsList, ParamsMap, SentinelEntry, SentinelInput, SlotChain,
    TokenResult,
};
use std::sync::Arc;

/// EntryBuilder is the basic API to protect a unit of work.
/// It is usually created by `Sentinel::entry()`.
pub struct EntryBuilder {
    resource_name: String,
    batch_count: u32,
    slot_chain: Arc<SlotChain>,
    args: Option<ParamsList>,
    attachments: Option<ParamsMap>,
}

impl EntryBuilder {
    pub fn new(resource_name: String, slot_chain: Arc<SlotChain>) -> Self {
        EntryBuilder {
            resource_name,
            batch_count: 1,
            slot_chain,
            args: None,
            attachments: None,
        }
    }

    /// `build()` would consume EntryBuilder.
    /// A blocked call returns the `BlockError`, and there is no entry to exit.
    pub fn build(self) -> Result<SentinelEntry, BlockError> {
        let mut ctx = EntryContext::new();
        ctx.set_resource(self.resource_name);

        let mut input = SentinelInput::new(self.batch_count);
        if let Some(args) = self.args {
            input.set_args(args);
        }
        if let Some(attachments) = self.attachments {
            input.set_attachments(attachments);
        }
        ctx.set_input(input);

        match self.slot_chain.entry(&mut ctx) {
            TokenResult::Blocked(block_err) => Err(block_err),
            _ => Ok(SentinelEntry::new(ctx, self.slot_chain)),
        }
    }

    pub fn with_batch_count(mut self, batch_count: u32) -> Self {
        self.batch_count = batch_count;
        self
    }

    pub fn with_slot_chain(mut self, slot_chain: Arc<SlotChain>) -> Self {
        self.slot_chain = slot_chain;
        self
    }

    pub fn with_args(mut self, args: Option<ParamsList>) -> Self {
        self.args = args;
        self
    }

    pub fn with_attachments(mut self, attachments: Option<ParamsMap>) -> Self {
        self.attachments = attachments;
        self
    }
}
