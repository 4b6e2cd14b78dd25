use super::{EntryContext, SlotChain};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// SentinelEntry is the handle of a passed call.
/// The protected unit of work should be wrapped by the creation of the entry and `exit()`.
pub struct SentinelEntry {
    ctx: EntryContext,
    /// each entry traverses a slot chain,
    /// the chain is shared by the engine, thus here we use Arc
    sc: Arc<SlotChain>,
    exited: AtomicBool,
}

impl SentinelEntry {
    pub fn new(ctx: EntryContext, sc: Arc<SlotChain>) -> Self {
        SentinelEntry {
            ctx,
            sc,
            exited: AtomicBool::new(false),
        }
    }

    pub fn context(&self) -> &EntryContext {
        &self.ctx
    }

    /// `exit` runs the completion of the stat slots, only the first call takes effect.
    pub fn exit(&self) {
        if self.exited.swap(true, Ordering::SeqCst) {
            return;
        }
        self.sc.exit(&self.ctx);
    }

    pub fn is_exited(&self) -> bool {
        self.exited.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for SentinelEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentinelEntry")
            .field("ctx", &self.ctx)
            .field("exited", &self.is_exited())
            .finish()
    }
}
