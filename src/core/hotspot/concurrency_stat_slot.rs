use super::*;
use crate::{
    base::{BaseSlot, BlockError, EntryContext, StatSlot},
    logging,
};
use std::sync::{atomic::Ordering, Arc};

pub const STAT_SLOT_ORDER: u32 = 4000;

/// ConcurrencyStatSlot is to record the Concurrency statistic for all arguments.
/// A passed entry increases the counter of its argument, and the completion decreases it.
pub struct ConcurrencyStatSlot {
    rule_manager: Arc<RuleManager>,
}

impl ConcurrencyStatSlot {
    pub fn new(rule_manager: Arc<RuleManager>) -> Self {
        ConcurrencyStatSlot { rule_manager }
    }

    fn concurrency_controllers(&self, ctx: &EntryContext) -> Vec<Arc<Controller>> {
        self.rule_manager
            .get_traffic_controller_list_for(ctx.resource())
            .into_iter()
            .filter(|tc| tc.rule().metric_type == MetricType::Concurrency)
            .collect()
    }
}

impl BaseSlot for ConcurrencyStatSlot {
    fn order(&self) -> u32 {
        STAT_SLOT_ORDER
    }
}

impl StatSlot for ConcurrencyStatSlot {
    fn on_entry_pass(&self, ctx: &EntryContext) {
        for tc in self.concurrency_controllers(ctx) {
            if let Some(arg) = tc.extract_args(ctx) {
                let counter = &tc.metric().concurrency_counter;
                if let Some(concurrency) = counter.add_if_absent(arg, 1) {
                    concurrency.fetch_add(1, Ordering::SeqCst);
                }
            }
        }
    }

    fn on_entry_blocked(&self, _ctx: &EntryContext, _block_error: &BlockError) {}

    fn on_completed(&self, ctx: &EntryContext) {
        for tc in self.concurrency_controllers(ctx) {
            if let Some(arg) = tc.extract_args(ctx) {
                match tc.metric().concurrency_counter.get(&arg) {
                    Some(concurrency) => {
                        concurrency.fetch_sub(1, Ordering::SeqCst);
                    }
                    None => {
                        logging::debug!("[ConcurrencyStatSlot on_completed] Parameter does not exist in ConcurrencyCounter, argument: {:?}", arg);
                    }
                }
            }
        }
    }
}
