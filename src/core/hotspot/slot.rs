use super::*;
use crate::{
    base::{BaseSlot, EntryContext, RuleCheckSlot, TokenResult},
    utils,
};
use std::sync::Arc;

pub const RULE_CHECK_SLOT_ORDER: u32 = 4000;

/// A RuleSlot for hotspot param flow related metrics
pub struct Slot {
    rule_manager: Arc<RuleManager>,
}

impl Slot {
    pub fn new(rule_manager: Arc<RuleManager>) -> Self {
        Slot { rule_manager }
    }
}

impl BaseSlot for Slot {
    fn order(&self) -> u32 {
        RULE_CHECK_SLOT_ORDER
    }
}

impl RuleCheckSlot for Slot {
    fn check(&self, ctx: &mut EntryContext) -> TokenResult {
        let batch = ctx.input().batch_count();
        let tcs = self
            .rule_manager
            .get_traffic_controller_list_for(ctx.resource());
        for tc in tcs {
            // the controllers without extracted argument are skipped
            if let Some(arg) = tc.extract_args(ctx) {
                let r = tc.perform_checking(&arg, batch);
                match r {
                    TokenResult::Pass => {}
                    TokenResult::Blocked(_) => {
                        ctx.set_result(r);
                        return ctx.result().clone();
                    }
                    TokenResult::Wait(ms_to_wait) => {
                        utils::sleep_for_ms(ms_to_wait);
                    }
                }
            }
        }
        ctx.result().clone()
    }
}
