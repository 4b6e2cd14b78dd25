use crate::{base::SlotChain, hotspot};
use std::sync::Arc;

/// `build_slot_chain` assembles the slots checking and recording the hotspot param flow rules of the manager.
pub fn build_slot_chain(rule_manager: Arc<hotspot::RuleManager>) -> SlotChain {
    let mut sc = SlotChain::new();
    sc.add_rule_check_slot(Arc::new(hotspot::Slot::new(Arc::clone(&rule_manager)))); // 4000
    sc.add_stat_slot(Arc::new(hotspot::ConcurrencyStatSlot::new(rule_manager))); // 4000
    sc
}
