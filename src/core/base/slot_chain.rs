use super::{BlockError, EntryContext, TokenResult};
use crate::utils::AsAny;
use std::any::Any;
use std::sync::Arc;

/// Common part of the slots. Slots with a smaller `order` run first.
pub trait BaseSlot: Any + AsAny + Sync + Send {
    fn order(&self) -> u32 {
        0
    }
}

/// RuleCheckSlot decides whether a call passes.
/// The first blocked result stops the remaining rule check slots.
pub trait RuleCheckSlot: BaseSlot {
    fn check(&self, ctx: &mut EntryContext) -> TokenResult {
        ctx.result().clone()
    }
}

/// StatSlot records the statistic of the calls after the rule checks.
pub trait StatSlot: BaseSlot {
    fn on_entry_pass(&self, _ctx: &EntryContext) {}
    fn on_entry_blocked(&self, _ctx: &EntryContext, _block_error: &BlockError) {}
    /// Runs when a passed entry exits, blocked calls never complete.
    fn on_completed(&self, _ctx: &EntryContext) {}
}

/// SlotChain is the pipeline every entry goes through.
/// Build it before sharing it, the slots are sorted on insertion.
#[derive(Default)]
pub struct SlotChain {
    rule_checks: Vec<Arc<dyn RuleCheckSlot>>,
    stats: Vec<Arc<dyn StatSlot>>,
}

impl SlotChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule_check_slot(&mut self, slot: Arc<dyn RuleCheckSlot>) {
        let pos = self
            .rule_checks
            .partition_point(|s| s.order() <= slot.order());
        self.rule_checks.insert(pos, slot);
    }

    pub fn add_stat_slot(&mut self, slot: Arc<dyn StatSlot>) {
        let pos = self.stats.partition_point(|s| s.order() <= slot.order());
        self.stats.insert(pos, slot);
    }

    /// `entry` runs the rule checks and then the stat slots, the result is also kept in `ctx`.
    pub fn entry(&self, ctx: &mut EntryContext) -> TokenResult {
        ctx.set_result(TokenResult::Pass);
        for slot in &self.rule_checks {
            let r = slot.check(ctx);
            if r.is_blocked() {
                ctx.set_result(r);
                break;
            }
        }

        let result = ctx.result().clone();
        for slot in &self.stats {
            match &result {
                TokenResult::Blocked(err) => slot.on_entry_blocked(ctx, err),
                _ => slot.on_entry_pass(ctx),
            }
        }
        result
    }

    pub fn exit(&self, ctx: &EntryContext) {
        if ctx.is_blocked() {
            return;
        }
        for slot in &self.stats {
            slot.on_completed(ctx);
        }
    }
}

#[cfg(test)]
pub(crate) use test::mocks::{MockRuleCheckSlot, MockStatSlot};

#[cfg(test)]
mod test {
    use super::super::BlockType;
    use super::*;

    struct Named {
        name: u32,
        order: u32,
    }

    impl BaseSlot for Named {
        fn order(&self) -> u32 {
            self.order
        }
    }
    impl RuleCheckSlot for Named {}
    impl StatSlot for Named {}

    fn shuffled() -> Vec<(u32, u32)> {
        // (name, order), the names are the positions after sorting
        vec![(2, 20), (0, 0), (3, 20), (1, 10), (4, 4000)]
    }

    #[test]
    fn slots_sorted_by_order() {
        let mut sc = SlotChain::new();
        for (name, order) in shuffled() {
            sc.add_rule_check_slot(Arc::new(Named { name, order }));
            sc.add_stat_slot(Arc::new(Named { name, order }));
        }
        let names: Vec<u32> = sc
            .rule_checks
            .into_iter()
            .map(|s| s.as_any_arc().downcast::<Named>().unwrap().name)
            .collect();
        assert_eq!(vec![0, 1, 2, 3, 4], names);
        let names: Vec<u32> = sc
            .stats
            .into_iter()
            .map(|s| s.as_any_arc().downcast::<Named>().unwrap().name)
            .collect();
        // equal orders keep the insertion order
        assert_eq!(vec![0, 1, 2, 3, 4], names);
    }

    pub(crate) mod mocks {
        use super::*;
        use mockall::*;

        mock! {
            pub(crate) RuleCheckSlot {}
            impl BaseSlot for RuleCheckSlot {}
            impl RuleCheckSlot for RuleCheckSlot {
                fn check(&self, ctx: &mut EntryContext) -> TokenResult;
            }
        }

        mock! {
            pub(crate) StatSlot {}
            impl BaseSlot for StatSlot {}
            impl StatSlot for StatSlot {
                fn on_entry_pass(&self, ctx: &EntryContext);
                fn on_entry_blocked(&self, ctx: &EntryContext, block_error: &BlockError);
                fn on_completed(&self, ctx: &EntryContext);
            }
        }

        #[test]
        fn pass_then_complete() {
            let mut check = MockRuleCheckSlot::new();
            let mut stat = MockStatSlot::new();
            let mut seq = Sequence::new();
            check
                .expect_check()
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| TokenResult::new_should_wait(10));
            stat.expect_on_entry_pass()
                .times(1)
                .in_sequence(&mut seq)
                .return_const(());
            stat.expect_on_entry_blocked().never().return_const(());
            stat.expect_on_completed()
                .times(1)
                .in_sequence(&mut seq)
                .return_const(());

            let mut sc = SlotChain::new();
            sc.add_rule_check_slot(Arc::new(check));
            sc.add_stat_slot(Arc::new(stat));
            let mut ctx = EntryContext::new();
            // a waiting result does not block
            assert!(sc.entry(&mut ctx).is_pass());
            sc.exit(&ctx);
        }

        #[test]
        fn first_block_stops_checks() {
            let mut first = MockRuleCheckSlot::new();
            let mut second = MockRuleCheckSlot::new();
            let mut stat = MockStatSlot::new();
            first
                .expect_check()
                .times(1)
                .returning(|_| TokenResult::new_blocked(BlockType::HotSpotParamFlow, "mock"));
            second.expect_check().never();
            stat.expect_on_entry_pass().never().return_const(());
            stat.expect_on_entry_blocked()
                .times(1)
                .withf(|_, err| err.block_msg() == "mock")
                .return_const(());
            stat.expect_on_completed().never().return_const(());

            let mut sc = SlotChain::new();
            sc.add_rule_check_slot(Arc::new(first));
            sc.add_rule_check_slot(Arc::new(second));
            sc.add_stat_slot(Arc::new(stat));
            let mut ctx = EntryContext::new();
            assert!(sc.entry(&mut ctx).is_blocked());
            assert!(ctx.is_blocked());
            sc.exit(&ctx);
        }
    }
}
