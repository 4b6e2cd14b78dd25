use super::*;
use crate::base::{BlockType, ParamKey, TokenResult};
use std::sync::{atomic::Ordering, Arc};

/// ConcurrencyChecker limits the in-flight requests of every parameter value.
/// The counters are maintained by the `ConcurrencyStatSlot`, the checker only reads them.
/// The first observer of a value passes without comparison.
/// The limit is best-effort under races: entries checked at the same moment may all
/// see the count before any of them is recorded, and all pass.
#[derive(Debug, Default)]
pub struct ConcurrencyChecker;

impl Checker for ConcurrencyChecker {
    fn do_check(&self, owner: &Controller, arg: &ParamKey, _batch_count: u32) -> TokenResult {
        let concurrency_counter = &owner.metric().concurrency_counter;
        if concurrency_counter.cap() == 0 {
            return TokenResult::new_pass();
        }
        let concurrency = match concurrency_counter.get(arg) {
            Some(cell) => cell.load(Ordering::SeqCst),
            None => return TokenResult::new_pass(),
        };
        let token_count = owner.threshold_of(arg);
        if concurrency + 1 > token_count {
            let msg = format!(
                "hotspot concurrency check blocked, arg: {:?}, concurrency: {}",
                arg, concurrency
            );
            return TokenResult::new_blocked_with_cause(
                BlockType::HotSpotParamFlow,
                msg,
                owner.rule().clone(),
                Arc::new(concurrency),
            );
        }
        TokenResult::new_pass()
    }
}

#[cfg(test)]
mod test {
    use super::super::test::{controller_of, controller_with_metric};
    use super::*;
    use crate::base::ParamKind;
    use crate::hotspot::MockCounter;
    use crate::utils::AsAny;
    use std::sync::atomic::AtomicI64;

    fn rule(threshold: i64) -> Rule {
        Rule {
            resource: "abc".into(),
            metric_type: MetricType::Concurrency,
            threshold,
            ..Default::default()
        }
    }

    #[test]
    fn check_threshold() {
        let mut counter: MockCounter<ParamKey> = MockCounter::new();
        counter.expect_cap().return_const(100_usize);
        counter
            .expect_get()
            .returning(|key| match key {
                ParamKey::Int(1) => Some(Arc::new(AtomicI64::new(99))),
                ParamKey::Int(2) => Some(Arc::new(AtomicI64::new(100))),
                _ => None,
            });
        let metric = ParamsMetric {
            concurrency_counter: Box::new(counter),
            ..Default::default()
        };
        let controller = controller_with_metric(rule(100), metric);
        assert!(controller.perform_checking(&ParamKey::from(1), 1).is_pass());
        let token = controller.perform_checking(&ParamKey::from(2), 1);
        assert!(token.is_blocked());
        assert_eq!(
            100,
            *token
                .block_err()
                .unwrap()
                .triggered_value()
                .unwrap()
                .as_any_arc()
                .downcast::<i64>()
                .unwrap()
        );
        // first observer
        assert!(controller.perform_checking(&ParamKey::from(3), 1).is_pass());
    }

    #[test]
    fn specific_item() {
        let controller = controller_of(Rule {
            specific_items: vec![SpecificItem::new(ParamKind::String, "vip", 3)],
            ..rule(1)
        });
        let counter = &controller.metric().concurrency_counter;
        counter.add(ParamKey::from("vip"), 2);
        counter.add(ParamKey::from("normal"), 1);
        assert!(controller.perform_checking(&ParamKey::from("vip"), 1).is_pass());
        assert!(controller.perform_checking(&ParamKey::from("normal"), 1).is_blocked());
        counter.add(ParamKey::from("vip"), 3);
        assert!(controller.perform_checking(&ParamKey::from("vip"), 1).is_blocked());
    }

    #[test]
    fn zero_threshold_first_observer_passes() {
        let controller = controller_of(rule(0));
        let arg = ParamKey::from(1);
        assert!(controller.perform_checking(&arg, 1).is_pass());
        // observed, even if nothing is in flight now
        controller.metric().concurrency_counter.add(arg.clone(), 0);
        assert!(controller.perform_checking(&arg, 1).is_blocked());
    }
}
