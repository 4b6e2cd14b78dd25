//! Throttling, the passed requests of a hot parameter are evenly spaced

use super::*;
use crate::{
    base::{BlockType, ParamKey, TokenResult},
    utils,
};
use std::sync::{atomic::Ordering, Arc};

/// ThrottlingChecker spaces the requests of every parameter value evenly,
/// the requests that would queue longer than `max_queueing_time_ms` are rejected.
#[derive(Debug, Default)]
pub struct ThrottlingChecker;

impl Checker for ThrottlingChecker {
    fn do_check(&self, owner: &Controller, arg: &ParamKey, batch_count: u32) -> TokenResult {
        let time_counter = &owner.metric().rule_time_counter;
        if time_counter.cap() == 0 {
            return TokenResult::new_pass();
        }
        let token_count = owner.threshold_of(arg);
        if token_count <= 0 {
            let msg = format!(
                "hotspot throttling check blocked, threshold is 0, arg: {:?}",
                arg
            );
            return TokenResult::new_blocked_with_cause(
                BlockType::HotSpotParamFlow,
                msg,
                owner.rule().clone(),
                Arc::new(token_count),
            );
        }
        let interval_cost_time = (batch_count as f64
            * owner.rule().duration_in_sec as f64
            * 1000.0
            / token_count as f64)
            .round() as i64;
        let max_queueing_time_ms = owner.rule().max_queueing_time_ms;

        loop {
            let current_time_in_ms = utils::curr_time_millis() as i64;
            let last_pass_time_arc =
                match time_counter.add_if_absent(arg.clone(), current_time_in_ms) {
                    Some(last_pass_time_arc) => last_pass_time_arc,
                    None => return TokenResult::new_pass(),
                };
            let last_pass_time = last_pass_time_arc.load(Ordering::SeqCst);
            let expected_time = last_pass_time.saturating_add(interval_cost_time);
            if expected_time <= current_time_in_ms
                || expected_time - current_time_in_ms <= max_queueing_time_ms
            {
                if last_pass_time_arc
                    .compare_exchange(
                        last_pass_time,
                        expected_time.max(current_time_in_ms),
                        Ordering::SeqCst,
                        Ordering::Relaxed,
                    )
                    .is_ok()
                {
                    let await_time = expected_time - current_time_in_ms;
                    if await_time > 0 {
                        return TokenResult::new_should_wait(await_time as u64);
                    }
                    return TokenResult::new_pass();
                }
                std::thread::yield_now();
            } else {
                let msg = format!("hotspot throttling check blocked, estimated queueing time exceeds max queueing time, arg: {:?}", arg);
                return TokenResult::new_blocked_with_cause(
                    BlockType::HotSpotParamFlow,
                    msg,
                    owner.rule().clone(),
                    Arc::new(last_pass_time),
                );
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::super::test::{controller_of, controller_with_metric};
    use super::*;
    use crate::hotspot::MockCounter;
    use std::sync::atomic::AtomicI64;

    fn rule(threshold: i64, max_queueing_time_ms: i64) -> Rule {
        Rule {
            resource: "abc".into(),
            metric_type: MetricType::QPS,
            control_strategy: ControlStrategy::Throttling,
            threshold,
            max_queueing_time_ms,
            duration_in_sec: 1,
            ..Default::default()
        }
    }

    #[test]
    fn evenly_spaced() {
        let controller = controller_of(rule(2, 2000));
        let arg = ParamKey::from("a");
        assert!(controller.perform_checking(&arg, 1).is_pass());
        for i in 1..5 {
            let token = controller.perform_checking(&arg, 1);
            assert!(token.is_wait(), "call {} got {}", i, token);
            let expected = i * 500;
            let waited = token.ms_to_wait();
            assert!(waited <= expected && waited + 50 > expected);
        }
        let token = controller.perform_checking(&arg, 1);
        assert!(token.is_blocked());
        assert!(token
            .block_err()
            .unwrap()
            .block_msg()
            .contains("exceeds max queueing time"));
    }

    #[test]
    fn no_queueing() {
        let controller = controller_of(rule(10, 0));
        let arg = ParamKey::from(1);
        assert!(controller.perform_checking(&arg, 1).is_pass());
        assert!(controller.perform_checking(&arg, 1).is_blocked());
        utils::sleep_for_ms(110);
        assert!(controller.perform_checking(&arg, 1).is_pass());
    }

    #[test]
    fn zero_threshold() {
        let controller = controller_of(rule(0, 2000));
        assert!(controller.perform_checking(&ParamKey::from(1), 1).is_blocked());
    }

    #[test]
    fn expected_time_in_past() {
        let curr_time = utils::curr_time_millis() as i64;
        let last_pass_time = Arc::new(AtomicI64::new(curr_time - 1000));
        let mut rule_time_counter: MockCounter<ParamKey> = MockCounter::new();
        rule_time_counter
            .expect_add_if_absent()
            .once()
            .return_const(Some(Arc::clone(&last_pass_time)));
        rule_time_counter.expect_cap().return_const(100_usize);
        let metric = ParamsMetric {
            rule_time_counter: Box::new(rule_time_counter),
            ..Default::default()
        };

        let controller = controller_with_metric(rule(10, 0), metric);
        let token = controller.perform_checking(&ParamKey::from(1), 1);
        assert!(token.is_pass());
        // the next slot starts from now instead of the stale pass time
        assert!(last_pass_time.load(Ordering::SeqCst) >= curr_time);
    }

    #[test]
    fn batch_takes_longer() {
        let curr_time = utils::curr_time_millis() as i64;
        let last_pass_time = Arc::new(AtomicI64::new(curr_time + 60_000));
        let mut rule_time_counter: MockCounter<ParamKey> = MockCounter::new();
        rule_time_counter
            .expect_add_if_absent()
            .once()
            .return_const(Some(Arc::clone(&last_pass_time)));
        rule_time_counter.expect_cap().return_const(100_usize);
        let metric = ParamsMetric {
            rule_time_counter: Box::new(rule_time_counter),
            ..Default::default()
        };

        let controller = controller_with_metric(rule(10, 1000), metric);
        let token = controller.perform_checking(&ParamKey::from(1), 5);
        assert!(token.is_blocked());
        assert_eq!(curr_time + 60_000, last_pass_time.load(Ordering::SeqCst));
    }
}
