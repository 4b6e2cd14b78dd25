//! Directly reject

use super::*;
use crate::{
    base::{BlockType, ParamKey, TokenResult},
    utils,
};
use std::sync::{atomic::Ordering, Arc};

/// RejectChecker is a token bucket refilled once per statistic window,
/// the requests exceeding the bucket are rejected directly.
#[derive(Debug, Default)]
pub struct RejectChecker;

fn blocked(owner: &Controller, msg: String, snapshot: i64) -> TokenResult {
    TokenResult::new_blocked_with_cause(
        BlockType::HotSpotParamFlow,
        msg,
        owner.rule().clone(),
        Arc::new(snapshot),
    )
}

impl Checker for RejectChecker {
    fn do_check(&self, owner: &Controller, arg: &ParamKey, batch_count: u32) -> TokenResult {
        let time_counter = &owner.metric().rule_time_counter;
        let token_counter = &owner.metric().rule_token_counter;
        if time_counter.cap() == 0 || token_counter.cap() == 0 {
            return TokenResult::new_pass();
        }
        let token_count = owner.threshold_of(arg);
        if token_count <= 0 {
            let msg = format!("hotspot QPS check blocked, threshold is 0, arg: {:?}", arg);
            return blocked(owner, msg, token_count);
        }

        let batch_count = batch_count as i64;
        let max_count = token_count.saturating_add(owner.rule().burst_count);
        if batch_count > max_count {
            let msg = format!("hotspot reject check blocked, request batch count is more than max token count, arg: {:?}", arg);
            return blocked(owner, msg, batch_count);
        }
        let window_ms = owner.rule().duration_in_sec.saturating_mul(1000);

        loop {
            let current_time_in_ms = utils::curr_time_millis() as i64;
            let last_add_token_time = match time_counter.add_if_absent(arg.clone(), current_time_in_ms) {
                Some(last_add_token_time) => last_add_token_time,
                None => {
                    // First fill token, and consume token immediately
                    token_counter.add(arg.clone(), max_count - batch_count);
                    return TokenResult::new_pass();
                }
            };

            // Calculate the time duration since last token was added.
            let pass_time = current_time_in_ms - last_add_token_time.load(Ordering::SeqCst);
            if pass_time > window_ms {
                // Refill the tokens because statistic window has passed.
                let old_qps =
                    match token_counter.add_if_absent(arg.clone(), max_count - batch_count) {
                        Some(old_qps) => old_qps,
                        None => {
                            // Might not be accurate here.
                            last_add_token_time.store(current_time_in_ms, Ordering::SeqCst);
                            return TokenResult::new_pass();
                        }
                    };
                let rest_qps = old_qps.load(Ordering::SeqCst);
                let to_add_token_num = pass_time.saturating_mul(token_count) / window_ms;
                let new_qps = if to_add_token_num.saturating_add(rest_qps) > max_count {
                    max_count - batch_count
                } else {
                    to_add_token_num + rest_qps - batch_count
                };

                if new_qps < 0 {
                    let msg = format!("hotspot reject check blocked, refilled token count is less than request batch count, arg: {:?}", arg);
                    return blocked(owner, msg, new_qps);
                }
                if old_qps
                    .compare_exchange(rest_qps, new_qps, Ordering::SeqCst, Ordering::Relaxed)
                    .is_ok()
                {
                    last_add_token_time.store(current_time_in_ms, Ordering::SeqCst);
                    return TokenResult::new_pass();
                }
                std::thread::yield_now();
            } else {
                // check whether the rest of token is enough to batch
                match token_counter.get(arg) {
                    Some(old_qps) => {
                        let old_rest_token = old_qps.load(Ordering::SeqCst);
                        if old_rest_token < batch_count {
                            let msg = format!("hotspot reject check blocked, request batch count is more than available token count, arg: {:?}", arg);
                            return blocked(owner, msg, old_rest_token);
                        }
                        if old_qps
                            .compare_exchange(
                                old_rest_token,
                                old_rest_token - batch_count,
                                Ordering::SeqCst,
                                Ordering::Relaxed,
                            )
                            .is_ok()
                        {
                            return TokenResult::new_pass();
                        }
                    }
                    None => {
                        // the token cell has been evicted, start a new window
                        if token_counter
                            .add_if_absent(arg.clone(), max_count - batch_count)
                            .is_none()
                        {
                            last_add_token_time.store(current_time_in_ms, Ordering::SeqCst);
                            return TokenResult::new_pass();
                        }
                    }
                }
                std::thread::yield_now();
            }
        }
    }
}
