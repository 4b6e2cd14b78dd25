use sentinel_hotspot::hotspot::{ControlStrategy, MetricType, Rule};
use sentinel_hotspot::utils::{curr_time_millis, sleep_for_ms};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Each user is allowed 10 requests per second, and the VIP user is allowed 50
fn main() {
    // Init sentinel configurations
    let sentinel = Arc::new(sentinel_hotspot::init_default().unwrap_or_else(|err| {
        sentinel_hotspot::logging::error!("{:?}", err);
        Default::default()
    }));
    sentinel
        .load_rules(vec![Arc::new(Rule {
            resource: "query".into(),
            metric_type: MetricType::QPS,
            control_strategy: ControlStrategy::Reject,
            param_index: 0,
            threshold: 10,
            burst_count: 2,
            duration_in_sec: 1,
            specific_items: vec![sentinel_hotspot::hotspot::SpecificItem::new(
                sentinel_hotspot::base::ParamKind::String,
                "vip",
                50,
            )],
            ..Default::default()
        })])
        .unwrap_or_else(|err| {
            sentinel_hotspot::logging::error!("{:?}", err);
            false
        });

    let passed = Arc::new(AtomicU64::new(0));
    let blocked = Arc::new(AtomicU64::new(0));
    let mut handlers = Vec::new();
    for i in 0..8 {
        let sentinel = Arc::clone(&sentinel);
        let passed = Arc::clone(&passed);
        let blocked = Arc::clone(&blocked);
        handlers.push(std::thread::spawn(move || {
            let user = if i % 2 == 0 { "vip" } else { "guest" };
            for _ in 0..300 {
                let entry_builder = sentinel.entry("query").with_args(Some(vec![user.into()]));
                if let Ok(entry) = entry_builder.build() {
                    // Passed, wrap the logic here.
                    passed.fetch_add(1, Ordering::SeqCst);
                    sleep_for_ms(5);
                    // Be sure the entry is exited finally.
                    entry.exit()
                } else {
                    // Blocked. We could get the block reason from the BlockError.
                    blocked.fetch_add(1, Ordering::SeqCst);
                    sleep_for_ms(5);
                }
            }
        }));
    }
    for h in handlers {
        h.join().expect("Couldn't join on the associated thread");
    }
    println!(
        "{}: passed {}, blocked {}",
        curr_time_millis(),
        passed.load(Ordering::SeqCst),
        blocked.load(Ordering::SeqCst)
    );
}
