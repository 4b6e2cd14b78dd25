use sentinel_hotspot::base::ParamKey;
use sentinel_hotspot::hotspot::{MetricType, Rule};
use sentinel_hotspot::utils::{curr_time_millis, sleep_for_ms};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// At most 3 in-flight tasks for each tenant
fn main() {
    // Init sentinel configurations
    let sentinel = Arc::new(sentinel_hotspot::init_default().unwrap_or_else(|err| {
        sentinel_hotspot::logging::error!("{:?}", err);
        Default::default()
    }));
    sentinel
        .load_rules(vec![Arc::new(Rule {
            resource: "task".into(),
            metric_type: MetricType::Concurrency,
            param_index: -1,
            threshold: 3,
            ..Default::default()
        })])
        .unwrap_or_else(|err| {
            sentinel_hotspot::logging::error!("{:?}", err);
            false
        });

    let mut handlers = Vec::new();
    for _ in 0..20 {
        let sentinel = Arc::clone(&sentinel);
        handlers.push(std::thread::spawn(move || {
            for round in 0..50 {
                let tenant: ParamKey = if round % 3 == 0 { "small" } else { "big" }.into();
                let entry_builder = sentinel
                    .entry("task")
                    .with_args(Some(vec![round.into(), tenant]));
                if let Ok(entry) = entry_builder.build() {
                    sleep_for_ms(10);
                    entry.exit()
                } else {
                    // blocked
                    sleep_for_ms(10);
                }
            }
        }));
    }
    let monitor = Arc::clone(&sentinel);
    handlers.push(std::thread::spawn(move || {
        for _ in 0..10 {
            for tc in monitor.rule_manager().get_traffic_controller_list_for("task") {
                let current = tc
                    .metric()
                    .concurrency_counter
                    .get(&"big".into())
                    .map(|c| c.load(Ordering::SeqCst));
                println!(
                    "{}: [HotSpot Concurrency] currentConcurrency of big tenant: {:?}",
                    curr_time_millis(),
                    current
                );
            }
            sleep_for_ms(100);
        }
    }));
    for h in handlers {
        h.join().expect("Couldn't join on the associated thread");
    }
}
