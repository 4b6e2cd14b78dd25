use sentinel_hotspot::hotspot::{ControlStrategy, MetricType, Rule};
use sentinel_hotspot::utils::curr_time_millis;
use std::sync::Arc;

/// The requests of each product are spaced evenly, 5 per second,
/// and a request waits at most 1 second.
fn main() {
    // Init sentinel configurations
    let sentinel = Arc::new(sentinel_hotspot::init_default().unwrap_or_else(|err| {
        sentinel_hotspot::logging::error!("{:?}", err);
        Default::default()
    }));
    sentinel
        .load_rules(vec![Arc::new(Rule {
            resource: "order".into(),
            metric_type: MetricType::QPS,
            control_strategy: ControlStrategy::Throttling,
            param_key: "product".into(),
            threshold: 5,
            max_queueing_time_ms: 1000,
            duration_in_sec: 1,
            ..Default::default()
        })])
        .unwrap_or_else(|err| {
            sentinel_hotspot::logging::error!("{:?}", err);
            false
        });

    let mut handlers = Vec::new();
    for i in 0..4 {
        let sentinel = Arc::clone(&sentinel);
        handlers.push(std::thread::spawn(move || {
            for _ in 0..10 {
                let mut attachments = sentinel_hotspot::base::ParamsMap::new();
                attachments.insert("product".into(), (i % 2).into());
                let r = sentinel
                    .entry("order")
                    .with_attachments(Some(attachments))
                    .build();
                match r {
                    Ok(entry) => {
                        println!("{}: product {} passed", curr_time_millis(), i % 2);
                        entry.exit()
                    }
                    Err(err) => println!("{}: product {} blocked, {}", curr_time_millis(), i % 2, err),
                }
            }
        }));
    }
    for h in handlers {
        h.join().expect("Couldn't join on the associated thread");
    }
}
