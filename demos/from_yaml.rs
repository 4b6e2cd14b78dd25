use sentinel_hotspot::hotspot::{ControlStrategy, MetricType, Rule};
use sentinel_hotspot::utils::sleep_for_ms;
use std::sync::Arc;

fn main() {
    // Init sentinel configurations from yaml file
    let sentinel = match sentinel_hotspot::init_with_config_file("testdata/config/sentinel.yaml") {
        Ok(sentinel) => sentinel,
        Err(err) => {
            sentinel_hotspot::logging::error!("{:?}", err);
            return;
        }
    };
    println!("{}", sentinel.config());
    sentinel
        .load_rules(vec![Arc::new(Rule {
            resource: "task".into(),
            metric_type: MetricType::QPS,
            control_strategy: ControlStrategy::Reject,
            threshold: 10,
            duration_in_sec: 1,
            ..Default::default()
        })])
        .unwrap_or_else(|err| {
            sentinel_hotspot::logging::error!("{:?}", err);
            false
        });

    for i in 0..30 {
        let r = sentinel.check("task", vec![(i % 3).into()], 1);
        println!("{}: {}", i, r);
        sleep_for_ms(10);
    }
}
