use rand::Rng;
use sentinel_hotspot::base::{BlockType, ParamKey, ParamKind, ParamsMap};
use sentinel_hotspot::config::ConfigEntity;
use sentinel_hotspot::hotspot::{CachePolicy, ControlStrategy, MetricType, Rule, SpecificItem};
use sentinel_hotspot::utils::sleep_for_ms;
use sentinel_hotspot::Sentinel;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

fn sentinel_with(cache_policy: CachePolicy) -> Sentinel {
    let mut config = ConfigEntity::default();
    config.config.hotspot.cache_policy = cache_policy;
    sentinel_hotspot::init_with_config(config).unwrap()
}

#[test]
fn reject_scenario() {
    for policy in &[CachePolicy::Lru, CachePolicy::TinyLfu] {
        let sentinel = sentinel_with(*policy);
        sentinel
            .load_rules(vec![Arc::new(Rule {
                resource: "reject".into(),
                metric_type: MetricType::QPS,
                control_strategy: ControlStrategy::Reject,
                threshold: 3,
                duration_in_sec: 1,
                ..Default::default()
            })])
            .unwrap();
        let entry = || {
            sentinel
                .entry("reject")
                .with_args(Some(vec!["X".into()]))
                .build()
        };
        for _ in 0..3 {
            entry().unwrap().exit();
        }
        let err = entry().unwrap_err();
        assert_eq!(BlockType::HotSpotParamFlow, err.block_type());
        assert!(err.triggered_rule().is_some());

        sleep_for_ms(1100);
        assert!(entry().is_ok());
    }
}

#[test]
fn throttling_scenario() {
    let sentinel = Sentinel::default();
    sentinel
        .load_rules(vec![Arc::new(Rule {
            resource: "throttling".into(),
            metric_type: MetricType::QPS,
            control_strategy: ControlStrategy::Throttling,
            threshold: 2,
            max_queueing_time_ms: 2000,
            duration_in_sec: 1,
            ..Default::default()
        })])
        .unwrap();
    let tc = sentinel
        .rule_manager()
        .get_traffic_controller_list_for("throttling")[0]
        .clone();
    let arg = ParamKey::from("a");
    assert!(tc.perform_checking(&arg, 1).is_pass());
    for i in 1..5u64 {
        let r = tc.perform_checking(&arg, 1);
        assert!(r.is_wait());
        assert!(r.ms_to_wait() <= i * 500 && r.ms_to_wait() + 50 > i * 500);
    }
}

#[test]
fn reload_keeps_warmed_counters() {
    let sentinel = Sentinel::default();
    let rule = Rule {
        resource: "reload".into(),
        metric_type: MetricType::QPS,
        control_strategy: ControlStrategy::Reject,
        threshold: 3,
        duration_in_sec: 10,
        ..Default::default()
    };
    assert!(sentinel.load_rules(vec![Arc::new(rule.clone())]).unwrap());
    for _ in 0..3 {
        assert!(sentinel.check("reload", vec![7.into()], 1).is_pass());
    }
    assert!(sentinel.check("reload", vec![7.into()], 1).is_blocked());

    // the same rules
    assert!(!sentinel
        .load_rules(vec![Arc::new(Rule {
            id: "another id".into(),
            ..rule.clone()
        })])
        .unwrap());
    assert!(sentinel.check("reload", vec![7.into()], 1).is_blocked());

    // the bucket of 7 is still empty with the larger threshold
    assert!(sentinel
        .load_rules(vec![Arc::new(Rule {
            threshold: 30,
            ..rule
        })])
        .unwrap());
    assert_eq!(30, sentinel.get_rules("reload")[0].threshold);
    assert!(sentinel.check("reload", vec![7.into()], 1).is_blocked());
    assert!(sentinel.check("reload", vec![8.into()], 30).is_pass());
}

#[test]
fn reject_conservation() {
    let threshold = 20;
    let burst_count = 5;
    let sentinel = Arc::new(Sentinel::default());
    sentinel
        .load_rules(vec![Arc::new(Rule {
            resource: "conservation".into(),
            metric_type: MetricType::QPS,
            control_strategy: ControlStrategy::Reject,
            threshold,
            burst_count,
            duration_in_sec: 60,
            specific_items: vec![SpecificItem::new(ParamKind::Int, "0", 2 * threshold)],
            ..Default::default()
        })])
        .unwrap();
    let granted: Arc<Vec<AtomicI64>> = Arc::new((0..4).map(|_| AtomicI64::new(0)).collect());
    let mut handlers = Vec::new();
    for _ in 0..10 {
        let sentinel = Arc::clone(&sentinel);
        let granted = Arc::clone(&granted);
        handlers.push(std::thread::spawn(move || {
            let mut rng = rand::thread_rng();
            for _ in 0..100 {
                let user: i64 = rng.gen_range(0..4);
                let batch: u32 = rng.gen_range(1..4);
                let r = sentinel
                    .entry("conservation")
                    .with_args(Some(vec![user.into()]))
                    .with_batch_count(batch)
                    .build();
                if let Ok(entry) = r {
                    granted[user as usize].fetch_add(batch as i64, Ordering::SeqCst);
                    entry.exit();
                }
            }
        }));
    }
    for h in handlers {
        h.join().expect("Couldn't join on the associated thread");
    }
    assert!(granted[0].load(Ordering::SeqCst) <= 2 * threshold + burst_count);
    for g in granted.iter().skip(1) {
        assert!(g.load(Ordering::SeqCst) <= threshold + burst_count);
    }
}

#[test]
fn attachments_and_index() {
    let sentinel = Sentinel::default();
    sentinel
        .load_rules(vec![
            Arc::new(Rule {
                resource: "mixed".into(),
                metric_type: MetricType::QPS,
                control_strategy: ControlStrategy::Reject,
                param_key: "user".into(),
                threshold: 1,
                duration_in_sec: 10,
                ..Default::default()
            }),
            Arc::new(Rule {
                resource: "mixed".into(),
                metric_type: MetricType::QPS,
                control_strategy: ControlStrategy::Reject,
                param_index: -1,
                threshold: 2,
                duration_in_sec: 10,
                ..Default::default()
            }),
        ])
        .unwrap();
    let entry = |user: &str, product: i32| {
        let mut attachments = ParamsMap::new();
        attachments.insert("user".into(), user.into());
        sentinel
            .entry("mixed")
            .with_args(Some(vec!["ignored".into(), product.into()]))
            .with_attachments(Some(attachments))
            .build()
    };
    assert!(entry("u1", 1).is_ok());
    // blocked by the user rule
    assert!(entry("u1", 2).is_err());
    assert!(entry("u2", 1).is_ok());
    // blocked by the product rule
    assert!(entry("u3", 1).is_err());
}

#[test]
fn scan_resistance() {
    let mut config = ConfigEntity::default();
    config.config.hotspot.cache_policy = CachePolicy::TinyLfu;
    let sentinel = Sentinel::new(config).unwrap();
    sentinel
        .load_rules(vec![Arc::new(Rule {
            resource: "scan".into(),
            metric_type: MetricType::QPS,
            control_strategy: ControlStrategy::Reject,
            threshold: 1_000_000,
            duration_in_sec: 10,
            params_max_capacity: 100,
            ..Default::default()
        })])
        .unwrap();
    for _ in 0..20 {
        assert!(sentinel.check("scan", vec!["hot".into()], 1).is_pass());
    }
    // a scan of one-off values, the hot value recurs less often than a plain LRU of the capacity keeps
    for i in 0..10_000 {
        if i % 200 == 0 {
            assert!(sentinel.check("scan", vec!["hot".into()], 1).is_pass());
        }
        sentinel.check("scan", vec![i.into()], 1);
    }
    let tc = sentinel
        .rule_manager()
        .get_traffic_controller_list_for("scan")[0]
        .clone();
    let counter = &tc.metric().rule_token_counter;
    assert!(counter.len() <= 100);
    assert!(counter.contains(&"hot".into()));
}
