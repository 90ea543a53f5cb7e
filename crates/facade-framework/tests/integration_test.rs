use facade_framework::mock::MockContext;
use facade_framework::{describe_facade, factory, Description, FacadeType, Registry};
use std::sync::Arc;

// --- Test Facade ---

#[derive(Debug, PartialEq)]
struct Counter {
    value: u32,
}

describe_facade!(Counter => [value]);

fn counter_factory(value: u32) -> facade_framework::Factory {
    factory(move |_| Ok(Box::new(Counter { value })))
}

// --- Tests ---

/// Many tasks registering distinct keys at once: every registration lands.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_register_distinct_keys() {
    let registry = Arc::new(Registry::new());

    let mut handles = vec![];
    for i in 0..64u32 {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            let name = format!("facade-{}", i % 8);
            registry.register(&name, i, counter_factory(i), FacadeType::of::<Counter>())
        }));
    }
    for handle in handles {
        handle.await.unwrap().expect("distinct keys must all register");
    }

    assert_eq!(registry.len(), 64);
    let ctx = MockContext::new();
    for i in 0..64u32 {
        let name = format!("facade-{}", i % 8);
        let facade = registry.get_factory(&name, i).unwrap()(&ctx).unwrap();
        assert_eq!(facade.downcast_ref::<Counter>(), Some(&Counter { value: i }));
    }

    let listed = registry.list();
    assert_eq!(listed.len(), 8);
    for (n, description) in listed.iter().enumerate() {
        assert_eq!(description.name, format!("facade-{n}"));
        let expected: Vec<u32> = (0..64u32).filter(|i| i % 8 == n as u32).collect();
        assert_eq!(description.versions, expected);
    }
}

/// Racing writers on one key: exactly one wins, the rest see `AlreadyRegistered`.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_register_same_key_single_winner() {
    let registry = Arc::new(Registry::new());
    let barrier = Arc::new(tokio::sync::Barrier::new(16));

    let mut handles = vec![];
    for i in 0..16u32 {
        let registry = Arc::clone(&registry);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            registry
                .register("Contested", 1, counter_factory(i), FacadeType::of::<Counter>())
                .map(|()| i)
        }));
    }

    let mut winners = vec![];
    let mut losers = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(i) => winners.push(i),
            Err(err) => {
                assert!(err.is_already_registered());
                assert_eq!(err.to_string(), r#"object "Contested(1)" already registered"#);
                losers += 1;
            }
        }
    }
    assert_eq!(winners.len(), 1, "exactly one registration must win");
    assert_eq!(losers, 15);

    // The winner's factory is the one stored.
    let facade = registry.get_factory("Contested", 1).unwrap()(&MockContext::new()).unwrap();
    assert_eq!(facade.downcast_ref::<Counter>().map(|c| c.value), Some(winners[0]));
}

/// Readers running against writers never observe a name without versions.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_see_consistent_snapshots() {
    let registry = Arc::new(Registry::new());

    let writer = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            for round in 0..200u32 {
                registry
                    .register("Churn", round, counter_factory(round), FacadeType::of::<Counter>())
                    .unwrap();
                registry.discard("Churn", round);
                tokio::task::yield_now().await;
            }
        })
    };

    let mut readers = vec![];
    for _ in 0..4 {
        let registry = Arc::clone(&registry);
        readers.push(tokio::spawn(async move {
            for _ in 0..200 {
                for Description { versions, .. } in registry.list() {
                    assert!(!versions.is_empty());
                }
                let details = registry.list_details();
                assert!(details.len() <= 1);
                tokio::task::yield_now().await;
            }
        }));
    }

    writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }
    assert!(registry.list().is_empty());
}

/// Blocking threads as well as tasks: the registry is plain `Sync` state.
#[test]
fn test_register_from_os_threads() {
    let registry = Arc::new(Registry::new());

    std::thread::scope(|scope| {
        for i in 0..8u32 {
            let registry = &registry;
            scope.spawn(move || {
                registry.must_register("Threaded", i, counter_factory(i), FacadeType::of::<Counter>());
            });
        }
    });

    assert_eq!(
        registry.list(),
        vec![Description {
            name: "Threaded".to_string(),
            versions: (0..8).collect(),
        }]
    );
}
