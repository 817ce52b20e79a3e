//! Ingestion listener tests driven through an in-process transport
//!
//! These cover the message path from transport event to registry state,
//! including malformed payloads, reconnects and concurrent first contact.

use std::{collections::HashSet, time::Duration};

use sensorum::{
    BackoffConfig, Listener, MessageHandler, SensorRegistry, TopicFilter,
    test_utils::{channel_transport, sample_measurement},
};

fn fast_backoff() -> BackoffConfig {
    BackoffConfig {
        initial: Duration::from_millis(1),
        max: Duration::from_millis(5),
    }
}

fn handler(registry: &SensorRegistry) -> MessageHandler {
    MessageHandler::new(registry.clone(), TopicFilter::new("sensors"))
}

#[tokio::test]
async fn test_repeated_measurements_register_once() {
    let registry = SensorRegistry::new(16);
    let (transport, handle) = channel_transport();
    let listener = Listener::new(transport, handler(&registry), &fast_backoff());

    handle.connect();
    for lux in 0..10 {
        handle.publish_measurement("sensors/sensor0", &sample_measurement(lux as f32));
    }
    handle.close();

    listener.run(std::future::pending()).await;

    assert_eq!(registry.list_sensors(), vec!["sensor0"]);
    assert_eq!(registry.peek_next_expected(), "sensor1");

    let lux: Vec<f32> = registry
        .history("sensor0")
        .iter()
        .map(|r| r.measurement.lux)
        .collect();
    assert_eq!(lux, (0..10).map(|l| l as f32).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_malformed_payload_is_dropped() {
    let registry = SensorRegistry::default();
    let handler = handler(&registry);
    let stats = handler.stats().clone();
    let (transport, handle) = channel_transport();
    let listener = Listener::new(transport, handler, &fast_backoff());

    handle.connect();
    handle.publish_measurement("sensors/sensor0", &sample_measurement(1.0));
    handle.publish("sensors/sensor0", b"definitely not cbor".to_vec());
    handle.publish("sensors/sensor1", vec![0xa1, 0x61]);
    handle.publish_measurement("unrelated/sensor9", &sample_measurement(2.0));
    handle.publish_measurement("sensors/sensor0", &sample_measurement(3.0));
    handle.close();

    listener.run(std::future::pending()).await;

    assert_eq!(registry.list_sensors(), vec!["sensor0"]);
    assert_eq!(registry.peek_next_expected(), "sensor1");
    assert_eq!(registry.latest("sensor0").unwrap().measurement.lux, 3.0);
    assert_eq!(stats.accepted(), 2);
    assert_eq!(stats.rejected(), 3);
}

#[tokio::test]
async fn test_resubscribes_after_reconnect() {
    let registry = SensorRegistry::default();
    let (transport, handle) = channel_transport();
    let listener = Listener::new(transport, handler(&registry), &fast_backoff());

    handle.connect();
    handle.publish_measurement("sensors/sensor0", &sample_measurement(1.0));
    handle.fail("connection reset by peer");
    handle.fail("connection refused");
    handle.connect();
    handle.publish_measurement("sensors/sensor1", &sample_measurement(2.0));
    handle.close();

    listener.run(std::future::pending()).await;

    assert_eq!(handle.subscriptions(), vec!["sensors/+", "sensors/+"]);
    assert_eq!(registry.list_sensors(), vec!["sensor0", "sensor1"]);
}

#[tokio::test]
async fn test_shutdown_stops_idle_listener() {
    let registry = SensorRegistry::default();
    let (transport, _handle) = channel_transport();
    let listener = Listener::new(transport, handler(&registry), &fast_backoff());

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let task = tokio::spawn(listener.run(async {
        let _ = stop_rx.await;
    }));

    stop_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("listener did not stop")
        .unwrap();
}

#[tokio::test]
async fn test_shutdown_interrupts_backoff() {
    let registry = SensorRegistry::default();
    let (transport, handle) = channel_transport();
    let slow = BackoffConfig {
        initial: Duration::from_secs(3600),
        max: Duration::from_secs(3600),
    };
    let listener = Listener::new(transport, handler(&registry), &slow);

    handle.fail("broker unreachable");

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let task = tokio::spawn(listener.run(async {
        let _ = stop_rx.await;
    }));

    tokio::time::sleep(Duration::from_millis(20)).await;
    stop_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("listener stuck in backoff")
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_contact_on_separate_connections() {
    let registry = SensorRegistry::default();
    let mut tasks = Vec::new();

    for name in ["sensor0", "sensor1", "sensor2"] {
        let (transport, handle) = channel_transport();
        let listener = Listener::new(transport, handler(&registry), &fast_backoff());

        handle.connect();
        handle.publish_measurement(&format!("sensors/{name}"), &sample_measurement(1.0));
        handle.close();

        tasks.push(tokio::spawn(listener.run(std::future::pending())));
    }

    for result in futures::future::join_all(tasks).await {
        result.unwrap();
    }

    let names: HashSet<String> = registry.list_sensors().into_iter().collect();
    assert_eq!(names.len(), 3);

    let indices: HashSet<usize> = names
        .iter()
        .map(|name| registry.get(name).unwrap().index)
        .collect();
    assert_eq!(indices, HashSet::from([0, 1, 2]));
    assert_eq!(registry.next_index(), 3);
    assert_eq!(registry.peek_next_expected(), "sensor3");
}

#[test]
fn test_concurrent_handlers_on_threads() {
    let registry = SensorRegistry::default();
    let handler = handler(&registry);
    let barrier = std::sync::Arc::new(std::sync::Barrier::new(8));

    let threads: Vec<_> = (0..8)
        .map(|i| {
            let handler = handler.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                let payload = sample_measurement(i as f32).encode().unwrap();
                barrier.wait();
                // Half the threads race on the same name
                let topic = if i % 2 == 0 {
                    "sensors/shared".to_string()
                } else {
                    format!("sensors/sensor{i}")
                };
                handler.handle(&topic, &payload).unwrap()
            })
        })
        .collect();

    let sensors: Vec<_> = threads.into_iter().map(|t| t.join().unwrap()).collect();

    let shared: HashSet<usize> = sensors
        .iter()
        .filter(|s| s.name == "shared")
        .map(|s| s.index)
        .collect();
    assert_eq!(shared.len(), 1, "one index for one logical sensor");

    assert_eq!(registry.len(), 5);
    let mut indices: Vec<usize> = registry
        .list_sensors()
        .iter()
        .map(|name| registry.get(name).unwrap().index)
        .collect();
    indices.sort_unstable();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert_eq!(handler.stats().accepted(), 8);
}
