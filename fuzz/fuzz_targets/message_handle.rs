#![no_main]

use libfuzzer_sys::fuzz_target;
use sensorum::{MessageHandler, SensorRegistry, TopicFilter};

fuzz_target!(|input: (&str, &[u8])| {
    let (topic, payload) = input;
    let registry = SensorRegistry::default();
    let handler = MessageHandler::new(registry.clone(), TopicFilter::new("sensors"));

    match handler.handle(topic, payload) {
        Ok(sensor) => assert_eq!(sensor.index, 0),
        Err(_) => assert!(registry.is_empty()),
    }
});
