//! Simulated field sensor: publishes a batch of measurements and exits.

use std::time::Duration;

use clap::Parser;
use rumqttc::{AsyncClient, Event, MqttOptions, Outgoing, Packet, QoS};
use tracing_subscriber::EnvFilter;

use sensorum::{
    Measurement,
    config::{DEFAULT_MQTT_PORT, DEFAULT_TOPIC_ROOT},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Sensor name, used as the last topic level
    #[arg(long, default_value = "sensor0")]
    name: String,

    /// Number of measurements to publish
    #[arg(long, default_value_t = 5)]
    count: u32,

    #[arg(long, env = "MQTT_HOST", default_value = "localhost")]
    mqtt_host: String,

    #[arg(long, env = "MQTT_PORT", default_value_t = DEFAULT_MQTT_PORT)]
    mqtt_port: u16,

    #[arg(long, default_value = DEFAULT_TOPIC_ROOT)]
    topic_root: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let topic = format!("{}/{}", args.topic_root.trim_end_matches('/'), args.name);

    let mut options = MqttOptions::new(args.name.clone(), args.mqtt_host, args.mqtt_port);
    options.set_keep_alive(Duration::from_secs(10));

    // Every publish is queued before the event loop runs, so the channel must hold them all.
    let (client, mut eventloop) = AsyncClient::new(options, args.count as usize + 1);

    for i in 0..args.count {
        let measurement = Measurement::builder()
            .now()
            .lux(i as f32)
            .humidity(45.0)
            .temperature_c(21.0)
            .soil(400.0)
            .salt(100.0)
            .battery_mv(4_000)
            .firmware(0, 1, 0)
            .build();

        client
            .publish(topic.clone(), QoS::AtLeastOnce, false, measurement.encode()?)
            .await?;
    }

    if args.count == 0 {
        client.disconnect().await?;
    }

    let mut acked = 0;
    loop {
        match eventloop.poll().await? {
            Event::Incoming(Packet::PubAck(_)) => {
                acked += 1;
                if acked == args.count {
                    client.disconnect().await?;
                }
            }
            Event::Outgoing(Outgoing::Disconnect) => break,
            _ => {}
        }
    }

    tracing::info!(topic = %topic, count = args.count, "published measurements");
    Ok(())
}
