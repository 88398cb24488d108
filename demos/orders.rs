//! # Orders demo
//!
//! Shows the bus end to end:
//! - a fast consumer that keeps up with the stream
//! - a slow consumer with a small buffer that gets evicted on overflow
//! - a publisher fanning out orders
//! - graceful shutdown
//!
//! ## Run
//! ```bash
//! RUST_LOG=topicbus=debug cargo run --example orders
//! ```

use std::time::Duration;

use futures::StreamExt;
use tracing_subscriber::EnvFilter;

use topicbus::{Envelope, EventBus, SubscriptionHandle};

#[derive(Debug)]
struct Order {
    id: u32,
    amount_cents: u64,
}

fn consumer(
    name: &'static str,
    mut sub: SubscriptionHandle,
    pace: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut seen = 0usize;
        while let Some(ev) = sub.next().await {
            if let Some(order) = ev.payload::<Order>() {
                seen += 1;
                println!("[{name}] order #{} ({} cents)", order.id, order.amount_cents);
            }
            tokio::time::sleep(pace).await;
        }
        println!("[{name}] stream ended after {seen} orders: {:?}", sub.error());
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let bus = EventBus::builder().name("orders-demo").build();

    let fast = consumer(
        "fast",
        bus.subscribe("orders", 64).await?,
        Duration::from_millis(1),
    );
    let slow = consumer(
        "slow",
        bus.subscribe("orders", 2).await?,
        Duration::from_millis(200),
    );

    for id in 1..=20 {
        bus.publish(Envelope::new(
            "orders",
            Order {
                id,
                amount_cents: u64::from(id) * 250,
            },
        ))
        .await?;
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    tokio::time::sleep(Duration::from_millis(200)).await;
    println!("stats: {:?}", bus.stats().await?);

    bus.shutdown().await;
    fast.await?;
    slow.await?;
    Ok(())
}
