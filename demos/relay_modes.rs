//! # Example: relay_modes
//!
//! Side-by-side run of both delivery modes.
//!
//! Demonstrates how to:
//! - Retain a startup notice emitted before its consumer exists.
//! - Broadcast refresh signals that are dropped while nobody watches.
//! - Tear everything down through the owning [`Scope`].
//!
//! ## Flow
//! ```text
//! Scope::new()
//!     ├─► notices (Retaining): emit("permission denied") ──► [buffer]
//!     │        └─► screen attaches later ──► receives it
//!     ├─► refresh (Broadcast): emit(1) with 0 subscribers ──► Suppressed
//!     │        └─► feed attaches, emit(2) ──► feed receives 2
//!     └─► Scope::shutdown(grace) ──► streams end, tasks joined
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=eventrelay=debug cargo run --example relay_modes
//! ```

use std::time::Duration;

use eventrelay::{Delivery, DeliveryMode, Relay, RelayConfig, Scope};
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 1. One owning scope for every relay of this "screen"
    let scope = Scope::new();

    // 2. Retaining: emitted during init, consumed once the UI is ready
    let notices: Relay<String> = Relay::with_config(
        RelayConfig::default()
            .with_mode(DeliveryMode::Retaining)
            .with_name("notices"),
        &scope,
    );
    let producer = {
        let notices = notices.clone();
        tokio::spawn(async move {
            notices.publish("permission denied".to_string());
        })
    };
    producer.await?;

    tokio::time::sleep(Duration::from_millis(50)).await;
    let mut screen = notices.subscribe();
    if let Some(msg) = screen.next().await {
        println!("[notices] screen got {msg:?} (emitted before it subscribed)");
    }

    // 3. Broadcast: only live subscribers hear about it
    let refresh: Relay<u32> = Relay::with_config(
        RelayConfig::default()
            .with_mode(DeliveryMode::Broadcast)
            .with_name("feed-refresh"),
        &scope,
    );
    let outcome = refresh.emit(1)?;
    println!("[refresh] emit(1) with nobody listening: {}", outcome.as_label());
    debug_assert_eq!(outcome, Delivery::Suppressed);

    let mut feed = refresh.subscribe();
    refresh.emit(2)?;
    if let Some(rev) = feed.next().await {
        println!("[refresh] feed got revision {rev}");
    }
    println!("[refresh] stats: {:?}", refresh.stats());

    // 4. Teardown: every stream ends without error
    scope.shutdown(Duration::from_secs(1)).await?;
    println!(
        "[scope] stopped; screen={:?} feed={:?}",
        screen.next().await,
        feed.next().await
    );
    Ok(())
}
