//! # Example: memory_cluster
//!
//! A three-member cluster simulated on one in-memory provider.
//!
//! Demonstrates how to:
//! - Implement [`Application`] for a clustered service.
//! - Publish a join handshake from a `launch` callback.
//! - Run the [`Agent`] loop and stop it with a [`CancellationToken`].
//!
//! ## Flow
//! ```text
//! LAUNCH(i-new) ──► consul.launch() ──► send_join_to_message_queue("consul", payload)
//!               ──► nomad.launch()
//! JOIN(i-new, consul) ──► consul.join() ──► mark_enrolled()
//! TERMINATE(i-old)    ──► consul.terminate() ──► nomad.terminate()
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=joule=debug cargo run --example memory_cluster
//! ```

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use joule::{
    Agent, AgentConfig, Application, ApplicationError, Event, MemoryProvider, Payload, Provider,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// A service that sponsors newcomers by publishing its gossip key.
struct Consul {
    gossip_key: &'static str,
}

#[async_trait]
impl Application for Consul {
    fn name(&self) -> &str {
        "consul"
    }

    async fn join(&self, _provider: &dyn Provider, event: &Event) -> Result<(), ApplicationError> {
        info!(
            instance = event.instance(),
            has_token = event.token().is_some(),
            "consul: joining cluster"
        );
        Ok(())
    }

    async fn launch(&self, provider: &dyn Provider, event: &Event) -> Result<(), ApplicationError> {
        let mut payload = Payload::new();
        payload.insert("gossip_key".into(), Value::from(self.gossip_key));
        provider
            .send_join_to_message_queue(self.name(), event, payload)
            .await
            .map_err(|e| ApplicationError::fail(e.to_string()))?;
        info!(instance = event.instance(), "consul: sponsored newcomer");
        Ok(())
    }

    async fn terminate(
        &self,
        _provider: &dyn Provider,
        event: &Event,
    ) -> Result<(), ApplicationError> {
        info!(instance = event.instance(), "consul: force-leave");
        Ok(())
    }
}

/// A service that only cares about departures.
struct Nomad;

#[async_trait]
impl Application for Nomad {
    fn name(&self) -> &str {
        "nomad"
    }

    async fn join(&self, _: &dyn Provider, _: &Event) -> Result<(), ApplicationError> {
        Ok(())
    }

    async fn launch(&self, _: &dyn Provider, _: &Event) -> Result<(), ApplicationError> {
        Ok(())
    }

    async fn terminate(&self, _: &dyn Provider, event: &Event) -> Result<(), ApplicationError> {
        Err(ApplicationError::fail(format!(
            "node {} still has allocations",
            event.instance()
        )))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // 1. Local instance and its backlog
    let provider = Arc::new(MemoryProvider::new("i-local"));
    provider.push_event(&Event::launch("i-new")).await;
    provider
        .push_event(&Event::join("i-local").with_application("consul").with_token("s3cr3t"))
        .await;
    provider.push_event(&Event::terminate("i-old")).await;
    provider.push_raw("{\"event\": \"REBOOT\"}").await;

    // 2. Agent with a short interval so the demo finishes quickly
    let agent = Arc::new(
        Agent::builder(provider.clone())
            .with_application(Arc::new(Consul { gossip_key: "pUqJrVyVRj5jsiYEkM/tFQ==" }))
            .with_application(Arc::new(Nomad))
            .with_config(AgentConfig {
                interval: Duration::from_millis(500),
                ..AgentConfig::default()
            })
            .build()?,
    );

    // 3. Run for a while, then cancel
    let token = CancellationToken::new();
    let handle = tokio::spawn({
        let agent = agent.clone();
        let token = token.clone();
        async move { agent.run(token).await }
    });

    tokio::time::sleep(Duration::from_secs(2)).await;
    token.cancel();
    handle.await??;

    // 4. Inspect what happened on the backend
    info!(
        enrolled = provider.is_enrolled().await?,
        essential_marks = provider.essential_marks().await,
        "final instance state"
    );
    for join in provider.published().await {
        info!(
            application = %join.application,
            instance = join.event.instance(),
            payload_keys = ?join.payload.keys().collect::<Vec<_>>(),
            "published join"
        );
    }
    Ok(())
}
