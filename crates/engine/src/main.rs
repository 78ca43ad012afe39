use std::sync::Arc;

use chain_client::mock::InMemoryChainClient;
use chain_client::{ChainClient, MoveCallTarget};
use clap::Parser;
use confidentiality::mock::MockCollaborator;
use confidentiality::ConfidentialityCollaborator;
use engine::{serve, Engine, EngineConfig};
use router::RouterConfig;
use tx_composer::ProtocolTargets;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let config = EngineConfig::parse();
    let package = config.protocol_package_id.to_string();

    // Real node/collaborator integration is an out-of-scope external
    // collaborator; this binary wires the in-memory and mock
    // implementations the rest of the workspace tests against.
    tracing::warn!("engine started with the in-memory chain client and mock confidentiality collaborator");
    let chain_client: Arc<dyn ChainClient> = Arc::new(InMemoryChainClient::new(Vec::new()));
    let confidentiality_collaborator: Arc<dyn ConfidentialityCollaborator> = Arc::new(MockCollaborator::new());

    let targets = ProtocolTargets {
        fill_full: MoveCallTarget::new(package.clone(), "offer", "fill_full"),
        fill_partial: MoveCallTarget::new(package.clone(), "offer", "fill_partial"),
        execute_against_offer: MoveCallTarget::new(package.clone(), "intent", "execute_against_offer"),
        execute_against_offer_encrypted: MoveCallTarget::new(package, "intent", "execute_against_offer_encrypted"),
    };

    let metrics_address = config.metrics_address;
    let engine = Engine::new(
        config,
        chain_client,
        Vec::new(),
        confidentiality_collaborator,
        targets,
        RouterConfig::default(),
    );

    let metrics_handle = tokio::spawn(serve(metrics_address, engine.metrics(), engine.clone()));
    let run_handle = tokio::spawn(engine.clone().run_forever());

    tokio::signal::ctrl_c().await.expect("failed to listen for ctrl-c");
    tracing::info!("shutdown requested");
    engine.stop().await;
    run_handle.await.expect("tick loop task panicked");
    metrics_handle.abort();
}
