use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use router_types::ObjectId;
use url::Url;

/// Which deployment this engine talks to. Purely informational for now —
/// callers may use it to pick network-specific defaults upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Network {
    Testnet,
    Mainnet,
}

/// Construction-time configuration for the execution engine (spec §6,
/// "Engine configuration"). Supplied once and never mutated during a run.
#[derive(Debug, Parser)]
pub struct EngineConfig {
    /// Chain-client RPC endpoint.
    #[clap(long, env)]
    pub rpc_endpoint: Url,

    #[clap(long, env, value_enum, default_value = "testnet")]
    pub network: Network,

    #[clap(long, env)]
    pub protocol_package_id: ObjectId,

    #[clap(long, env)]
    pub executor_capability_id: ObjectId,

    /// Revocation registry for the executor capability, if the deployment
    /// uses one. Absence is not fatal — the engine simply never checks it.
    #[clap(long, env)]
    pub revocation_registry_id: Option<ObjectId>,

    #[clap(long, env, default_value = "5s", value_parser = humantime::parse_duration)]
    pub poll_interval: Duration,

    /// Per-intent processing deadline for one tick (spec §5, "Each intent's
    /// processing inherits a deadline from
    /// `min(intent.expiry, engine.tickDeadline)`"). An intent closer to its
    /// own expiry than this gets the tighter of the two.
    #[clap(long, env, default_value = "2s", value_parser = humantime::parse_duration)]
    pub tick_deadline: Duration,

    /// How stale the ingestion worker's last-applied-event timestamp may
    /// get before `/health` reports not-alive (spec §4.6).
    #[clap(long, env, default_value = "30s", value_parser = humantime::parse_duration)]
    pub liveness_staleness: Duration,

    #[clap(long, env, default_value_t = 50_000_000)]
    pub max_gas_direct: u64,

    #[clap(long, env, default_value_t = 100_000_000)]
    pub max_gas_composite: u64,

    #[clap(long, env, default_value_t = 50)]
    pub slippage_bps: u32,

    /// Package id of the confidentiality policy module, if opaque intents
    /// are supported on this deployment.
    #[clap(long, env)]
    pub confidentiality_policy_package_id: Option<ObjectId>,

    #[clap(long, env, default_value = "60s", value_parser = humantime::parse_duration)]
    pub recently_executed_ttl: Duration,

    #[clap(long, env, default_value = "0.0.0.0:9589")]
    pub metrics_address: SocketAddr,
}
