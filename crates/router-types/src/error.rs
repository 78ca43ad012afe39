use thiserror::Error;

/// The router's full error taxonomy (spec §7). Every other component's
/// error type converts into this one at the boundary the engine observes,
/// so the tick loop can categorize every outcome with a single `match`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// Pricing kernel input was degenerate (zero denominator, overflow).
    /// Never swallowed — surfaced all the way to the caller.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A venue adapter could not produce a quote (missing SDK, network
    /// fault, insufficient depth). Treated as "no liquidity" by the router.
    #[error("venue unavailable: {0}")]
    VenueUnavailable(String),

    /// No combination of native and external liquidity could satisfy the
    /// search. A regular, non-error outcome from the caller's perspective.
    #[error("no route satisfies the requested constraints")]
    NoRoute,

    /// A route was found but violates the intent's price or budget bounds.
    #[error("route violates intent constraints: {0}")]
    RouteConstraintViolation(String),

    /// The confidentiality collaborator could not decrypt an opaque intent,
    /// or its session credential expired.
    #[error("confidentiality miss: {0}")]
    ConfidentialityMiss(String),

    /// Event subscription or polling hit a transient fault; retried with
    /// backoff by the ingestion worker.
    #[error("event ingestion transient error: {0}")]
    EventIngestionTransient(String),

    /// An event of unrecognized shape was received and skipped.
    #[error("malformed event: {0}")]
    EventMalformed(String),

    /// The chain rejected a submitted transaction. Counted as a failure;
    /// not retried automatically.
    #[error("submission failed: {0}")]
    SubmissionFailed(String),

    /// Startup configuration was invalid (missing executor capability, bad
    /// package id). The only variant that aborts the engine instead of
    /// being absorbed into metrics.
    #[error("fatal configuration error: {0}")]
    FatalConfig(String),
}

impl RouterError {
    /// Whether this error should abort the engine's startup rather than be
    /// recorded and continued past (spec §7, "Propagation policy").
    pub fn is_fatal(&self) -> bool {
        matches!(self, RouterError::FatalConfig(_))
    }
}

pub type RouterResult<T> = Result<T, RouterError>;
