use router_types::{Address, ObjectId};

/// A reference to an on-chain object, as returned by object lookups (spec
/// §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub id: ObjectId,
    pub version: u64,
    pub digest: String,
}

/// A handle to a value produced within an in-progress transaction: the
/// output of a coin split, a move call, or a merge. Opaque to callers other
/// than the builder that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoinHandle(pub usize);

/// An argument to a move call: an object reference, a coin produced earlier
/// in the same transaction, or a pure (BCS-encoded) value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxArg {
    Object(ObjectRef),
    Coin(CoinHandle),
    PureU64(u64),
    PureAddress(Address),
    PureBytes(Vec<u8>),
}

/// A fully-qualified move-call target: `package::module::function`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveCallTarget {
    pub package: String,
    pub module: String,
    pub function: String,
}

impl MoveCallTarget {
    pub fn new(
        package: impl Into<String>,
        module: impl Into<String>,
        function: impl Into<String>,
    ) -> Self {
        Self {
            package: package.into(),
            module: module.into(),
            function: function.into(),
        }
    }
}

/// Transaction-builder primitives the composer uses to assemble a single
/// atomic settlement (spec §6). Building is purely in-memory and
/// non-suspending (spec §5); only [`super::ChainClient::submit`] performs
/// I/O.
pub trait TxBuilder: std::fmt::Debug {
    /// Reference an existing on-chain object as a call argument.
    fn object_ref(&mut self, object: ObjectRef) -> TxArg;

    /// A `u64` integer call argument.
    fn pure_u64(&mut self, value: u64) -> TxArg;

    /// An address call argument.
    fn pure_address(&mut self, address: Address) -> TxArg;

    /// A byte-vector call argument.
    fn pure_bytes(&mut self, bytes: Vec<u8>) -> TxArg;

    /// Emit a move call, returning handles to any coins/objects it
    /// produces (in the order the on-chain function returns them).
    fn move_call(&mut self, target: MoveCallTarget, args: Vec<TxArg>) -> Vec<CoinHandle>;

    /// Split `amount` off `coin`, returning a handle to the new coin. The
    /// remainder stays addressable as `coin`.
    fn split_coin(&mut self, coin: CoinHandle, amount: u64) -> CoinHandle;

    /// Merge `others` into `into`.
    fn merge_coins(&mut self, into: CoinHandle, others: Vec<CoinHandle>);

    /// Transfer an object/coin to `recipient`.
    fn transfer(&mut self, object: CoinHandle, recipient: Address);

    /// Attach the gas budget ceiling for this transaction (spec §4.5).
    fn set_gas_budget(&mut self, budget: u64);
}
