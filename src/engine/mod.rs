//! Deterministic execution engine: seeded randomness threaded explicitly
//! through every stochastic operation.

pub mod rng;

pub use rng::StockRng;
