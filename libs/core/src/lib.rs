//! botbridge core contracts and value types.
//!
//! This crate exposes the canonical [`Activity`] envelope exchanged between channel adapters and
//! bot logic, the per-turn [`TurnContext`], the middleware pipeline that runs a turn, and the
//! [`Storage`] contract implemented by the storage providers.
pub mod activity;
pub mod adapter;
pub mod body;
pub mod error;
pub mod markup;
pub mod middleware;
pub mod storage;
pub mod turn;

pub use activity::*;
pub use adapter::*;
pub use body::*;
pub use error::*;
pub use middleware::*;
pub use storage::*;
pub use turn::*;
