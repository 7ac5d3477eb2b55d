//! Network collaborators: aggregator quote API, ledger RPC, backoff policy

pub mod backoff;
pub mod interfaces;
pub mod quote_client;
pub mod rpc_client;

pub use backoff::*;
pub use interfaces::*;
pub use quote_client::*;
pub use rpc_client::*;
