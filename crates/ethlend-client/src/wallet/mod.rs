//! Wallet access
//!
//! - [`provider`]: the wallet capability and raw RPC transport traits
//! - [`rpc`]: EIP-1193 style JSON-RPC wallet endpoint
//! - [`connector`]: account-access handshake producing a [`connector::Session`]

pub mod connector;
pub mod provider;
pub mod rpc;
