// src/gateway/mod.rs
//! Chat platform boundary: signature checks plus reply and push delivery.

pub mod line;
pub mod signature;

use async_trait::async_trait;

use crate::error::Result;

pub use line::LineGateway;
pub use signature::{sign, verify_signature};

#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Whether `signature` authenticates the raw webhook `body`.
    fn verify(&self, signature: &str, body: &[u8]) -> bool;
    /// Answer an inbound event. A reply token is single use.
    async fn reply(&self, reply_token: &str, text: &str) -> Result<()>;
    /// Unsolicited message to a user; may be called any number of times.
    async fn push(&self, to: &str, text: &str) -> Result<()>;
}
