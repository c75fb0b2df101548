// src/blockchain/mod.rs

pub mod enrichment;
pub mod models;

pub use enrichment::{EnrichmentClient, TransactionEnricher};
pub use models::{
    AccountId, ExecutionResult, HederaNetwork, TransactionBytes, TransactionError,
    TransactionPayload,
};
