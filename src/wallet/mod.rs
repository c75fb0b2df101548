// src/wallet/mod.rs

pub mod bridge;
pub mod connector;
pub mod relay;
pub mod session;
pub mod storage;

pub use connector::{AppMetadata, WalletConnector, WalletError};
pub use relay::RelayConnector;
pub use session::{SessionState, WalletSession, ACCOUNT_STORAGE_KEY};
pub use storage::SessionStore;
