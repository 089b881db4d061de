pub mod client;
pub mod error;
pub mod token;

pub use client::AmadeusClient;
pub use error::AmadeusError;
pub use token::{ClientCredentials, TokenCache, TokenFetcher, TokenGrant};
