pub mod registry;
pub mod traits;

// Collaborator implementations
pub mod coingecko;
pub mod etherscan;
pub mod json_renderer;
