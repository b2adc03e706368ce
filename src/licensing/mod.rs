// Site visibility / license gate
// Resolves whether the site renders, shows the offline screen, or keeps loading

pub mod types;
pub mod config;
pub mod api;
pub mod manager;
pub mod store;
pub mod poller;
pub mod gate;

#[cfg(test)]
pub(crate) mod testing;

pub use types::*;
pub use config::{Endpoints, GateConfig};
pub use gate::Gate;
pub use manager::Resolver;
pub use poller::{start_polling, PollHandle};
pub use store::DecisionStore;
