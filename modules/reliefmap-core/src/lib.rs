pub mod adapters;
pub mod dedup;
pub mod help;
pub mod store;
pub mod traits;
pub mod trust;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use dedup::{DeduplicationEngine, EngineSettings, IngestOutcome};
pub use help::HelpMatcher;
pub use store::{MemoryStore, PgStore};
pub use traits::{
    CorroborationSearch, EventOracle, EventStore, HelpOfferStore, HelpOracle, LocationResolver,
};
