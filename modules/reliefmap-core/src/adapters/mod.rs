//! Production implementations of the collaborator traits.

mod corroboration;
mod geocoder;
mod oracle;

pub use corroboration::{NoCorroboration, TwitterCorroboration};
pub use geocoder::{GoogleGeocoder, NominatimGeocoder};
pub use oracle::GeminiOracle;
