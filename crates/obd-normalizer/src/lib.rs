//! Response Normalization
//!
//! Maps decoded OBD-II values onto JSON-safe values for the output records.

mod normalizer;

pub use normalizer::{Normalizer, NO_RESPONSE};
