//! Registrable-domain parsing.
//!
//! Splits hostnames into a mid-level domain and a public suffix using a
//! line-oriented public-suffix reference (standard PSL format).

mod noise;
mod public_suffix;

pub use noise::NoiseDomains;
pub use public_suffix::{hostname_of, PublicSuffixList, RegistrableDomain};
