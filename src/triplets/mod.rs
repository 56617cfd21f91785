//! Skip-gram triplets and their extraction from token sequences.
mod triplet;
mod window;

pub use triplet::SgnsTriplet;
pub use window::WindowExtractor;
