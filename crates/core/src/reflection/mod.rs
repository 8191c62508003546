//! Specular reflections by the image-receiver method
//!
//! The receiver is mirrored across every wall it can see, then each image is mirrored
//! again across the walls its visibility cone reaches, up to the reflection order. A source
//! seen by an image through the image's wall gives a reflection path once the chain is
//! unfolded back into world space and validated.

pub mod enumerator;
pub mod mirror;

pub use enumerator::MirrorReceiversCompute;
pub use mirror::{ChainKey, IntersectionKind, MirrorArena, MirrorReceiver};
