pub mod id;
pub mod offering;
#[cfg(feature = "sea-orm")]
pub mod upsert;

pub use id::WideId;
pub use offering::OfferingKey;
