pub mod feed;
pub mod fingerprint;
pub mod item;

pub use feed::{FeedDescriptor, HashingOptions};
pub use fingerprint::fingerprint;
pub use item::Item;
