mod category;
mod feed;
mod offer;

pub use category::{Category, OfferType};
pub use feed::{Author, Feed, FeedEntry};
pub use offer::OfferRecord;
