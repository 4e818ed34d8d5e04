mod assembler;
mod sink;

pub use assembler::{assemble, FeedSettings};
pub use sink::{to_channel, FeedSink, FileSink};
