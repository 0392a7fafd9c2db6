//! Configuration: typed options, the deep merge, and attribute-derived
//! option maps.

mod attrs;
mod merge;
mod options;

pub use attrs::options_from;
pub(crate) use attrs::is_marked;
pub use merge::{deep_merge, merge};
pub use options::{CollectSource, Config, SyncPolicy};
