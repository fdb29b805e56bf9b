//! Collection state: the catalog joined with the user's status flags.
//!
//! - `merge_status`: pure join of catalog and status map
//! - `Tracker`: the context object that owns the live collection and
//!   persists every status change before committing it
//! - `Filter`, `Stats`: view helpers over a merged collection

pub mod filter;
pub mod merge;
pub mod tracker;

pub use filter::{unique_game_series, unique_types, Filter, Stats};
pub use merge::merge_status;
pub use tracker::{Tracker, TrackerError, ViewMode};
