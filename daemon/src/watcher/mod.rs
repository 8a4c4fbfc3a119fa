//! Session detection and the poll loop that drives it.

pub mod poller;
pub mod session_tracker;

pub use poller::Poller;
pub use session_tracker::SessionRecord;
