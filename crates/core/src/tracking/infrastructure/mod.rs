pub mod mosse_tracker;
pub mod redetect_tracker;
pub mod tracker_factory;
