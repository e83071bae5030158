pub mod decision;
pub mod mirrored_issue;
pub mod tracked_item;
