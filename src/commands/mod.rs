pub mod info;
pub mod preview;
pub mod remove;
pub mod select;
