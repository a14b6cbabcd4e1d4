pub mod counter;
pub mod periodic;
pub mod treasury;
pub mod vouch;
