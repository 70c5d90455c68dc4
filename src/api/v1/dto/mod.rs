pub mod me;
pub mod permissions;
