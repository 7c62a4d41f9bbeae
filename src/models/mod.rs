pub mod claim;
pub mod session;
