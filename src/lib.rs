pub mod cantilever;
pub mod error;
pub mod session;
pub mod study;
