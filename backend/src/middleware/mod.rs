//! Request middleware shared by both services.

pub mod trace;

pub use trace::Trace;
