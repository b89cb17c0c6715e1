//! Domain rules live here as explicit functions called by the mutating
//! handlers, instead of implicit persistence-lifecycle hooks. Identity is
//! always an explicit parameter.

pub mod catalog;
pub mod notify;
pub mod orders;
pub mod payments;
pub mod reviews;
