//! Application core: domain logic behind port traits.
//!
//! Connectivity supervision and the door controller live here. All
//! interaction with hardware and the network happens through the traits
//! in [`ports`], so this layer runs unchanged against host mocks.

pub mod connectivity;
pub mod ports;
pub mod service;
