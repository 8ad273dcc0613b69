//! Application Layer
//!
//! The application layer orchestrates domain logic around the ports. It
//! defines:
//!
//! - **Ports**: interfaces for the data service's record endpoints
//! - **Store**: the synchronized record collection and its mutation rules
//! - **Services**: long-running feed projection tasks

pub mod ports;
pub mod services;
pub mod store;

pub use ports::*;
pub use services::*;
pub use store::*;
