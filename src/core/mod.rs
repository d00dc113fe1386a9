//! Core application primitives (coordinator, scheduler, runtime, status server)

pub mod coordinator;
pub mod error;
pub mod http;
pub mod runtime;
pub mod scheduler;

pub use coordinator::*;
pub use error::*;
pub use http::*;
pub use runtime::*;
pub use scheduler::*;
