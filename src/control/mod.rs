//! Control surface: HTTP request model, payload parsing, route dispatch,
//! and the bridge that carries requests from the HTTP task to the control
//! loop.

pub mod bridge;
pub mod payload;
pub mod request;
pub mod router;

pub use bridge::RequestBridge;
pub use request::{ControlRequest, HttpResponse, Method};
pub use router::{Routed, dispatch};
