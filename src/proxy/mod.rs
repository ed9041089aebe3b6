//! Proxy connectivity and Tor identity control
//!
//! - `probe`: wait until the SOCKS proxy accepts TCP connections
//! - `control`: ask the Tor control port for a new circuit

mod control;
mod probe;

pub use control::{IdentityRotator, TorControl};
pub use probe::{is_reachable, wait_for_proxy, CONNECT_TIMEOUT};
