//! TCP reachability probe for the SOCKS proxy

use crate::{Result, RippleError};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::Instant;

/// Upper bound for a single connection attempt
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Tries one TCP connection to `address`
pub async fn is_reachable(address: &str, connect_timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(connect_timeout, TcpStream::connect(address)).await,
        Ok(Ok(_))
    )
}

/// Polls `address` until it accepts a TCP connection
///
/// # Arguments
///
/// * `address` - `host:port` of the proxy
/// * `poll_interval` - Pause between failed attempts
/// * `timeout` - Total time to keep trying
///
/// # Returns
///
/// * `Ok(Duration)` - Time spent waiting before the proxy answered
/// * `Err(RippleError::ProxyUnavailable)` - The timeout ran out
pub async fn wait_for_proxy(
    address: &str,
    poll_interval: Duration,
    timeout: Duration,
) -> Result<Duration> {
    let start = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let remaining = timeout.saturating_sub(start.elapsed());

        if is_reachable(address, CONNECT_TIMEOUT.min(remaining)).await {
            let waited = start.elapsed();
            tracing::info!(
                "Proxy at {} reachable after {} attempt(s) ({:?})",
                address,
                attempts,
                waited
            );
            return Ok(waited);
        }

        let remaining = timeout.saturating_sub(start.elapsed());
        if remaining.is_zero() {
            tracing::error!("Proxy at {} not reachable within {:?}", address, timeout);
            return Err(RippleError::ProxyUnavailable {
                address: address.to_string(),
                waited: start.elapsed(),
            });
        }

        tracing::debug!(
            "Proxy at {} not ready (attempt {}), retrying in {:?}",
            address,
            attempts,
            poll_interval
        );
        tokio::time::sleep(poll_interval.min(remaining)).await;
    }
}
