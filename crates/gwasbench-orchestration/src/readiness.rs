//! Readiness probes for background services.

use std::net::{TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use gwasbench_core::cancel::CancellationToken;
use gwasbench_core::config::Endpoint;
use gwasbench_core::constants::POLL_INTERVAL;
use gwasbench_core::error::BenchError;

use crate::process::ServiceProcess;

const CONNECT_TIMEOUT: Duration = Duration::from_millis(200);

/// How to decide that a background service is ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessProbe {
    /// Wait a fixed time, then require that the service is still alive.
    Delay(Duration),
    /// Poll until a TCP connection to the endpoint succeeds.
    Tcp { endpoint: Endpoint, timeout: Duration },
    /// Poll until a liveness file exists.
    File { path: PathBuf, timeout: Duration },
}

impl ReadinessProbe {
    /// Block until `service` is ready.
    ///
    /// Fails early if the service exits or the run is cancelled, and with
    /// [`BenchError::ReadinessTimeout`] when the bound is reached.
    pub fn await_ready(
        &self,
        service: &mut ServiceProcess,
        cancel: &CancellationToken,
    ) -> Result<Duration, BenchError> {
        let start = Instant::now();
        let (limit, delay_only) = match self {
            Self::Delay(d) => (*d, true),
            Self::Tcp { timeout, .. } | Self::File { timeout, .. } => (*timeout, false),
        };

        loop {
            cancel.check_cancelled()?;
            service.ensure_running()?;

            let waited = start.elapsed();
            if delay_only {
                if waited >= limit {
                    tracing::debug!(service = service.name(), ?waited, "fixed delay elapsed");
                    return Ok(waited);
                }
            } else if self.probe() {
                tracing::info!(service = service.name(), ?waited, "service ready");
                return Ok(waited);
            } else if waited >= limit {
                return Err(BenchError::ReadinessTimeout {
                    service: service.name().to_string(),
                    waited,
                });
            }

            let remaining = limit.saturating_sub(waited);
            std::thread::sleep(POLL_INTERVAL.min(remaining).max(Duration::from_millis(1)));
        }
    }

    /// One non-blocking check of the readiness condition.
    fn probe(&self) -> bool {
        match self {
            Self::Delay(_) => true,
            Self::Tcp { endpoint, .. } => tcp_accepts(endpoint),
            Self::File { path, .. } => path.exists(),
        }
    }
}

fn tcp_accepts(endpoint: &Endpoint) -> bool {
    let Ok(addrs) = (endpoint.hostname.as_str(), endpoint.port).to_socket_addrs() else {
        return false;
    };
    addrs
        .into_iter()
        .any(|addr| TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).is_ok())
}
