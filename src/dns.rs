use crate::{
    errors::{Error, Result},
    models::Host,
};
use std::net::{IpAddr, SocketAddr};
use tracing::debug;
use trust_dns_resolver::TokioAsyncResolver;

/// Turns a host into a socket address. IP literals are not looked up.
pub async fn resolve(host: &Host) -> Result<SocketAddr> {
    let stringaddr = match host {
        Host::A(addr) => return Ok(*addr),
        Host::S(stringaddr) => stringaddr,
    };

    if let Ok(ip) = stringaddr.host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, stringaddr.port));
    }

    let resolve_failed = |reason: String| Error::ResolveFailed {
        host: stringaddr.host.clone(),
        reason,
    };

    let resolver =
        TokioAsyncResolver::tokio_from_system_conf().map_err(|e| resolve_failed(e.to_string()))?;
    debug!("Looking up {}", stringaddr.host);
    let response = resolver
        .lookup_ip(stringaddr.host.as_str())
        .await
        .map_err(|e| resolve_failed(e.to_string()))?;

    response
        .iter()
        .next()
        .map(|ip| SocketAddr::new(ip, stringaddr.port))
        .ok_or_else(|| resolve_failed("no addresses".into()))
}
