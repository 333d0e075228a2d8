use super::header::Framing;
use crate::errors::{Error, Result};
use bytes::{Bytes, BytesMut};
use std::{
    collections::BTreeMap,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};
use tokio::{
    net::UdpSocket,
    time::{self, Instant},
};
use tracing::{debug, trace, warn};

const MAX_DATAGRAM_SIZE: usize = 65_535;

/// One logical response, reassembled from one or more datagrams.
#[derive(Clone, Debug)]
pub struct Response {
    pub data: Bytes,
    pub packets: usize,
    pub elapsed: Duration,
}

#[derive(Clone, Debug)]
struct Fragment {
    data: Bytes,
    header_len: usize,
}

/// Collects the datagrams of one response until it is complete.
#[derive(Debug, Default)]
pub struct SplitCollector {
    expected: Option<u8>,
    fragments: BTreeMap<u8, Fragment>,
    sole: Option<Bytes>,
    received: usize,
}

impl SplitCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of datagrams pushed so far, dropped ones included.
    pub fn received(&self) -> usize {
        self.received
    }

    pub fn is_complete(&self) -> bool {
        self.sole.is_some()
            || self
                .expected
                .map_or(false, |count| self.fragments.len() >= usize::from(count))
    }

    /// Accepts one datagram and reports whether the response is complete.
    pub fn push(&mut self, datagram: Bytes) -> Result<bool> {
        self.received += 1;
        let framing = Framing::peek(&datagram)?;

        let split = match framing.split {
            None => {
                if !self.fragments.is_empty() {
                    debug!(
                        "Unsplit packet replaces {} collected fragments",
                        self.fragments.len()
                    );
                    self.fragments.clear();
                }
                self.sole = Some(datagram);
                return Ok(true);
            }
            Some(split) => split,
        };

        let count = split.count.max(1);
        let expected = *self.expected.get_or_insert(count);
        if count != expected {
            warn!(
                "Dropping fragment {} announcing {} packets, expected {}",
                split.number, count, expected
            );
            return Ok(self.is_complete());
        }
        if split.number >= expected {
            warn!(
                "Dropping fragment {} out of range for {} packets",
                split.number, expected
            );
            return Ok(self.is_complete());
        }

        self.fragments.insert(
            split.number,
            Fragment {
                data: datagram,
                header_len: framing.header_len,
            },
        );

        Ok(self.is_complete())
    }

    /// Joins the fragments in split order. Only the first fragment keeps its header.
    pub fn reassemble(self) -> Result<Bytes> {
        if let Some(sole) = self.sole {
            return Ok(sole);
        }
        if !self.is_complete() {
            return Err(Error::UnexpectedEndOfData);
        }

        let mut out = BytesMut::new();
        for (number, fragment) in self.fragments {
            if number == 0 {
                out.extend_from_slice(&fragment.data);
            } else {
                out.extend_from_slice(&fragment.data[fragment.header_len..]);
            }
        }

        Ok(out.freeze())
    }
}

/// Sends `command` to `addr` and waits for the complete answer.
///
/// Each read waits at most `read_timeout`; the whole exchange is abandoned once `timeout`
/// has passed since the request was sent.
pub async fn send_and_receive(
    command: &[u8],
    addr: SocketAddr,
    timeout: Duration,
    read_timeout: Duration,
) -> Result<Response> {
    let local: SocketAddr = if addr.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    let connect_failed = |e| Error::ConnectFailed {
        addr,
        source: Arc::new(e),
    };
    let sock = UdpSocket::bind(local).await.map_err(connect_failed)?;
    sock.connect(addr).await.map_err(connect_failed)?;

    trace!("Sending data to {}: {:?}", addr, command);
    sock.send(command).await.map_err(|e| Error::SendFailed {
        source: Arc::new(e),
    })?;

    let started = Instant::now();
    let mut collector = SplitCollector::new();
    let mut buf = vec![0; MAX_DATAGRAM_SIZE];
    loop {
        let elapsed = started.elapsed();
        if elapsed >= timeout {
            debug!(
                "Timed out waiting for {} after {} packets",
                addr,
                collector.received()
            );
            return Err(Error::TimedOut(timeout));
        }

        let wait = read_timeout.min(timeout - elapsed);
        let len = match time::timeout(wait, sock.recv(&mut buf)).await {
            Ok(Ok(len)) => len,
            Ok(Err(e)) => {
                return Err(Error::ReceiveFailed {
                    source: Arc::new(e),
                })
            }
            Err(_) => continue,
        };

        let datagram = Bytes::copy_from_slice(&buf[..len]);
        trace!("Received data from {}: {:?}", addr, datagram);

        if collector.push(datagram)? {
            break;
        }
    }

    let packets = collector.received();
    let data = collector.reassemble()?;

    Ok(Response {
        data,
        packets,
        elapsed: started.elapsed(),
    })
}
