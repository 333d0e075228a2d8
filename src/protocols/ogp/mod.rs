//! Online Game Protocol (OGP) query client.
//!
//! A query is a two-step exchange: a challenge request, answered with an error packet that
//! carries the challenge number, then the status query echoing that number.

pub mod codec;
pub mod fields;
pub mod header;
pub mod request;
pub mod schema;
pub mod transport;

pub use self::request::Sections;

use self::{
    header::{parse_packet, PacketType},
    transport::{send_and_receive, Response},
};
use crate::{
    dns,
    errors::{Error, Result},
    models::{Host, Status},
};
use derive_more::Display;
use enum_primitive_derive::Primitive;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, time::Duration};
use tracing::{debug, trace, warn};

/// Query settings. Durations are given in milliseconds when deserialized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Total time allowed for one exchange.
    #[serde(with = "millis")]
    pub timeout: Duration,
    /// Time allowed for a single read.
    #[serde(with = "millis")]
    pub read_timeout: Duration,
    pub colored_names: bool,
    /// Attach a random request id. Answers that drop or alter it are rejected.
    pub request_id: bool,
    pub sections: Sections,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(2),
            colored_names: true,
            request_id: false,
            sections: Sections::default(),
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(v: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(v.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[derive(Clone, Debug)]
pub enum Phase {
    NoChallenge,
    HasChallenge,
    Completed,
    Failed(Error),
}

#[derive(Clone, Copy, Debug, Display, Primitive)]
enum ServerErrorKind {
    #[display(fmt = "Banned")]
    Banned = 0,
    #[display(fmt = "Invalid Type: The query type in header is unknown")]
    InvalidType = 1,
    #[display(fmt = "Invalid Value: Any value in header is incorrect")]
    InvalidValue = 2,
    #[display(fmt = "Invalid Challenge Number: The challenge number is incorrect")]
    InvalidChallengeNumber = 3,
    #[display(fmt = "Invalid Query: The query body is incorrect")]
    InvalidQuery = 4,
}

/// Human readable text for an error id sent by the server.
pub fn server_error_message(id: u8) -> String {
    match ServerErrorKind::from_u8(id) {
        Some(kind) => format!("{} - {}", id, kind),
        None => format!("{} - Unknown", id),
    }
}

/// Query state for one server. The challenge number survives failed queries.
#[derive(Debug)]
pub struct Session {
    host: Host,
    config: Config,
    addr: Option<SocketAddr>,
    phase: Phase,
    challenge_number: Option<u32>,
    sent_request_id: Option<u32>,
    request_id: Option<u32>,
    last_error: Option<Error>,
}

impl Session {
    pub fn new<H: Into<Host>>(host: H, config: Config) -> Self {
        Self {
            host: host.into(),
            config,
            addr: None,
            phase: Phase::NoChallenge,
            challenge_number: None,
            sent_request_id: None,
            request_id: None,
            last_error: None,
        }
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn challenge_number(&self) -> Option<u32> {
        self.challenge_number
    }

    /// Request id carried by the last status answer, if the server set one.
    pub fn request_id(&self) -> Option<u32> {
        self.request_id
    }

    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    async fn addr(&mut self) -> Result<SocketAddr> {
        if let Some(addr) = self.addr {
            return Ok(addr);
        }

        let addr = dns::resolve(&self.host).await?;
        debug!("Resolved {} to {}", self.host, addr);
        self.addr = Some(addr);
        Ok(addr)
    }

    async fn exchange(&mut self, command: &[u8]) -> Result<Response> {
        let addr = self.addr().await?;
        send_and_receive(command, addr, self.config.timeout, self.config.read_timeout).await
    }

    fn fail(&mut self, e: Error) -> Error {
        warn!("Query to {} failed: {}", self.host, e);
        self.phase = Phase::Failed(e.clone());
        self.last_error = Some(e.clone());
        e
    }

    /// Asks the server for a fresh challenge number and stores it.
    ///
    /// A failed handshake is kept in `last_error` only. The phase goes back to `NoChallenge`,
    /// or `HasChallenge` when an earlier challenge number is still held.
    pub async fn request_challenge(&mut self) -> Result<u32> {
        match self.fetch_challenge().await {
            Ok(challenge_number) => {
                debug!("Got challenge number {:#010X} from {}", challenge_number, self.host);
                self.challenge_number = Some(challenge_number);
                self.phase = Phase::HasChallenge;
                Ok(challenge_number)
            }
            Err(e) => {
                warn!("Challenge request to {} failed: {}", self.host, e);
                self.phase = match self.challenge_number {
                    Some(_) => Phase::HasChallenge,
                    None => Phase::NoChallenge,
                };
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    async fn fetch_challenge(&mut self) -> Result<u32> {
        let response = self.exchange(&request::challenge_request()).await?;
        parse_challenge(&response.data)
    }

    /// Runs a status query, requesting a challenge first if none is held.
    pub async fn query_status(&mut self) -> Result<Status> {
        self.sent_request_id = None;
        self.request_id = None;
        self.last_error = None;

        if self.challenge_number.is_none() {
            self.request_challenge().await?;
        }
        let challenge_number = match self.challenge_number {
            Some(v) => v,
            None => return Err(self.fail(Error::NoChallengeNumber)),
        };

        self.sent_request_id = if self.config.request_id {
            Some(rand::random())
        } else {
            None
        };
        let command = request::status_request(
            challenge_number,
            self.sent_request_id,
            &self.config.sections,
            self.config.colored_names,
        );

        match self.fetch_status(&command).await {
            Ok(status) => {
                debug!(
                    "Status of {} received in {} packets",
                    self.host, status.packets
                );
                self.phase = Phase::Completed;
                Ok(status)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn fetch_status(&mut self, command: &[u8]) -> Result<Status> {
        let response = self.exchange(command).await?;
        let mut status = self.parse_status(&response.data)?;
        status.ping = Some(response.elapsed);
        status.packets = response.packets;

        Ok(status)
    }

    fn parse_status(&mut self, data: &[u8]) -> Result<Status> {
        let (header, body) = parse_packet(data)?;
        trace!("Status header from {}: {:?}", self.host, header);

        match PacketType::from_u8(header.packet_type) {
            Some(PacketType::Query) => {}
            Some(PacketType::ErrorReply) => {
                if let Some(challenge_number) = header.challenge_number {
                    self.challenge_number = Some(challenge_number);
                }
                let id = *body.first().ok_or(Error::UnexpectedEndOfData)?;
                return Err(Error::ServerError {
                    id,
                    message: server_error_message(id),
                });
            }
            None => return Err(Error::UnexpectedResponseType(header.packet_type)),
        }

        if !header.is_answer() {
            return Err(Error::UnexpectedHeaderFlags("answer bit not set"));
        }
        if let Some(challenge_number) = header.challenge_number {
            self.challenge_number = Some(challenge_number);
        }
        self.request_id = header.request_id;
        match (self.sent_request_id, header.request_id) {
            (Some(sent), Some(received)) if sent != received => {
                return Err(Error::RequestIdMismatch { sent, received });
            }
            (Some(_), None) => {
                return Err(Error::UnexpectedHeaderFlags("request id not echoed"));
            }
            _ => {}
        }
        if let Some(split) = header.split {
            if split.number != 0 {
                return Err(Error::UnexpectedHeaderFlags(
                    "reassembled packet does not start with split number 0",
                ));
            }
        }

        schema::decode(body)
    }
}

fn parse_challenge(data: &[u8]) -> Result<u32> {
    let (header, _) = parse_packet(data)?;
    if header.packet_type != PacketType::ErrorReply as u8 {
        return Err(Error::UnexpectedResponseType(header.packet_type));
    }
    if !header.is_answer() {
        return Err(Error::UnexpectedHeaderFlags("answer bit not set"));
    }

    header
        .challenge_number
        .ok_or(Error::UnexpectedHeaderFlags("challenge number not set"))
}
