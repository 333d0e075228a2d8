use {
    derive_more::{Display, From},
    enum_primitive_derive::Primitive,
    num_traits::FromPrimitive,
    serde::{Deserialize, Serialize},
    std::{collections::BTreeMap, net::SocketAddr, string::ToString, time::Duration},
};

#[derive(Clone, Debug, Display, PartialEq, Eq)]
#[display(fmt = "{}:{}", host, port)]
pub struct StringAddr {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug, Display, PartialEq, Eq, From)]
pub enum Host {
    #[display(fmt = "{}", _0)]
    A(SocketAddr),
    #[display(fmt = "{}", _0)]
    S(StringAddr),
}

impl<S> From<(S, u16)> for Host
where
    S: ToString,
{
    fn from((host, port): (S, u16)) -> Self {
        Host::S(StringAddr {
            host: host.to_string(),
            port,
        })
    }
}

/// One in-band color change inside a colored name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorEntry {
    /// Offset from the previous color change.
    pub delta_position: u32,
    pub color_value: u8,
    /// 16-bit (5-6-5) color, present for color values in the extended range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended: Option<u16>,
}

pub type ColorRun = Vec<ColorEntry>;

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Primitive, Serialize, Deserialize)]
pub enum ServerType {
    Unknown = 0,
    Listen = 1,
    Dedicated = 2,
}

impl Default for ServerType {
    fn default() -> Self {
        ServerType::Unknown
    }
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatingSystem {
    Unknown,
    Windows,
    Linux,
    Macintosh,
    #[display(fmt = "Unknown ({})", _0)]
    Other(u8),
}

impl From<u8> for OperatingSystem {
    fn from(v: u8) -> Self {
        match v {
            0 => OperatingSystem::Unknown,
            1 => OperatingSystem::Windows,
            2 => OperatingSystem::Linux,
            3 => OperatingSystem::Macintosh,
            other => OperatingSystem::Other(other),
        }
    }
}

impl Default for OperatingSystem {
    fn default() -> Self {
        OperatingSystem::Unknown
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerFlags {
    pub server_type: ServerType,
    pub password: bool,
    pub proxy: bool,
    pub os: OperatingSystem,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_md5: Option<[u8; 16]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl MapInfo {
    /// Map file checksum as a lowercase hex string.
    pub fn md5_hex(&self) -> Option<String> {
        self.file_md5.map(hex::encode)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<ServerFlags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_name_color: Option<ColorRun>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mod_info: Option<ModInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<MapInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_map: Option<MapInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_slots: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_color: Option<ColorRun>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_ping: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_loss: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u16>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerFlags {
    pub alive: bool,
    pub dead: bool,
    pub bot: bool,
    pub bomp: bool,
    pub vip: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<PlayerFlags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_color: Option<ColorRun>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub race: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frags: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kills: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deaths: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suicides: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_kills: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ping: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loss: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<u16>,
    /// Raw address bytes as sent by the server. The layout is not fixed by the protocol.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Vec<u8>>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOnFlags {
    pub active: bool,
    pub anti_cheat_tool: bool,
    pub mutator: bool,
    pub admin_tool: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOnEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<AddOnFlags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Primitive, Serialize, Deserialize)]
pub enum LimitType {
    #[display(fmt = "Time (in seconds)")]
    Time = 0,
    #[display(fmt = "Player Score")]
    PlayerScore = 1,
    Round = 2,
    #[display(fmt = "Team Score")]
    TeamScore = 3,
    Unknown = 0xFF,
}

impl LimitType {
    /// Maps a 4-bit limit type code. Codes outside the known set are `Unknown`.
    pub fn from_code(code: u8) -> Self {
        LimitType::from_u8(code).unwrap_or(LimitType::Unknown)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitEntry {
    pub kind: LimitType,
    /// Type code as sent, kept for codes outside the known set.
    pub code: u8,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<u32>,
}

/// Everything one status query returned. Sections the server did not send are `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub game_id: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_info: Option<ServerInfo>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub teams: Option<Vec<TeamEntry>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub players: Option<Vec<PlayerEntry>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<BTreeMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub addons: Option<Vec<AddOnEntry>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<Vec<LimitEntry>>,

    // Transport statistics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ping: Option<Duration>,

    #[serde(default)]
    pub packets: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::str::FromStr;

    fn fixtures() -> (Value, Status) {
        let mut status = Status {
            game_id: 7,
            ..Default::default()
        };
        status.server_info = Some(ServerInfo {
            host_name: Some("My OGP Server".into()),
            flags: Some(ServerFlags {
                server_type: ServerType::Dedicated,
                password: false,
                proxy: false,
                os: OperatingSystem::Linux,
            }),
            slot_max: Some(16),
            ..Default::default()
        });
        status.rules = Some(
            vec![("mp_timelimit".to_string(), "30".to_string())]
                .into_iter()
                .collect(),
        );
        status.limits = Some(vec![LimitEntry {
            kind: LimitType::Round,
            code: 2,
            limit: 10,
            left: None,
        }]);
        status.packets = 1;

        let ser = json!({
            "game_id": 7,
            "server_info": {
                "flags": {
                    "server_type": "Dedicated",
                    "password": false,
                    "proxy": false,
                    "os": "Linux",
                },
                "host_name": "My OGP Server",
                "slot_max": 16,
            },
            "rules": {
                "mp_timelimit": "30",
            },
            "limits": [
                { "kind": "Round", "code": 2, "limit": 10 },
            ],
            "packets": 1,
        });

        (ser, status)
    }

    #[test]
    fn serialization() {
        let (expectation, fixture) = fixtures();

        let result = serde_json::to_value(&fixture).unwrap();

        assert_eq!(expectation, result);
    }

    #[test]
    fn deserialization() {
        let (fixture, expectation) = fixtures();

        let result: Status = serde_json::from_value(fixture).unwrap();

        assert_eq!(expectation, result);
    }

    #[test]
    fn display_names() {
        assert_eq!(LimitType::from_code(0).to_string(), "Time (in seconds)");
        assert_eq!(LimitType::from_code(9).to_string(), "Unknown");
        assert_eq!(OperatingSystem::from(3).to_string(), "Macintosh");
        assert_eq!(OperatingSystem::from(5).to_string(), "Unknown (5)");
    }

    #[test]
    fn host_from_parts() {
        let addr = SocketAddr::from_str("127.0.0.1:9000").unwrap();

        assert_eq!(Host::from(addr).to_string(), "127.0.0.1:9000");
        assert_eq!(
            Host::from(("ogp.example.org", 12345)),
            Host::S(StringAddr {
                host: "ogp.example.org".into(),
                port: 12345,
            })
        );
    }

    #[test]
    fn map_md5_hex() {
        let map = MapInfo {
            file_md5: Some([0xAB; 16]),
            ..Default::default()
        };

        assert_eq!(
            map.md5_hex().unwrap(),
            "abababababababababababababababab"
        );
    }
}
