use super::{
    codec::{put_flag_groups, Flag, FlagGroups},
    fields,
    header::{Header, PacketType},
};
use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};

/// Top-level sections to ask the server for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sections {
    pub server_info: bool,
    pub team_list: bool,
    pub player_list: bool,
    pub rule_list: bool,
    pub addon_list: bool,
    pub limit_list: bool,
}

impl Default for Sections {
    fn default() -> Self {
        Self {
            server_info: true,
            team_list: true,
            player_list: true,
            rule_list: true,
            addon_list: true,
            limit_list: true,
        }
    }
}

/// A query without a challenge number. Servers answer it with an error packet that carries one.
pub fn challenge_request() -> Bytes {
    let mut buf = BytesMut::new();
    Header::new(PacketType::Query).put(&mut buf);
    buf.freeze()
}

fn selected(enabled: bool, all: &[Flag]) -> FlagGroups {
    if enabled {
        FlagGroups::with_flags(all)
    } else {
        FlagGroups::new()
    }
}

/// Default query v1 asking for every known field of the selected sections.
pub fn status_request(
    challenge_number: u32,
    request_id: Option<u32>,
    sections: &Sections,
    colored_names: bool,
) -> Bytes {
    let mut header = Header::new(PacketType::Query);
    header.challenge_number = Some(challenge_number);
    header.request_id = request_id;

    let mut request = FlagGroups::new();
    for &(enabled, flag) in &[
        (sections.server_info, fields::request::SERVER_INFO),
        (sections.team_list, fields::request::TEAM_LIST),
        (sections.player_list, fields::request::PLAYER_LIST),
        (sections.rule_list, fields::request::RULE_LIST),
        (sections.addon_list, fields::request::ADDON_LIST),
        (sections.limit_list, fields::request::LIMIT_LIST),
        (colored_names, fields::request::COLORED_NAMES),
    ] {
        if enabled {
            request.set(flag);
        }
    }

    let server_info = selected(sections.server_info, fields::server_info::ALL);
    let mods = selected(server_info.has(fields::server_info::MOD), fields::mods::ALL);
    let maps = selected(server_info.has(fields::server_info::MAP), fields::maps::ALL);
    let teams = selected(sections.team_list, fields::teams::ALL);
    let players = selected(sections.player_list, fields::players::ALL);
    let addons = selected(sections.addon_list, fields::addons::ALL);

    let mut buf = BytesMut::new();
    header.put(&mut buf);
    for groups in &[request, server_info, mods, maps, teams, players, addons] {
        put_flag_groups(&mut buf, groups);
    }
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &[u8] = b"\xFF\xFF\xFF\xFFOGP\0";

    #[test]
    fn test_challenge_request() {
        let mut expectation = PREFIX.to_vec();
        expectation.extend_from_slice(&[0x03, 0x01, 0x00]);

        assert_eq!(challenge_request(), expectation);
    }

    #[test]
    fn test_status_request() {
        let mut expectation = PREFIX.to_vec();
        // header: size, type, flags (challenge number), challenge number
        expectation.extend_from_slice(&[0x07, 0x01, 0x02, 0x78, 0x56, 0x34, 0x12]);
        // request flags, colored names in the second group
        expectation.extend_from_slice(&[0xBF, 0x01]);
        // server info fields
        expectation.extend_from_slice(&[0x8F, 0x9F, 0x0F]);
        // mod, map and team fields
        expectation.extend_from_slice(&[0x1F, 0x3F, 0x3F]);
        // player fields
        expectation.extend_from_slice(&[0xBF, 0xBF, 0xBF, 0x01]);
        // add-on fields
        expectation.push(0x0F);

        let result = status_request(0x1234_5678, None, &Sections::default(), true);

        assert_eq!(result, expectation);
    }

    #[test]
    fn test_status_request_reduced() {
        let sections = Sections {
            server_info: false,
            player_list: false,
            ..Sections::default()
        };

        let mut expectation = PREFIX.to_vec();
        // request id adds four bytes and a flag
        expectation.extend_from_slice(&[0x0B, 0x01, 0x06, 0x01, 0x00, 0x00, 0x00]);
        expectation.extend_from_slice(&[0x2A, 0x00, 0x00, 0x00]);
        expectation.push(0x3A);
        // server info, mod and map fields all empty
        expectation.extend_from_slice(&[0x00, 0x00, 0x00]);
        // team fields, empty player fields, add-on fields
        expectation.extend_from_slice(&[0x3F, 0x00, 0x0F]);

        let result = status_request(1, Some(42), &sections, false);

        assert_eq!(result, expectation);
    }
}
