//! Decoder for the body of a default query v1 answer.
//!
//! Every section, and every field inside a section, is preceded by the flag groups that say
//! whether it was sent. List sections transmit one set of field groups shared by all entries.

use super::{
    codec::{color_run, cstring, flag_groups, md5, var_sint, var_uint, FlagGroups},
    fields,
};
use crate::{errors::Result, models::*};
use nom::{
    combinator::{cond, map},
    error::{Error as NomError, ErrorKind},
    multi::length_data,
    number::complete::{le_u16, le_u32},
    sequence::pair,
    IResult,
};
use num_traits::FromPrimitive;
use std::collections::BTreeMap;
use tracing::trace;

// Entries that occupy no bytes at all, i.e. lists without any fields.
const MAX_EMPTY_ENTRIES: usize = 1024;
const MAX_PREALLOC: usize = 256;

/// Decodes a status answer body.
pub fn decode(body: &[u8]) -> Result<Status> {
    let (rest, status) = status(body)?;
    if !rest.is_empty() {
        trace!("Ignoring {} trailing bytes", rest.len());
    }

    Ok(status)
}

fn status(input: &[u8]) -> IResult<&[u8], Status> {
    use fields::request::*;

    let (input, game_id) = le_u16(input)?;
    let (input, request) = flag_groups(input)?;
    let colored = request.has(COLORED_NAMES);

    let (input, server_info) = cond(request.has(SERVER_INFO), |i| server_info(i, colored))(input)?;
    let (input, teams) = cond(request.has(TEAM_LIST), |i| team_list(i, colored))(input)?;
    let (input, players) = cond(request.has(PLAYER_LIST), |i| player_list(i, colored))(input)?;
    let (input, rules) = cond(request.has(RULE_LIST), rule_list)(input)?;
    let (input, addons) = cond(request.has(ADDON_LIST), addon_list)(input)?;
    let (input, limits) = cond(request.has(LIMIT_LIST), limit_list)(input)?;

    Ok((
        input,
        Status {
            game_id,
            server_info,
            teams,
            players,
            rules,
            addons,
            limits,
            ..Default::default()
        },
    ))
}

/// Reads `count` entries. An announced count that only yields empty entries is cut off.
fn entries<'a, O, F>(mut input: &'a [u8], count: u32, mut entry: F) -> IResult<&'a [u8], Vec<O>>
where
    F: FnMut(&'a [u8]) -> IResult<&'a [u8], O>,
{
    let mut out = Vec::with_capacity((count as usize).min(MAX_PREALLOC));
    for _ in 0..count {
        let (rest, item) = entry(input)?;
        if rest.len() == input.len() && out.len() >= MAX_EMPTY_ENTRIES {
            return Err(nom::Err::Error(NomError::new(input, ErrorKind::TooLarge)));
        }
        input = rest;
        out.push(item);
    }

    Ok((input, out))
}

fn server_flags(input: &[u8]) -> IResult<&[u8], ServerFlags> {
    use fields::server_flags::*;

    map(flag_groups, |flags| ServerFlags {
        server_type: ServerType::from_u8(flags.bits(0, SERVER_TYPE)).unwrap_or_default(),
        password: flags.has(PASSWORD),
        proxy: flags.has(PROXY),
        os: OperatingSystem::from(flags.bits(0, OPERATING_SYSTEM)),
    })(input)
}

/// An empty mod name ends the block: no field groups follow it.
fn mod_info(input: &[u8]) -> IResult<&[u8], ModInfo> {
    use fields::mods::*;

    let (input, name) = cstring(input)?;
    if name.is_empty() {
        return Ok((input, ModInfo::default()));
    }

    let (input, fields) = flag_groups(input)?;
    let (input, identifier) = cond(fields.has(IDENTIFIER), cstring)(input)?;
    let (input, size) = cond(fields.has(SIZE), le_u32)(input)?;
    let (input, version) = cond(fields.has(VERSION), cstring)(input)?;
    let (input, url) = cond(fields.has(URL), cstring)(input)?;
    let (input, author) = cond(fields.has(AUTHOR), cstring)(input)?;

    let identifier = identifier.map(|identifier| {
        if identifier.is_empty() {
            name.clone()
        } else {
            identifier
        }
    });

    Ok((
        input,
        ModInfo {
            name,
            identifier,
            size,
            version,
            url,
            author,
        },
    ))
}

fn map_info<'a>(input: &'a [u8], fields: &FlagGroups) -> IResult<&'a [u8], MapInfo> {
    use fields::maps::*;

    let (input, name) = cstring(input)?;
    let (input, file_name) = cond(fields.has(FILE_NAME), cstring)(input)?;
    let (input, file_size) = cond(fields.has(FILE_SIZE), le_u32)(input)?;
    let (input, file_md5) = cond(fields.has(FILE_MD5), md5)(input)?;
    let (input, version) = cond(fields.has(VERSION), cstring)(input)?;
    let (input, url) = cond(fields.has(URL), cstring)(input)?;
    let (input, author) = cond(fields.has(AUTHOR), cstring)(input)?;

    Ok((
        input,
        MapInfo {
            name,
            file_name,
            file_size,
            file_md5,
            version,
            url,
            author,
        },
    ))
}

fn server_info(input: &[u8], colored: bool) -> IResult<&[u8], ServerInfo> {
    use fields::server_info::*;

    let (input, fields) = flag_groups(input)?;

    let (input, game_name) = cond(fields.has(GAME_NAME), cstring)(input)?;
    let (input, flags) = cond(fields.has(SERVER_FLAGS), server_flags)(input)?;
    let (input, host_name) = cond(fields.has(HOST_NAME), cstring)(input)?;
    let (input, host_name_color) = cond(fields.has(HOST_NAME) && colored, color_run)(input)?;
    let (input, connect_port) = cond(fields.has(CONNECT_PORT), le_u16)(input)?;

    let (input, mod_info) = cond(fields.has(MOD), mod_info)(input)?;
    let (input, game_type) = cond(fields.has(GAME_TYPE), cstring)(input)?;
    let (input, game_mode) = cond(fields.has(GAME_MODE), cstring)(input)?;

    // The next map shares the field groups of the current one.
    let has_map = fields.has(MAP);
    let (input, map_fields) = cond(has_map, flag_groups)(input)?;
    let map_fields = map_fields.unwrap_or_default();
    let (input, current_map) = cond(has_map, |i| map_info(i, &map_fields))(input)?;
    let (input, next_map) = cond(has_map && fields.has(NEXT_MAP), |i| {
        map_info(i, &map_fields)
    })(input)?;

    let (input, player_count) = cond(fields.has(PLAYER_COUNT), var_uint)(input)?;
    let (input, slot_max) = cond(fields.has(SLOT_MAX), var_uint)(input)?;
    let (input, bot_count) = cond(fields.has(BOT_COUNT), var_uint)(input)?;
    let (input, reserved_slots) = cond(fields.has(RESERVED_SLOTS), var_uint)(input)?;

    Ok((
        input,
        ServerInfo {
            game_name,
            flags,
            host_name,
            host_name_color,
            connect_port,
            mod_info,
            game_type,
            game_mode,
            map: current_map,
            next_map,
            player_count,
            slot_max,
            bot_count,
            reserved_slots,
        },
    ))
}

fn team_entry<'a>(
    input: &'a [u8],
    fields: &FlagGroups,
    colored: bool,
) -> IResult<&'a [u8], TeamEntry> {
    use fields::teams::*;

    let (input, name) = cond(fields.has(NAME), cstring)(input)?;
    let (input, name_color) = cond(fields.has(NAME) && colored, color_run)(input)?;
    let (input, score) = cond(fields.has(SCORE), var_sint)(input)?;
    let (input, average_ping) = cond(fields.has(AVERAGE_PING), le_u16)(input)?;
    let (input, average_loss) = cond(fields.has(AVERAGE_LOSS), le_u16)(input)?;
    let (input, player_count) = cond(fields.has(PLAYER_COUNT), var_uint)(input)?;
    let (input, color) = cond(fields.has(COLOR), le_u16)(input)?;

    Ok((
        input,
        TeamEntry {
            name,
            name_color,
            score,
            average_ping,
            average_loss,
            player_count,
            color,
        },
    ))
}

fn team_list(input: &[u8], colored: bool) -> IResult<&[u8], Vec<TeamEntry>> {
    let (input, count) = var_uint(input)?;
    if count == 0 {
        return Ok((input, Vec::new()));
    }

    let (input, fields) = flag_groups(input)?;
    entries(input, count, |i| team_entry(i, &fields, colored))
}

fn player_flags(input: &[u8]) -> IResult<&[u8], PlayerFlags> {
    use fields::player_flags::*;

    map(flag_groups, |flags| PlayerFlags {
        alive: flags.has(ALIVE),
        dead: flags.has(DEAD),
        bot: flags.has(BOT),
        bomp: flags.has(BOMP),
        vip: flags.has(VIP),
    })(input)
}

fn address(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    map(length_data(var_uint), |raw: &[u8]| raw.to_vec())(input)
}

fn player_entry<'a>(
    input: &'a [u8],
    fields: &FlagGroups,
    colored: bool,
) -> IResult<&'a [u8], PlayerEntry> {
    use fields::players::*;

    let (input, flags) = cond(fields.has(FLAGS), player_flags)(input)?;
    let (input, slot) = cond(fields.has(SLOT), var_uint)(input)?;
    let (input, name) = cond(fields.has(NAME), cstring)(input)?;
    let (input, name_color) = cond(fields.has(NAME) && colored, color_run)(input)?;
    let (input, team) = cond(fields.has(TEAM), var_sint)(input)?;
    let (input, class) = cond(fields.has(CLASS), cstring)(input)?;
    let (input, race) = cond(fields.has(RACE), cstring)(input)?;

    let (input, score) = cond(fields.has(SCORE), var_sint)(input)?;
    let (input, frags) = cond(fields.has(FRAGS), var_sint)(input)?;
    let (input, kills) = cond(fields.has(KILLS), var_uint)(input)?;
    let (input, deaths) = cond(fields.has(DEATHS), var_uint)(input)?;
    let (input, suicides) = cond(fields.has(SUICIDES), var_uint)(input)?;
    let (input, team_kills) = cond(fields.has(TEAM_KILLS), var_uint)(input)?;

    let (input, id) = cond(fields.has(ID), le_u32)(input)?;
    let (input, global_id) = cond(fields.has(GLOBAL_ID), cstring)(input)?;
    let (input, ping) = cond(fields.has(PING), le_u16)(input)?;
    let (input, loss) = cond(fields.has(LOSS), le_u16)(input)?;
    let (input, model) = cond(fields.has(MODEL), cstring)(input)?;
    let (input, time) = cond(fields.has(TIME), le_u16)(input)?;

    let (input, address) = cond(fields.has(ADDRESS), address)(input)?;

    Ok((
        input,
        PlayerEntry {
            flags,
            slot,
            name,
            name_color,
            team,
            class,
            race,
            score,
            frags,
            kills,
            deaths,
            suicides,
            team_kills,
            id,
            global_id,
            ping,
            loss,
            model,
            time,
            address,
        },
    ))
}

fn player_list(input: &[u8], colored: bool) -> IResult<&[u8], Vec<PlayerEntry>> {
    let (input, count) = var_uint(input)?;
    if count == 0 {
        return Ok((input, Vec::new()));
    }

    let (input, fields) = flag_groups(input)?;
    entries(input, count, |i| player_entry(i, &fields, colored))
}

/// Later duplicates of a key overwrite earlier ones.
fn rule_list(input: &[u8]) -> IResult<&[u8], BTreeMap<String, String>> {
    let (input, count) = var_uint(input)?;
    let (input, rules) = entries(input, count, pair(cstring, cstring))?;

    Ok((input, rules.into_iter().collect()))
}

fn addon_flags(input: &[u8]) -> IResult<&[u8], AddOnFlags> {
    use fields::addon_flags::*;

    map(flag_groups, |flags| AddOnFlags {
        active: flags.has(ACTIVE),
        anti_cheat_tool: flags.has(ANTI_CHEAT_TOOL),
        mutator: flags.has(MUTATOR),
        admin_tool: flags.has(ADMIN_TOOL),
    })(input)
}

fn addon_entry<'a>(input: &'a [u8], fields: &FlagGroups) -> IResult<&'a [u8], AddOnEntry> {
    use fields::addons::*;

    let (input, flags) = cond(fields.has(FLAGS), addon_flags)(input)?;
    let (input, short_name) = cond(fields.has(SHORT_NAME), cstring)(input)?;
    let (input, long_name) = cond(fields.has(LONG_NAME), cstring)(input)?;
    let (input, version) = cond(fields.has(VERSION), cstring)(input)?;

    Ok((
        input,
        AddOnEntry {
            flags,
            short_name,
            long_name,
            version,
        },
    ))
}

fn addon_list(input: &[u8]) -> IResult<&[u8], Vec<AddOnEntry>> {
    let (input, count) = var_uint(input)?;
    if count == 0 {
        return Ok((input, Vec::new()));
    }

    let (input, fields) = flag_groups(input)?;
    entries(input, count, |i| addon_entry(i, &fields))
}

fn limit_entry(input: &[u8]) -> IResult<&[u8], LimitEntry> {
    use fields::limits::*;

    let (input, flags) = flag_groups(input)?;
    let code = flags.bits(0, LIMIT_TYPE);
    let (input, limit) = var_uint(input)?;
    let (input, left) = cond(flags.has(HAS_LEFT), var_uint)(input)?;

    Ok((
        input,
        LimitEntry {
            kind: LimitType::from_code(code),
            code,
            limit,
            left,
        },
    ))
}

fn limit_list(input: &[u8]) -> IResult<&[u8], Vec<LimitEntry>> {
    let (input, count) = var_uint(input)?;
    entries(input, count, limit_entry)
}
