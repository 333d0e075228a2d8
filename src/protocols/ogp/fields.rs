//! Flag layout of the default query: which bit selects which field.
//!
//! The request advertises a set of these groups and the answer repeats the ones the server
//! honours, so the request builder and the decoder share the same table.

use super::codec::Flag;
use std::ops::Range;

pub mod request {
    use super::Flag;

    pub const SERVER_INFO: Flag = (0, 0);
    pub const TEAM_LIST: Flag = (0, 1);
    pub const PLAYER_LIST: Flag = (0, 2);
    pub const RULE_LIST: Flag = (0, 3);
    pub const ADDON_LIST: Flag = (0, 4);
    pub const LIMIT_LIST: Flag = (0, 5);
    pub const COLORED_NAMES: Flag = (1, 0);
}

pub mod server_info {
    use super::Flag;

    pub const GAME_NAME: Flag = (0, 0);
    pub const SERVER_FLAGS: Flag = (0, 1);
    pub const HOST_NAME: Flag = (0, 2);
    pub const CONNECT_PORT: Flag = (0, 3);
    pub const MOD: Flag = (1, 0);
    pub const GAME_TYPE: Flag = (1, 1);
    pub const GAME_MODE: Flag = (1, 2);
    pub const MAP: Flag = (1, 3);
    pub const NEXT_MAP: Flag = (1, 4);
    pub const PLAYER_COUNT: Flag = (2, 0);
    pub const SLOT_MAX: Flag = (2, 1);
    pub const BOT_COUNT: Flag = (2, 2);
    pub const RESERVED_SLOTS: Flag = (2, 3);

    pub const ALL: &[Flag] = &[
        GAME_NAME,
        SERVER_FLAGS,
        HOST_NAME,
        CONNECT_PORT,
        MOD,
        GAME_TYPE,
        GAME_MODE,
        MAP,
        NEXT_MAP,
        PLAYER_COUNT,
        SLOT_MAX,
        BOT_COUNT,
        RESERVED_SLOTS,
    ];
}

pub mod server_flags {
    use super::{Flag, Range};

    pub const SERVER_TYPE: Range<u8> = 0..2;
    pub const PASSWORD: Flag = (0, 2);
    pub const PROXY: Flag = (0, 3);
    pub const OPERATING_SYSTEM: Range<u8> = 4..7;
}

pub mod mods {
    use super::Flag;

    pub const IDENTIFIER: Flag = (0, 0);
    pub const SIZE: Flag = (0, 1);
    pub const VERSION: Flag = (0, 2);
    pub const URL: Flag = (0, 3);
    pub const AUTHOR: Flag = (0, 4);

    pub const ALL: &[Flag] = &[IDENTIFIER, SIZE, VERSION, URL, AUTHOR];
}

pub mod maps {
    use super::Flag;

    pub const FILE_NAME: Flag = (0, 0);
    pub const FILE_SIZE: Flag = (0, 1);
    pub const FILE_MD5: Flag = (0, 2);
    pub const VERSION: Flag = (0, 3);
    pub const URL: Flag = (0, 4);
    pub const AUTHOR: Flag = (0, 5);

    pub const ALL: &[Flag] = &[FILE_NAME, FILE_SIZE, FILE_MD5, VERSION, URL, AUTHOR];
}

pub mod teams {
    use super::Flag;

    pub const NAME: Flag = (0, 0);
    pub const SCORE: Flag = (0, 1);
    pub const AVERAGE_PING: Flag = (0, 2);
    pub const AVERAGE_LOSS: Flag = (0, 3);
    pub const PLAYER_COUNT: Flag = (0, 4);
    pub const COLOR: Flag = (0, 5);

    pub const ALL: &[Flag] = &[NAME, SCORE, AVERAGE_PING, AVERAGE_LOSS, PLAYER_COUNT, COLOR];
}

pub mod players {
    use super::Flag;

    pub const FLAGS: Flag = (0, 0);
    pub const SLOT: Flag = (0, 1);
    pub const NAME: Flag = (0, 2);
    pub const TEAM: Flag = (0, 3);
    pub const CLASS: Flag = (0, 4);
    pub const RACE: Flag = (0, 5);
    pub const SCORE: Flag = (1, 0);
    pub const FRAGS: Flag = (1, 1);
    pub const KILLS: Flag = (1, 2);
    pub const DEATHS: Flag = (1, 3);
    pub const SUICIDES: Flag = (1, 4);
    pub const TEAM_KILLS: Flag = (1, 5);
    pub const ID: Flag = (2, 0);
    pub const GLOBAL_ID: Flag = (2, 1);
    pub const PING: Flag = (2, 2);
    pub const LOSS: Flag = (2, 3);
    pub const MODEL: Flag = (2, 4);
    pub const TIME: Flag = (2, 5);
    pub const ADDRESS: Flag = (3, 0);

    pub const ALL: &[Flag] = &[
        FLAGS, SLOT, NAME, TEAM, CLASS, RACE, SCORE, FRAGS, KILLS, DEATHS, SUICIDES, TEAM_KILLS,
        ID, GLOBAL_ID, PING, LOSS, MODEL, TIME, ADDRESS,
    ];
}

pub mod player_flags {
    use super::Flag;

    pub const ALIVE: Flag = (0, 0);
    pub const DEAD: Flag = (0, 1);
    pub const BOT: Flag = (0, 2);
    pub const BOMP: Flag = (1, 0);
    pub const VIP: Flag = (1, 1);
}

pub mod addons {
    use super::Flag;

    pub const FLAGS: Flag = (0, 0);
    pub const SHORT_NAME: Flag = (0, 1);
    pub const LONG_NAME: Flag = (0, 2);
    pub const VERSION: Flag = (0, 3);

    pub const ALL: &[Flag] = &[FLAGS, SHORT_NAME, LONG_NAME, VERSION];
}

pub mod addon_flags {
    use super::Flag;

    pub const ACTIVE: Flag = (0, 0);
    pub const ANTI_CHEAT_TOOL: Flag = (0, 1);
    pub const MUTATOR: Flag = (0, 2);
    pub const ADMIN_TOOL: Flag = (0, 3);
}

pub mod limits {
    use super::{Flag, Range};

    pub const HAS_LEFT: Flag = (0, 0);
    pub const LIMIT_TYPE: Range<u8> = 1..5;
}
