//! Records carried inside protocol messages: users, friends, rooms.
//!
//! The server describes users with short strings: a rank like `"3d"`, a
//! flag string like `"cs"` and an auth level like `"normal"`. Those strings
//! come from closed sets, so they are parsed into enums here and anything
//! unknown is rejected with [`ProtocolError::InvalidField`].
//!
//! Each record has a serde-friendly "raw" shape (plain strings, as on the
//! wire) and a validated shape. The raw shapes are crate-private; message
//! post-load turns raw into validated.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// UserFlag
// ---------------------------------------------------------------------------

/// One status flag from a user's flag string.
///
/// Declaration order is the order flags are rendered back to a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UserFlag {
    /// `g`: guest account.
    Guest,
    /// `c`: connected.
    Connected,
    /// `d`: account deleted.
    Deleted,
    /// `s`: sleeping, inactive for over 10 minutes.
    Sleeping,
    /// `a`: has an avatar.
    Avatar,
    /// `r`: robot.
    Robot,
    /// `T`: has won a tournament.
    TournamentWinner,
    /// `t`: tournament runner-up.
    TournamentRunnerUp,
    /// `p`: currently playing a game.
    Playing,
    /// `P`: currently playing a tournament game.
    PlayingTournament,
    /// `*`: Plus subscriber.
    PlusMember,
    /// `!`: Meijin.
    Meijin,
    /// `=`: can play ranked games.
    CanPlayRanked,
    /// `~`: plays stronger players far more often than weaker ones.
    SelfishRanked,
}

impl UserFlag {
    /// Every flag, in rendering order.
    pub const ALL: [UserFlag; 14] = [
        Self::Guest,
        Self::Connected,
        Self::Deleted,
        Self::Sleeping,
        Self::Avatar,
        Self::Robot,
        Self::TournamentWinner,
        Self::TournamentRunnerUp,
        Self::Playing,
        Self::PlayingTournament,
        Self::PlusMember,
        Self::Meijin,
        Self::CanPlayRanked,
        Self::SelfishRanked,
    ];

    /// The flag's wire character.
    pub fn as_char(self) -> char {
        match self {
            Self::Guest => 'g',
            Self::Connected => 'c',
            Self::Deleted => 'd',
            Self::Sleeping => 's',
            Self::Avatar => 'a',
            Self::Robot => 'r',
            Self::TournamentWinner => 'T',
            Self::TournamentRunnerUp => 't',
            Self::Playing => 'p',
            Self::PlayingTournament => 'P',
            Self::PlusMember => '*',
            Self::Meijin => '!',
            Self::CanPlayRanked => '=',
            Self::SelfishRanked => '~',
        }
    }

    /// Looks up a flag by its wire character.
    pub fn from_char(c: char) -> Result<Self, ProtocolError> {
        Self::ALL
            .into_iter()
            .find(|flag| flag.as_char() == c)
            .ok_or_else(|| ProtocolError::invalid_field("flags", c.to_string()))
    }
}

/// The set of flags on a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFlags(BTreeSet<UserFlag>);

impl UserFlags {
    /// `true` if the flag is set.
    pub fn contains(&self, flag: UserFlag) -> bool {
        self.0.contains(&flag)
    }

    /// Sets a flag. Setting a flag twice is a no-op.
    pub fn insert(&mut self, flag: UserFlag) {
        self.0.insert(flag);
    }

    /// Iterates the flags in rendering order.
    pub fn iter(&self) -> impl Iterator<Item = UserFlag> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for UserFlags {
    type Err = ProtocolError;

    /// Parses a flag string such as `"cra"`. Any unknown character fails
    /// the whole string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .map(UserFlag::from_char)
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }
}

impl fmt::Display for UserFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for flag in &self.0 {
            write!(f, "{}", flag.as_char())?;
        }
        Ok(())
    }
}

impl Serialize for UserFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromIterator<UserFlag> for UserFlags {
    fn from_iter<I: IntoIterator<Item = UserFlag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// AuthLevel
// ---------------------------------------------------------------------------

/// A user's authorization level, lowest first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AuthLevel {
    #[default]
    Normal,
    RobotRanked,
    Teacher,
    JrAdmin,
    SrAdmin,
    SuperAdmin,
}

impl AuthLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::RobotRanked => "robot_ranked",
            Self::Teacher => "teacher",
            Self::JrAdmin => "jr_admin",
            Self::SrAdmin => "sr_admin",
            Self::SuperAdmin => "super_admin",
        }
    }
}

impl FromStr for AuthLevel {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "robot_ranked" => Ok(Self::RobotRanked),
            "teacher" => Ok(Self::Teacher),
            "jr_admin" => Ok(Self::JrAdmin),
            "sr_admin" => Ok(Self::SrAdmin),
            "super_admin" => Ok(Self::SuperAdmin),
            other => Err(ProtocolError::invalid_field("authLevel", other)),
        }
    }
}

impl fmt::Display for AuthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FriendType
// ---------------------------------------------------------------------------

/// Which friend list an entry belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendType {
    #[default]
    Buddy,
    Censored,
    Fan,
    AdminTrack,
}

impl FromStr for FriendType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buddy" => Ok(Self::Buddy),
            "censored" => Ok(Self::Censored),
            "fan" => Ok(Self::Fan),
            "admin_track" => Ok(Self::AdminTrack),
            other => Err(ProtocolError::invalid_field("friendType", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// UserRecord / FriendRecord
// ---------------------------------------------------------------------------

/// A server account, as described in messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub name: String,
    /// Empty when the user has no rank.
    pub rank: String,
    pub flags: UserFlags,
    pub auth_level: AuthLevel,
}

impl UserRecord {
    /// Builds a user from its wire strings, validating flags and auth level.
    pub fn new(
        name: impl Into<String>,
        rank: impl Into<String>,
        flags: &str,
        auth_level: &str,
    ) -> Result<Self, ProtocolError> {
        Ok(Self {
            name: name.into(),
            rank: rank.into(),
            flags: flags.parse()?,
            auth_level: auth_level.parse()?,
        })
    }

    pub fn has_flag(&self, flag: UserFlag) -> bool {
        self.flags.contains(flag)
    }
}

/// An entry of the logged-in user's friend lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRecord {
    pub friend_type: FriendType,
    #[serde(flatten)]
    pub user: UserRecord,
    pub notes: String,
}

// ---------------------------------------------------------------------------
// RoomRecord
// ---------------------------------------------------------------------------

/// A room the server advertises at login.
///
/// Rooms carry no closed enumerations, so the wire shape is the record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRecord {
    pub channel_id: u64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub tourn_only: bool,
    #[serde(default)]
    pub global_games_only: bool,
}

// ---------------------------------------------------------------------------
// Raw (wire) shapes
// ---------------------------------------------------------------------------

/// A user as it arrives: plain strings, nothing validated.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RawUser {
    name: String,
    rank: String,
    flags: String,
    auth_level: Option<String>,
}

impl RawUser {
    pub(crate) fn load(self) -> Result<UserRecord, ProtocolError> {
        let auth_level = match self.auth_level.as_deref() {
            Some(level) => level.parse()?,
            None => AuthLevel::default(),
        };
        Ok(UserRecord {
            name: self.name,
            rank: self.rank,
            flags: self.flags.parse()?,
            auth_level,
        })
    }
}

/// A friend entry as it arrives.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RawFriend {
    friend_type: Option<String>,
    #[serde(flatten)]
    user: RawUser,
    notes: String,
}

impl RawFriend {
    pub(crate) fn load(self) -> Result<FriendRecord, ProtocolError> {
        let friend_type = match self.friend_type.as_deref() {
            Some(kind) => kind.parse()?,
            None => FriendType::default(),
        };
        Ok(FriendRecord {
            friend_type,
            user: self.user.load()?,
            notes: self.notes,
        })
    }
}
