//! Closed enum views over raw string enumeration fields.
//!
//! Wire strings are the source of truth and are stored verbatim in the
//! content structs; these enums are derived, best-effort views. Parsing an
//! unknown string yields `None` rather than an error, so new protocol
//! values never break deserialization.

/// A user's relationship to a room.
///
/// The absence of a membership record is a distinct "none" state and is
/// modelled by `Option<Membership>` at the lookup site, not by `Leave`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Membership {
    Invite,
    Join,
    Knock,
    Leave,
    Ban,
}

impl Membership {
    pub fn as_str(self) -> &'static str {
        match self {
            Membership::Invite => "invite",
            Membership::Join => "join",
            Membership::Knock => "knock",
            Membership::Leave => "leave",
            Membership::Ban => "ban",
        }
    }

    pub fn parse(s: &str) -> Option<Membership> {
        match s {
            "invite" => Some(Membership::Invite),
            "join" => Some(Membership::Join),
            "knock" => Some(Membership::Knock),
            "leave" => Some(Membership::Leave),
            "ban" => Some(Membership::Ban),
            _ => None,
        }
    }
}

/// Who may join a room without an invite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinRule {
    Public,
    Invite,
    Knock,
    Private,
}

impl JoinRule {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinRule::Public => "public",
            JoinRule::Invite => "invite",
            JoinRule::Knock => "knock",
            JoinRule::Private => "private",
        }
    }

    pub fn parse(s: &str) -> Option<JoinRule> {
        match s {
            "public" => Some(JoinRule::Public),
            "invite" => Some(JoinRule::Invite),
            "knock" => Some(JoinRule::Knock),
            "private" => Some(JoinRule::Private),
            _ => None,
        }
    }
}

/// How far back newly joined users can see room history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryVisibility {
    Invited,
    Joined,
    Shared,
    WorldReadable,
}

impl HistoryVisibility {
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryVisibility::Invited => "invited",
            HistoryVisibility::Joined => "joined",
            HistoryVisibility::Shared => "shared",
            HistoryVisibility::WorldReadable => "world_readable",
        }
    }

    pub fn parse(s: &str) -> Option<HistoryVisibility> {
        match s {
            "invited" => Some(HistoryVisibility::Invited),
            "joined" => Some(HistoryVisibility::Joined),
            "shared" => Some(HistoryVisibility::Shared),
            "world_readable" => Some(HistoryVisibility::WorldReadable),
            _ => None,
        }
    }
}

/// Whether guest accounts may join a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuestAccess {
    CanJoin,
    Forbidden,
}

impl GuestAccess {
    pub fn as_str(self) -> &'static str {
        match self {
            GuestAccess::CanJoin => "can_join",
            GuestAccess::Forbidden => "forbidden",
        }
    }

    pub fn parse(s: &str) -> Option<GuestAccess> {
        match s {
            "can_join" => Some(GuestAccess::CanJoin),
            "forbidden" => Some(GuestAccess::Forbidden),
            _ => None,
        }
    }
}
