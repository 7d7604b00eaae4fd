//! Broker naming contract.
//!
//! Channel and destination names are part of the wire contract with the
//! broker and must match it exactly. [`ChannelKey`] names subscription
//! endpoints; [`Destination`] names publish targets.

use std::fmt;

/// A named subscription endpoint on the broker.
///
/// Three channels are user-scoped and mandatory while connected (inbox,
/// errors, typing); the public and group channels are context-dependent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelKey {
    /// The shared public room: `public-broadcast`.
    Public,

    /// Direct-message delivery for a user: `user:{id}:inbox`.
    Inbox(u64),

    /// Server-pushed action rejections for a user: `user:{id}:errors`.
    Errors(u64),

    /// Typing indicators addressed to a user: `user:{id}:typing`.
    Typing(u64),

    /// Broadcast for one group: `group:{id}:broadcast`.
    Group(u64),
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "public-broadcast"),
            Self::Inbox(user_id) => write!(f, "user:{user_id}:inbox"),
            Self::Errors(user_id) => write!(f, "user:{user_id}:errors"),
            Self::Typing(user_id) => write!(f, "user:{user_id}:typing"),
            Self::Group(group_id) => write!(f, "group:{group_id}:broadcast"),
        }
    }
}

/// A publish destination on the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    /// Presence announcement on connect: `chat.join`.
    Join,

    /// Presence retraction on logout: `chat.leave`.
    Leave,

    /// Public chat message: `chat.send`.
    SendPublic,

    /// Direct chat message: `chat.send:{peerId}`.
    SendDirect(u64),

    /// Group chat message: `chat.sendGroup:{groupId}`.
    SendGroup(u64),

    /// Typing indicator in the public room: `chat.typing:public`.
    TypingPublic,

    /// Typing indicator to a direct peer: `chat.typing:{peerId}`.
    TypingDirect(u64),

    /// Typing indicator to a group: `chat.typing:{groupId}`.
    TypingGroup(u64),
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Join => write!(f, "chat.join"),
            Self::Leave => write!(f, "chat.leave"),
            Self::SendPublic => write!(f, "chat.send"),
            Self::SendDirect(peer_id) => write!(f, "chat.send:{peer_id}"),
            Self::SendGroup(group_id) => write!(f, "chat.sendGroup:{group_id}"),
            Self::TypingPublic => write!(f, "chat.typing:public"),
            Self::TypingDirect(peer_id) => write!(f, "chat.typing:{peer_id}"),
            Self::TypingGroup(group_id) => write!(f, "chat.typing:{group_id}"),
        }
    }
}
