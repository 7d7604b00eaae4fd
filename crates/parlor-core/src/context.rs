//! Conversation context model.
//!
//! A client is always viewing exactly one conversation scope: the public
//! room, a one-to-one conversation, or a group. [`ChatContext`] is the
//! compact key form used for routing, typing-signal keys, and topology
//! convergence. [`ContextTarget`] is the selection form carrying the
//! display references the composer needs when addressing envelopes.

use std::fmt;

use parlor_proto::{ChannelKey, Destination, GroupRef, PeerRef};

/// The conversation scope the user is currently viewing, in key form.
///
/// Doubles as the typing-signal context key, so it is `Copy + Eq + Hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChatContext {
    /// The shared public room.
    #[default]
    Public,

    /// A one-to-one conversation with one peer.
    Direct {
        /// The peer's user id.
        peer_id: u64,
    },

    /// A group conversation.
    Group {
        /// The group id.
        group_id: u64,
    },
}

impl ChatContext {
    /// The context-specific broker channel, if this context has one.
    ///
    /// Direct contexts return `None`: direct delivery arrives on the
    /// user's inbox queue, which is always subscribed while connected.
    pub fn channel(&self) -> Option<ChannelKey> {
        match self {
            Self::Public => Some(ChannelKey::Public),
            Self::Direct { .. } => None,
            Self::Group { group_id } => Some(ChannelKey::Group(*group_id)),
        }
    }

    /// Publish destination for chat messages sent in this context.
    pub fn send_destination(&self) -> Destination {
        match self {
            Self::Public => Destination::SendPublic,
            Self::Direct { peer_id } => Destination::SendDirect(*peer_id),
            Self::Group { group_id } => Destination::SendGroup(*group_id),
        }
    }

    /// Publish destination for typing indicators in this context.
    pub fn typing_destination(&self) -> Destination {
        match self {
            Self::Public => Destination::TypingPublic,
            Self::Direct { peer_id } => Destination::TypingDirect(*peer_id),
            Self::Group { group_id } => Destination::TypingGroup(*group_id),
        }
    }

    /// Group id when this is a group context.
    pub fn group_id(&self) -> Option<u64> {
        match self {
            Self::Group { group_id } => Some(*group_id),
            _ => None,
        }
    }
}

impl fmt::Display for ChatContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Direct { peer_id } => write!(f, "direct:{peer_id}"),
            Self::Group { group_id } => write!(f, "group:{group_id}"),
        }
    }
}

/// A context selection carrying the display references of the target.
///
/// The session stores the active target so the outbound composer can
/// address envelopes with usernames and group names, not just ids.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContextTarget {
    /// The shared public room.
    #[default]
    Public,

    /// A one-to-one conversation with this peer.
    Direct(PeerRef),

    /// This group's conversation.
    Group(GroupRef),
}

impl ContextTarget {
    /// The key form of this selection.
    pub fn key(&self) -> ChatContext {
        match self {
            Self::Public => ChatContext::Public,
            Self::Direct(peer) => ChatContext::Direct { peer_id: peer.id },
            Self::Group(group) => ChatContext::Group { group_id: group.id },
        }
    }

    /// The peer reference when this is a direct selection.
    pub fn peer(&self) -> Option<&PeerRef> {
        match self {
            Self::Direct(peer) => Some(peer),
            _ => None,
        }
    }

    /// The group reference when this is a group selection.
    pub fn group(&self) -> Option<&GroupRef> {
        match self {
            Self::Group(group) => Some(group),
            _ => None,
        }
    }
}
