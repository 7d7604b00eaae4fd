//! Roster and group view state.
//!
//! Filled in by collaborator fetches when the session requests a refresh
//! (JOIN/LEAVE → roster, GROUP_ADD/GROUP_REMOVE → groups and membership).
//! Pure view model: the session never reads it.

use std::collections::HashMap;

/// A user as the directory reports them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Stable user id.
    pub id: u64,
    /// Display name.
    pub username: String,
    /// Email, when the directory exposes it.
    pub email: Option<String>,
    /// Presence flag.
    pub online: bool,
    /// Avatar download URL, when the user has one.
    pub avatar_url: Option<String>,
}

impl User {
    /// Minimal user record.
    pub fn new(id: u64, username: impl Into<String>) -> Self {
        Self { id, username: username.into(), email: None, online: false, avatar_url: None }
    }
}

/// A group as the directory reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Stable group id.
    pub id: u64,
    /// Display name.
    pub groupname: String,
    /// The creating user.
    pub creator_id: u64,
    /// Users with admin rights.
    pub admins: Vec<u64>,
    /// Current members.
    pub members: Vec<User>,
}

/// Directory view state: active users, the user's groups, and cached
/// admin checks.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    users: Vec<User>,
    groups: Vec<Group>,
    admin: HashMap<u64, bool>,
}

impl Roster {
    /// Empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Active users, as last fetched.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// The user's groups, as last fetched.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Replace the user list.
    pub fn set_users(&mut self, users: Vec<User>) {
        self.users = users;
    }

    /// Replace the group list.
    pub fn set_groups(&mut self, groups: Vec<Group>) {
        self.groups = groups;
    }

    /// Replace one group's member list, if the group is known.
    pub fn set_members(&mut self, group_id: u64, members: Vec<User>) {
        if let Some(group) = self.groups.iter_mut().find(|group| group.id == group_id) {
            group.members = members;
        }
    }

    /// Cache an admin check result.
    pub fn set_admin(&mut self, group_id: u64, is_admin: bool) {
        self.admin.insert(group_id, is_admin);
    }

    /// Whether the current user administers `group_id`, as last checked.
    pub fn is_group_admin(&self, group_id: u64) -> bool {
        self.admin.get(&group_id).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_update_targets_the_right_group() {
        let mut roster = Roster::new();
        roster.set_groups(vec![
            Group { id: 1, groupname: "a".into(), creator_id: 9, admins: vec![9], members: vec![] },
            Group { id: 2, groupname: "b".into(), creator_id: 9, admins: vec![9], members: vec![] },
        ]);

        roster.set_members(2, vec![User::new(5, "eve")]);
        assert!(roster.groups()[0].members.is_empty());
        assert_eq!(roster.groups()[1].members.len(), 1);

        // Unknown groups are ignored.
        roster.set_members(3, vec![User::new(6, "mallory")]);
    }

    #[test]
    fn admin_checks_default_to_false() {
        let mut roster = Roster::new();
        assert!(!roster.is_group_admin(7));

        roster.set_admin(7, true);
        assert!(roster.is_group_admin(7));
        assert!(!roster.is_group_admin(8));
    }
}
