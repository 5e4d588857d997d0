//! # Role-Based Access Control
//!
//! Answers "may this role do this to that?" for every permission-gated
//! control in the CRM.
//!
//! ## Evaluation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  can(Some(Staff), Delete, Contacts)                                     │
//! │       │                                                                 │
//! │       ├── role is None?            → false                              │
//! │       │                                                                 │
//! │       ├── table[Staff][Contacts]   → {create, read, update}             │
//! │       │     missing?               → false                              │
//! │       │                                                                 │
//! │       ├── contains Delete?         → no                                 │
//! │       ├── contains Manage?         → no                                 │
//! │       │                                                                 │
//! │       └── false  (deny by default)                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Role Hierarchy
//! `Owner (3) > Manager (2) > Staff (1)`. The hierarchy is independent of
//! the resource grants: [`is_role_at_least`] compares ranks only.
//!
//! ## Canonical Table
//! There is exactly one table, [`standard_table`]. It is built once on first
//! use and never mutated; [`role_permissions`] hands out copies.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use ts_rs::TS;

use crate::error::CoreError;

// =============================================================================
// Role
// =============================================================================

/// A member's role within an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Role {
    /// Full control, including billing and team management.
    Owner,
    /// Runs the day-to-day CRM: pipelines, invoices, campaigns.
    Manager,
    /// Works records but cannot delete them or change settings.
    Staff,
}

impl Role {
    /// Every role, highest rank first.
    pub const ALL: [Role; 3] = [Role::Owner, Role::Manager, Role::Staff];

    /// Hierarchical rank (higher number = more privileged).
    #[inline]
    pub const fn rank(self) -> u8 {
        match self {
            Role::Owner => 3,
            Role::Manager => 2,
            Role::Staff => 1,
        }
    }

    /// Whether this role is at least as privileged as `required`.
    #[inline]
    pub const fn is_at_least(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Manager => "manager",
            Role::Staff => "staff",
        }
    }
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Role {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "owner" => Ok(Role::Owner),
            "manager" => Ok(Role::Manager),
            "staff" => Ok(Role::Staff),
            other => Err(CoreError::UnknownRole(other.to_string())),
        }
    }
}

// =============================================================================
// Action
// =============================================================================

/// A verb applied to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    /// Umbrella grant: implies every other action on the resource.
    Manage,
}

impl Action {
    /// Every action, including `Manage`.
    pub const ALL: [Action; 5] = [
        Action::Create,
        Action::Read,
        Action::Update,
        Action::Delete,
        Action::Manage,
    ];

    /// The four concrete actions `Manage` expands to.
    pub const CRUD: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];

    pub const fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Manage => "manage",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == wanted)
            .ok_or(CoreError::UnknownAction(wanted))
    }
}

// =============================================================================
// Resource
// =============================================================================

/// A protected entity class. Closed set, known at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Resource {
    Contacts,
    Deals,
    Invoices,
    Products,
    Campaigns,
    Templates,
    Automations,
    Reports,
    Settings,
    Team,
    Billing,
    Integrations,
    Users,
    Analytics,
    Messages,
}

impl Resource {
    pub const ALL: [Resource; 15] = [
        Resource::Contacts,
        Resource::Deals,
        Resource::Invoices,
        Resource::Products,
        Resource::Campaigns,
        Resource::Templates,
        Resource::Automations,
        Resource::Reports,
        Resource::Settings,
        Resource::Team,
        Resource::Billing,
        Resource::Integrations,
        Resource::Users,
        Resource::Analytics,
        Resource::Messages,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Resource::Contacts => "contacts",
            Resource::Deals => "deals",
            Resource::Invoices => "invoices",
            Resource::Products => "products",
            Resource::Campaigns => "campaigns",
            Resource::Templates => "templates",
            Resource::Automations => "automations",
            Resource::Reports => "reports",
            Resource::Settings => "settings",
            Resource::Team => "team",
            Resource::Billing => "billing",
            Resource::Integrations => "integrations",
            Resource::Users => "users",
            Resource::Analytics => "analytics",
            Resource::Messages => "messages",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Resource::ALL
            .into_iter()
            .find(|r| r.as_str() == wanted)
            .ok_or(CoreError::UnknownResource(wanted))
    }
}

// =============================================================================
// Role Permissions
// =============================================================================

/// The grants of a single role: resource → allowed actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RolePermissions(BTreeMap<Resource, BTreeSet<Action>>);

impl RolePermissions {
    /// Creates an empty grant set (no access to anything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `actions` on `resource` to this grant set.
    pub fn grant(&mut self, resource: Resource, actions: &[Action]) {
        self.0.entry(resource).or_default().extend(actions.iter().copied());
    }

    /// Whether `action` on `resource` is permitted, honouring `Manage`.
    pub fn allows(&self, action: Action, resource: Resource) -> bool {
        self.0
            .get(&resource)
            .is_some_and(|actions| actions.contains(&action) || actions.contains(&Action::Manage))
    }

    /// The raw grant for a resource, if any.
    pub fn actions(&self, resource: Resource) -> Option<&BTreeSet<Action>> {
        self.0.get(&resource)
    }

    /// Effective actions on a resource, with `Manage` expanded to CRUD.
    pub fn effective_actions(&self, resource: Resource) -> BTreeSet<Action> {
        match self.0.get(&resource) {
            Some(actions) if actions.contains(&Action::Manage) => Action::CRUD.into_iter().collect(),
            Some(actions) => actions.clone(),
            None => BTreeSet::new(),
        }
    }

    /// Resources with at least one grant.
    pub fn resources(&self) -> impl Iterator<Item = Resource> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Resource, &BTreeSet<Action>)> + '_ {
        self.0.iter().map(|(r, a)| (*r, a))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// Permission Table
// =============================================================================

/// Role → grants. A role without an entry has no permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionTable(BTreeMap<Role, RolePermissions>);

mod grants {
    use super::Action::{Create, Delete, Manage, Read, Update};
    use super::Resource::*;
    use super::{Action, Resource, Role};

    /// The canonical grants. Anything not listed is denied.
    pub(super) const STANDARD_GRANTS: &[(Role, Resource, &[Action])] = &[
        // Owner manages everything.
        (Role::Owner, Contacts, &[Manage]),
        (Role::Owner, Deals, &[Manage]),
        (Role::Owner, Invoices, &[Manage]),
        (Role::Owner, Products, &[Manage]),
        (Role::Owner, Campaigns, &[Manage]),
        (Role::Owner, Templates, &[Manage]),
        (Role::Owner, Automations, &[Manage]),
        (Role::Owner, Reports, &[Manage]),
        (Role::Owner, Settings, &[Manage]),
        (Role::Owner, Team, &[Manage]),
        (Role::Owner, Billing, &[Manage]),
        (Role::Owner, Integrations, &[Manage]),
        (Role::Owner, Users, &[Manage]),
        (Role::Owner, Analytics, &[Manage]),
        (Role::Owner, Messages, &[Manage]),
        // Manager: full control of CRM records, read-only on org administration.
        (Role::Manager, Contacts, &[Manage]),
        (Role::Manager, Deals, &[Manage]),
        (Role::Manager, Invoices, &[Manage]),
        (Role::Manager, Products, &[Manage]),
        (Role::Manager, Campaigns, &[Manage]),
        (Role::Manager, Templates, &[Manage]),
        (Role::Manager, Automations, &[Manage]),
        (Role::Manager, Messages, &[Manage]),
        (Role::Manager, Reports, &[Create, Read]),
        (Role::Manager, Analytics, &[Read]),
        (Role::Manager, Settings, &[Read]),
        (Role::Manager, Team, &[Read]),
        (Role::Manager, Users, &[Read]),
        (Role::Manager, Integrations, &[Read]),
        // Staff: works records, never deletes.
        (Role::Staff, Contacts, &[Create, Read, Update]),
        (Role::Staff, Deals, &[Create, Read, Update]),
        (Role::Staff, Invoices, &[Create, Read]),
        (Role::Staff, Products, &[Read]),
        (Role::Staff, Campaigns, &[Read]),
        (Role::Staff, Templates, &[Read]),
        (Role::Staff, Messages, &[Create, Read, Update]),
        (Role::Staff, Reports, &[Read]),
    ];
}

impl PermissionTable {
    /// Creates an empty table. Every check against it is denied.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the canonical table from the standard grant list.
    pub fn standard() -> Self {
        grants::STANDARD_GRANTS
            .iter()
            .fold(Self::new(), |table, (role, resource, actions)| {
                table.grant(*role, *resource, actions)
            })
    }

    /// Builder: adds a grant and returns the table.
    pub fn grant(mut self, role: Role, resource: Resource, actions: &[Action]) -> Self {
        self.0.entry(role).or_default().grant(resource, actions);
        self
    }

    /// Evaluates a permission check against this table.
    ///
    /// `false` when the role is absent or has no entry for the resource;
    /// otherwise `true` iff the grant contains `action` or `Manage`.
    pub fn allows(&self, role: Option<Role>, action: Action, resource: Resource) -> bool {
        let Some(role) = role else {
            trace!(%action, %resource, "Permission denied: no role");
            return false;
        };
        let allowed = self
            .0
            .get(&role)
            .is_some_and(|grants| grants.allows(action, resource));
        if !allowed {
            trace!(%role, %action, %resource, "Permission denied");
        }
        allowed
    }

    /// A copy of one role's grants; empty when the role has no entry.
    pub fn permissions_for(&self, role: Role) -> RolePermissions {
        self.0.get(&role).cloned().unwrap_or_default()
    }

    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.keys().copied()
    }
}

static STANDARD_TABLE: LazyLock<PermissionTable> = LazyLock::new(PermissionTable::standard);

/// The process-wide canonical permission table.
pub fn standard_table() -> &'static PermissionTable {
    &STANDARD_TABLE
}

// =============================================================================
// Public Checks
// =============================================================================

/// Whether `role` may perform `action` on `resource`.
///
/// Never panics. An absent role (signed out, unknown membership) is denied.
///
/// ```rust
/// use crm_core::rbac::{can, Action, Resource, Role};
///
/// assert!(can(Some(Role::Owner), Action::Delete, Resource::Billing));
/// assert!(!can(Some(Role::Staff), Action::Delete, Resource::Contacts));
/// assert!(!can(None, Action::Read, Resource::Contacts));
/// ```
pub fn can(role: Option<Role>, action: Action, resource: Resource) -> bool {
    standard_table().allows(role, action, resource)
}

/// String-boundary form of [`can`] for values arriving from the session
/// layer or URL params. Anything that does not parse is denied.
pub fn can_str(role: Option<&str>, action: &str, resource: &str) -> bool {
    let parsed = (
        role.map(Role::from_str).transpose(),
        Action::from_str(action),
        Resource::from_str(resource),
    );
    match parsed {
        (Ok(role), Ok(action), Ok(resource)) => can(role, action, resource),
        (role, action, resource) => {
            let error = [role.err(), action.err(), resource.err()]
                .into_iter()
                .flatten()
                .next();
            debug!(error = ?error, "Permission denied: unparseable input");
            false
        }
    }
}

/// Whether `current` ranks at least as high as `required`.
///
/// ```rust
/// use crm_core::rbac::{is_role_at_least, Role};
///
/// assert!(is_role_at_least(Some(Role::Owner), Role::Staff));
/// assert!(!is_role_at_least(Some(Role::Staff), Role::Owner));
/// assert!(!is_role_at_least(None, Role::Staff));
/// ```
pub fn is_role_at_least(current: Option<Role>, required: Role) -> bool {
    current.is_some_and(|role| role.is_at_least(required))
}

/// A copy of `role`'s grants in the canonical table.
pub fn role_permissions(role: Role) -> RolePermissions {
    standard_table().permissions_for(role)
}

/// Effective actions for rendering: `Manage` expanded, empty when denied.
pub fn allowed_actions(role: Option<Role>, resource: Resource) -> BTreeSet<Action> {
    role.map(|r| standard_table().permissions_for(r).effective_actions(resource))
        .unwrap_or_default()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Owner > Role::Manager);
        assert!(Role::Manager > Role::Staff);
        assert_eq!(Role::ALL.iter().max(), Some(&Role::Owner));
    }

    #[test]
    fn test_role_at_least() {
        assert!(is_role_at_least(Some(Role::Owner), Role::Staff));
        assert!(!is_role_at_least(Some(Role::Staff), Role::Owner));
        assert!(is_role_at_least(Some(Role::Manager), Role::Manager));
        assert!(!is_role_at_least(None, Role::Staff));
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Owner".parse::<Role>().unwrap(), Role::Owner);
        assert_eq!(" delete ".parse::<Action>().unwrap(), Action::Delete);
        assert_eq!("messages".parse::<Resource>().unwrap(), Resource::Messages);
        assert!(matches!("admin".parse::<Role>(), Err(CoreError::UnknownRole(_))));
        assert!(matches!("widgets".parse::<Resource>(), Err(CoreError::UnknownResource(_))));
        assert!(matches!("archive".parse::<Action>(), Err(CoreError::UnknownAction(_))));
    }

    #[test]
    fn test_display_matches_parse() {
        for resource in Resource::ALL {
            assert_eq!(resource.to_string().parse::<Resource>().unwrap(), resource);
        }
        for action in Action::ALL {
            assert_eq!(action.to_string().parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn test_owner_can_do_everything() {
        for resource in Resource::ALL {
            for action in Action::ALL {
                assert!(can(Some(Role::Owner), action, resource), "{action} {resource}");
            }
        }
    }

    #[test]
    fn test_manage_implies_crud() {
        for role in Role::ALL {
            let grants = role_permissions(role);
            for (resource, actions) in grants.iter() {
                if actions.contains(&Action::Manage) {
                    for action in Action::CRUD {
                        assert!(can(Some(role), action, resource), "{role} {action} {resource}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_missing_entry_denies() {
        for role in [Role::Manager, Role::Staff] {
            let grants = role_permissions(role);
            for resource in Resource::ALL {
                if grants.actions(resource).is_none() {
                    for action in Action::ALL {
                        assert!(!can(Some(role), action, resource), "{role} {action} {resource}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_no_role_denies_everything() {
        for resource in Resource::ALL {
            for action in Action::ALL {
                assert!(!can(None, action, resource));
            }
        }
    }

    #[test]
    fn test_staff_grants() {
        let staff = Some(Role::Staff);
        assert!(can(staff, Action::Create, Resource::Contacts));
        assert!(can(staff, Action::Update, Resource::Deals));
        assert!(!can(staff, Action::Delete, Resource::Contacts));
        assert!(!can(staff, Action::Delete, Resource::Messages));
        assert!(!can(staff, Action::Delete, Resource::Products));
        assert!(!can(staff, Action::Read, Resource::Billing));
        assert!(!can(staff, Action::Read, Resource::Automations));
    }

    #[test]
    fn test_manager_grants() {
        let manager = Some(Role::Manager);
        assert!(can(manager, Action::Delete, Resource::Invoices));
        assert!(can(manager, Action::Read, Resource::Team));
        assert!(!can(manager, Action::Update, Resource::Settings));
        assert!(!can(manager, Action::Read, Resource::Billing));
    }

    #[test]
    fn test_can_str_fails_closed() {
        assert!(can_str(Some("owner"), "delete", "billing"));
        assert!(!can_str(Some("owner"), "delete", "widgets"));
        assert!(!can_str(Some("superuser"), "read", "contacts"));
        assert!(!can_str(Some("owner"), "archive", "contacts"));
        assert!(!can_str(None, "read", "contacts"));
    }

    #[test]
    fn test_role_permissions_is_a_copy() {
        let mut copy = role_permissions(Role::Staff);
        copy.grant(Resource::Billing, &[Action::Manage]);
        assert!(copy.allows(Action::Delete, Resource::Billing));
        assert!(!can(Some(Role::Staff), Action::Delete, Resource::Billing));
    }

    #[test]
    fn test_allowed_actions_expands_manage() {
        let actions = allowed_actions(Some(Role::Manager), Resource::Deals);
        assert_eq!(actions, BTreeSet::from(Action::CRUD));
        assert!(!actions.contains(&Action::Manage));

        let actions = allowed_actions(Some(Role::Staff), Resource::Invoices);
        assert_eq!(actions, BTreeSet::from([Action::Create, Action::Read]));

        assert!(allowed_actions(None, Resource::Deals).is_empty());
        assert!(allowed_actions(Some(Role::Staff), Resource::Billing).is_empty());
    }

    #[test]
    fn test_empty_table_denies() {
        let table = PermissionTable::new();
        assert!(!table.allows(Some(Role::Owner), Action::Read, Resource::Contacts));
        assert!(table.permissions_for(Role::Owner).is_empty());
    }

    #[test]
    fn test_custom_table() {
        let table = PermissionTable::new().grant(Role::Staff, Resource::Reports, &[Action::Manage]);
        assert!(table.allows(Some(Role::Staff), Action::Delete, Resource::Reports));
        assert!(!table.allows(Some(Role::Owner), Action::Read, Resource::Reports));
        assert_eq!(table.roles().collect::<Vec<_>>(), vec![Role::Staff]);
    }

    #[test]
    fn test_table_json_shape() {
        let table = PermissionTable::new()
            .grant(Role::Staff, Resource::Contacts, &[Action::Read, Action::Create]);
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"staff":{"contacts":["create","read"]}}"#);

        let back: PermissionTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
