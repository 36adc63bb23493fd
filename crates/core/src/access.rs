//! Routes and role gating.
//!
//! Navigation entries, dashboard panels and action buttons each carry the
//! list of roles that may see them. [`Role::Unknown`] is never listed, so a
//! viewer without a usable session sees nothing.

use core::fmt;

use crate::types::{Audience, Resource, Role};

const ALL_ROLES: &[Role] = &[Role::Admin, Role::Teacher, Role::Parent, Role::Student];
const STAFF: &[Role] = &[Role::Admin, Role::Teacher];
const STAFF_AND_PARENTS: &[Role] = &[Role::Admin, Role::Teacher, Role::Parent];

/// A navigation target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Dashboard,
    About,
    Reports,
    Register,
    Conferencing,
    /// A resource's list screen.
    List(Resource),
    /// A resource's form; `Some(key)` opens it in update mode.
    Form(Resource, Option<String>),
}

impl Route {
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_owned(),
            Self::Login => "/login".to_owned(),
            Self::Dashboard => "/dashboard".to_owned(),
            Self::About => "/about".to_owned(),
            Self::Reports => "/reports".to_owned(),
            Self::Register => "/register".to_owned(),
            Self::Conferencing => "/conferencing".to_owned(),
            Self::List(resource) => format!("/{}", resource.slug()),
            Self::Form(resource, None) => format!("/{}/new", resource.slug()),
            Self::Form(resource, Some(key)) => format!("/{}/{key}/edit", resource.slug()),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// One sidebar entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub route: Route,
    pub roles: &'static [Role],
}

impl NavItem {
    #[must_use]
    pub fn is_visible_to(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// A titled group of sidebar entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuSection {
    pub title: &'static str,
    pub items: &'static [NavItem],
}

/// The sidebar, in display order.
pub static MENU: [MenuSection; 2] = [
    MenuSection {
        title: "MAIN MENU",
        items: &[
            NavItem {
                label: "Dashboard",
                route: Route::Dashboard,
                roles: ALL_ROLES,
            },
            NavItem {
                label: "Teacher Portal",
                route: Route::List(Resource::Teachers),
                roles: STAFF,
            },
            NavItem {
                label: "Parent Portal",
                route: Route::List(Resource::Parents),
                roles: STAFF_AND_PARENTS,
            },
            NavItem {
                label: "Student Portal",
                route: Route::List(Resource::Students),
                roles: ALL_ROLES,
            },
            NavItem {
                label: "Admissions",
                route: Route::List(Resource::Students),
                roles: STAFF_AND_PARENTS,
            },
            NavItem {
                label: "Reports",
                route: Route::Reports,
                roles: ALL_ROLES,
            },
            NavItem {
                label: "Conferencing",
                route: Route::Conferencing,
                roles: STAFF,
            },
            NavItem {
                label: "About",
                route: Route::About,
                roles: ALL_ROLES,
            },
        ],
    },
    MenuSection {
        title: "ACCOUNT",
        items: &[NavItem {
            label: "Logout",
            route: Route::Home,
            roles: ALL_ROLES,
        }],
    },
];

/// The sidebar as `role` sees it. Sections with no visible entry are dropped.
#[must_use]
pub fn menu_for(role: Role) -> Vec<(&'static str, Vec<&'static NavItem>)> {
    MENU.iter()
        .map(|section| {
            let items: Vec<&'static NavItem> = section
                .items
                .iter()
                .filter(|item| item.is_visible_to(role))
                .collect();
            (section.title, items)
        })
        .filter(|(_, items)| !items.is_empty())
        .collect()
}

/// A block on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashboardPanel {
    /// Student, parent and teacher head counts.
    Totals,
    /// The announcement feed for one audience.
    Announcements(Audience),
}

impl DashboardPanel {
    pub const ALL: [Self; 5] = [
        Self::Totals,
        Self::Announcements(Audience::Teachers),
        Self::Announcements(Audience::Parents),
        Self::Announcements(Audience::Students),
        Self::Announcements(Audience::Admins),
    ];

    #[must_use]
    pub const fn roles(self) -> &'static [Role] {
        match self {
            Self::Totals => ALL_ROLES,
            Self::Announcements(Audience::Teachers) => STAFF,
            Self::Announcements(Audience::Parents) => &[Role::Admin, Role::Parent],
            Self::Announcements(Audience::Students) => &[Role::Admin, Role::Student],
            Self::Announcements(Audience::Admins) => &[Role::Admin],
        }
    }

    #[must_use]
    pub fn is_visible_to(self, role: Role) -> bool {
        self.roles().contains(&role)
    }

    /// Panels shown to `role`, in display order.
    #[must_use]
    pub fn visible_to(role: Role) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|panel| panel.is_visible_to(role))
            .collect()
    }
}

/// A gated button on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    NewMeeting,
    NewAnnouncement,
}

impl Action {
    pub const ALL: [Self; 2] = [Self::NewMeeting, Self::NewAnnouncement];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NewMeeting => "New Meeting",
            Self::NewAnnouncement => "New Announcement",
        }
    }

    /// Where the button leads.
    #[must_use]
    pub const fn route(self) -> Route {
        match self {
            Self::NewMeeting => Route::Conferencing,
            Self::NewAnnouncement => Route::Form(Resource::Announcements, None),
        }
    }

    #[must_use]
    pub fn is_allowed(self, role: Role) -> bool {
        match self {
            Self::NewMeeting | Self::NewAnnouncement => STAFF.contains(&role),
        }
    }

    /// Buttons shown to `role`.
    #[must_use]
    pub fn allowed_for(role: Role) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|action| action.is_allowed(role))
            .collect()
    }
}
