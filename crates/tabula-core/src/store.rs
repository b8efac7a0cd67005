//! Process-wide client state with change notification.
//!
//! Built once at startup and shared by `Arc`. Readers either take a snapshot
//! or subscribe and get woken on every change.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio::sync::watch;

use crate::auth::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    SignedOut,
    SignedIn {
        /// `None` until `/auth/me` has been fetched.
        user: Option<User>,
    },
}

impl Session {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Self::SignedIn { user } => user.as_ref(),
            Self::SignedOut => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppSnapshot {
    pub session: Session,
    pub theme: Theme,
    pub sidebar_collapsed: bool,
}

pub struct AppStore {
    state: watch::Sender<AppSnapshot>,
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new(AppSnapshot::default())
    }
}

impl AppStore {
    pub fn new(initial: AppSnapshot) -> Self {
        let (state, _) = watch::channel(initial);
        Self { state }
    }

    pub fn snapshot(&self) -> AppSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppSnapshot> {
        self.state.subscribe()
    }

    pub fn set_session(&self, session: Session) {
        self.update(|s| s.session = session);
    }

    pub fn set_theme(&self, theme: Theme) {
        self.update(|s| s.theme = theme);
    }

    pub fn toggle_theme(&self) -> Theme {
        let mut theme = Theme::default();
        self.update(|s| {
            s.theme = s.theme.toggled();
            theme = s.theme;
        });
        theme
    }

    pub fn set_sidebar_collapsed(&self, collapsed: bool) {
        self.update(|s| s.sidebar_collapsed = collapsed);
    }

    /// Applies `edit` and notifies subscribers only if something changed.
    fn update<F>(&self, edit: F)
    where
        F: FnOnce(&mut AppSnapshot),
    {
        self.state.send_if_modified(|state| {
            let before = state.clone();
            edit(state);
            *state != before
        });
    }
}
