//! Navigation directives handed back to the calling layer.
//!
//! The core never changes the current view itself. Outcomes that used to
//! redirect the page (forced logout, missing task, successful login) come
//! back as a `Navigation` value and, where the user should be told why, a
//! `Notice`.

use crate::config::ClientConfig;

/// Where the calling layer should send the user next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Login,
    Home,
}

impl Navigation {
    pub fn path(self, config: &ClientConfig) -> &str {
        match self {
            Navigation::Login => &config.login_path,
            Navigation::Home => &config.home_path,
        }
    }
}

/// User-facing notice that accompanies a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    TaskNotFound,
}

impl Notice {
    pub fn message(self) -> &'static str {
        match self {
            Notice::TaskNotFound => "task not found",
        }
    }
}
