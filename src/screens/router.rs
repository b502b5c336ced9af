use tracing::{info, warn};

use crate::database::Database;
use crate::error::{AdminError, AdminResult};
use crate::screens::{SongsScreen, UsersScreen};
use crate::session::{self, AdminSession, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Dashboard,
    Songs,
    Users,
}

impl Screen {
    pub fn title(self) -> &'static str {
        match self {
            Screen::Login => "Admin Login",
            Screen::Dashboard => "Admin Dashboard",
            Screen::Songs => "Manage Songs",
            Screen::Users => "Manage Users",
        }
    }
}

/// Moves the operator between screens inside one process. Every entry
/// into a guarded screen re-validates the session; a rejected session
/// lands on [`Screen::Login`].
pub struct Router<'a> {
    db: &'a Database,
    store: &'a SessionStore,
    current: Screen,
}

impl<'a> Router<'a> {
    pub fn new(db: &'a Database, store: &'a SessionStore) -> Self {
        Self {
            db,
            store,
            current: Screen::Login,
        }
    }

    pub fn current(&self) -> Screen {
        self.current
    }

    pub fn enter(&mut self, screen: Screen) -> AdminResult<AdminSession> {
        // Going back to login always drops the session.
        if screen == Screen::Login {
            self.logout()?;
            return Err(AdminError::Unauthenticated);
        }

        match session::authorize(self.db, self.store) {
            Ok(admin) => {
                self.current = screen;
                info!("Admin {} entered {}", admin.admin_id(), screen.title());
                Ok(admin)
            }
            Err(e) => {
                if e.requires_login() {
                    warn!("Redirecting to login: {}", e);
                    self.current = Screen::Login;
                }
                Err(e)
            }
        }
    }

    pub fn open_songs(&mut self) -> AdminResult<SongsScreen<'a>> {
        let admin = self.enter(Screen::Songs)?;
        SongsScreen::open(self.db, admin)
    }

    pub fn open_users(&mut self) -> AdminResult<UsersScreen<'a>> {
        let admin = self.enter(Screen::Users)?;
        UsersScreen::open(self.db, admin)
    }

    pub fn login(&mut self, email: &str, password: &str) -> AdminResult<AdminSession> {
        let admin = session::login(self.db, self.store, email, password)?;
        self.current = Screen::Dashboard;
        Ok(admin)
    }

    pub fn logout(&mut self) -> AdminResult<()> {
        session::logout(self.store)?;
        self.current = Screen::Login;
        Ok(())
    }
}
