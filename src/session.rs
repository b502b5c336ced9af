use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::auth::password::verify_password;
use crate::database::{users, Database};
use crate::error::{AdminError, AdminResult};

/// The signed-in admin as shown in screen headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminProfile {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl AdminProfile {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Proof that the guard ran against the store. Only [`authorize`] and
/// [`login`] hand these out.
#[derive(Debug, Clone)]
pub struct AdminSession {
    profile: AdminProfile,
}

impl AdminSession {
    pub fn profile(&self) -> &AdminProfile {
        &self.profile
    }

    pub fn admin_id(&self) -> i64 {
        self.profile.id
    }
}

/// Persisted form of the session: a plain-text file holding the admin id.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file and blank content both mean "not logged in".
    pub fn read_token(&self) -> AdminResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn issue(&self, admin_id: i64) -> AdminResult<()> {
        fs::write(&self.path, admin_id.to_string())?;
        Ok(())
    }

    pub fn clear(&self) -> AdminResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Cleared session artifact {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Validates the stored session against the database.
///
/// A missing or blank token yields `Unauthenticated`; a token that does not
/// name an admin yields `Forbidden`. Both clear the artifact. A database
/// outage leaves it in place.
pub fn authorize(db: &Database, store: &SessionStore) -> AdminResult<AdminSession> {
    let Some(token) = store.read_token()? else {
        store.clear()?;
        return Err(AdminError::Unauthenticated);
    };

    let profile = match token.parse::<i64>() {
        Ok(admin_id) => users::find_admin(db, admin_id)?,
        Err(_) => None,
    };

    match profile {
        Some(profile) => Ok(AdminSession { profile }),
        None => {
            warn!("Session token {:?} does not belong to an admin", token);
            store.clear()?;
            Err(AdminError::Forbidden)
        }
    }
}

/// Checks credentials and issues a new session artifact for an admin.
pub fn login(db: &Database, store: &SessionStore, email: &str, password: &str) -> AdminResult<AdminSession> {
    let credentials = users::find_credentials(db, email.trim())?;

    let Some(credentials) = credentials.filter(|c| verify_password(password, &c.password_hash)) else {
        warn!("Failed login for {:?}", email);
        return Err(AdminError::Unauthenticated);
    };
    if !credentials.is_admin {
        warn!("Non-admin {:?} tried to sign in", email);
        return Err(AdminError::Forbidden);
    }

    store.issue(credentials.profile.id)?;
    info!("Admin {} signed in", credentials.profile.id);
    Ok(AdminSession {
        profile: credentials.profile,
    })
}

pub fn logout(store: &SessionStore) -> AdminResult<()> {
    store.clear()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::{insert_user, temp_db};
    use anyhow::Result;

    fn store_in(dir: &tempfile::TempDir) -> SessionStore {
        SessionStore::new(dir.path().join("current_admin.txt"))
    }

    #[test]
    fn test_missing_file_is_unauthenticated() {
        let (dir, db) = temp_db();
        let store = store_in(&dir);

        assert!(matches!(authorize(&db, &store), Err(AdminError::Unauthenticated)));
    }

    #[test]
    fn test_blank_file_is_unauthenticated_and_cleared() -> Result<()> {
        let (dir, db) = temp_db();
        let store = store_in(&dir);
        fs::write(store.path(), "  \n")?;

        assert!(matches!(authorize(&db, &store), Err(AdminError::Unauthenticated)));
        assert!(!store.path().exists());
        Ok(())
    }

    #[test]
    fn test_denied_tokens_are_forbidden_and_cleared() -> Result<()> {
        let (dir, db) = temp_db();
        let store = store_in(&dir);
        let listener = insert_user(&db, "Ada", "ada@example.com", "password1", false);

        for token in [listener.to_string(), "999".to_string(), "not-a-number".to_string()] {
            fs::write(store.path(), &token)?;
            assert!(
                matches!(authorize(&db, &store), Err(AdminError::Forbidden)),
                "token {:?} should be refused",
                token
            );
            assert!(!store.path().exists());
        }
        Ok(())
    }

    #[test]
    fn test_admin_token_yields_profile() -> Result<()> {
        let (dir, db) = temp_db();
        let store = store_in(&dir);
        let admin = insert_user(&db, "Root", "root@example.com", "password1", true);
        fs::write(store.path(), format!("{}\n", admin))?;

        let session = authorize(&db, &store)?;
        assert_eq!(session.admin_id(), admin);
        assert_eq!(session.profile().display_name(), "Root Tester");
        assert_eq!(session.profile().email, "root@example.com");
        assert!(store.path().exists());
        Ok(())
    }

    #[test]
    fn test_database_outage_keeps_artifact() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = store_in(&dir);
        store.issue(1)?;
        let db = Database::new(dir.path().join("gone.db"));

        assert!(matches!(authorize(&db, &store), Err(AdminError::DatabaseUnavailable(_))));
        assert!(store.path().exists());
        Ok(())
    }

    #[test]
    fn test_login_issues_and_logout_invalidates() -> Result<()> {
        let (dir, db) = temp_db();
        let store = store_in(&dir);
        let admin = insert_user(&db, "Root", "root@example.com", "hunter22", true);

        let session = login(&db, &store, " root@example.com ", "hunter22")?;
        assert_eq!(session.admin_id(), admin);
        assert_eq!(store.read_token()?, Some(admin.to_string()));
        assert_eq!(authorize(&db, &store)?.admin_id(), admin);

        logout(&store)?;
        assert_eq!(store.read_token()?, None);
        assert!(matches!(authorize(&db, &store), Err(AdminError::Unauthenticated)));
        Ok(())
    }

    #[test]
    fn test_login_rejections() -> Result<()> {
        let (dir, db) = temp_db();
        let store = store_in(&dir);
        insert_user(&db, "Root", "root@example.com", "hunter22", true);
        insert_user(&db, "Ada", "ada@example.com", "password1", false);

        assert!(matches!(
            login(&db, &store, "root@example.com", "wrong"),
            Err(AdminError::Unauthenticated)
        ));
        assert!(matches!(
            login(&db, &store, "nobody@example.com", "hunter22"),
            Err(AdminError::Unauthenticated)
        ));
        assert!(matches!(
            login(&db, &store, "ada@example.com", "password1"),
            Err(AdminError::Forbidden)
        ));
        assert_eq!(store.read_token()?, None);
        Ok(())
    }
}
