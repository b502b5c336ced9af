use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::info;

use crate::auth::password::hash_password;
use crate::database::users::{self, NewUser, UserRecord};
use crate::database::Database;
use crate::error::{AdminResult, ValidationError};
use crate::screens::table::Table;
use crate::screens::Screen;
use crate::session::AdminSession;
use crate::utils::format::format_date;

pub const MIN_PASSWORD_LEN: usize = 8;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$").expect("email pattern compiles")
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct UserRow {
    pub index: usize,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub created: String,
    pub playlists: i64,
    pub plays: i64,
}

impl UserRow {
    fn from_record(index: usize, record: UserRecord) -> Self {
        Self {
            index,
            user_id: record.user_id,
            name: record.full_name(),
            created: format_date(&record.created_at),
            email: record.email,
            is_admin: record.is_admin,
            playlists: record.playlist_count,
            plays: record.listening_count,
        }
    }
}

/// Raw input of the "Add New User" form.
#[derive(Debug, Clone, Default)]
pub struct NewUserForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub is_admin: bool,
}

impl NewUserForm {
    /// Field checks, in the order the operator sees them. Email uniqueness
    /// is checked later, against the store.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("First name", self.first_name.trim()),
            ("Last name", self.last_name.trim()),
            ("Email", self.email.trim()),
            ("Password", self.password.as_str()),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.is_empty()) {
            return Err(ValidationError::MissingField(*field));
        }

        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort { min: MIN_PASSWORD_LEN });
        }
        if !email_pattern().is_match(self.email.trim()) {
            return Err(ValidationError::InvalidEmail);
        }
        Ok(())
    }

    pub fn into_new_user(self) -> NewUser {
        NewUser {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            password_hash: hash_password(&self.password),
            is_admin: self.is_admin,
        }
    }
}

/// Validates the form and stores the user with its default playlist.
pub fn create_user(db: &Database, form: NewUserForm) -> AdminResult<i64> {
    form.validate()?;
    users::insert_user(db, &form.into_new_user())
}

#[derive(Debug)]
pub struct UsersScreen<'a> {
    db: &'a Database,
    admin: AdminSession,
    rows: Vec<UserRow>,
}

impl<'a> UsersScreen<'a> {
    pub fn open(db: &'a Database, admin: AdminSession) -> AdminResult<Self> {
        let mut screen = Self {
            db,
            admin,
            rows: Vec::new(),
        };
        screen.refresh()?;
        Ok(screen)
    }

    pub fn admin(&self) -> &AdminSession {
        &self.admin
    }

    pub fn rows(&self) -> &[UserRow] {
        &self.rows
    }

    pub fn find(&self, user_id: i64) -> Option<&UserRow> {
        self.rows.iter().find(|row| row.user_id == user_id)
    }

    pub fn refresh(&mut self) -> AdminResult<()> {
        let records = users::list_users(self.db)?;
        self.rows = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| UserRow::from_record(i + 1, record))
            .collect();
        Ok(())
    }

    pub fn add(&mut self, form: NewUserForm) -> AdminResult<i64> {
        let user_id = create_user(self.db, form)?;
        info!("Admin {} added user {}", self.admin.admin_id(), user_id);
        self.refresh()?;
        Ok(user_id)
    }

    /// Refuses admins; otherwise removes the user and all it owns.
    pub fn delete(&mut self, user_id: i64) -> AdminResult<()> {
        users::delete_user(self.db, user_id)?;
        info!("Admin {} deleted user {}", self.admin.admin_id(), user_id);
        self.refresh()
    }

    /// Returns the new admin flag. Demoting oneself is allowed.
    pub fn toggle_admin(&mut self, user_id: i64) -> AdminResult<bool> {
        let is_admin = users::toggle_admin(self.db, user_id)?;
        self.refresh()?;
        Ok(is_admin)
    }

    pub fn render(&self) -> String {
        let mut table = Table::new(vec!["#", "Name", "Email", "Admin", "Created", "Playlists", "Plays", "ID"]);
        for row in &self.rows {
            table.push(vec![
                row.index.to_string(),
                row.name.clone(),
                row.email.clone(),
                if row.is_admin { "Yes" } else { "No" }.to_string(),
                row.created.clone(),
                row.playlists.to_string(),
                row.plays.to_string(),
                row.user_id.to_string(),
            ]);
        }
        format!(
            "{}  |  Admin: {}\n{}Total Users: {}",
            Screen::Users.title(),
            self.admin.profile().display_name(),
            table.render(),
            self.rows.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::{count, count_all, insert_user, temp_db};
    use crate::error::AdminError;
    use crate::session::SessionStore;
    use anyhow::Result;

    fn form(email: &str) -> NewUserForm {
        NewUserForm {
            first_name: " Grace ".to_string(),
            last_name: "Hopper".to_string(),
            email: email.to_string(),
            password: "compilers".to_string(),
            confirm_password: "compilers".to_string(),
            is_admin: false,
        }
    }

    fn open_screen<'a>(db: &'a Database, dir: &tempfile::TempDir) -> (i64, UsersScreen<'a>) {
        let store = SessionStore::new(dir.path().join("current_admin.txt"));
        let admin = insert_user(db, "Root", "root@example.com", "hunter22", true);
        let session = crate::session::login(db, &store, "root@example.com", "hunter22").unwrap();
        (admin, UsersScreen::open(db, session).unwrap())
    }

    #[test]
    fn test_form_validation_order() {
        assert_eq!(form("grace@example.com").validate(), Ok(()));

        let mut missing = form("grace@example.com");
        missing.last_name = "   ".to_string();
        assert_eq!(missing.validate(), Err(ValidationError::MissingField("Last name")));

        let mut mismatch = form("grace@example.com");
        mismatch.confirm_password = "compilerz".to_string();
        assert_eq!(mismatch.validate(), Err(ValidationError::PasswordMismatch));

        let mut short = form("grace@example.com");
        short.password = "cobol".to_string();
        short.confirm_password = "cobol".to_string();
        assert_eq!(short.validate(), Err(ValidationError::PasswordTooShort { min: 8 }));

        for bad in ["grace", "grace@", "grace@navy", "@navy.mil", "grace hopper@navy.mil"] {
            assert_eq!(form(bad).validate(), Err(ValidationError::InvalidEmail), "{}", bad);
        }
        assert_eq!(form("grace.hopper+cobol@navy.mil").validate(), Ok(()));
    }

    #[test]
    fn test_add_user_creates_one_row_and_favorites() -> Result<()> {
        let (dir, db) = temp_db();
        let (_, mut screen) = open_screen(&db, &dir);

        let user_id = screen.add(form("grace@example.com"))?;

        let row = screen.find(user_id).unwrap();
        assert_eq!(row.index, 1);
        assert_eq!(row.name, "Grace Hopper");
        assert!(!row.is_admin);
        assert_eq!(row.playlists, 1);
        assert_eq!(row.plays, 0);
        assert_eq!(count_all(&db, "SELECT COUNT(*) FROM Users WHERE email = 'grace@example.com'"), 1);
        assert_eq!(
            count(&db, "SELECT COUNT(*) FROM Playlists WHERE user_id = ?1 AND name = 'Favorites'", user_id),
            1
        );
        Ok(())
    }

    #[test]
    fn test_add_duplicate_email_rejected() -> Result<()> {
        let (dir, db) = temp_db();
        let (_, mut screen) = open_screen(&db, &dir);

        let mut dup = form("root@example.com");
        dup.first_name = "Other".to_string();
        assert!(matches!(
            screen.add(dup),
            Err(AdminError::Validation(ValidationError::DuplicateEmail))
        ));
        assert_eq!(screen.rows().len(), 1);
        assert_eq!(count_all(&db, "SELECT COUNT(*) FROM Playlists"), 0);
        Ok(())
    }

    #[test]
    fn test_delete_and_toggle() -> Result<()> {
        let (dir, db) = temp_db();
        let (admin, mut screen) = open_screen(&db, &dir);
        let user_id = screen.add(form("grace@example.com"))?;

        assert!(matches!(screen.delete(admin), Err(AdminError::PolicyViolation(_))));
        assert!(screen.find(admin).is_some());

        assert!(screen.toggle_admin(user_id)?);
        assert!(screen.find(user_id).unwrap().is_admin);
        assert!(matches!(screen.delete(user_id), Err(AdminError::PolicyViolation(_))));
        assert!(!screen.toggle_admin(user_id)?);

        screen.delete(user_id)?;
        assert!(screen.find(user_id).is_none());
        assert_eq!(count(&db, "SELECT COUNT(*) FROM Playlists WHERE user_id = ?1", user_id), 0);

        // No self-demotion guard
        assert!(!screen.toggle_admin(admin)?);
        assert!(screen.render().contains("Total Users: 1"));
        Ok(())
    }
}
