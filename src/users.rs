//! User directory: read-only lookups over the users store.

use crate::error::{Error, Result};
use crate::model::User;
use crate::store::{Record, RecordStore};

pub const USERS_HEADER: &str = "Code,Name,Email,Password";

const COL_CODE: usize = 0;
const COL_NAME: usize = 1;
const COL_EMAIL: usize = 2;
const COL_PASSWORD: usize = 3;

/// Lookup of users by code or by credential pair
#[derive(Debug, Clone)]
pub struct UserDirectory<S> {
    store: S,
}

impl<S: RecordStore> UserDirectory<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn find_all(&self) -> Result<Vec<User>> {
        self.store.read_all()?.iter().map(user_from_record).collect()
    }

    /// First user whose code matches.
    pub fn find_by_code(&self, code: i64) -> Result<User> {
        for record in self.store.read_all()? {
            if record.int(COL_CODE, "Code")? == code {
                return user_from_record(&record);
            }
        }
        Err(Error::UserNotFound(code))
    }

    /// First user whose email and password both match exactly.
    ///
    /// Passwords are stored and compared as plain text.
    pub fn find_by_credentials(&self, email: &str, password: &str) -> Result<User> {
        for record in self.store.read_all()? {
            if record.text(COL_EMAIL, "Email")? == email
                && record.text(COL_PASSWORD, "Password")? == password
            {
                return user_from_record(&record);
            }
        }
        Err(Error::InvalidCredentials)
    }
}

fn user_from_record(record: &Record) -> Result<User> {
    Ok(User {
        code: record.int(COL_CODE, "Code")?,
        name: record.text(COL_NAME, "Name")?.to_string(),
        email: record.text(COL_EMAIL, "Email")?.to_string(),
        password: record.text(COL_PASSWORD, "Password")?.to_string(),
    })
}
