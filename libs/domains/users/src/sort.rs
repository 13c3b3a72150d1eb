//! `sort=<field>,<direction>` parsing and paging for user listings.
//!
//! Each listing declares the fields it may be ordered by. A field outside that
//! list, an unknown direction or a malformed expression is rejected with
//! [`UserError::InvalidSort`] instead of falling back to a default order.

use std::cmp::Ordering;
use std::str::FromStr;
use strum::{Display, EnumString};

use crate::error::{UserError, UserResult};
use crate::models::User;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum SortField {
    Id,
    Login,
    FirstName,
    LastName,
    Email,
    Activated,
    LangKey,
    CreatedDate,
    LastModifiedDate,
}

impl SortField {
    /// Fields `GET /api/users` may be ordered by
    pub const PUBLIC: &'static [SortField] = &[SortField::Id, SortField::Login];

    /// Fields `GET /api/admin/users` may be ordered by
    pub const ADMIN: &'static [SortField] = &[
        SortField::Id,
        SortField::Login,
        SortField::FirstName,
        SortField::LastName,
        SortField::Email,
        SortField::Activated,
        SortField::LangKey,
        SortField::CreatedDate,
        SortField::LastModifiedDate,
    ];

    /// Key of this field in a stored user document
    pub fn document_field(self) -> &'static str {
        match self {
            SortField::Id => "_id",
            SortField::Login => "login",
            SortField::FirstName => "first_name",
            SortField::LastName => "last_name",
            SortField::Email => "email",
            SortField::Activated => "activated",
            SortField::LangKey => "lang_key",
            SortField::CreatedDate => "created_date",
            SortField::LastModifiedDate => "last_modified_date",
        }
    }

    /// Ascending comparison of two users on this field; `None` sorts first
    pub fn compare(self, a: &User, b: &User) -> Ordering {
        match self {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Login => a.login.cmp(&b.login),
            SortField::FirstName => a.first_name.cmp(&b.first_name),
            SortField::LastName => a.last_name.cmp(&b.last_name),
            SortField::Email => a.email.cmp(&b.email),
            SortField::Activated => a.activated.cmp(&b.activated),
            SortField::LangKey => a.lang_key.cmp(&b.lang_key),
            SortField::CreatedDate => a.created_date.cmp(&b.created_date),
            SortField::LastModifiedDate => a.last_modified_date.cmp(&b.last_modified_date),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Single-field ordering; ties are broken by ascending id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for Sort {
    fn default() -> Self {
        Self::asc(SortField::Id)
    }
}

impl Sort {
    pub fn asc(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }

    /// Parse `field[,direction]` against `allowed`. A missing expression means `id,asc`.
    pub fn parse(raw: Option<&str>, allowed: &[SortField]) -> UserResult<Self> {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(Self::default());
        };

        let mut parts = raw.split(',').map(str::trim);
        let field_name = parts.next().unwrap_or_default();
        let direction_name = parts.next();

        if parts.next().is_some() {
            return Err(UserError::InvalidSort(format!(
                "Sort '{}' must look like <field>,<asc|desc>",
                raw
            )));
        }

        let field = SortField::from_str(field_name)
            .ok()
            .filter(|field| allowed.contains(field))
            .ok_or_else(|| {
                UserError::InvalidSort(format!("Sort field '{}' is not allowed", field_name))
            })?;

        let direction = match direction_name {
            None | Some("") => SortDirection::Asc,
            Some(name) => SortDirection::from_str(name).map_err(|_| {
                UserError::InvalidSort(format!("Sort direction '{}' is not asc or desc", name))
            })?,
        };

        Ok(Self { field, direction })
    }

    /// Total order used by in-process stores; mirrors the database sort
    pub fn compare(&self, a: &User, b: &User) -> Ordering {
        let primary = match self.direction {
            SortDirection::Asc => self.field.compare(a, b),
            SortDirection::Desc => self.field.compare(b, a),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

/// Zero-based page of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Size is clamped to `1..=MAX_PAGE_SIZE`
    pub fn new(page: Option<u64>, size: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(0),
            size: size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, login: &str) -> User {
        let mut user = User::new(login, format!("{}@example.com", login), "hash");
        user.id = Some(id.to_string());
        user
    }

    #[test]
    fn test_parse_defaults_to_id_asc() {
        assert_eq!(Sort::parse(None, SortField::PUBLIC).unwrap(), Sort::default());
        assert_eq!(
            Sort::parse(Some("  "), SortField::PUBLIC).unwrap(),
            Sort::asc(SortField::Id)
        );
    }

    #[test]
    fn test_parse_field_and_direction() {
        assert_eq!(
            Sort::parse(Some("login,desc"), SortField::PUBLIC).unwrap(),
            Sort::desc(SortField::Login)
        );
        assert_eq!(
            Sort::parse(Some("id,ASC"), SortField::PUBLIC).unwrap(),
            Sort::asc(SortField::Id)
        );
        assert_eq!(
            Sort::parse(Some("login"), SortField::PUBLIC).unwrap(),
            Sort::asc(SortField::Login)
        );
        assert_eq!(
            Sort::parse(Some("lastModifiedDate,desc"), SortField::ADMIN).unwrap(),
            Sort::desc(SortField::LastModifiedDate)
        );
    }

    #[test]
    fn test_public_allow_list_is_id_and_login() {
        assert_eq!(SortField::PUBLIC, &[SortField::Id, SortField::Login]);

        for field in ["email", "imageUrl", "langKey", "firstName", "activated"] {
            let err = Sort::parse(Some(&format!("{},asc", field)), SortField::PUBLIC).unwrap_err();
            assert!(matches!(err, UserError::InvalidSort(_)), "{} accepted", field);
        }
    }

    #[test]
    fn test_parse_rejects_malformed_expressions() {
        for raw in ["nope,asc", "login,sideways", "login,asc,extra", ",asc", "password_hash"] {
            assert!(
                matches!(
                    Sort::parse(Some(raw), SortField::ADMIN),
                    Err(UserError::InvalidSort(_))
                ),
                "{} accepted",
                raw
            );
        }
    }

    #[test]
    fn test_compare_orders_logins_both_ways() {
        let mut users = vec![user("1", "bob"), user("2", "alice"), user("3", "carol")];

        users.sort_by(|a, b| Sort::asc(SortField::Login).compare(a, b));
        let logins: Vec<&str> = users.iter().map(|u| u.login.as_str()).collect();
        assert_eq!(logins, ["alice", "bob", "carol"]);

        users.sort_by(|a, b| Sort::desc(SortField::Login).compare(a, b));
        let logins: Vec<&str> = users.iter().map(|u| u.login.as_str()).collect();
        assert_eq!(logins, ["carol", "bob", "alice"]);
    }

    #[test]
    fn test_compare_breaks_ties_by_id() {
        let mut a = user("b", "x");
        let mut b = user("a", "y");
        a.activated = true;
        b.activated = true;

        let sort = Sort::desc(SortField::Activated);
        assert_eq!(sort.compare(&b, &a), Ordering::Less);
    }

    #[test]
    fn test_document_fields() {
        assert_eq!(SortField::Id.document_field(), "_id");
        assert_eq!(SortField::LangKey.document_field(), "lang_key");
        assert_eq!(SortField::LastModifiedDate.to_string(), "lastModifiedDate");
    }

    #[test]
    fn test_page_request_clamps_size() {
        assert_eq!(PageRequest::new(None, None), PageRequest::default());
        assert_eq!(PageRequest::new(Some(2), Some(500)).size, MAX_PAGE_SIZE);
        assert_eq!(PageRequest::new(None, Some(0)).size, 1);
        assert_eq!(PageRequest::new(Some(3), Some(10)).offset(), 30);
    }
}
