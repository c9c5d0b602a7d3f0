use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a row as the course API hands it out.
///
/// Most collections use integer keys; a few (admins, blogs) use string slugs.
/// Ids compare by their wire text, so `Num(42)` and `Str("42")` are the same
/// row while `Str("007")` is not `Num(7)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Num(i64),
    Str(String),
}

#[derive(PartialEq, Eq, Hash, PartialOrd, Ord)]
enum IdKey<'a> {
    Num(i64),
    Str(&'a str),
}

/// `n` when `s` is exactly how `n` is written
fn canonical_int(s: &str) -> Option<i64> {
    s.parse::<i64>().ok().filter(|n| n.to_string() == s)
}

impl EntityId {
    fn key(&self) -> IdKey<'_> {
        match self {
            EntityId::Num(n) => IdKey::Num(*n),
            EntityId::Str(s) => match canonical_int(s) {
                Some(n) => IdKey::Num(n),
                None => IdKey::Str(s),
            },
        }
    }
}

impl PartialEq for EntityId {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for EntityId {}

impl Hash for EntityId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for EntityId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EntityId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Num(n) => write!(f, "{}", n),
            EntityId::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        EntityId::Num(value)
    }
}

impl From<i32> for EntityId {
    fn from(value: i32) -> Self {
        EntityId::Num(i64::from(value))
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId::Str(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        EntityId::Str(value)
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    /// Plain integer text becomes `Num`, anything else (`007`, `+5`, slugs) stays a string id
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match canonical_int(s) {
            Some(n) => EntityId::Num(n),
            None => EntityId::Str(s.to_string()),
        })
    }
}

/// The collections exposed by the course API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Classes,
    Courses,
    Students,
    Instructors,
    Enrollments,
    Promotions,
    Locations,
    Admins,
    Blogs,
}

impl Resource {
    pub const ALL: [Resource; 9] = [
        Resource::Classes,
        Resource::Courses,
        Resource::Students,
        Resource::Instructors,
        Resource::Enrollments,
        Resource::Promotions,
        Resource::Locations,
        Resource::Admins,
        Resource::Blogs,
    ];

    /// URL path segment of the collection
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Classes => "classes",
            Resource::Courses => "courses",
            Resource::Students => "students",
            Resource::Instructors => "instructors",
            Resource::Enrollments => "enrollments",
            Resource::Promotions => "promotions",
            Resource::Locations => "locations",
            Resource::Admins => "admins",
            Resource::Blogs => "blogs",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Resource::ALL
            .iter()
            .copied()
            .find(|r| r.path() == wanted)
            .ok_or_else(|| format!("unknown resource '{}'", s))
    }
}

/// Correlation id sent with every request as `X-Request-Id`
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}
