//! Hierarchical query keys and the per-resource key builders.
//!
//! Every cached request is identified by a [`QueryKey`]: an ordered list of
//! [`KeySegment`]s that starts with the resource kind and narrows from there.
//!
//! | Builder                                  | Key                                      |
//! |------------------------------------------|------------------------------------------|
//! | `services::all()`                        | `services`                               |
//! | `services::list(&params)`                | `services/list/{limit=20,page=1}`        |
//! | `services::detail("ac-repair")`          | `services/detail/ac-repair`              |
//! | `bookings::by_technician("t-7")`         | `bookings/technician/t-7`                |
//! | `technicians::available("danapur", d)`   | `technicians/available/{area=..,date=..}`|
//!
//! Keys compare by value, so two calls with equal parameters always land on
//! the same cache entry and share one in-flight request. Invalidating a key
//! affects every key it is a prefix of.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

mod params;

pub use params::{BookingFilters, ListParams, Params};

/// One component of a [`QueryKey`].
///
/// Parameter objects are stored as a [`BTreeMap`], so field order never
/// affects equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum KeySegment {
    Str(String),
    Int(i64),
    Bool(bool),
    Map(BTreeMap<String, KeySegment>),
}

impl From<&str> for KeySegment {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for KeySegment {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for KeySegment {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for KeySegment {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<bool> for KeySegment {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{k}={v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// An ordered, hierarchical identifier for a cached resource request.
///
/// # Examples
///
/// ```
/// use aircare::keys::{services, ListParams};
///
/// let params = ListParams { page: Some(1), limit: Some(20), ..Default::default() };
/// assert_eq!(services::list(&params), services::list(&params.clone()));
/// assert!(services::list(&params).starts_with(&services::all()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct QueryKey(Vec<KeySegment>);

impl QueryKey {
    /// A key holding just the resource root.
    pub fn root(resource: &str) -> Self {
        Self(vec![KeySegment::from(resource)])
    }

    /// Returns a new key with `segment` appended.
    #[must_use]
    pub fn child(&self, segment: impl Into<KeySegment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Returns `true` if `prefix` is this key or one of its ancestors.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// The resource kind this key belongs to.
    pub fn resource(&self) -> Option<&str> {
        match self.0.first() {
            Some(KeySegment::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// The service catalog.
pub mod services {
    use super::{ListParams, QueryKey};

    pub const ROOT: &str = "services";

    pub fn all() -> QueryKey {
        QueryKey::root(ROOT)
    }

    pub fn lists() -> QueryKey {
        all().child("list")
    }

    pub fn list(params: &ListParams) -> QueryKey {
        lists().child(params.to_segment())
    }

    pub fn details() -> QueryKey {
        all().child("detail")
    }

    pub fn detail(id: &str) -> QueryKey {
        details().child(id)
    }

    pub fn search(query: &str) -> QueryKey {
        all().child("search").child(query)
    }

    pub fn by_category(category: &str) -> QueryKey {
        all().child("category").child(category)
    }

    pub fn by_area(area: &str) -> QueryKey {
        all().child("area").child(area)
    }

    pub fn stats() -> QueryKey {
        all().child("stats")
    }
}

/// Booking records.
pub mod bookings {
    use super::{BookingFilters, QueryKey};

    pub const ROOT: &str = "bookings";

    pub fn all() -> QueryKey {
        QueryKey::root(ROOT)
    }

    pub fn lists() -> QueryKey {
        all().child("list")
    }

    pub fn list(filters: &BookingFilters) -> QueryKey {
        lists().child(filters.to_segment())
    }

    pub fn details() -> QueryKey {
        all().child("detail")
    }

    pub fn detail(id: &str) -> QueryKey {
        details().child(id)
    }

    pub fn by_customer(customer_id: &str) -> QueryKey {
        all().child("customer").child(customer_id)
    }

    pub fn by_technician(technician_id: &str) -> QueryKey {
        all().child("technician").child(technician_id)
    }

    pub fn by_status(status: &str) -> QueryKey {
        all().child("status").child(status)
    }

    pub fn stats() -> QueryKey {
        all().child("stats")
    }
}

/// Customer records.
pub mod customers {
    use super::{ListParams, QueryKey};

    pub const ROOT: &str = "customers";

    pub fn all() -> QueryKey {
        QueryKey::root(ROOT)
    }

    pub fn lists() -> QueryKey {
        all().child("list")
    }

    pub fn list(params: &ListParams) -> QueryKey {
        lists().child(params.to_segment())
    }

    pub fn details() -> QueryKey {
        all().child("detail")
    }

    pub fn detail(id: &str) -> QueryKey {
        details().child(id)
    }

    pub fn search(query: &str) -> QueryKey {
        all().child("search").child(query)
    }

    pub fn by_area(area: &str) -> QueryKey {
        all().child("area").child(area)
    }

    pub fn stats() -> QueryKey {
        all().child("stats")
    }
}

/// Field technicians and their availability.
pub mod technicians {
    use super::{ListParams, Params, QueryKey};

    pub const ROOT: &str = "technicians";

    pub fn all() -> QueryKey {
        QueryKey::root(ROOT)
    }

    pub fn lists() -> QueryKey {
        all().child("list")
    }

    pub fn list(params: &ListParams) -> QueryKey {
        lists().child(params.to_segment())
    }

    pub fn details() -> QueryKey {
        all().child("detail")
    }

    pub fn detail(id: &str) -> QueryKey {
        details().child(id)
    }

    pub fn by_area(area: &str) -> QueryKey {
        all().child("area").child(area)
    }

    /// Technicians free in `area` on `date` (`YYYY-MM-DD`).
    pub fn available(area: &str, date: &str) -> QueryKey {
        all()
            .child("available")
            .child(Params::new().set("area", area).set("date", date).build())
    }

    pub fn schedule(id: &str, date: &str) -> QueryKey {
        detail(id).child("schedule").child(date)
    }

    pub fn stats() -> QueryKey {
        all().child("stats")
    }
}

/// Public team profiles shown on the about page.
pub mod team {
    use super::{ListParams, QueryKey};

    pub const ROOT: &str = "team";

    pub fn all() -> QueryKey {
        QueryKey::root(ROOT)
    }

    pub fn lists() -> QueryKey {
        all().child("list")
    }

    pub fn list(params: &ListParams) -> QueryKey {
        lists().child(params.to_segment())
    }

    pub fn details() -> QueryKey {
        all().child("detail")
    }

    pub fn detail(id: &str) -> QueryKey {
        details().child(id)
    }
}

/// Customer testimonials.
pub mod testimonials {
    use super::{ListParams, QueryKey};

    pub const ROOT: &str = "testimonials";

    pub fn all() -> QueryKey {
        QueryKey::root(ROOT)
    }

    pub fn lists() -> QueryKey {
        all().child("list")
    }

    pub fn list(params: &ListParams) -> QueryKey {
        lists().child(params.to_segment())
    }

    pub fn details() -> QueryKey {
        all().child("detail")
    }

    pub fn detail(id: &str) -> QueryKey {
        details().child(id)
    }

    pub fn by_service(service: &str) -> QueryKey {
        all().child("service").child(service)
    }

    pub fn featured() -> QueryKey {
        all().child("featured")
    }

    pub fn stats() -> QueryKey {
        all().child("stats")
    }
}
