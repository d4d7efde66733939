//! Parameter objects embedded in list keys.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::KeySegment;

/// Builder for a [`KeySegment::Map`]. `None` values are skipped.
#[derive(Debug, Default, Clone)]
pub struct Params {
    map: BTreeMap<String, KeySegment>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set(mut self, name: &str, value: impl Into<KeySegment>) -> Self {
        self.map.insert(name.to_owned(), value.into());
        self
    }

    #[must_use]
    pub fn set_opt<V>(self, name: &str, value: Option<V>) -> Self
    where
        V: Into<KeySegment>,
    {
        match value {
            Some(value) => self.set(name, value),
            None => self,
        }
    }

    pub fn build(self) -> KeySegment {
        KeySegment::Map(self.map)
    }
}

/// Pagination, sorting and coarse filtering shared by most list endpoints.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
    pub category: Option<String>,
    pub area: Option<String>,
}

impl ListParams {
    pub fn to_segment(&self) -> KeySegment {
        Params::new()
            .set_opt("page", self.page)
            .set_opt("limit", self.limit)
            .set_opt("sort", self.sort.clone())
            .set_opt("category", self.category.clone())
            .set_opt("area", self.area.clone())
            .build()
    }
}

/// Filters accepted by the booking list endpoint.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingFilters {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub area: Option<String>,
    pub customer_id: Option<String>,
    pub technician_id: Option<String>,
    /// `YYYY-MM-DD`
    pub date: Option<String>,
}

impl BookingFilters {
    pub fn to_segment(&self) -> KeySegment {
        Params::new()
            .set_opt("page", self.page)
            .set_opt("limit", self.limit)
            .set_opt("status", self.status.clone())
            .set_opt("area", self.area.clone())
            .set_opt("customer_id", self.customer_id.clone())
            .set_opt("technician_id", self.technician_id.clone())
            .set_opt("date", self.date.clone())
            .build()
    }
}
