//! Which cached subtrees a successful mutation makes stale.
//!
//! | Mutation      | Invalidated subtrees          |
//! |---------------|-------------------------------|
//! | booking       | `bookings`, `technicians`     |
//! | customer      | `customers`, `bookings`       |
//! | testimonial   | `testimonials`                |
//! | service       | `services`                    |
//! | technician    | `technicians`, `team`         |
//! | team          | `team`                        |
//!
//! A booking changes technician availability, and a customer edit changes how
//! that customer's bookings render, hence the cross-resource entries.

use std::fmt;

use crate::keys::{QueryKey, bookings, customers, services, team, technicians, testimonials};

/// The kind of write a mutation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Booking,
    Customer,
    Testimonial,
    Service,
    Technician,
    Team,
}

impl MutationKind {
    /// Lowercase name used in log records.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Booking => "booking",
            Self::Customer => "customer",
            Self::Testimonial => "testimonial",
            Self::Service => "service",
            Self::Technician => "technician",
            Self::Team => "team",
        }
    }

    /// Root keys to invalidate once this mutation succeeds.
    pub fn invalidates(self) -> Vec<QueryKey> {
        match self {
            Self::Booking => vec![bookings::all(), technicians::all()],
            Self::Customer => vec![customers::all(), bookings::all()],
            Self::Testimonial => vec![testimonials::all()],
            Self::Service => vec![services::all()],
            Self::Technician => vec![technicians::all(), team::all()],
            Self::Team => vec![team::all()],
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roots(kind: MutationKind) -> Vec<String> {
        kind.invalidates().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn booking_also_invalidates_technicians() {
        assert_eq!(roots(MutationKind::Booking), ["bookings", "technicians"]);
    }

    #[test]
    fn customer_also_invalidates_bookings() {
        assert_eq!(roots(MutationKind::Customer), ["customers", "bookings"]);
    }

    #[test]
    fn testimonial_only_touches_testimonials() {
        assert_eq!(roots(MutationKind::Testimonial), ["testimonials"]);
    }
}
