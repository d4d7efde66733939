//! The fixed option sets a booking form selects from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A value that is not one of the enumerated options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownOption {
    pub kind: &'static str,
    pub value: String,
}

/// Services offered through the booking forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceKind {
    #[serde(rename = "ac-repair")]
    Repair,
    #[serde(rename = "ac-cleaning")]
    Cleaning,
    #[serde(rename = "gas-refilling")]
    GasRefilling,
    #[serde(rename = "ac-maintenance")]
    Maintenance,
    #[serde(rename = "emergency-service")]
    Emergency,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 5] = [
        Self::Repair,
        Self::Cleaning,
        Self::GasRefilling,
        Self::Maintenance,
        Self::Emergency,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Repair => "ac-repair",
            Self::Cleaning => "ac-cleaning",
            Self::GasRefilling => "gas-refilling",
            Self::Maintenance => "ac-maintenance",
            Self::Emergency => "emergency-service",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Repair => "AC Repair",
            Self::Cleaning => "AC Cleaning",
            Self::GasRefilling => "Gas Refilling",
            Self::Maintenance => "AC Maintenance",
            Self::Emergency => "Emergency Service",
        }
    }
}

/// Patna localities the business dispatches technicians to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceArea {
    BoringRoad,
    Kankarbagh,
    RajendraNagar,
    PatliputraColony,
    BaileyRoad,
    Danapur,
    Gardanibagh,
    Anisabad,
    PhulwariSharif,
    RajaBazar,
}

impl ServiceArea {
    pub const ALL: [ServiceArea; 10] = [
        Self::BoringRoad,
        Self::Kankarbagh,
        Self::RajendraNagar,
        Self::PatliputraColony,
        Self::BaileyRoad,
        Self::Danapur,
        Self::Gardanibagh,
        Self::Anisabad,
        Self::PhulwariSharif,
        Self::RajaBazar,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BoringRoad => "boring-road",
            Self::Kankarbagh => "kankarbagh",
            Self::RajendraNagar => "rajendra-nagar",
            Self::PatliputraColony => "patliputra-colony",
            Self::BaileyRoad => "bailey-road",
            Self::Danapur => "danapur",
            Self::Gardanibagh => "gardanibagh",
            Self::Anisabad => "anisabad",
            Self::PhulwariSharif => "phulwari-sharif",
            Self::RajaBazar => "raja-bazar",
        }
    }
}

/// How soon the customer wants a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    Today,
    Tomorrow,
    ThisWeek,
    Flexible,
}

impl Urgency {
    pub const ALL: [Urgency; 4] = [Self::Today, Self::Tomorrow, Self::ThisWeek, Self::Flexible];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Tomorrow => "tomorrow",
            Self::ThisWeek => "this-week",
            Self::Flexible => "flexible",
        }
    }
}

macro_rules! option_set_impls {
    ($ty:ty, $kind:literal) => {
        impl FromStr for $ty {
            type Err = UnknownOption;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .into_iter()
                    .find(|option| option.as_str() == s)
                    .ok_or_else(|| UnknownOption {
                        kind: $kind,
                        value: s.to_owned(),
                    })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

option_set_impls!(ServiceKind, "service");
option_set_impls!(ServiceArea, "area");
option_set_impls!(Urgency, "urgency");
