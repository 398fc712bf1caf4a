use bitflags::bitflags;
use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

bitflags! {
    /// Set of days a schedule slot applies to.
    ///
    /// Serialised as a list of short day names, e.g. `["mon", "wed"]`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Weekdays: u8 {
        const MON = 1 << 0;
        const TUE = 1 << 1;
        const WED = 1 << 2;
        const THU = 1 << 3;
        const FRI = 1 << 4;
        const SAT = 1 << 5;
        const SUN = 1 << 6;

        const WORKWEEK = Self::MON.bits() | Self::TUE.bits() | Self::WED.bits()
            | Self::THU.bits() | Self::FRI.bits();
        const WEEKEND = Self::SAT.bits() | Self::SUN.bits();
    }
}

const DAY_NAMES: [(&str, Weekdays); 7] = [
    ("mon", Weekdays::MON),
    ("tue", Weekdays::TUE),
    ("wed", Weekdays::WED),
    ("thu", Weekdays::THU),
    ("fri", Weekdays::FRI),
    ("sat", Weekdays::SAT),
    ("sun", Weekdays::SUN),
];

impl Weekdays {
    /// Day by its offset from Monday (`0` = Monday, `6` = Sunday).
    #[must_use]
    pub fn from_monday_offset(offset: u32) -> Self {
        DAY_NAMES.get(offset as usize).map_or_else(Self::empty, |(_, day)| *day)
    }

    /// Short names of the contained days, Monday first.
    #[must_use]
    pub fn day_names(self) -> Vec<&'static str> {
        DAY_NAMES.iter().filter(|(_, day)| self.contains(*day)).map(|(name, _)| *name).collect()
    }
}

/// Error for an unrecognised day name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDay(pub String);

impl fmt::Display for UnknownDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown weekday '{}'", self.0)
    }
}

impl std::error::Error for UnknownDay {}

impl FromStr for Weekdays {
    type Err = UnknownDay;

    /// Accepts short (`mon`) and long (`monday`) names in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const LONG: [&str; 7] =
            ["monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday"];

        let lowered = s.trim().to_ascii_lowercase();
        DAY_NAMES
            .iter()
            .zip(LONG)
            .find(|((short, _), long)| lowered == *short || lowered == *long)
            .map(|((_, day), _)| *day)
            .ok_or_else(|| UnknownDay(s.to_owned()))
    }
}

impl Serialize for Weekdays {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let names = self.day_names();
        let mut seq = serializer.serialize_seq(Some(names.len()))?;
        for name in names {
            seq.serialize_element(name)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Weekdays {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DaysVisitor;

        impl<'de> Visitor<'de> for DaysVisitor {
            type Value = Weekdays;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a list of weekday names")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Weekdays, A::Error> {
                let mut days = Weekdays::empty();
                while let Some(name) = seq.next_element::<String>()? {
                    days |= name.parse::<Weekdays>().map_err(de::Error::custom)?;
                }
                Ok(days)
            }
        }

        deserializer.deserialize_seq(DaysVisitor)
    }
}
