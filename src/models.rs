use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// One of the five answers accepted by `POST /submit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnswerLabel {
    UnderOneHour,
    TwoToThreeHours,
    ThreeToFourHours,
    FourToSixHours,
    OverSixHours,
}

impl AnswerLabel {
    /// Canonical order, also the key order of the persisted file.
    pub const ALL: [AnswerLabel; 5] = [
        AnswerLabel::UnderOneHour,
        AnswerLabel::TwoToThreeHours,
        AnswerLabel::ThreeToFourHours,
        AnswerLabel::FourToSixHours,
        AnswerLabel::OverSixHours,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AnswerLabel::UnderOneHour => "Менее 1 часа",
            AnswerLabel::TwoToThreeHours => "2-3 часа",
            AnswerLabel::ThreeToFourHours => "3-4 часа",
            AnswerLabel::FourToSixHours => "4-6 часов",
            AnswerLabel::OverSixHours => "Более 6 часов",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for AnswerLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAnswer(pub String);

impl fmt::Display for UnknownAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown answer {:?}", self.0)
    }
}

impl std::error::Error for UnknownAnswer {}

impl FromStr for AnswerLabel {
    type Err = UnknownAnswer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnswerLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| UnknownAnswer(s.to_string()))
    }
}

/// Server-side tally: exactly one count per [`AnswerLabel`].
///
/// Serializes as a JSON object keyed by label text in canonical order.
/// Deserialization rejects any object whose key set differs from the
/// enumeration, so a differently-shaped file is treated as corrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    counts: [u64; 5],
}

impl Tally {
    pub fn get(&self, label: AnswerLabel) -> u64 {
        self.counts[label.index()]
    }

    pub fn increment(&mut self, label: AnswerLabel) {
        let slot = &mut self.counts[label.index()];
        *slot = slot.saturating_add(1);
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().fold(0u64, |sum, count| sum.saturating_add(*count))
    }

    pub fn iter(&self) -> impl Iterator<Item = (AnswerLabel, u64)> + '_ {
        AnswerLabel::ALL.into_iter().map(|label| (label, self.get(label)))
    }
}

impl Serialize for Tally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(AnswerLabel::ALL.len()))?;
        for (label, count) in self.iter() {
            map.serialize_entry(label.as_str(), &count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Tally {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TallyVisitor)
    }
}

struct TallyVisitor;

impl<'de> Visitor<'de> for TallyVisitor {
    type Value = Tally;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object with exactly the five answer labels as keys")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Tally, A::Error> {
        let mut counts: [Option<u64>; 5] = [None; 5];
        while let Some(key) = map.next_key::<String>()? {
            let label = key.parse::<AnswerLabel>().map_err(de::Error::custom)?;
            let slot = &mut counts[label.index()];
            if slot.is_some() {
                return Err(de::Error::custom(format!("duplicate key {:?}", key)));
            }
            *slot = Some(map.next_value()?);
        }

        let mut tally = Tally::default();
        for label in AnswerLabel::ALL {
            tally.counts[label.index()] = counts[label.index()]
                .ok_or_else(|| de::Error::missing_field(label.as_str()))?;
        }
        Ok(tally)
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub answer: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
