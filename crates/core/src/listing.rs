use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::UnknownVariant;

// ── Listing ───────────────────────────────────────────────────

/// A single vacancy as returned by the listing source.
///
/// Identity is the external `id`; everything else is informational and is
/// never mutated after fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub company: String,
    pub salary: Option<Salary>,
    pub experience: Option<Experience>,
    pub remote: bool,
    pub area: Option<String>,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    /// Short requirement text, when the source provides one.
    pub requirement: Option<String>,
    /// Short responsibility text, when the source provides one.
    pub responsibility: Option<String>,
}

impl Listing {
    /// Salary rendered for humans, or a placeholder when unknown.
    pub fn salary_text(&self) -> String {
        match &self.salary {
            Some(s) if s.from.is_some() || s.to.is_some() => s.to_string(),
            _ => "Salary not specified".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salary {
    pub from: Option<u64>,
    pub to: Option<u64>,
    pub currency: Option<String>,
    pub gross: Option<bool>,
}

impl Salary {
    /// Best-case figure of the range: `to` if present, otherwise `from`.
    pub fn upper_bound(&self) -> Option<u64> {
        self.to.or(self.from)
    }

    /// True for ruble salaries. hh.ru reports rubles as `RUR`; a missing
    /// currency is read as rubles too.
    pub fn is_rubles(&self) -> bool {
        match self.currency.as_deref() {
            None => true,
            Some(code) => code.eq_ignore_ascii_case("RUR") || code.eq_ignore_ascii_case("RUB"),
        }
    }
}

impl fmt::Display for Salary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let currency = self.currency.as_deref().unwrap_or("");
        let text = match (self.from, self.to) {
            (Some(from), Some(to)) => format!("{from} – {to} {currency}"),
            (Some(from), None) => format!("from {from} {currency}"),
            (None, Some(to)) => format!("up to {to} {currency}"),
            (None, None) => return Ok(()),
        };
        write!(f, "{}", text.trim_end())
    }
}

// ── Experience ────────────────────────────────────────────────

/// Experience band, using hh.ru identifiers on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Experience {
    #[serde(rename = "noExperience")]
    NoExperience,
    #[serde(rename = "between1And3")]
    Between1And3,
    #[serde(rename = "between3And6")]
    Between3And6,
    #[serde(rename = "moreThan6")]
    MoreThan6,
}

impl Experience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Experience::NoExperience => "noExperience",
            Experience::Between1And3 => "between1And3",
            Experience::Between3And6 => "between3And6",
            Experience::MoreThan6 => "moreThan6",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Experience::NoExperience => "no experience",
            Experience::Between1And3 => "1–3 years",
            Experience::Between3And6 => "3–6 years",
            Experience::MoreThan6 => "6+ years",
        }
    }
}

impl fmt::Display for Experience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Experience {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "noExperience" => Ok(Experience::NoExperience),
            "between1And3" => Ok(Experience::Between1And3),
            "between3And6" => Ok(Experience::Between3And6),
            "moreThan6" => Ok(Experience::MoreThan6),
            other => Err(UnknownVariant {
                kind: "experience",
                value: other.to_string(),
            }),
        }
    }
}

// ── Seen records ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeenStatus {
    Delivered,
    Favorited,
    Hidden,
}

impl SeenStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeenStatus::Delivered => "delivered",
            SeenStatus::Favorited => "favorited",
            SeenStatus::Hidden => "hidden",
        }
    }
}

impl fmt::Display for SeenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeenStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delivered" => Ok(SeenStatus::Delivered),
            "favorited" => Ok(SeenStatus::Favorited),
            "hidden" => Ok(SeenStatus::Hidden),
            other => Err(UnknownVariant {
                kind: "seen status",
                value: other.to_string(),
            }),
        }
    }
}

/// Persisted dedup row. Carries enough metadata to re-render a favorite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeenRecord {
    pub listing_id: String,
    pub status: SeenStatus,
    pub title: String,
    pub company: String,
    pub url: String,
    pub salary: Option<String>,
    pub delivered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn salary(from: Option<u64>, to: Option<u64>) -> Salary {
        Salary {
            from,
            to,
            currency: Some("RUR".to_string()),
            gross: None,
        }
    }

    #[test]
    fn salary_display_variants() {
        assert_eq!(salary(Some(100), Some(200)).to_string(), "100 – 200 RUR");
        assert_eq!(salary(Some(100), None).to_string(), "from 100 RUR");
        assert_eq!(salary(None, Some(200)).to_string(), "up to 200 RUR");
    }

    #[test]
    fn upper_bound_prefers_to() {
        assert_eq!(salary(Some(100), Some(200)).upper_bound(), Some(200));
        assert_eq!(salary(Some(100), None).upper_bound(), Some(100));
        assert_eq!(salary(None, None).upper_bound(), None);
    }

    #[test]
    fn experience_parses_wire_ids() {
        assert_eq!("between3And6".parse::<Experience>().unwrap(), Experience::Between3And6);
        let err = "senior".parse::<Experience>().unwrap_err();
        assert!(err.to_string().contains("senior"));
    }

    #[test]
    fn seen_status_round_trips_through_str() {
        for status in [SeenStatus::Delivered, SeenStatus::Favorited, SeenStatus::Hidden] {
            assert_eq!(status.as_str().parse::<SeenStatus>().unwrap(), status);
        }
    }

    #[test]
    fn salary_text_placeholder_when_missing() {
        let listing = Listing {
            id: "1".into(),
            title: "Dev".into(),
            company: "Acme".into(),
            salary: None,
            experience: None,
            remote: false,
            area: None,
            url: "https://hh.ru/vacancy/1".into(),
            published_at: None,
            requirement: None,
            responsibility: None,
        };
        assert_eq!(listing.salary_text(), "Salary not specified");
    }
}
