/// Adoption preferences
///
/// A user's preference is three non-empty code sets (age buckets, genders,
/// sizes). Resolving a preference turns the age buckets into the set of
/// admissible ages in months, which the candidate selector filters on.

mod store;

pub use store::PreferenceStore;

use crate::{
    catalog::{Gender, Size},
    error::{AppError, AppResult},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, ops::Range, str::FromStr};

/// Fixed age classification, in months
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeBucket {
    #[serde(rename = "b")]
    Baby,
    #[serde(rename = "y")]
    Young,
    #[serde(rename = "a")]
    Adult,
    #[serde(rename = "s")]
    Senior,
}

impl AgeBucket {
    pub const ALL: [AgeBucket; 4] = [
        AgeBucket::Baby,
        AgeBucket::Young,
        AgeBucket::Adult,
        AgeBucket::Senior,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeBucket::Baby => "b",
            AgeBucket::Young => "y",
            AgeBucket::Adult => "a",
            AgeBucket::Senior => "s",
        }
    }

    /// Half-open month range covered by the bucket
    pub fn months(&self) -> Range<i64> {
        match self {
            AgeBucket::Baby => 0..12,
            AgeBucket::Young => 12..24,
            AgeBucket::Adult => 24..72,
            AgeBucket::Senior => 72..200,
        }
    }

    /// Bucket an age falls into; ages of 200 months and over have none
    #[cfg(test)]
    pub fn classify(age: i64) -> Option<AgeBucket> {
        Self::ALL.into_iter().find(|bucket| bucket.months().contains(&age))
    }
}

impl FromStr for AgeBucket {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "b" => Ok(AgeBucket::Baby),
            "y" => Ok(AgeBucket::Young),
            "a" => Ok(AgeBucket::Adult),
            "s" => Ok(AgeBucket::Senior),
            _ => Err(AppError::InvalidPreference(format!("Invalid age code: {}", s))),
        }
    }
}

/// Stored adoption preference for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preference {
    pub age: BTreeSet<AgeBucket>,
    pub gender: BTreeSet<Gender>,
    pub size: BTreeSet<Size>,
}

impl Default for Preference {
    fn default() -> Self {
        Self {
            age: AgeBucket::ALL.into_iter().collect(),
            gender: [Gender::Male, Gender::Female].into_iter().collect(),
            size: [Size::Small, Size::Medium, Size::Large, Size::ExtraLarge]
                .into_iter()
                .collect(),
        }
    }
}

impl Preference {
    /// Build a preference from raw codes, validating each field
    pub fn from_codes<A, G, S>(age: &[A], gender: &[G], size: &[S]) -> AppResult<Self>
    where
        A: AsRef<str>,
        G: AsRef<str>,
        S: AsRef<str>,
    {
        Ok(Self {
            age: parse_codes("age", age)?,
            gender: parse_codes("gender", gender)?,
            size: parse_codes("size", size)?,
        })
    }

    /// Build a preference from the comma-delimited columns it is stored as
    pub fn from_stored(age: &str, gender: &str, size: &str) -> AppResult<Self> {
        Self::from_codes(&split_codes(age), &split_codes(gender), &split_codes(size))
    }

    /// Comma-delimited storage form of a field
    pub fn join_codes<'a, I>(codes: I) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        codes.into_iter().collect::<Vec<_>>().join(",")
    }

    pub fn age_codes(&self) -> String {
        Self::join_codes(self.age.iter().map(AgeBucket::as_str))
    }

    pub fn gender_codes(&self) -> String {
        Self::join_codes(self.gender.iter().map(Gender::as_str))
    }

    pub fn size_codes(&self) -> String {
        Self::join_codes(self.size.iter().map(Size::as_str))
    }
}

/// Concrete predicates derived from a preference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Admissible ages in months (union of the selected bucket ranges)
    pub ages: BTreeSet<i64>,
    pub genders: BTreeSet<Gender>,
    pub sizes: BTreeSet<Size>,
}

impl FilterCriteria {
    #[cfg(test)]
    pub fn admits(&self, age: i64, gender: Gender, size: Size) -> bool {
        self.ages.contains(&age) && self.genders.contains(&gender) && self.sizes.contains(&size)
    }

    /// Admissible ages coalesced into contiguous half-open ranges
    pub fn age_spans(&self) -> Vec<Range<i64>> {
        let mut spans: Vec<Range<i64>> = Vec::new();
        for &age in &self.ages {
            match spans.last_mut() {
                Some(span) if span.end == age => span.end = age + 1,
                _ => spans.push(age..age + 1),
            }
        }
        spans
    }
}

/// Expand a preference into filter criteria
pub fn resolve(preference: &Preference) -> AppResult<FilterCriteria> {
    if preference.age.is_empty() || preference.gender.is_empty() || preference.size.is_empty() {
        return Err(AppError::InvalidPreference(
            "Preference fields must not be empty".to_string(),
        ));
    }

    Ok(FilterCriteria {
        ages: preference.age.iter().flat_map(AgeBucket::months).collect(),
        genders: preference.gender.clone(),
        sizes: preference.size.clone(),
    })
}

/// Preference field as sent by clients: a list of codes, or one
/// comma-delimited string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CodeList {
    Many(Vec<String>),
    Delimited(String),
}

impl CodeList {
    pub fn into_codes(self) -> Vec<String> {
        match self {
            CodeList::Many(codes) => codes,
            CodeList::Delimited(raw) => split_codes(&raw),
        }
    }
}

/// Preference update request body
#[derive(Debug, Clone, Deserialize)]
pub struct PreferenceUpdate {
    pub age: CodeList,
    pub gender: CodeList,
    pub size: CodeList,
}

fn split_codes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty())
        .collect()
}

fn parse_codes<T, C>(field: &str, codes: &[C]) -> AppResult<BTreeSet<T>>
where
    T: FromStr<Err = AppError> + Ord,
    C: AsRef<str>,
{
    let parsed = codes
        .iter()
        .map(|code| code.as_ref().trim().parse::<T>())
        .collect::<AppResult<BTreeSet<T>>>()?;

    if parsed.is_empty() {
        return Err(AppError::InvalidPreference(format!(
            "At least one {} code is required",
            field
        )));
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preference_is_unrestricted() {
        let preference = Preference::default();
        assert_eq!(preference.age_codes(), "b,y,a,s");
        assert_eq!(preference.gender_codes(), "m,f");
        assert_eq!(preference.size_codes(), "s,m,l,xl");
    }

    #[test]
    fn test_classify_bucket_boundaries() {
        assert_eq!(AgeBucket::classify(0), Some(AgeBucket::Baby));
        assert_eq!(AgeBucket::classify(11), Some(AgeBucket::Baby));
        assert_eq!(AgeBucket::classify(12), Some(AgeBucket::Young));
        assert_eq!(AgeBucket::classify(36), Some(AgeBucket::Adult));
        assert_eq!(AgeBucket::classify(60), Some(AgeBucket::Adult));
        assert_eq!(AgeBucket::classify(72), Some(AgeBucket::Senior));
        assert_eq!(AgeBucket::classify(199), Some(AgeBucket::Senior));
        assert_eq!(AgeBucket::classify(200), None);
        assert_eq!(AgeBucket::classify(420), None);
    }

    #[test]
    fn test_resolve_unions_bucket_ranges() {
        let preference = Preference::from_codes(&["b", "a"], &["f"], &["s", "xl"]).unwrap();
        let criteria = resolve(&preference).unwrap();

        let expected: BTreeSet<i64> = (0..12).chain(24..72).collect();
        assert_eq!(criteria.ages, expected);
        assert_eq!(criteria.age_spans(), vec![0..12, 24..72]);
        assert!(criteria.admits(30, Gender::Female, Size::Small));
        assert!(!criteria.admits(12, Gender::Female, Size::Small));
        assert!(!criteria.admits(30, Gender::Male, Size::Small));
    }

    #[test]
    fn test_adjacent_buckets_coalesce() {
        let criteria = resolve(&Preference::default()).unwrap();
        assert_eq!(criteria.age_spans(), vec![0..200]);
    }

    #[test]
    fn test_rejects_unknown_and_empty_codes() {
        assert!(matches!(
            Preference::from_codes(&["q"], &["m"], &["s"]),
            Err(AppError::InvalidPreference(_))
        ));
        assert!(matches!(
            Preference::from_codes(&["b"], &["x"], &["s"]),
            Err(AppError::InvalidPreference(_))
        ));
        let empty: [&str; 0] = [];
        assert!(matches!(
            Preference::from_codes(&["b"], &["m"], &empty),
            Err(AppError::InvalidPreference(_))
        ));
        assert!(Preference::from_stored("b,y", "", "s").is_err());
    }

    #[test]
    fn test_stored_form_round_trip() {
        let preference = Preference::from_stored("s, b", "f", "xl,s").unwrap();
        assert_eq!(preference.age_codes(), "b,s");
        assert_eq!(preference.size_codes(), "s,xl");
        assert_eq!(
            Preference::from_stored(
                &preference.age_codes(),
                &preference.gender_codes(),
                &preference.size_codes()
            )
            .unwrap(),
            preference
        );
    }

    #[test]
    fn test_code_list_accepts_both_shapes() {
        let update: PreferenceUpdate =
            serde_json::from_str(r#"{"age": "b,y", "gender": ["f"], "size": "xl"}"#).unwrap();

        assert_eq!(update.age.into_codes(), vec!["b", "y"]);
        assert_eq!(update.gender.into_codes(), vec!["f"]);
        assert_eq!(update.size.into_codes(), vec!["xl"]);
    }

    #[test]
    fn test_preference_serializes_as_code_arrays() {
        let json = serde_json::to_value(Preference::default()).unwrap();
        assert_eq!(json["age"], serde_json::json!(["b", "y", "a", "s"]));
        assert_eq!(json["size"], serde_json::json!(["s", "m", "l", "xl"]));
    }
}
