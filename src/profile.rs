//! Profile model – the raw employee record as delivered by the profile store.
//!
//! Every field is optional. Unknown fields are ignored so records carrying
//! database ids, timestamps or other bookkeeping deserialise unchanged.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::MappingError;

/// A raw, possibly partial employee profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProfileData {
    #[serde(deserialize_with = "lenient_record")]
    pub general_information: Option<GeneralInformation>,

    // Flat fallbacks used by older records that predate `general_information`.
    #[serde(deserialize_with = "lenient_text")]
    pub first_name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub last_name: Option<String>,
    /// Full display name; split on the last space when no first/last name exists.
    #[serde(deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub designation: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub biography: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub profile_image: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub location: Option<String>,

    #[serde(deserialize_with = "lenient_items")]
    pub technical_skills: Option<Vec<Skill>>,
    #[serde(deserialize_with = "lenient_items")]
    pub specialized_skills: Option<Vec<Skill>>,
    #[serde(deserialize_with = "lenient_items")]
    pub experiences: Option<Vec<Experience>>,
    #[serde(deserialize_with = "lenient_items", alias = "education")]
    pub educations: Option<Vec<Education>>,
    #[serde(deserialize_with = "lenient_items")]
    pub trainings: Option<Vec<Training>>,
    #[serde(deserialize_with = "lenient_items")]
    pub achievements: Option<Vec<Achievement>>,
    #[serde(deserialize_with = "lenient_items")]
    pub projects: Option<Vec<Project>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeneralInformation {
    #[serde(deserialize_with = "lenient_text")]
    pub first_name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub last_name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub designation: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub biography: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub profile_image: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Skill {
    #[serde(deserialize_with = "lenient_text", alias = "skill")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub proficiency: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Experience {
    #[serde(deserialize_with = "lenient_text", alias = "company")]
    pub company_name: Option<String>,
    #[serde(deserialize_with = "lenient_text", alias = "title")]
    pub designation: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub start_date: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub end_date: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_current: Option<bool>,
    #[serde(deserialize_with = "lenient_text")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Education {
    #[serde(deserialize_with = "lenient_text")]
    pub degree: Option<String>,
    #[serde(deserialize_with = "lenient_text", alias = "institution")]
    pub university: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub department: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub start_date: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub end_date: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_current: Option<bool>,
    #[serde(deserialize_with = "lenient_text")]
    pub gpa: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Training {
    #[serde(deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub provider: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub certification_date: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub start_date: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub end_date: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Achievement {
    #[serde(deserialize_with = "lenient_text", alias = "title")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Project {
    #[serde(deserialize_with = "lenient_text", alias = "title")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub role: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub technologies: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_text")]
    pub start_date: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub end_date: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_current: Option<bool>,
    #[serde(deserialize_with = "lenient_text")]
    pub url: Option<String>,
}

impl ProfileData {
    /// Parse a profile from JSON. `null` yields an empty profile.
    pub fn from_json(json: &str) -> Result<Self, MappingError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Interpret an already-parsed JSON value as a profile.
    ///
    /// Only the top-level shape is checked: a field of the wrong type is
    /// treated as absent.
    pub fn from_value(value: Value) -> Result<Self, MappingError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(mut map) => {
                // `education` is the legacy spelling; the plural wins.
                if map.contains_key("educations") {
                    map.remove("education");
                }
                Ok(serde_json::from_value(Value::Object(map))?)
            }
            Value::Bool(_) => Err(MappingError::NotAnObject("a boolean")),
            Value::Number(_) => Err(MappingError::NotAnObject("a number")),
            Value::String(_) => Err(MappingError::NotAnObject("a string")),
            Value::Array(_) => Err(MappingError::NotAnObject("an array")),
        }
    }
}

// ---------------------------------------------------------------------------
// Lenient field decoders
// ---------------------------------------------------------------------------
//
// A field of the wrong type decodes as absent instead of rejecting the whole
// profile.

/// Accept a string or a number, keeping its textual form.
fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Value>::deserialize(d)?.and_then(text_of))
}

/// Accept `9`, `9.5`, `"9"` or `null`. Non-numeric strings become `None`.
fn lenient_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let raw = Option::<Value>::deserialize(d)?;
    Ok(match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Accept `true`, `1` or `"yes"` style flags.
fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    let raw = Option::<Value>::deserialize(d)?;
    Ok(match raw {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => n.as_f64().map(|n| n != 0.0),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Some(true),
            "false" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// Accept `["a", "b"]` or a comma-separated `"a, b"`.
fn lenient_list<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<String>>, D::Error> {
    let raw = Option::<Value>::deserialize(d)?;
    Ok(match raw {
        Some(Value::Array(items)) => Some(items.into_iter().filter_map(text_of).collect()),
        Some(Value::String(s)) => Some(
            s.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    })
}

/// Accept a list of records. A lone record is a one-element list; `null`
/// and undecodable elements are skipped.
fn lenient_items<'de, D, T>(d: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Value>::deserialize(d)?;
    Ok(match raw {
        Some(Value::Array(items)) => Some(items.into_iter().filter_map(record_of).collect()),
        Some(obj @ Value::Object(_)) => Some(record_of(obj).into_iter().collect()),
        _ => None,
    })
}

/// Accept a nested record; anything but an object is absent.
fn lenient_record<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(Option::<Value>::deserialize(d)?.and_then(record_of))
}

fn text_of(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn record_of<T: DeserializeOwned>(value: Value) -> Option<T> {
    if !value.is_object() {
        return None;
    }
    match serde_json::from_value(value) {
        Ok(record) => Some(record),
        Err(e) => {
            log::warn!("skipping malformed profile entry: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_is_empty_profile() {
        let p = ProfileData::from_json("null").unwrap();
        assert_eq!(p, ProfileData::default());
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(matches!(
            ProfileData::from_json("[1, 2]"),
            Err(MappingError::NotAnObject("an array"))
        ));
        assert!(matches!(
            ProfileData::from_json("{not json"),
            Err(MappingError::Json(_))
        ));
    }

    #[test]
    fn lenient_fields() {
        let p = ProfileData::from_json(
            r#"{
                "id": 42,
                "technical_skills": [{"name": "Go", "proficiency": "7"}, {"skill": "C"}],
                "education": [{"degree": "BSc", "institution": "MIT", "gpa": 3.9}],
                "projects": [{"title": "Atlas", "technologies": "Rust, Postgres ,"}]
            }"#,
        )
        .unwrap();

        let skills = p.technical_skills.unwrap();
        assert_eq!(skills[0].proficiency, Some(7.0));
        assert_eq!(skills[1].name.as_deref(), Some("C"));
        assert_eq!(skills[1].proficiency, None);

        let edu = p.educations.unwrap();
        assert_eq!(edu[0].university.as_deref(), Some("MIT"));
        assert_eq!(edu[0].gpa.as_deref(), Some("3.9"));

        let projects = p.projects.unwrap();
        assert_eq!(projects[0].name.as_deref(), Some("Atlas"));
        assert_eq!(
            projects[0].technologies,
            Some(vec!["Rust".to_string(), "Postgres".to_string()])
        );
    }

    #[test]
    fn flags_accept_strings_and_numbers() {
        let p = ProfileData::from_json(
            r#"{"experiences": [
                {"company_name": "A", "is_current": "true"},
                {"company_name": "B", "is_current": 1},
                {"company_name": "C", "is_current": "no"},
                {"company_name": "D", "is_current": "sometimes"}
            ]}"#,
        )
        .unwrap();
        let flags: Vec<Option<bool>> =
            p.experiences.unwrap().iter().map(|e| e.is_current).collect();
        assert_eq!(flags, [Some(true), Some(true), Some(false), None]);
    }

    #[test]
    fn null_and_malformed_list_entries_are_skipped() {
        let p = ProfileData::from_json(
            r#"{"technical_skills": [null, {"name": "Rust"}, 7, {"name": "Go", "skill": "Go"}]}"#,
        )
        .unwrap();
        let names: Vec<_> = p
            .technical_skills
            .unwrap()
            .into_iter()
            .map(|s| s.name.unwrap_or_default())
            .collect();
        assert_eq!(names, ["Rust"]);
    }

    #[test]
    fn wrong_scalar_types_become_absent() {
        let p = ProfileData::from_json(
            r#"{
                "general_information": {"first_name": 42, "last_name": ["x"], "email": true},
                "designation": {"title": "Engineer"}
            }"#,
        )
        .unwrap();
        let general = p.general_information.unwrap();
        assert_eq!(general.first_name.as_deref(), Some("42"));
        assert_eq!(general.last_name, None);
        assert_eq!(general.email, None);
        assert_eq!(p.designation, None);
    }

    #[test]
    fn lone_record_is_a_one_element_list() {
        let p = ProfileData::from_json(
            r#"{"technical_skills": {"name": "Rust"}, "projects": "none", "general_information": []}"#,
        )
        .unwrap();
        assert_eq!(p.technical_skills.unwrap()[0].name.as_deref(), Some("Rust"));
        assert_eq!(p.projects, None);
        assert_eq!(p.general_information, None);
    }

    #[test]
    fn plural_education_wins_over_legacy_key() {
        let p = ProfileData::from_json(
            r#"{"education": [{"degree": "Old"}], "educations": [{"degree": "New"}]}"#,
        )
        .unwrap();
        assert_eq!(p.educations.unwrap()[0].degree.as_deref(), Some("New"));
    }
}
