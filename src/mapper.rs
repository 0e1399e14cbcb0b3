//! Data mapper – normalises a raw [`ProfileData`] into the flat,
//! default-filled [`MappedEmployeeData`] that templates are evaluated
//! against.
//!
//! All defaulting happens here, once. After mapping, every key a template
//! can reference exists: missing text is the empty string, missing lists are
//! empty lists, and derived fields (full name, periods, skill percentages)
//! are precomputed.

use crate::profile::{
    Achievement, Education, Experience, ProfileData, Project, Skill, Training,
};
use crate::value::{MapBuilder, TemplateValue};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Options controlling the mapper's derived fields.
#[derive(Debug, Clone, PartialEq)]
pub struct MapperOptions {
    /// Maximum proficiency score; `level_percent` is relative to it.
    pub proficiency_scale: f64,
    /// Shown as the end date of current positions.
    pub present_label: String,
    /// Month (`YYYY-MM`) that open-ended experiences run to when summing
    /// `total_experience_years`. Without it they are left out of the sum.
    pub as_of: Option<String>,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            proficiency_scale: 10.0,
            present_label: "Present".to_string(),
            as_of: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Mapped types
// ---------------------------------------------------------------------------

/// Normalised employee data. Every field is always present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedEmployeeData {
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub initials: String,
    pub designation: String,
    pub biography: String,
    pub profile_image: String,
    pub email: String,
    pub phone: String,
    pub location: String,

    pub technical_skills: Vec<MappedSkill>,
    pub specialized_skills: Vec<MappedSkill>,
    pub experiences: Vec<MappedExperience>,
    pub educations: Vec<MappedEducation>,
    pub trainings: Vec<MappedTraining>,
    pub achievements: Vec<MappedAchievement>,
    pub projects: Vec<MappedProject>,

    pub total_experience_years: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedSkill {
    pub name: String,
    pub proficiency: f64,
    pub level_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedExperience {
    pub company_name: String,
    pub designation: String,
    pub start_date: String,
    pub end_date: String,
    pub is_current: bool,
    pub description: String,
    pub period: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedEducation {
    pub degree: String,
    pub university: String,
    pub department: String,
    pub start_date: String,
    pub end_date: String,
    pub is_current: bool,
    pub gpa: String,
    pub period: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedTraining {
    pub title: String,
    pub provider: String,
    pub certification_date: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
    pub period: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedAchievement {
    pub name: String,
    pub description: String,
    pub date: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedProject {
    pub name: String,
    pub role: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub technologies_text: String,
    pub start_date: String,
    pub end_date: String,
    pub is_current: bool,
    pub url: String,
    pub period: String,
}

impl MappedEmployeeData {
    /// Every top-level key exposed to templates, in a stable order.
    pub const KEYS: &'static [&'static str] = &[
        "first_name",
        "last_name",
        "full_name",
        "initials",
        "designation",
        "biography",
        "profile_image",
        "email",
        "phone",
        "location",
        "technical_skills",
        "specialized_skills",
        "skills",
        "experiences",
        "educations",
        "trainings",
        "achievements",
        "projects",
        "has_skills",
        "has_experiences",
        "has_educations",
        "has_trainings",
        "has_achievements",
        "has_projects",
        "total_experience_years",
    ];

    /// Build the value tree templates are evaluated against.
    pub fn to_value(&self) -> TemplateValue {
        let skills: Vec<TemplateValue> = self
            .technical_skills
            .iter()
            .chain(&self.specialized_skills)
            .map(MappedSkill::to_value)
            .collect();

        MapBuilder::new()
            .set("first_name", self.first_name.as_str())
            .set("last_name", self.last_name.as_str())
            .set("full_name", self.full_name.as_str())
            .set("initials", self.initials.as_str())
            .set("designation", self.designation.as_str())
            .set("biography", self.biography.as_str())
            .set("profile_image", self.profile_image.as_str())
            .set("email", self.email.as_str())
            .set("phone", self.phone.as_str())
            .set("location", self.location.as_str())
            .set("technical_skills", list(&self.technical_skills, MappedSkill::to_value))
            .set("specialized_skills", list(&self.specialized_skills, MappedSkill::to_value))
            .set("has_skills", !skills.is_empty())
            .set("skills", TemplateValue::List(skills))
            .set("experiences", list(&self.experiences, MappedExperience::to_value))
            .set("educations", list(&self.educations, MappedEducation::to_value))
            .set("trainings", list(&self.trainings, MappedTraining::to_value))
            .set("achievements", list(&self.achievements, MappedAchievement::to_value))
            .set("projects", list(&self.projects, MappedProject::to_value))
            .set("has_experiences", !self.experiences.is_empty())
            .set("has_educations", !self.educations.is_empty())
            .set("has_trainings", !self.trainings.is_empty())
            .set("has_achievements", !self.achievements.is_empty())
            .set("has_projects", !self.projects.is_empty())
            .set("total_experience_years", self.total_experience_years)
            .build()
    }

    /// Pretty JSON of the template-visible data, for template authors.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.to_value().to_json()).unwrap_or_default()
    }
}

fn list<T>(items: &[T], f: fn(&T) -> TemplateValue) -> TemplateValue {
    TemplateValue::List(items.iter().map(f).collect())
}

impl MappedSkill {
    fn to_value(&self) -> TemplateValue {
        MapBuilder::new()
            .set("name", self.name.as_str())
            .set("proficiency", self.proficiency)
            .set("level_percent", self.level_percent)
            .build()
    }
}

impl MappedExperience {
    fn to_value(&self) -> TemplateValue {
        MapBuilder::new()
            .set("company_name", self.company_name.as_str())
            .set("designation", self.designation.as_str())
            .set("start_date", self.start_date.as_str())
            .set("end_date", self.end_date.as_str())
            .set("is_current", self.is_current)
            .set("description", self.description.as_str())
            .set("period", self.period.as_str())
            .build()
    }
}

impl MappedEducation {
    fn to_value(&self) -> TemplateValue {
        MapBuilder::new()
            .set("degree", self.degree.as_str())
            .set("university", self.university.as_str())
            .set("department", self.department.as_str())
            .set("start_date", self.start_date.as_str())
            .set("end_date", self.end_date.as_str())
            .set("is_current", self.is_current)
            .set("gpa", self.gpa.as_str())
            .set("period", self.period.as_str())
            .build()
    }
}

impl MappedTraining {
    fn to_value(&self) -> TemplateValue {
        MapBuilder::new()
            .set("title", self.title.as_str())
            .set("provider", self.provider.as_str())
            .set("certification_date", self.certification_date.as_str())
            .set("start_date", self.start_date.as_str())
            .set("end_date", self.end_date.as_str())
            .set("description", self.description.as_str())
            .set("period", self.period.as_str())
            .build()
    }
}

impl MappedAchievement {
    fn to_value(&self) -> TemplateValue {
        MapBuilder::new()
            .set("name", self.name.as_str())
            .set("description", self.description.as_str())
            .set("date", self.date.as_str())
            .build()
    }
}

impl MappedProject {
    fn to_value(&self) -> TemplateValue {
        MapBuilder::new()
            .set("name", self.name.as_str())
            .set("role", self.role.as_str())
            .set("description", self.description.as_str())
            .set("technologies", self.technologies.clone())
            .set("technologies_text", self.technologies_text.as_str())
            .set("start_date", self.start_date.as_str())
            .set("end_date", self.end_date.as_str())
            .set("is_current", self.is_current)
            .set("url", self.url.as_str())
            .set("period", self.period.as_str())
            .build()
    }
}

// ---------------------------------------------------------------------------
// Mapper
// ---------------------------------------------------------------------------

/// Pure profile normaliser.
#[derive(Debug, Clone, Default)]
pub struct DataMapper {
    options: MapperOptions,
}

impl DataMapper {
    pub fn new(options: MapperOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MapperOptions {
        &self.options
    }

    /// Normalise `profile`. Never fails: absent data maps to defaults.
    pub fn map(&self, profile: &ProfileData) -> MappedEmployeeData {
        let general = profile.general_information.clone().unwrap_or_default();

        // The dedicated general-information record wins over flat fields.
        // A name is taken whole from one source so parts are never mixed.
        let (split_first, split_last) = split_name(profile.name.as_deref());
        let (first_name, last_name) = [
            (general.first_name.as_deref(), general.last_name.as_deref()),
            (profile.first_name.as_deref(), profile.last_name.as_deref()),
            (split_first.as_deref(), split_last.as_deref()),
        ]
        .into_iter()
        .map(|(first, last)| (pick(&[first]), pick(&[last])))
        .find(|(first, last)| !first.is_empty() || !last.is_empty())
        .unwrap_or_default();
        let full_name = match (first_name.is_empty(), last_name.is_empty()) {
            (false, false) => format!("{first_name} {last_name}"),
            (false, true) => first_name.clone(),
            (true, false) => last_name.clone(),
            (true, true) => pick(&[profile.name.as_deref()]),
        };
        let initials = full_name
            .split_whitespace()
            .filter_map(|w| w.chars().next())
            .flat_map(char::to_uppercase)
            .collect();

        let experiences: Vec<MappedExperience> = items(&profile.experiences)
            .iter()
            .map(|e| self.map_experience(e))
            .collect();
        let total_experience_years = self.total_experience_years(items(&profile.experiences));

        MappedEmployeeData {
            designation: pick(&[general.designation.as_deref(), profile.designation.as_deref()]),
            biography: pick(&[general.biography.as_deref(), profile.biography.as_deref()]),
            profile_image: pick(&[
                general.profile_image.as_deref(),
                profile.profile_image.as_deref(),
            ]),
            email: pick(&[general.email.as_deref(), profile.email.as_deref()]),
            phone: pick(&[general.phone.as_deref(), profile.phone.as_deref()]),
            location: pick(&[general.location.as_deref(), profile.location.as_deref()]),
            first_name,
            last_name,
            full_name,
            initials,
            technical_skills: items(&profile.technical_skills)
                .iter()
                .map(|s| self.map_skill(s))
                .collect(),
            specialized_skills: items(&profile.specialized_skills)
                .iter()
                .map(|s| self.map_skill(s))
                .collect(),
            experiences,
            educations: items(&profile.educations)
                .iter()
                .map(|e| self.map_education(e))
                .collect(),
            trainings: items(&profile.trainings)
                .iter()
                .map(|t| self.map_training(t))
                .collect(),
            achievements: items(&profile.achievements)
                .iter()
                .map(map_achievement)
                .collect(),
            projects: items(&profile.projects)
                .iter()
                .map(|p| self.map_project(p))
                .collect(),
            total_experience_years,
        }
    }

    fn map_skill(&self, skill: &Skill) -> MappedSkill {
        let proficiency = skill.proficiency.filter(|p| p.is_finite()).unwrap_or(0.0);
        let level_percent = if self.options.proficiency_scale > 0.0 {
            let pct = proficiency / self.options.proficiency_scale * 100.0;
            (pct.clamp(0.0, 100.0) * 10.0).round() / 10.0
        } else {
            0.0
        };
        MappedSkill {
            name: text(&skill.name),
            proficiency,
            level_percent,
        }
    }

    fn map_experience(&self, e: &Experience) -> MappedExperience {
        let is_current = e.is_current.unwrap_or(false);
        let start_date = format_date(e.start_date.as_deref());
        let end_date = self.end_label(is_current, e.end_date.as_deref());
        MappedExperience {
            company_name: text(&e.company_name),
            designation: text(&e.designation),
            is_current,
            description: text(&e.description),
            period: period(&start_date, &end_date),
            start_date,
            end_date,
        }
    }

    fn map_education(&self, e: &Education) -> MappedEducation {
        let is_current = e.is_current.unwrap_or(false);
        let start_date = format_date(e.start_date.as_deref());
        let end_date = self.end_label(is_current, e.end_date.as_deref());
        MappedEducation {
            degree: text(&e.degree),
            university: text(&e.university),
            department: text(&e.department),
            is_current,
            gpa: text(&e.gpa),
            period: period(&start_date, &end_date),
            start_date,
            end_date,
        }
    }

    fn map_training(&self, t: &Training) -> MappedTraining {
        let start_date = format_date(t.start_date.as_deref());
        let end_date = format_date(t.end_date.as_deref());
        MappedTraining {
            title: text(&t.title),
            provider: text(&t.provider),
            certification_date: format_date(t.certification_date.as_deref()),
            description: text(&t.description),
            period: period(&start_date, &end_date),
            start_date,
            end_date,
        }
    }

    fn map_project(&self, p: &Project) -> MappedProject {
        let is_current = p.is_current.unwrap_or(false);
        let technologies: Vec<String> = p
            .technologies
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        let start_date = format_date(p.start_date.as_deref());
        let end_date = self.end_label(is_current, p.end_date.as_deref());
        MappedProject {
            name: text(&p.name),
            role: text(&p.role),
            description: text(&p.description),
            technologies_text: technologies.join(", "),
            technologies,
            is_current,
            url: text(&p.url),
            period: period(&start_date, &end_date),
            start_date,
            end_date,
        }
    }

    fn end_label(&self, is_current: bool, end: Option<&str>) -> String {
        if is_current {
            self.options.present_label.clone()
        } else {
            format_date(end)
        }
    }

    fn total_experience_years(&self, experiences: &[Experience]) -> f64 {
        let as_of = self.options.as_of.as_deref().and_then(parse_year_month);
        let months: i64 = experiences
            .iter()
            .filter_map(|e| {
                let start = parse_year_month(e.start_date.as_deref()?)?;
                let end = if e.is_current.unwrap_or(false) {
                    as_of?
                } else {
                    parse_year_month(e.end_date.as_deref()?)?
                };
                let span = (end.0 - start.0) * 12 + (end.1 as i64 - start.1 as i64);
                (span >= 0).then_some(span)
            })
            .sum();
        (months as f64 / 12.0 * 10.0).round() / 10.0
    }
}

fn map_achievement(a: &Achievement) -> MappedAchievement {
    MappedAchievement {
        name: text(&a.name),
        description: text(&a.description),
        date: format_date(a.date.as_deref()),
    }
}

fn items<T>(list: &Option<Vec<T>>) -> &[T] {
    list.as_deref().unwrap_or_default()
}

/// Trimmed text, or the empty placeholder when absent or blank.
fn text(value: &Option<String>) -> String {
    pick(&[value.as_deref()])
}

/// First non-blank candidate, trimmed. Candidates are ordered most-specific first.
fn pick(candidates: &[Option<&str>]) -> String {
    candidates
        .iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Split "Ada King Lovelace" into ("Ada King", "Lovelace").
fn split_name(name: Option<&str>) -> (Option<String>, Option<String>) {
    let name = match name.map(str::trim) {
        Some(n) if !n.is_empty() => n,
        _ => return (None, None),
    };
    match name.rsplit_once(char::is_whitespace) {
        Some((first, last)) => (Some(first.trim().to_string()), Some(last.to_string())),
        None => (Some(name.to_string()), None),
    }
}

fn period(start: &str, end: &str) -> String {
    match (start.is_empty(), end.is_empty()) {
        (false, false) => format!("{start} – {end}"),
        (false, true) => start.to_string(),
        (true, false) => end.to_string(),
        (true, true) => String::new(),
    }
}

/// Parse the `YYYY-MM` prefix of an ISO date or datetime.
fn parse_year_month(s: &str) -> Option<(i64, u32)> {
    let s = s.trim();
    let year: i64 = s.get(0..4)?.parse().ok()?;
    if s.as_bytes().get(4) != Some(&b'-') {
        return None;
    }
    let month: u32 = s.get(5..7)?.parse().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}

/// `2021-03-15` → `Mar 2021`. A bare year passes through; anything else is
/// kept verbatim.
fn format_date(raw: Option<&str>) -> String {
    let s = match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => return String::new(),
    };
    if let Some((year, month)) = parse_year_month(s) {
        return format!("{} {}", MONTHS[(month - 1) as usize], year);
    }
    if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
        return s.to_string();
    }
    log::warn!("unrecognised date '{s}', keeping it verbatim");
    s.to_string()
}
