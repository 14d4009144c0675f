use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Error returned when parsing an unknown enum code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCode {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for UnknownCode {}

/// Self-assessed skill level. Stored as the Portuguese code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillLevel {
    #[default]
    #[serde(rename = "iniciante")]
    Beginner,
    #[serde(rename = "intermediário", alias = "intermediario")]
    Intermediate,
    #[serde(rename = "avançado", alias = "avancado")]
    Advanced,
}

impl SkillLevel {
    pub const ALL: [SkillLevel; 3] = [Self::Beginner, Self::Intermediate, Self::Advanced];

    pub fn code(self) -> &'static str {
        match self {
            Self::Beginner => "iniciante",
            Self::Intermediate => "intermediário",
            Self::Advanced => "avançado",
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SkillLevel {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "iniciante" => Ok(Self::Beginner),
            "intermediário" | "intermediario" => Ok(Self::Intermediate),
            "avançado" | "avancado" => Ok(Self::Advanced),
            other => Err(UnknownCode {
                kind: "skill level",
                value: other.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------

/// Preferred learning medium.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LearningStyle {
    #[serde(rename = "vídeo", alias = "video")]
    Video,
    #[serde(rename = "leitura")]
    Reading,
    #[default]
    #[serde(rename = "misto")]
    Mixed,
}

impl LearningStyle {
    pub const ALL: [LearningStyle; 3] = [Self::Video, Self::Reading, Self::Mixed];

    pub fn code(self) -> &'static str {
        match self {
            Self::Video => "vídeo",
            Self::Reading => "leitura",
            Self::Mixed => "misto",
        }
    }
}

impl fmt::Display for LearningStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for LearningStyle {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vídeo" | "video" => Ok(Self::Video),
            "leitura" => Ok(Self::Reading),
            "misto" => Ok(Self::Mixed),
            other => Err(UnknownCode {
                kind: "learning style",
                value: other.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------

/// Career area the user wants to move into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterestArea {
    Ia,
    Frontend,
    Backend,
    Dados,
    Gestao,
    Uxui,
}

impl InterestArea {
    pub const ALL: [InterestArea; 6] = [
        Self::Ia,
        Self::Frontend,
        Self::Backend,
        Self::Dados,
        Self::Gestao,
        Self::Uxui,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::Ia => "ia",
            Self::Frontend => "frontend",
            Self::Backend => "backend",
            Self::Dados => "dados",
            Self::Gestao => "gestao",
            Self::Uxui => "uxui",
        }
    }

    /// Human-readable label shown next to the profile.
    pub fn label(self) -> &'static str {
        match self {
            Self::Ia => "IA",
            Self::Frontend => "Desenvolvimento Front-end",
            Self::Backend => "Desenvolvimento Back-end",
            Self::Dados => "Dados / Analytics",
            Self::Gestao => "Gestão e Liderança",
            Self::Uxui => "UX / UI",
        }
    }
}

impl fmt::Display for InterestArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for InterestArea {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.code() == s)
            .ok_or_else(|| UnknownCode {
                kind: "interest area",
                value: s.to_owned(),
            })
    }
}

/// Wire format for an optional interest area: the empty string means "none".
mod interest_code {
    use super::*;

    pub fn serialize<S: Serializer>(area: &Option<InterestArea>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(area.map_or("", InterestArea::code))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<InterestArea>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(code) => code.parse().map(Some).map_err(serde::de::Error::custom),
        }
    }
}

/// Weekly hours came from a numeric text field; tolerate floats and numeric strings.
mod lenient_hours {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        let value = Value::deserialize(d)?;
        let hours = match &value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Null => Some(0.0),
            _ => None,
        };
        match hours {
            Some(h) if h.is_finite() && h >= 0.0 => Ok(round_hours(h)),
            _ => Err(serde::de::Error::custom(format!(
                "weeklyHours must be a non-negative number, got {value}"
            ))),
        }
    }
}

/// Whole hours from a non-negative reading, rounded to the nearest hour.
pub fn round_hours(hours: f64) -> u32 {
    hours.round().clamp(0.0, f64::from(u32::MAX)) as u32
}

/// A task id as the app stored it: a non-blank string or a number.
pub fn task_id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Estimated minutes as a number or numeric string, rounded. `None` below 1.
pub fn minutes_from_value(value: &Value) -> Option<u32> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    let rounded = raw.round();
    (rounded >= 1.0 && rounded <= f64::from(u32::MAX)).then_some(rounded as u32)
}

/// Task fields as written by older clients: numeric ids, string or
/// fractional minutes, and task lists the database turned into maps.
mod lenient_task {
    use super::*;

    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(task_id_from_value(&Value::deserialize(d)?).unwrap_or_default())
    }

    pub fn minutes<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        Ok(minutes_from_value(&Value::deserialize(d)?).unwrap_or(Task::DEFAULT_ESTIMATED_MINUTES))
    }

    /// An array, or a map keyed by index. Null slots are skipped and a task
    /// without an id takes its 1-based position.
    pub fn tasks<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Task>, D::Error> {
        let slots: Vec<(usize, Value)> = match Value::deserialize(d)? {
            Value::Null => Vec::new(),
            Value::Array(items) => items.into_iter().enumerate().collect(),
            Value::Object(map) => {
                let mut slots = map
                    .into_iter()
                    .map(|(key, v)| {
                        key.parse::<usize>().map(|i| (i, v)).map_err(|_| {
                            serde::de::Error::custom(format!("task key {key:?} is not an index"))
                        })
                    })
                    .collect::<Result<Vec<_>, D::Error>>()?;
                slots.sort_by_key(|(i, _)| *i);
                slots
            }
            other => {
                return Err(serde::de::Error::custom(format!(
                    "tasks must be a list, got {other}"
                )));
            }
        };

        slots
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| {
                let mut task: Task = serde_json::from_value(v).map_err(serde::de::Error::custom)?;
                if task.id.is_empty() {
                    task.id = (i + 1).to_string();
                }
                Ok(task)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// The profile document at `users/{uid}`.
///
/// Missing fields fall back to [`UserProfile::default`], so partially written
/// documents still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub name: String,
    pub goal: String,
    pub current_skill_level: SkillLevel,
    #[serde(deserialize_with = "lenient_hours::deserialize")]
    pub weekly_hours: u32,
    pub learning_style: LearningStyle,
    #[serde(with = "interest_code")]
    pub interest_area: Option<InterestArea>,
}

impl UserProfile {
    pub const DEFAULT_WEEKLY_HOURS: u32 = 5;
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            goal: String::new(),
            current_skill_level: SkillLevel::Beginner,
            weekly_hours: Self::DEFAULT_WEEKLY_HOURS,
            learning_style: LearningStyle::Mixed,
            interest_area: None,
        }
    }
}

/// A partial profile update. Only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub goal: Option<String>,
    pub current_skill_level: Option<SkillLevel>,
    pub weekly_hours: Option<u32>,
    pub learning_style: Option<LearningStyle>,
    /// `Some(None)` clears the area.
    pub interest_area: Option<Option<InterestArea>>,
}

impl ProfilePatch {
    /// A patch that rewrites every field of `profile`.
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            name: Some(profile.name.clone()),
            goal: Some(profile.goal.clone()),
            current_skill_level: Some(profile.current_skill_level),
            weekly_hours: Some(profile.weekly_hours),
            learning_style: Some(profile.learning_style),
            interest_area: Some(profile.interest_area),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply the patch to an in-memory profile.
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(name) = &self.name {
            profile.name = name.clone();
        }
        if let Some(goal) = &self.goal {
            profile.goal = goal.clone();
        }
        if let Some(level) = self.current_skill_level {
            profile.current_skill_level = level;
        }
        if let Some(hours) = self.weekly_hours {
            profile.weekly_hours = hours;
        }
        if let Some(style) = self.learning_style {
            profile.learning_style = style;
        }
        if let Some(area) = self.interest_area {
            profile.interest_area = area;
        }
    }

    /// Field map for a partial merge, keyed by the document's field names.
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(name) = &self.name {
            fields.insert("name".into(), Value::from(name.as_str()));
        }
        if let Some(goal) = &self.goal {
            fields.insert("goal".into(), Value::from(goal.as_str()));
        }
        if let Some(level) = self.current_skill_level {
            fields.insert("currentSkillLevel".into(), Value::from(level.code()));
        }
        if let Some(hours) = self.weekly_hours {
            fields.insert("weeklyHours".into(), Value::from(hours));
        }
        if let Some(style) = self.learning_style {
            fields.insert("learningStyle".into(), Value::from(style.code()));
        }
        if let Some(area) = self.interest_area {
            fields.insert(
                "interestArea".into(),
                Value::from(area.map_or("", InterestArea::code)),
            );
        }
        fields
    }
}

// ---------------------------------------------------------------------------

fn default_estimated_minutes() -> u32 {
    Task::DEFAULT_ESTIMATED_MINUTES
}

/// One checkable study task inside a [`WeeklyPlan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, deserialize_with = "lenient_task::id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(
        default = "default_estimated_minutes",
        deserialize_with = "lenient_task::minutes"
    )]
    pub estimated_minutes: u32,
    #[serde(default)]
    pub done: bool,
}

impl Task {
    pub const DEFAULT_ESTIMATED_MINUTES: u32 = 45;
}

/// The plan document at `plans/{uid}/{weekId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPlan {
    pub week_id: String,
    #[serde(default)]
    pub summary: String,
    /// The database drops empty arrays, so a plan without tasks reads back
    /// with no `tasks` key at all.
    #[serde(default, deserialize_with = "lenient_task::tasks")]
    pub tasks: Vec<Task>,
}

impl WeeklyPlan {
    /// Position of the task with the given id.
    pub fn task_index(&self, task_id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == task_id)
    }

    /// `(done, total)` task counts.
    pub fn progress(&self) -> (usize, usize) {
        let done = self.tasks.iter().filter(|t| t.done).count();
        (done, self.tasks.len())
    }

    /// Total estimated minutes across all tasks.
    pub fn total_minutes(&self) -> u32 {
        self.tasks.iter().map(|t| t.estimated_minutes).sum()
    }
}
