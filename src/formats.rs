use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Main,
    Spaces,
    Speakers,
    Schedule,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Main,
        Section::Spaces,
        Section::Speakers,
        Section::Schedule,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Section::Main => "main",
            Section::Spaces => "spaces",
            Section::Speakers => "speakers",
            Section::Schedule => "schedule",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Success,
    #[default]
    Failure,
}

impl<'de> Deserialize<'de> for SectionStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw.as_deref() {
            Some("success") => SectionStatus::Success,
            _ => SectionStatus::Failure,
        })
    }
}

/// Outcome of scraping one section: a status plus an untyped payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SectionResult {
    #[serde(default)]
    pub status: SectionStatus,
    #[serde(default, deserialize_with = "null_as_empty_object")]
    pub data: Map<String, Value>,
}

impl SectionResult {
    pub fn success(data: Map<String, Value>) -> Self {
        Self {
            status: SectionStatus::Success,
            data,
        }
    }

    pub fn failure() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.status == SectionStatus::Success
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }
}

fn null_as_empty_object<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Map<String, Value>, D::Error> {
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Result of looking up `section.data.field` in a bundle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldLookup<'a> {
    SectionMissing,
    FieldMissing,
    Found(&'a Value),
}

impl<'a> FieldLookup<'a> {
    pub fn found(self) -> Option<&'a Value> {
        match self {
            FieldLookup::Found(value) => Some(value),
            FieldLookup::SectionMissing | FieldLookup::FieldMissing => None,
        }
    }
}

/// Per-section results of one scraping pass, keyed by section name.
///
/// Unknown section names returned by the scraping service are kept so the
/// full view can pass them through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ScrapeResultBundle {
    sections: BTreeMap<String, SectionResult>,
}

impl ScrapeResultBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_section(mut self, section: Section, result: SectionResult) -> Self {
        self.insert(section, result);
        self
    }

    pub fn insert(&mut self, section: Section, result: SectionResult) {
        self.sections.insert(section.as_str().to_owned(), result);
    }

    pub fn get(&self, section: Section) -> Option<&SectionResult> {
        self.sections.get(section.as_str())
    }

    /// Returns the stored result, or an empty failed result when the
    /// scraping service omitted the section.
    pub fn section(&self, section: Section) -> SectionResult {
        self.get(section).cloned().unwrap_or_default()
    }

    pub fn data(&self, section: Section) -> Map<String, Value> {
        self.get(section)
            .map(|result| result.data.clone())
            .unwrap_or_default()
    }

    pub fn is_success(&self, section: Section) -> bool {
        self.get(section).is_some_and(SectionResult::is_success)
    }

    pub fn lookup(&self, section: Section, field: &str) -> FieldLookup<'_> {
        let Some(result) = self.get(section) else {
            return FieldLookup::SectionMissing;
        };
        match result.field(field) {
            Some(value) => FieldLookup::Found(value),
            None => FieldLookup::FieldMissing,
        }
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeakersDocument {
    pub speakers: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleDocument {
    pub days: Vec<ScheduleDay>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleDay {
    pub day: String,
    pub sessions: Vec<Value>,
}

impl ScheduleDocument {
    pub const SINGLE_DAY_LABEL: &'static str = "Day 1";

    pub fn single_day(sessions: Vec<Value>) -> Self {
        Self {
            days: vec![ScheduleDay {
                day: Self::SINGLE_DAY_LABEL.to_owned(),
                sessions,
            }],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncSummary {
    pub speakers_count: usize,
    pub main_page_available: bool,
}

/// Body of a successful `scrape` call; `type` selects the view.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScrapeView {
    Spaces {
        data: Map<String, Value>,
    },
    Registration {
        data: Map<String, Value>,
        registration_link: String,
        registration_platform: String,
    },
    AllData {
        data: ScrapeResultBundle,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScrapeResponse {
    pub success: bool,
    #[serde(flatten)]
    pub view: ScrapeView,
    pub scraped_at: String,
    pub support_contact: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConferenceInfoView {
    pub success: bool,
    pub conference_info: Map<String, Value>,
    pub spaces: Map<String, Value>,
    pub registration_link: String,
    pub registration_platform: String,
    pub scraped_at: String,
    pub support_contact: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UpdateResponse {
    pub success: bool,
    pub message: String,
    pub updated_at: String,
    pub data_summary: SyncSummary,
    pub support_contact: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorEnvelope {
    pub error: bool,
    pub message: String,
    pub support_contact: String,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>, support_contact: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
            support_contact: support_contact.into(),
        }
    }
}

/// Uniform result of every exposed operation.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Envelope<T> {
    Success(T),
    Error(ErrorEnvelope),
}

impl<T> Envelope<T> {
    pub fn is_error(&self) -> bool {
        matches!(self, Envelope::Error(_))
    }

    pub fn success(self) -> Option<T> {
        match self {
            Envelope::Success(body) => Some(body),
            Envelope::Error(_) => None,
        }
    }

    pub fn error(self) -> Option<ErrorEnvelope> {
        match self {
            Envelope::Success(_) => None,
            Envelope::Error(envelope) => Some(envelope),
        }
    }
}
