use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::formats::{
    ConferenceInfoView, FieldLookup, ScrapeResponse, ScrapeResultBundle, ScrapeView, Section,
};

pub const DEFAULT_REGISTRATION_LINK: &str = "https://lu.ma/ltp8u2bb";
pub const DEFAULT_REGISTRATION_PLATFORM: &str = "Luma";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    Spaces,
    Registration,
    All,
}

impl SelectorKind {
    pub fn classify(selector: Option<&str>) -> Self {
        let Some(selector) = selector.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::All;
        };
        // Only the registration marker ignores case.
        if selector.contains("/spaces") || selector.contains("#spaces") {
            Self::Spaces
        } else if selector.to_ascii_lowercase().contains("register") {
            Self::Registration
        } else {
            Self::All
        }
    }
}

/// Registration link and platform, with fallbacks already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub link: String,
    pub platform: String,
}

impl Registration {
    pub fn resolve(bundle: &ScrapeResultBundle) -> Self {
        Self {
            link: registration_field(bundle, "registration_link", DEFAULT_REGISTRATION_LINK),
            platform: registration_field(
                bundle,
                "registration_platform",
                DEFAULT_REGISTRATION_PLATFORM,
            ),
        }
    }
}

// Missing section, missing field and unusable value all fall back alike.
fn registration_field(bundle: &ScrapeResultBundle, field: &str, default: &str) -> String {
    match bundle.lookup(Section::Main, field) {
        FieldLookup::Found(Value::String(value)) if !value.trim().is_empty() => value.clone(),
        FieldLookup::Found(value) => {
            tracing::debug!(field, ?value, "unusable registration field; using default");
            default.to_owned()
        }
        FieldLookup::FieldMissing => {
            tracing::debug!(field, "main section lacks registration field; using default");
            default.to_owned()
        }
        FieldLookup::SectionMissing => {
            tracing::debug!(field, "main section missing; using default");
            default.to_owned()
        }
    }
}

pub fn compose(
    bundle: ScrapeResultBundle,
    selector: Option<&str>,
    scraped_at: DateTime<Utc>,
    support_contact: &str,
) -> ScrapeResponse {
    let view = match SelectorKind::classify(selector) {
        SelectorKind::Spaces => ScrapeView::Spaces {
            data: bundle.data(Section::Spaces),
        },
        SelectorKind::Registration => {
            let registration = Registration::resolve(&bundle);
            ScrapeView::Registration {
                data: bundle.data(Section::Main),
                registration_link: registration.link,
                registration_platform: registration.platform,
            }
        }
        SelectorKind::All => ScrapeView::AllData { data: bundle },
    };

    ScrapeResponse {
        success: true,
        view,
        scraped_at: scraped_at.to_rfc3339(),
        support_contact: support_contact.to_owned(),
    }
}

pub fn conference_info(
    bundle: &ScrapeResultBundle,
    scraped_at: DateTime<Utc>,
    support_contact: &str,
) -> ConferenceInfoView {
    let registration = Registration::resolve(bundle);
    ConferenceInfoView {
        success: true,
        conference_info: bundle.data(Section::Main),
        spaces: bundle.data(Section::Spaces),
        registration_link: registration.link,
        registration_platform: registration.platform,
        scraped_at: scraped_at.to_rfc3339(),
        support_contact: support_contact.to_owned(),
    }
}
