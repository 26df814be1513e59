use std::sync::Arc;

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::compose;
use crate::error::SourceError;
use crate::formats::{
    ConferenceInfoView, Envelope, ErrorEnvelope, ScrapeResponse, ScrapeResultBundle,
    UpdateResponse,
};
use crate::source::ConferenceSource;
use crate::store::ConferenceStore;
use crate::sync::CacheSynchronizer;

pub const SCRAPE: &str = "scrape";
pub const GET_CONFERENCE_INFO: &str = "get_conference_info";
pub const UPDATE_CONFERENCE_DATA: &str = "update_conference_data";

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ScrapeRequest {
    /// Page to focus on. A URL containing `/spaces` or `#spaces` returns the
    /// spaces section, one mentioning `register` returns registration
    /// details; anything else returns every section.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ConferenceInfoRequest {}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct UpdateConferenceDataRequest {}

/// The three conference operations exposed to the agent.
///
/// Every call fetches a fresh bundle from the source and turns any failure
/// into an [`ErrorEnvelope`]; nothing escapes as an `Err`.
pub struct ConferenceTools {
    source: Arc<dyn ConferenceSource>,
    synchronizer: CacheSynchronizer,
    support_contact: String,
}

impl ConferenceTools {
    pub fn new(
        source: Arc<dyn ConferenceSource>,
        store: Arc<dyn ConferenceStore>,
        support_contact: impl Into<String>,
    ) -> Self {
        Self {
            source,
            synchronizer: CacheSynchronizer::new(store),
            support_contact: support_contact.into(),
        }
    }

    pub fn support_contact(&self) -> &str {
        &self.support_contact
    }

    pub async fn scrape(&self, request: ScrapeRequest) -> Envelope<ScrapeResponse> {
        match self.source.get_all_data().await {
            Ok(bundle) => Envelope::Success(compose::compose(
                bundle,
                request.url.as_deref(),
                Utc::now(),
                &self.support_contact,
            )),
            Err(SourceError::Service(err)) => {
                tracing::error!(?err, "web scraping service error");
                self.error(format!(
                    "Failed to scrape website due to a service error: {err}"
                ))
            }
            Err(SourceError::Unexpected(err)) => {
                tracing::error!(?err, "error scraping website");
                self.error(format!("Failed to scrape website: {err}"))
            }
        }
    }

    pub async fn get_conference_info(
        &self,
        _request: ConferenceInfoRequest,
    ) -> Envelope<ConferenceInfoView> {
        match self.source.get_all_data().await {
            Ok(bundle) => Envelope::Success(compose::conference_info(
                &bundle,
                Utc::now(),
                &self.support_contact,
            )),
            Err(SourceError::Service(err)) => {
                tracing::error!(?err, "web scraping service error");
                self.error(format!(
                    "Failed to get conference information due to a service error: {err}"
                ))
            }
            Err(SourceError::Unexpected(err)) => {
                tracing::error!(?err, "error getting conference info");
                self.error(format!("Failed to get conference information: {err}"))
            }
        }
    }

    pub async fn update_conference_data(
        &self,
        _request: UpdateConferenceDataRequest,
    ) -> Envelope<UpdateResponse> {
        let bundle: ScrapeResultBundle = match self.source.get_all_data().await {
            Ok(bundle) => bundle,
            Err(SourceError::Service(err)) => {
                tracing::error!(?err, "web scraping service error");
                return self.error(format!(
                    "Failed to update conference data due to a service error: {err}"
                ));
            }
            Err(SourceError::Unexpected(err)) => {
                tracing::error!(?err, "error updating conference data");
                return self.error("Failed to update conference data");
            }
        };

        let summary = self.synchronizer.sync(&bundle).await;
        Envelope::Success(UpdateResponse {
            success: true,
            message: "Conference data updated successfully".to_owned(),
            updated_at: Utc::now().to_rfc3339(),
            data_summary: summary,
            support_contact: self.support_contact.clone(),
        })
    }

    fn error<T>(&self, message: impl Into<String>) -> Envelope<T> {
        Envelope::Error(ErrorEnvelope::new(message, self.support_contact.clone()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// Name-based dispatch over [`ConferenceTools`] for agent runtimes that call
/// tools with a JSON argument object.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: Arc<ConferenceTools>,
}

impl ToolRegistry {
    pub fn new(tools: Arc<ConferenceTools>) -> Self {
        Self { tools }
    }

    pub fn support_contact(&self) -> &str {
        self.tools.support_contact()
    }

    pub fn specs() -> Vec<ToolSpec> {
        vec![
            ToolSpec {
                name: SCRAPE,
                description: "Scrape information from the API Conference website. \
                    Optionally focus on the spaces or registration page via `url`.",
                parameters: parameters_schema::<ScrapeRequest>(),
            },
            ToolSpec {
                name: GET_CONFERENCE_INFO,
                description: "Get conference information including venue, dates, \
                    spaces and registration details.",
                parameters: parameters_schema::<ConferenceInfoRequest>(),
            },
            ToolSpec {
                name: UPDATE_CONFERENCE_DATA,
                description: "Refresh the local speakers and schedule data from the \
                    conference website.",
                parameters: parameters_schema::<UpdateConferenceDataRequest>(),
            },
        ]
    }

    pub fn tool_names() -> Vec<&'static str> {
        Self::specs().into_iter().map(|spec| spec.name).collect()
    }

    pub async fn dispatch(&self, name: &str, arguments: Value) -> Value {
        tracing::debug!(tool = name, %arguments, "dispatching tool");
        match name {
            SCRAPE => match self.parse_arguments(name, arguments) {
                Ok(request) => self.render(self.tools.scrape(request).await),
                Err(envelope) => self.render(envelope),
            },
            GET_CONFERENCE_INFO => match self.parse_arguments(name, arguments) {
                Ok(request) => self.render(self.tools.get_conference_info(request).await),
                Err(envelope) => self.render(envelope),
            },
            UPDATE_CONFERENCE_DATA => match self.parse_arguments(name, arguments) {
                Ok(request) => self.render(self.tools.update_conference_data(request).await),
                Err(envelope) => self.render(envelope),
            },
            _ => {
                tracing::warn!(tool = name, "unknown tool requested");
                self.render(Envelope::<()>::Error(ErrorEnvelope::new(
                    format!(
                        "Unknown tool '{name}'. Available tools: {}",
                        Self::tool_names().join(", ")
                    ),
                    self.tools.support_contact(),
                )))
            }
        }
    }

    fn parse_arguments<T: serde::de::DeserializeOwned + Default>(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<T, Envelope<()>> {
        if arguments.is_null() {
            return Ok(T::default());
        }
        serde_json::from_value(arguments).map_err(|err| {
            tracing::error!(tool = name, ?err, "invalid tool arguments");
            Envelope::Error(ErrorEnvelope::new(
                format!("Invalid arguments for tool '{name}': {err}"),
                self.tools.support_contact(),
            ))
        })
    }

    fn render<T: Serialize>(&self, envelope: Envelope<T>) -> Value {
        serde_json::to_value(&envelope).unwrap_or_else(|err| {
            tracing::error!(?err, "failed to serialize tool response");
            serde_json::json!({
                "error": true,
                "message": format!("Failed to serialize tool response: {err}"),
                "support_contact": self.tools.support_contact(),
            })
        })
    }
}

fn parameters_schema<T: JsonSchema>() -> Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema).unwrap_or_else(|_| serde_json::json!({"type": "object"}))
}
