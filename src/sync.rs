use std::sync::Arc;

use serde_json::Value;

use crate::formats::{
    FieldLookup, ScheduleDocument, ScrapeResultBundle, Section, SpeakersDocument, SyncSummary,
};
use crate::store::ConferenceStore;

/// Refreshes the persisted speakers and schedule documents from a bundle.
///
/// A document is only replaced when its section succeeded and carries a
/// non-empty list; otherwise the file on disk is left as it was. The two
/// documents are written independently and write failures are logged, never
/// returned.
pub struct CacheSynchronizer {
    store: Arc<dyn ConferenceStore>,
}

impl CacheSynchronizer {
    pub fn new(store: Arc<dyn ConferenceStore>) -> Self {
        Self { store }
    }

    pub async fn sync(&self, bundle: &ScrapeResultBundle) -> SyncSummary {
        let speakers = refreshable_list(bundle, Section::Speakers, "speakers");
        if let Some(speakers) = speakers {
            let document = SpeakersDocument {
                speakers: speakers.to_vec(),
            };
            match self.store.put_speakers(&document).await {
                Ok(()) => tracing::info!(count = speakers.len(), "speakers cache updated"),
                Err(err) => tracing::error!(?err, "failed to update speakers cache"),
            }
        }

        if let Some(sessions) = refreshable_list(bundle, Section::Schedule, "schedule") {
            let document = ScheduleDocument::single_day(sessions.to_vec());
            match self.store.put_schedule(&document).await {
                Ok(()) => tracing::info!(sessions = sessions.len(), "schedule cache updated"),
                Err(err) => tracing::error!(?err, "failed to update schedule cache"),
            }
        }

        SyncSummary {
            speakers_count: list_len(bundle.lookup(Section::Speakers, "speakers")),
            main_page_available: bundle.is_success(Section::Main),
        }
    }
}

fn refreshable_list<'a>(
    bundle: &'a ScrapeResultBundle,
    section: Section,
    field: &str,
) -> Option<&'a [Value]> {
    if !bundle.is_success(section) {
        tracing::debug!(%section, "section not scraped successfully; keeping cached file");
        return None;
    }
    match bundle.lookup(section, field) {
        FieldLookup::Found(Value::Array(items)) if !items.is_empty() => Some(items.as_slice()),
        FieldLookup::Found(Value::Array(_)) => {
            tracing::debug!(%section, field, "list is empty; keeping cached file");
            None
        }
        FieldLookup::Found(value) => {
            tracing::warn!(%section, field, ?value, "expected a list; keeping cached file");
            None
        }
        FieldLookup::FieldMissing | FieldLookup::SectionMissing => {
            tracing::debug!(%section, field, "field missing; keeping cached file");
            None
        }
    }
}

fn list_len(lookup: FieldLookup<'_>) -> usize {
    match lookup.found() {
        Some(Value::Array(items)) => items.len(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::{Map, json};

    use super::*;
    use crate::formats::{SectionResult, SectionStatus};
    use crate::store::LocalFsConferenceStore;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn seed(store: &LocalFsConferenceStore) -> (Vec<u8>, Vec<u8>) {
        let speakers = b"{\n  \"speakers\": [\"previous\"]\n}".to_vec();
        let schedule = b"{\"days\": []}".to_vec();
        std::fs::write(store.speakers_path(), &speakers).unwrap();
        std::fs::write(store.schedule_path(), &schedule).unwrap();
        (speakers, schedule)
    }

    #[tokio::test]
    async fn empty_or_failed_sections_leave_files_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsConferenceStore::new(dir.path());
        let (speakers_before, schedule_before) = seed(&store);

        let bundle = ScrapeResultBundle::new()
            .with_section(Section::Speakers, SectionResult::success(Map::new()))
            .with_section(
                Section::Schedule,
                SectionResult {
                    status: SectionStatus::Failure,
                    data: object(json!({"schedule": [{"title": "stale"}]})),
                },
            );
        let summary = CacheSynchronizer::new(Arc::new(store.clone()))
            .sync(&bundle)
            .await;

        assert_eq!(
            summary,
            SyncSummary {
                speakers_count: 0,
                main_page_available: false,
            }
        );
        assert_eq!(std::fs::read(store.speakers_path()).unwrap(), speakers_before);
        assert_eq!(std::fs::read(store.schedule_path()).unwrap(), schedule_before);
    }

    #[tokio::test]
    async fn empty_lists_do_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsConferenceStore::new(dir.path());
        let (speakers_before, schedule_before) = seed(&store);

        let bundle = ScrapeResultBundle::new()
            .with_section(
                Section::Speakers,
                SectionResult::success(object(json!({"speakers": []}))),
            )
            .with_section(
                Section::Schedule,
                SectionResult::success(object(json!({"schedule": "tbd"}))),
            );
        CacheSynchronizer::new(Arc::new(store.clone()))
            .sync(&bundle)
            .await;

        assert_eq!(std::fs::read(store.speakers_path()).unwrap(), speakers_before);
        assert_eq!(std::fs::read(store.schedule_path()).unwrap(), schedule_before);
    }

    #[tokio::test]
    async fn successful_sections_are_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsConferenceStore::new(dir.path());
        seed(&store);

        let s1 = json!({"name": "Ada", "topic": "GraphQL at scale"});
        let s2 = json!({"name": "Chidi", "topic": "Rate limiting"});
        let sessions = vec![json!({"time": "09:00"}), json!({"time": "10:00"})];
        let bundle = ScrapeResultBundle::new()
            .with_section(Section::Main, SectionResult::success(Map::new()))
            .with_section(
                Section::Speakers,
                SectionResult::success(object(json!({"speakers": [s1, s2]}))),
            )
            .with_section(
                Section::Schedule,
                SectionResult::success(object(json!({"schedule": sessions}))),
            );

        let summary = CacheSynchronizer::new(Arc::new(store.clone()))
            .sync(&bundle)
            .await;

        assert_eq!(summary.speakers_count, 2);
        assert!(summary.main_page_available);
        assert_eq!(
            store.get_speakers().await.unwrap().unwrap().speakers,
            vec![s1, s2]
        );
        assert_eq!(
            store.get_schedule().await.unwrap(),
            Some(ScheduleDocument::single_day(sessions))
        );
    }

    struct FailingSpeakersStore {
        inner: LocalFsConferenceStore,
    }

    #[async_trait]
    impl ConferenceStore for FailingSpeakersStore {
        async fn get_speakers(&self) -> anyhow::Result<Option<SpeakersDocument>> {
            self.inner.get_speakers().await
        }

        async fn get_schedule(&self) -> anyhow::Result<Option<ScheduleDocument>> {
            self.inner.get_schedule().await
        }

        async fn put_speakers(&self, _document: &SpeakersDocument) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }

        async fn put_schedule(&self, document: &ScheduleDocument) -> anyhow::Result<()> {
            self.inner.put_schedule(document).await
        }
    }

    #[tokio::test]
    async fn one_failed_write_does_not_block_the_other() {
        let dir = tempfile::tempdir().unwrap();
        let inner = LocalFsConferenceStore::new(dir.path());
        let store = Arc::new(FailingSpeakersStore {
            inner: inner.clone(),
        });

        let bundle = ScrapeResultBundle::new()
            .with_section(
                Section::Speakers,
                SectionResult::success(object(json!({"speakers": [{"name": "Ada"}]}))),
            )
            .with_section(
                Section::Schedule,
                SectionResult::success(object(json!({"schedule": [{"time": "09:00"}]}))),
            );

        let summary = CacheSynchronizer::new(store).sync(&bundle).await;

        assert_eq!(summary.speakers_count, 1);
        assert!(inner.get_speakers().await.unwrap().is_none());
        assert_eq!(
            inner.get_schedule().await.unwrap(),
            Some(ScheduleDocument::single_day(vec![json!({"time": "09:00"})]))
        );
    }
}
