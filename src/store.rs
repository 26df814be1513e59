use std::path::{Path, PathBuf};

use anyhow::Context as _;
use async_trait::async_trait;
use tokio::fs;

use crate::formats::{ScheduleDocument, SpeakersDocument};

pub const SPEAKERS_FILE: &str = "speakers.json";
pub const SCHEDULE_FILE: &str = "schedule.json";

#[async_trait]
pub trait ConferenceStore: Send + Sync {
    async fn get_speakers(&self) -> anyhow::Result<Option<SpeakersDocument>>;
    async fn get_schedule(&self) -> anyhow::Result<Option<ScheduleDocument>>;
    async fn put_speakers(&self, document: &SpeakersDocument) -> anyhow::Result<()>;
    async fn put_schedule(&self, document: &ScheduleDocument) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct LocalFsConferenceStore {
    data_dir: PathBuf,
}

impl LocalFsConferenceStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn speakers_path(&self) -> PathBuf {
        self.data_dir.join(SPEAKERS_FILE)
    }

    pub fn schedule_path(&self) -> PathBuf {
        self.data_dir.join(SCHEDULE_FILE)
    }
}

#[async_trait]
impl ConferenceStore for LocalFsConferenceStore {
    async fn get_speakers(&self) -> anyhow::Result<Option<SpeakersDocument>> {
        let path = self.speakers_path();
        read_json(&path)
            .await
            .with_context(|| format!("read: {}", path.display()))
    }

    async fn get_schedule(&self) -> anyhow::Result<Option<ScheduleDocument>> {
        let path = self.schedule_path();
        read_json(&path)
            .await
            .with_context(|| format!("read: {}", path.display()))
    }

    async fn put_speakers(&self, document: &SpeakersDocument) -> anyhow::Result<()> {
        write_json_atomic(&self.speakers_path(), document)
            .await
            .context("write speakers.json")
    }

    async fn put_schedule(&self, document: &ScheduleDocument) -> anyhow::Result<()> {
        write_json_atomic(&self.schedule_path(), document)
            .await
            .context("write schedule.json")
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<Option<T>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let value = serde_json::from_slice(&bytes).context("parse json")?;
    Ok(Some(value))
}

// Readers see either the old file or the new one, never a partial write.
async fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("path has no parent: {}", path.display()))?;
    fs::create_dir_all(parent)
        .await
        .with_context(|| format!("create parent dir: {}", parent.display()))?;

    let tmp_path = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
    let data = serde_json::to_vec_pretty(value).context("serialize json")?;
    fs::write(&tmp_path, &data)
        .await
        .with_context(|| format!("write tmp: {}", tmp_path.display()))?;
    if let Err(err) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(err).with_context(|| format!("rename tmp to final: {}", path.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn missing_documents_read_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsConferenceStore::new(dir.path());

        assert!(store.get_speakers().await.unwrap().is_none());
        assert!(store.get_schedule().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn schedule_round_trips_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsConferenceStore::new(dir.path().join("nested"));
        let sessions = vec![
            json!({"time": "09:00", "title": "Keynote"}),
            json!({"time": "10:00", "title": "Designing APIs"}),
            json!({"time": "11:30", "title": "Panel"}),
        ];

        store
            .put_schedule(&ScheduleDocument::single_day(sessions.clone()))
            .await
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(store.schedule_path()).unwrap()).unwrap();
        assert_eq!(raw, json!({"days": [{"day": "Day 1", "sessions": sessions}]}));
    }

    #[tokio::test]
    async fn writes_are_indented_and_keep_non_ascii() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsConferenceStore::new(dir.path());
        let document = SpeakersDocument {
            speakers: vec![json!({"name": "Adébáyọ̀ Ọlábísí"})],
        };

        store.put_speakers(&document).await.unwrap();

        let text = std::fs::read_to_string(store.speakers_path()).unwrap();
        assert!(text.contains("Adébáyọ̀ Ọlábísí"));
        assert!(text.contains("\n  \"speakers\": ["));
        assert_eq!(store.get_speakers().await.unwrap(), Some(document));
    }

    #[tokio::test]
    async fn rewrite_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsConferenceStore::new(dir.path());

        for n in 0..3 {
            store
                .put_speakers(&SpeakersDocument {
                    speakers: vec![json!({"id": n})],
                })
                .await
                .unwrap();
        }

        let names = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, vec![SPEAKERS_FILE.to_owned()]);
        assert_eq!(
            store.get_speakers().await.unwrap().unwrap().speakers,
            vec![json!({"id": 2})]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_leave_one_whole_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsConferenceStore::new(dir.path());

        let writers = (0..32)
            .map(|writer| {
                let store = store.clone();
                tokio::spawn(async move {
                    let speakers = (0..2000)
                        .map(|index| json!({"writer": writer, "index": index}))
                        .collect();
                    store.put_speakers(&SpeakersDocument { speakers }).await
                })
            })
            .collect::<Vec<_>>();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let speakers = store.get_speakers().await.unwrap().unwrap().speakers;
        assert_eq!(speakers.len(), 2000);
        let writer = speakers[0]["writer"].clone();
        assert!(speakers.iter().all(|speaker| speaker["writer"] == writer));

        let names = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, vec![SPEAKERS_FILE.to_owned()]);
    }

    #[tokio::test]
    async fn failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsConferenceStore::new(dir.path());
        std::fs::create_dir(store.speakers_path()).unwrap();
        std::fs::write(store.speakers_path().join("keep"), "x").unwrap();

        let err = store
            .put_speakers(&SpeakersDocument {
                speakers: vec![json!({"id": 1})],
            })
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("rename tmp to final"));
        let names = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, vec![SPEAKERS_FILE.to_owned()]);
    }

    #[tokio::test]
    async fn corrupt_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsConferenceStore::new(dir.path());
        std::fs::write(store.speakers_path(), "{").unwrap();

        let err = store.get_speakers().await.unwrap_err();
        assert!(format!("{err:#}").contains("parse json"));
    }
}
