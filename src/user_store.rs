// src/user_store.rs
use crate::errors::StoreError;
use crate::event::{Category, Event};
use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key of the record holding the user's events inside the store file.
pub const USER_EVENTS_KEY: &str = "userEvents";

/// Durable storage for events the user created. Events are append-only.
///
/// Saving is a read-modify-write of the whole list and is not atomic: two
/// processes saving at the same time can lose one of the events.
pub trait EventStore: Send + Sync {
    /// Every stored event; empty when nothing is stored or the data is unreadable.
    fn load_user_events(&self) -> Vec<Event>;

    fn save_user_event(&self, event: &Event) -> Result<(), StoreError>;
}

fn ensure_personal(event: &Event) -> Result<(), StoreError> {
    match event.category() {
        Category::Personal => Ok(()),
        other => Err(StoreError::NotPersonal(other)),
    }
}

// ===== JSON file store
/// A JSON object on disk; the events live under [`USER_EVENTS_KEY`] and any
/// other keys are left untouched.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_record(&self) -> Map<String, Value> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("JsonFileStore: {} does not exist yet", self.path.display());
                return Map::new();
            }
            Err(e) => {
                warn!("JsonFileStore: failed to read {}: {}", self.path.display(), e);
                return Map::new();
            }
        };
        match serde_json::from_str::<Map<String, Value>>(&content) {
            Ok(record) => record,
            Err(e) => {
                warn!("JsonFileStore: {} is not a JSON object: {}", self.path.display(), e);
                Map::new()
            }
        }
    }
}

fn events_from_record(record: &Map<String, Value>) -> Vec<Event> {
    let Some(raw) = record.get(USER_EVENTS_KEY) else {
        return Vec::new();
    };
    match serde_json::from_value::<Vec<Event>>(raw.clone()) {
        Ok(events) => events,
        Err(e) => {
            warn!("JsonFileStore: ignoring unreadable '{}': {}", USER_EVENTS_KEY, e);
            Vec::new()
        }
    }
}

impl EventStore for JsonFileStore {
    fn load_user_events(&self) -> Vec<Event> {
        let events = events_from_record(&self.read_record());
        debug!("JsonFileStore: loaded {} user events", events.len());
        events
    }

    fn save_user_event(&self, event: &Event) -> Result<(), StoreError> {
        ensure_personal(event)?;

        let mut record = self.read_record();
        let mut events = events_from_record(&record);
        events.push(event.clone());
        record.insert(USER_EVENTS_KEY.to_string(), serde_json::to_value(&events)?);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json_to_write = serde_json::to_string_pretty(&Value::Object(record))?;
        fs::write(&self.path, json_to_write)?;

        info!("JsonFileStore: saved '{}' ({} user events)", event.title(), events.len());
        Ok(())
    }
}

// ===== In-memory store
#[derive(Default)]
pub struct MemoryStore {
    events: Mutex<Vec<Event>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<Event>) -> Self {
        Self { events: Mutex::new(events) }
    }
}

impl EventStore for MemoryStore {
    fn load_user_events(&self) -> Vec<Event> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(_) => {
                warn!("MemoryStore: lock poisoned, reporting no events");
                Vec::new()
            }
        }
    }

    fn save_user_event(&self, event: &Event) -> Result<(), StoreError> {
        ensure_personal(event)?;
        self.events.lock().map_err(|_| StoreError::Poisoned)?.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dentist() -> Event {
        Event::new(
            "user-1710900000000".into(),
            "Dentist".into(),
            "2024-03-20T09:30:00".into(),
            Category::Personal,
        )
        .with_location("Station front")
        .with_type("個人")
        .with_priority(50.0)
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nothing.json"));
        assert!(store.load_user_events().is_empty());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("events.json"));

        store.save_user_event(&dentist()).unwrap();
        let second = Event::new(
            "user-1710900000001".into(),
            "Lunch".into(),
            "2024-03-21T12:00:00".into(),
            Category::Personal,
        );
        store.save_user_event(&second).unwrap();

        let loaded = store.load_user_events();
        assert_eq!(loaded, vec![dentist(), second]);
        assert!(loaded.iter().all(|e| e.category() == Category::Personal));
    }

    #[test]
    fn test_corrupt_file_loads_empty_and_is_replaced_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::new(&path);

        assert!(store.load_user_events().is_empty());

        store.save_user_event(&dentist()).unwrap();
        assert_eq!(store.load_user_events(), vec![dentist()]);
    }

    #[test]
    fn test_unreadable_event_list_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        fs::write(&path, r#"{ "userEvents": [{ "title": 3 }] }"#).unwrap();

        assert!(JsonFileStore::new(&path).load_user_events().is_empty());
    }

    #[test]
    fn test_other_keys_survive_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        fs::write(&path, r#"{ "theme": "dark", "userEvents": [] }"#).unwrap();

        JsonFileStore::new(&path).save_user_event(&dentist()).unwrap();

        let record: Map<String, Value> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(record.get("theme"), Some(&Value::String("dark".into())));
        assert_eq!(record.get(USER_EVENTS_KEY).and_then(Value::as_array).map(Vec::len), Some(1));
    }

    #[test]
    fn test_rejects_non_personal_events() {
        let store = MemoryStore::new();
        let remote =
            Event::new("ev1".into(), "Party".into(), "2024-03-02T10:00:00Z".into(), Category::Circle);

        assert!(matches!(
            store.save_user_event(&remote),
            Err(StoreError::NotPersonal(Category::Circle))
        ));
        assert!(store.load_user_events().is_empty());
    }
}
