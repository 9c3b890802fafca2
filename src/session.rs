//! Persisted session: an image reference plus its flat pin list.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::pin::{Pin, Tag};
use crate::store::PinStore;

/// Coordinates are kept as JSON doubles; the canvas narrows them to `f32`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PinRecord {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tag: Tag,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub image_path: String,
    pub pins: Vec<PinRecord>,
}

impl SessionRecord {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

pub fn to_record(image_path: &Path, pins: &[Pin]) -> SessionRecord {
    SessionRecord {
        image_path: image_path.to_string_lossy().into_owned(),
        pins: pins
            .iter()
            .map(|pin| PinRecord {
                x: f64::from(pin.x),
                y: f64::from(pin.y),
                title: pin.title.clone(),
                description: pin.description.clone(),
                tag: pin.tag,
            })
            .collect(),
    }
}

/// Rebuilds pins from a record, drawing fresh ids from `store`.
pub fn from_record(record: &SessionRecord, store: &mut PinStore) -> (PathBuf, Vec<Pin>) {
    let pins = record
        .pins
        .iter()
        .map(|r| Pin {
            id: store.next_id(),
            x: r.x as f32,
            y: r.y as f32,
            title: r.title.clone(),
            description: r.description.clone(),
            tag: r.tag,
        })
        .collect();
    (PathBuf::from(&record.image_path), pins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_pins(store: &mut PinStore) -> Vec<Pin> {
        let mut a = store.draft(12.5, 40.0);
        a.title = "Crack".into();
        a.description = "Hairline, north wall".into();
        a.tag = Tag::Warning;
        let mut b = store.draft(300.0, 7.25);
        b.description = "no title".into();
        b.tag = Tag::Info;
        vec![a, b]
    }

    fn fields(pin: &Pin) -> (f32, f32, &str, &str, Tag) {
        (pin.x, pin.y, pin.title.as_str(), pin.description.as_str(), pin.tag)
    }

    #[test]
    fn record_roundtrip_keeps_every_field() {
        let mut store = PinStore::new();
        let pins = sample_pins(&mut store);
        let record = to_record(Path::new("/photos/site.png"), &pins);

        let (path, loaded) = from_record(&record, &mut store);
        assert_eq!(path, PathBuf::from("/photos/site.png"));
        assert_eq!(loaded.len(), pins.len());
        for (original, restored) in pins.iter().zip(&loaded) {
            assert_eq!(fields(original), fields(restored));
        }
    }

    #[test]
    fn loaded_pins_get_new_ids() {
        let mut store = PinStore::new();
        let pins = sample_pins(&mut store);
        let record = to_record(Path::new("a.png"), &pins);
        let (_, loaded) = from_record(&record, &mut store);
        assert!(loaded.iter().all(|p| pins.iter().all(|q| q.id != p.id)));
    }

    #[test]
    fn json_shape_is_stable() {
        let mut store = PinStore::new();
        let mut pin = store.draft(1.0, 2.0);
        pin.title = "T".into();
        let record = to_record(Path::new("img.jpg"), &[pin]);
        let value: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "imagePath": "img.jpg",
                "pins": [{ "x": 1.0, "y": 2.0, "title": "T", "description": "", "tag": "default" }]
            })
        );
    }

    #[test]
    fn double_coordinates_survive_the_record() {
        let json = r#"{ "imagePath": "a.png", "pins": [{ "x": 123.456789012345, "y": 0.1 }] }"#;
        let record = SessionRecord::from_json(json).unwrap();
        assert_eq!(record.pins[0].x, 123.456789012345);
        assert_eq!(record.pins[0].y, 0.1);
        assert_eq!(record.pins[0].tag, Tag::Default);

        let mut store = PinStore::new();
        let (_, pins) = from_record(&record, &mut store);
        assert_eq!(pins[0].x, 123.456789012345_f64 as f32);
        assert_eq!(pins[0].y, 0.1_f32);
    }

    #[test]
    fn json_is_pretty_printed() {
        let record = SessionRecord {
            image_path: "img.jpg".into(),
            pins: vec![],
        };
        assert!(record.to_json().unwrap().contains('\n'));
    }

    #[test]
    fn file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("saved_session.json");
        let mut store = PinStore::new();
        let record = to_record(Path::new("img.bmp"), &sample_pins(&mut store));
        record.save(&path).unwrap();
        assert_eq!(SessionRecord::load(&path).unwrap(), record);
    }

    #[test]
    fn load_rejects_malformed_json() {
        assert!(SessionRecord::from_json("{ \"pins\": 3 }").is_err());
    }
}
