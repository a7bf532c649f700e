//! Narrator catalog
//!
//! A narrator is a named audio source persona with its own CDN base URL and,
//! optionally, an id on the word-timing API. The builtin list is a default
//! configuration table, not a closed enumeration: any `Narrator` value is
//! accepted by the engine.

use serde::{Deserialize, Serialize};

/// A recitation audio source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrator {
    /// Stable id, also the cache-key namespace
    pub id: u32,
    /// Display name
    pub name: String,
    /// Name in the narrator's own script
    pub native_name: String,
    /// Recitation style (e.g. "Murattal")
    pub style: String,
    /// Base URL of per-verse audio, terminated with a slash
    pub audio_base_url: String,
    /// Recitation id on the word-timing API; absence disables highlighting
    pub timing_recitation_id: Option<u32>,
}

impl Narrator {
    /// The builtin narrator catalog.
    pub fn builtin() -> Vec<Narrator> {
        vec![
            Narrator {
                id: 7,
                name: "Mishary Al-Afasy".to_string(),
                native_name: "مشاري العفاسي".to_string(),
                style: "Murattal".to_string(),
                audio_base_url: "https://cdn.islamic.network/quran/audio/128/ar.alafasy/"
                    .to_string(),
                timing_recitation_id: Some(7),
            },
            Narrator {
                id: 1,
                name: "Abdul-Basit (Murattal)".to_string(),
                native_name: "عبد الباسط عبد الصمد".to_string(),
                style: "Murattal".to_string(),
                audio_base_url:
                    "https://cdn.islamic.network/quran/audio/128/ar.abdulbasitmurattal/"
                        .to_string(),
                timing_recitation_id: Some(1),
            },
        ]
    }

    /// Looks up a builtin narrator by id.
    pub fn find(id: u32) -> Option<Narrator> {
        Self::builtin().into_iter().find(|n| n.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let narrators = Narrator::builtin();
        assert_eq!(narrators.len(), 2);
        assert!(narrators.iter().all(|n| n.audio_base_url.ends_with('/')));
    }

    #[test]
    fn test_find_by_id() {
        let narrator = Narrator::find(7).unwrap();
        assert_eq!(narrator.name, "Mishary Al-Afasy");
        assert_eq!(narrator.timing_recitation_id, Some(7));

        assert!(Narrator::find(999).is_none());
    }
}
