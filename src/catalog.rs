//! Theme catalog
//!
//! Read-only set of themes loaded before a round starts. A small built-in
//! catalog ships with the crate; the full content tables are supplied as JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::sim::{Card, Language};

/// A themed card set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub id: String,
    pub icon: String,
    /// Display name per language
    pub name: BTreeMap<Language, String>,
    pub items: Vec<Card>,
}

impl Theme {
    /// Display name in `lang`, falling back to English, then the id
    pub fn display_name(&self, lang: Language) -> &str {
        self.name
            .get(&lang)
            .or_else(|| self.name.get(&Language::En))
            .map(String::as_str)
            .unwrap_or(&self.id)
    }
}

/// All available themes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    themes: Vec<Theme>,
}

impl Catalog {
    pub fn new(themes: Vec<Theme>) -> Self {
        Self { themes }
    }

    /// Parse a JSON array of themes
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(json)?;
        log::info!("Loaded {} themes", catalog.themes.len());
        Ok(catalog)
    }

    pub fn themes(&self) -> &[Theme] {
        &self.themes
    }

    pub fn get(&self, id: &str) -> Result<&Theme> {
        self.themes
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| GameError::UnknownTheme(id.to_string()))
    }

    /// Small sample catalog
    pub fn builtin() -> Self {
        use Language::*;

        fn theme(id: &str, icon: &str, names: [&str; 3], items: &[[&str; 3]]) -> Theme {
            Theme {
                id: id.to_string(),
                icon: icon.to_string(),
                name: Language::ALL
                    .iter()
                    .zip(names)
                    .map(|(&lang, name)| (lang, name.to_string()))
                    .collect(),
                items: items
                    .iter()
                    .enumerate()
                    .map(|(i, [en, fr, es])| {
                        Card::new(format!("{id}-{i}"), &[(En, *en), (Fr, *fr), (EsMx, *es)])
                    })
                    .collect(),
            }
        }

        Self::new(vec![
            theme(
                "animals",
                "🐾",
                ["Animals", "Animaux", "Animales"],
                &[
                    ["Elephant", "Éléphant", "Elefante"],
                    ["Giraffe", "Girafe", "Jirafa"],
                    ["Penguin", "Manchot", "Pingüino"],
                    ["Kangaroo", "Kangourou", "Canguro"],
                    ["Octopus", "Pieuvre", "Pulpo"],
                    ["Squirrel", "Écureuil", "Ardilla"],
                    ["Dolphin", "Dauphin", "Delfín"],
                    ["Owl", "Hibou", "Búho"],
                ],
            ),
            theme(
                "food",
                "🍕",
                ["Food", "Nourriture", "Comida"],
                &[
                    ["Pizza", "Pizza", "Pizza"],
                    ["Taco", "Taco", "Taco"],
                    ["Croissant", "Croissant", "Cuernito"],
                    ["Pancake", "Crêpe", "Hot cake"],
                    ["Cheese", "Fromage", "Queso"],
                    ["Watermelon", "Pastèque", "Sandía"],
                ],
            ),
            theme(
                "jobs",
                "🧑‍🚒",
                ["Jobs", "Métiers", "Oficios"],
                &[
                    ["Firefighter", "Pompier", "Bombero"],
                    ["Astronaut", "Astronaute", "Astronauta"],
                    ["Chef", "Chef cuisinier", "Chef"],
                    ["Pilot", "Pilote", "Piloto"],
                    ["Dentist", "Dentiste", "Dentista"],
                ],
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let catalog = Catalog::builtin();
        let animals = catalog.get("animals").unwrap();
        assert_eq!(animals.display_name(Language::Fr), "Animaux");
        assert_eq!(animals.items[2].text(Language::EsMx), "Pingüino");
        assert!(catalog.themes().iter().all(|t| !t.items.is_empty()));
    }

    #[test]
    fn test_unknown_theme() {
        let catalog = Catalog::builtin();
        assert!(matches!(
            catalog.get("planets"),
            Err(GameError::UnknownTheme(id)) if id == "planets"
        ));
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {
                "id": "space",
                "icon": "🚀",
                "name": { "en": "Space", "fr": "Espace" },
                "items": [
                    { "id": "moon", "translations": { "en": "Moon", "fr": "Lune", "es-MX": "Luna" } }
                ]
            }
        ]"#;
        let catalog = Catalog::from_json(json).unwrap();
        let space = catalog.get("space").unwrap();
        assert_eq!(space.display_name(Language::EsMx), "Space");
        assert_eq!(space.items[0].text(Language::Fr), "Lune");
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(Catalog::from_json("{"), Err(GameError::Json(_))));
    }
}
