//! Cards, languages and the per-round shuffled deck

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Display language for card text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    En,
    #[serde(rename = "fr")]
    Fr,
    #[serde(rename = "es-MX")]
    EsMx,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Fr, Language::EsMx];

    /// Locale code
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
            Language::EsMx => "es-MX",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "en" => Some(Language::En),
            "fr" => Some(Language::Fr),
            "es-mx" | "es" => Some(Language::EsMx),
            _ => None,
        }
    }
}

/// One word/phrase to guess, with its translations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    #[serde(rename = "translations")]
    pub text_by_language: BTreeMap<Language, String>,
}

impl Card {
    pub fn new(id: impl Into<String>, texts: &[(Language, &str)]) -> Self {
        Self {
            id: id.into(),
            text_by_language: texts
                .iter()
                .map(|&(lang, text)| (lang, text.to_string()))
                .collect(),
        }
    }

    /// Text to show/record for `lang`, falling back to English, then the id
    pub fn text(&self, lang: Language) -> &str {
        self.text_by_language
            .get(&lang)
            .or_else(|| self.text_by_language.get(&Language::En))
            .map(String::as_str)
            .unwrap_or(&self.id)
    }
}

/// Cyclic sequence of cards for one round
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Uniformly shuffled copy of `cards` (Fisher-Yates)
    pub fn shuffled<R: Rng + ?Sized>(cards: &[Card], rng: &mut R) -> Result<Self> {
        let mut cards = cards.to_vec();
        cards.shuffle(rng);
        Self::ordered(cards)
    }

    /// Deck that keeps the given order
    pub fn ordered(cards: Vec<Card>) -> Result<Self> {
        if cards.is_empty() {
            return Err(GameError::EmptyDeck);
        }
        Ok(Self { cards })
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Always false; an empty deck cannot be built
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Card at `index`, wrapping past the end
    pub fn card(&self, index: usize) -> &Card {
        &self.cards[index % self.cards.len()]
    }

    /// Index of the card after `index`
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.cards.len()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}
