use crate::card::types::{CardDefinition, CardId, CardInGame};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CardDatabaseError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Card not found: {0}")]
    CardNotFound(String),
    #[error("Invalid deck format at line {line}: {reason}")]
    InvalidDeckFormat { line: usize, reason: String },
    #[error("Invalid card data: {0}")]
    InvalidCard(String),
}

/// Card library loaded from the card compiler's JSON output
#[derive(Debug, Clone, Default)]
pub struct CardDatabase {
    cards: HashMap<String, CardDefinition>,
}

impl CardDatabase {
    /// Load cards from a JSON file
    pub fn from_file(path: &str) -> Result<Self, CardDatabaseError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load cards from a JSON array of card definitions
    pub fn from_json(json: &str) -> Result<Self, CardDatabaseError> {
        let cards_vec: Vec<CardDefinition> = serde_json::from_str(json)?;

        let mut cards = HashMap::new();
        for card in cards_vec {
            if card.card_type.is_object() && card.stats.is_none() {
                return Err(CardDatabaseError::InvalidCard(format!(
                    "{} is a {} but has no stats",
                    card.name, card.card_type
                )));
            }
            cards.insert(card.name.clone(), card);
        }

        Ok(CardDatabase { cards })
    }

    /// Get a card by name
    pub fn get_card(&self, name: &str) -> Result<&CardDefinition, CardDatabaseError> {
        self.cards
            .get(name)
            .ok_or_else(|| CardDatabaseError::CardNotFound(name.to_string()))
    }

    /// Get all card names, sorted
    pub fn card_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.cards.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    /// Get total number of cards
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    /// Instantiate a deck from card names. Each copy gets its own id.
    pub fn build_deck<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<CardInGame>, CardDatabaseError> {
        let mut copies: HashMap<&str, usize> = HashMap::new();
        let mut deck = Vec::with_capacity(names.len());

        for name in names {
            let name = name.as_ref();
            let definition = self.get_card(name)?;
            let n = copies.entry(name).or_insert(0);
            *n += 1;
            deck.push(definition.instantiate(CardId(format!("{}#{}", name, n))));
        }

        Ok(deck)
    }

    /// Parse a deck list and return the expanded list of card names
    /// Format: "4 Card Name" per line, supports comments with # or //
    pub fn parse_deck_list(&self, content: &str) -> Result<Vec<String>, CardDatabaseError> {
        let mut names = Vec::new();

        for (line_num, line) in content.lines().enumerate() {
            let trimmed = line.trim();

            // Skip empty lines and comments
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
                continue;
            }

            let parts: Vec<&str> = trimmed.splitn(2, ' ').collect();
            if parts.len() != 2 {
                return Err(CardDatabaseError::InvalidDeckFormat {
                    line: line_num + 1,
                    reason: "Expected format: 'COUNT CARD_NAME'".to_string(),
                });
            }

            let count: usize = parts[0].parse().map_err(|_| CardDatabaseError::InvalidDeckFormat {
                line: line_num + 1,
                reason: format!("'{}' is not a valid number", parts[0]),
            })?;
            let card_name = parts[1].trim();
            self.get_card(card_name)?;

            for _ in 0..count {
                names.push(card_name.to_string());
            }
        }

        Ok(names)
    }
}
