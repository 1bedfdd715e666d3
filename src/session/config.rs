//! Session configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::game::GameSettings;
use crate::game::constants::{
    DECISION_TIMEOUT_SECS, DEFAULT_MAX_PLAYERS, MIN_PLAYERS, STARTING_HAND_SIZE,
};

/// Tunables for one session: how hands are dealt, who may start, and how
/// long a decision prompt stays open.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SessionConfig {
    /// Cards dealt to each player on join.
    pub starting_hand_size: usize,

    /// Players required before the host can start.
    pub min_players: usize,

    /// Seat cap.
    pub max_players: usize,

    /// How long a color-choice or challenge prompt waits before its
    /// default applies.
    pub decision_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            starting_hand_size: STARTING_HAND_SIZE,
            min_players: MIN_PLAYERS,
            max_players: DEFAULT_MAX_PLAYERS,
            decision_timeout: Duration::from_secs(DECISION_TIMEOUT_SECS),
        }
    }
}

impl SessionConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.min_players < 2 {
            return Err("Need at least 2 players to play".to_string());
        }

        if self.max_players < self.min_players {
            return Err("Max players must be at least min players".to_string());
        }

        if self.starting_hand_size == 0 {
            return Err("Starting hand size must be positive".to_string());
        }

        // Seeding the discard pile needs a non-wild left in the deck, and
        // every seat consumes a starting hand.
        if self.starting_hand_size * self.max_players > 98 {
            return Err("Hand size times max players can't exceed 98".to_string());
        }

        Ok(())
    }

    pub(crate) fn game_settings(&self) -> GameSettings {
        GameSettings {
            starting_hand_size: self.starting_hand_size,
            min_players: self.min_players,
            max_players: self.max_players,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_oversized_tables_are_rejected() {
        let config = SessionConfig {
            max_players: 15,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_single_player_minimum_is_rejected() {
        let config = SessionConfig {
            min_players: 1,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
