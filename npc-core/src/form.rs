//! Monster request form.
//!
//! The fields a game master fills in before pressing "Generate", plus the
//! [`GenerationForm`] seam that lets any frontend supply them.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from form validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("Name and Description are required.")]
    MissingRequired,

    #[error("Challenge rating must be a non-negative number, got {0}")]
    InvalidChallengeRating(f64),

    #[error("Invalid AI Provider selected: {0}")]
    InvalidProvider(String),
}

/// The AI provider that will write the stat block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Provider {
    #[default]
    Gemini,
    OpenAi,
}

impl Provider {
    /// Display name used in notifications.
    pub fn label(self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::OpenAi => "OpenAI",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Provider {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Provider::Gemini),
            "openai" => Ok(Provider::OpenAi),
            other => Err(FormError::InvalidProvider(other.to_string())),
        }
    }
}

/// Everything the game master typed into the form.
#[derive(Debug, Clone, PartialEq)]
pub struct MonsterRequest {
    pub name: String,
    pub cr: f64,
    pub creature_type: String,
    pub subtype: String,
    pub alignment: String,
    pub description: String,
    pub provider: Provider,
}

impl Default for MonsterRequest {
    fn default() -> Self {
        Self {
            name: "Undead Clown".to_string(),
            cr: 3.0,
            creature_type: "undead".to_string(),
            subtype: "clown".to_string(),
            alignment: "Chaotic Evil".to_string(),
            description: "A horrifying Undead Clown (CR 3). It attacks with an acid-squirting \
                          lapel flower and a surprisingly powerful clown shoe kick. It should \
                          have undead traits like Undead Fortitude and poison immunity."
                .to_string(),
            provider: Provider::Gemini,
        }
    }
}

impl MonsterRequest {
    /// Check the fields the pipeline cannot work without.
    pub fn validate(&self) -> Result<(), FormError> {
        if self.name.trim().is_empty() || self.description.trim().is_empty() {
            return Err(FormError::MissingRequired);
        }
        if !self.cr.is_finite() || self.cr < 0.0 {
            return Err(FormError::InvalidChallengeRating(self.cr));
        }
        Ok(())
    }

    /// Render the request as the user section of the generation prompt.
    pub fn structured_prompt(&self) -> String {
        let attacks = if self.subtype == "clown" {
            "1. Acid-Squirting Lapel Flower (ranged attack, acid damage).\n\
             2. Powerful Clown Shoe Kick (melee attack, bludgeoning damage)."
        } else {
            ""
        };

        format!(
            "\nMonster Name: {name}\n\
             CR: {cr}\n\
             Type: {creature_type}\n\
             Subtype: {subtype}\n\
             Alignment: {alignment}\n\
             Description/Key Features: {description}\n\
             Specific Attacks to include (if any mentioned in description, otherwise up to you based on concept):\n\
             {attacks}\n\
             Include Undead Fortitude, Poison Immunity, and relevant Condition Immunities if type is undead.\n\
             Base other stats on CR and concept.\n",
            name = self.name,
            cr = self.cr,
            creature_type = self.creature_type,
            subtype = self.subtype,
            alignment = self.alignment,
            description = self.description,
        )
    }
}

/// A form that can hand over its current values and be closed.
///
/// Frontends implement this; the generator only ever talks to the trait.
pub trait GenerationForm {
    /// Collect the current field values.
    fn values(&self) -> MonsterRequest;

    /// Signal that generation finished and the form can go away.
    fn close(&mut self);
}
