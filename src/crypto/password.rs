//! Random password generation and a simple strength score.

use rand::seq::IndexedRandom;

use crate::errors::{Result, VaultError};

pub const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
pub const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const DIGITS: &str = "0123456789";
pub const SYMBOLS: &str = "!@#$%^&*()-_=+[]{};:,.<>/?";

/// Shortest password the generator will produce.
pub const MIN_GENERATED_LEN: usize = 4;

/// Longest password the generator will produce.
pub const MAX_GENERATED_LEN: usize = 128;

/// Which character classes to draw from, and how many characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub length: usize,
    pub lowercase: bool,
    pub uppercase: bool,
    pub digits: bool,
    pub symbols: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            length: 16,
            lowercase: true,
            uppercase: true,
            digits: true,
            symbols: true,
        }
    }
}

impl GeneratorOptions {
    fn pool(&self) -> Vec<char> {
        let mut pool = String::new();
        if self.lowercase {
            pool.push_str(LOWERCASE);
        }
        if self.uppercase {
            pool.push_str(UPPERCASE);
        }
        if self.digits {
            pool.push_str(DIGITS);
        }
        if self.symbols {
            pool.push_str(SYMBOLS);
        }
        pool.chars().collect()
    }
}

/// Generate a password by drawing uniformly from the enabled classes.
pub fn generate_password(options: &GeneratorOptions) -> Result<String> {
    if !(MIN_GENERATED_LEN..=MAX_GENERATED_LEN).contains(&options.length) {
        return Err(VaultError::InvalidInput(format!(
            "password length must be between {MIN_GENERATED_LEN} and {MAX_GENERATED_LEN}"
        )));
    }

    let pool = options.pool();
    if pool.is_empty() {
        return Err(VaultError::InvalidInput(
            "select at least one character class".into(),
        ));
    }

    let mut rng = rand::rng();
    let password = (0..options.length)
        .filter_map(|_| pool.choose(&mut rng).copied())
        .collect();
    Ok(password)
}

/// Coarse strength buckets for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Strength {
    Weak,
    Fair,
    Strong,
    VeryStrong,
}

impl Strength {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=24 => Self::Weak,
            25..=49 => Self::Fair,
            50..=74 => Self::Strong,
            _ => Self::VeryStrong,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Weak => "weak",
            Self::Fair => "fair",
            Self::Strong => "strong",
            Self::VeryStrong => "very strong",
        }
    }
}

/// Score a password from 0 to 100.
///
/// Length earns 4 points per character (capped at 60), each character
/// class present earns 10, and 12+ characters with 3+ classes earn a
/// 10-point bonus.
pub fn strength_score(password: &str) -> u8 {
    if password.is_empty() {
        return 0;
    }

    let length = password.chars().count();
    let classes = [
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_ascii_alphanumeric()),
    ]
    .iter()
    .filter(|present| **present)
    .count();

    let base = (length * 4).min(60);
    let diversity = classes * 10;
    let bonus = if length >= 12 && classes >= 3 { 10 } else { 0 };

    // Bounded by 100 before the cast.
    (base + diversity + bonus).min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_requested_length_from_pool() {
        let opts = GeneratorOptions {
            length: 40,
            lowercase: false,
            uppercase: false,
            digits: true,
            symbols: false,
        };
        let pw = generate_password(&opts).unwrap();
        assert_eq!(pw.chars().count(), 40);
        assert!(pw.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn default_options_produce_sixteen_chars() {
        let pw = generate_password(&GeneratorOptions::default()).unwrap();
        assert_eq!(pw.len(), 16);
        assert!(pw.chars().all(|c| LOWERCASE.contains(c)
            || UPPERCASE.contains(c)
            || DIGITS.contains(c)
            || SYMBOLS.contains(c)));
    }

    #[test]
    fn rejects_empty_pool() {
        let opts = GeneratorOptions {
            lowercase: false,
            uppercase: false,
            digits: false,
            symbols: false,
            ..GeneratorOptions::default()
        };
        assert!(generate_password(&opts).is_err());
    }

    #[test]
    fn rejects_out_of_range_length() {
        for length in [0, 3, 129] {
            let opts = GeneratorOptions {
                length,
                ..GeneratorOptions::default()
            };
            assert!(generate_password(&opts).is_err(), "length {length}");
        }
    }

    #[test]
    fn score_examples() {
        assert_eq!(strength_score(""), 0);
        // 3 chars, one class: 12 + 10
        assert_eq!(strength_score("abc"), 22);
        // 10 chars, lower+digit: 40 + 20
        assert_eq!(strength_score("abcde12345"), 60);
        // 12 chars, 4 classes, bonus: 48 + 40 + 10
        assert_eq!(strength_score("Abcdefgh12!x"), 98);
        // capped
        assert_eq!(strength_score("Abcdefghijklmnop12345!!"), 100);
    }

    #[test]
    fn labels_follow_thresholds() {
        assert_eq!(Strength::from_score(0), Strength::Weak);
        assert_eq!(Strength::from_score(24), Strength::Weak);
        assert_eq!(Strength::from_score(25), Strength::Fair);
        assert_eq!(Strength::from_score(50), Strength::Strong);
        assert_eq!(Strength::from_score(75), Strength::VeryStrong);
        assert_eq!(Strength::VeryStrong.label(), "very strong");
    }
}
