//! Random password generation.
//!
//! Every character is drawn uniformly from the union of the selected
//! classes.  Four distinct positions are then picked, and for each
//! selected class one of those positions is overwritten with a character
//! from that class, so every requested class shows up at least once.

use rand::{CryptoRng, Rng};

use crate::errors::{Result, StrongboxError};

pub const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
pub const DIGITS: &str = "1234567890";
pub const PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Shortest password the generator will produce.
pub const MIN_PASSWORD_LEN: usize = 4;

/// Longest password an entry can store.
pub const MAX_PASSWORD_LEN: usize = 65_535;

/// Character classes to draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordClasses {
    pub uppercase: bool,
    pub lowercase: bool,
    pub digits: bool,
    pub punctuation: bool,
}

impl Default for PasswordClasses {
    fn default() -> Self {
        Self::ALL
    }
}

impl PasswordClasses {
    pub const ALL: Self = Self {
        uppercase: true,
        lowercase: true,
        digits: true,
        punctuation: true,
    };

    pub const NONE: Self = Self {
        uppercase: false,
        lowercase: false,
        digits: false,
        punctuation: false,
    };

    /// With nothing selected, fall back to lowercase only.
    fn effective(self) -> Self {
        if self == Self::NONE {
            Self {
                lowercase: true,
                ..Self::NONE
            }
        } else {
            self
        }
    }

    fn selected(self) -> [(bool, &'static [u8]); 4] {
        [
            (self.uppercase, UPPERCASE.as_bytes()),
            (self.lowercase, LOWERCASE.as_bytes()),
            (self.digits, DIGITS.as_bytes()),
            (self.punctuation, PUNCTUATION.as_bytes()),
        ]
    }
}

/// Generate a password of `length` characters using the thread CSPRNG.
pub fn generate_password(length: usize, classes: PasswordClasses) -> Result<String> {
    generate_password_with(&mut rand::rng(), length, classes)
}

/// Generate a password with a caller-supplied cryptographic RNG.
pub fn generate_password_with<R: Rng + CryptoRng>(
    rng: &mut R,
    length: usize,
    classes: PasswordClasses,
) -> Result<String> {
    if length < MIN_PASSWORD_LEN {
        return Err(StrongboxError::Validation(format!(
            "password length must be at least {MIN_PASSWORD_LEN}"
        )));
    }
    if length > MAX_PASSWORD_LEN {
        return Err(StrongboxError::Validation(format!(
            "password length cannot exceed {MAX_PASSWORD_LEN}"
        )));
    }

    let sets = classes.effective().selected();
    let alphabet: Vec<u8> = sets
        .iter()
        .filter(|(on, _)| *on)
        .flat_map(|(_, set)| set.iter().copied())
        .collect();

    let mut password: Vec<u8> = (0..length)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())])
        .collect();

    let mut positions = Vec::with_capacity(sets.len());
    while positions.len() < sets.len() {
        let candidate = rng.random_range(0..length);
        if !positions.contains(&candidate) {
            positions.push(candidate);
        }
    }

    for (&(on, set), &position) in sets.iter().zip(&positions) {
        if on {
            password[position] = set[rng.random_range(0..set.len())];
        }
    }

    Ok(password.into_iter().map(char::from).collect())
}
