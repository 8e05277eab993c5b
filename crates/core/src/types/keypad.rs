//! Portal login keypad.
//!
//! The portal login page shows the ten digits in a freshly shuffled order.
//! The browser submits the *positions* of the pressed buttons; the server
//! keeps the layout in the session and decodes positions back to digits
//! with [`KeypadLayout::decode`]. A PIN is exactly [`PIN_LENGTH`] digits.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Number of digits in a portal access code.
pub const PIN_LENGTH: usize = 6;

/// Errors from keypad input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum KeypadError {
    /// The entry already holds [`PIN_LENGTH`] digits.
    #[error("access code is limited to {PIN_LENGTH} digits")]
    Full,
    /// A non-digit character was entered.
    #[error("only digits can be entered")]
    NotADigit,
    /// A button position outside the keypad was submitted.
    #[error("unknown keypad position: {0}")]
    UnknownPosition(usize),
    /// A layout was not a permutation of the ten digits.
    #[error("keypad layout must contain each digit exactly once")]
    InvalidLayout,
}

/// On-screen order of the ten digit buttons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeypadLayout {
    digits: [u8; 10],
}

impl KeypadLayout {
    /// A new random layout.
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut digits = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9];
        digits.shuffle(rng);
        Self { digits }
    }

    /// Build a layout from an explicit button order.
    ///
    /// # Errors
    ///
    /// Returns [`KeypadError::InvalidLayout`] unless `digits` contains each of
    /// `0..=9` exactly once.
    pub fn from_digits(digits: [u8; 10]) -> Result<Self, KeypadError> {
        let mut seen = [false; 10];
        for &d in &digits {
            let slot = seen
                .get_mut(usize::from(d))
                .ok_or(KeypadError::InvalidLayout)?;
            if *slot {
                return Err(KeypadError::InvalidLayout);
            }
            *slot = true;
        }
        Ok(Self { digits })
    }

    /// Digits in button order, for rendering.
    #[must_use]
    pub const fn digits(&self) -> &[u8; 10] {
        &self.digits
    }

    /// The digit shown on the button at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`KeypadError::UnknownPosition`] for positions past the last
    /// button.
    pub fn digit_at(&self, position: usize) -> Result<char, KeypadError> {
        self.digits
            .get(position)
            .map(|d| char::from(b'0' + d))
            .ok_or(KeypadError::UnknownPosition(position))
    }

    /// Decode a sequence of pressed button positions into a PIN entry.
    ///
    /// # Errors
    ///
    /// Fails on an unknown position or when more than [`PIN_LENGTH`]
    /// buttons were pressed.
    pub fn decode<I>(&self, positions: I) -> Result<PinEntry, KeypadError>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut entry = PinEntry::default();
        for position in positions {
            entry.press(self.digit_at(position)?)?;
        }
        Ok(entry)
    }
}

/// Digits typed so far on the keypad.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinEntry {
    digits: String,
}

impl PinEntry {
    /// Append a digit.
    ///
    /// # Errors
    ///
    /// Returns [`KeypadError::Full`] when [`PIN_LENGTH`] digits are already
    /// entered (the entry is left unchanged) and [`KeypadError::NotADigit`]
    /// for anything but `0`-`9`.
    pub fn press(&mut self, digit: char) -> Result<(), KeypadError> {
        if !digit.is_ascii_digit() {
            return Err(KeypadError::NotADigit);
        }
        if self.digits.len() >= PIN_LENGTH {
            return Err(KeypadError::Full);
        }
        self.digits.push(digit);
        Ok(())
    }

    /// Remove the last digit, if any.
    pub fn backspace(&mut self) -> Option<char> {
        self.digits.pop()
    }

    /// Remove every digit.
    pub fn clear(&mut self) {
        self.digits.clear();
    }

    /// Number of digits entered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.digits.len()
    }

    /// Whether nothing has been entered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// Whether the entry holds a full access code.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.digits.len() == PIN_LENGTH
    }

    /// The entered digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.digits
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_seventh_digit_is_rejected() {
        let mut entry = PinEntry::default();
        for d in "123456".chars() {
            entry.press(d).unwrap();
        }
        assert!(entry.is_complete());
        assert_eq!(entry.press('7'), Err(KeypadError::Full));
        assert_eq!(entry.as_str(), "123456");
        assert_eq!(entry.len(), PIN_LENGTH);
    }

    #[test]
    fn test_never_exceeds_pin_length_under_any_input() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut entry = PinEntry::default();
        for _ in 0..500 {
            let d = char::from(b'0' + rng.random_range(0..10u8));
            match rng.random_range(0..4) {
                0 => {
                    entry.backspace();
                }
                _ => {
                    let _ = entry.press(d);
                }
            }
            assert!(entry.len() <= PIN_LENGTH);
        }
    }

    #[test]
    fn test_backspace_and_clear() {
        let mut entry = PinEntry::default();
        entry.press('4').unwrap();
        entry.press('2').unwrap();
        assert_eq!(entry.backspace(), Some('2'));
        assert_eq!(entry.as_str(), "4");
        entry.clear();
        assert!(entry.is_empty());
        assert_eq!(entry.backspace(), None);
    }

    #[test]
    fn test_rejects_non_digits() {
        let mut entry = PinEntry::default();
        assert_eq!(entry.press('a'), Err(KeypadError::NotADigit));
        assert!(entry.is_empty());
    }

    #[test]
    fn test_shuffled_layout_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let layout = KeypadLayout::shuffled(&mut rng);
            let mut digits = *layout.digits();
            digits.sort_unstable();
            assert_eq!(digits, [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        }
    }

    #[test]
    fn test_decode_positions() {
        let layout = KeypadLayout::from_digits([9, 8, 7, 6, 5, 4, 3, 2, 1, 0]).unwrap();
        let entry = layout.decode([0, 1, 2, 9, 9, 5]).unwrap();
        assert_eq!(entry.as_str(), "987004");
    }

    #[test]
    fn test_decode_rejects_seventh_press_and_bad_positions() {
        let layout = KeypadLayout::from_digits([0, 1, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap();
        assert_eq!(
            layout.decode([1, 2, 3, 4, 5, 6, 7]),
            Err(KeypadError::Full)
        );
        assert_eq!(
            layout.decode([10]),
            Err(KeypadError::UnknownPosition(10))
        );
    }

    #[test]
    fn test_from_digits_rejects_non_permutations() {
        assert_eq!(
            KeypadLayout::from_digits([0, 0, 2, 3, 4, 5, 6, 7, 8, 9]),
            Err(KeypadError::InvalidLayout)
        );
        assert_eq!(
            KeypadLayout::from_digits([10, 1, 2, 3, 4, 5, 6, 7, 8, 9]),
            Err(KeypadError::InvalidLayout)
        );
    }
}
