use crate::spawn::RandomSource;

/// The fixed word the player spells to counter a red circle.
pub const TARGET_WORD: &str = "FOCUS";

/// Result of a single letter press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LetterOutcome {
    /// Valid prefix, word not complete yet.
    Progress,
    /// The full word was spelled; the attempt is cleared.
    Match,
    /// Wrong letter for this position, or five letters without a match;
    /// the attempt restarts from empty.
    Reset,
}

/// The player's in-progress spelling attempt.
///
/// Matching is strictly positional: each pressed letter must equal the
/// word's letter at that index. Any deviation resets the whole attempt,
/// even when the pressed letter occurs elsewhere in the word.
#[derive(Clone, Debug, Default)]
pub struct SpellingAttempt {
    typed: Vec<char>,
}

impl SpellingAttempt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, letter: char) -> LetterOutcome {
        self.typed.push(letter);

        let word: Vec<char> = TARGET_WORD.chars().collect();
        if self.typed == word {
            self.typed.clear();
            return LetterOutcome::Match;
        }

        // The length check comes first: five letters without a match always
        // resets, independent of where the mismatch happened.
        let pos = self.typed.len() - 1;
        if self.typed.len() >= word.len() || self.typed[pos] != word[pos] {
            self.typed.clear();
            return LetterOutcome::Reset;
        }

        LetterOutcome::Progress
    }

    pub fn clear(&mut self) {
        self.typed.clear();
    }

    pub fn typed(&self) -> &[char] {
        &self.typed
    }

    pub fn is_empty(&self) -> bool {
        self.typed.is_empty()
    }
}

/// The scrambled set of the word's letters offered as tappable choices.
/// Always contains each of the five letters exactly once.
#[derive(Clone, Debug)]
pub struct LetterBank {
    letters: Vec<char>,
}

impl LetterBank {
    pub fn new() -> Self {
        Self {
            letters: TARGET_WORD.chars().collect(),
        }
    }

    pub fn shuffle(&mut self, rng: &mut dyn RandomSource) {
        rng.shuffle(&mut self.letters);
    }

    pub fn letters(&self) -> &[char] {
        &self.letters
    }

    pub fn contains(&self, letter: char) -> bool {
        self.letters.contains(&letter)
    }
}

impl Default for LetterBank {
    fn default() -> Self {
        Self::new()
    }
}
