/// One attempt at one phrase.
///
/// `transcript_offset` marks how many characters of the session's cumulative
/// transcript were already settled when the round began; judging only looks
/// at what the recognizer heard after that point. `resolved` flips exactly
/// once, on success or timeout, whichever is processed first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    phrase_index: usize,
    transcript_offset: usize,
    resolved: bool,
    seq: u64,
}

impl Round {
    pub(crate) fn spawn(phrase_index: usize, transcript_offset: usize, seq: u64) -> Self {
        Self {
            phrase_index,
            transcript_offset,
            resolved: false,
            seq,
        }
    }

    #[must_use]
    pub fn phrase_index(&self) -> usize {
        self.phrase_index
    }

    /// Characters of the cumulative transcript settled before this round.
    #[must_use]
    pub fn transcript_offset(&self) -> usize {
        self.transcript_offset
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Distinguishes this round from every other round of the same game, so
    /// countdown events from an already-resolved round can be discarded.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Marks the round resolved. Returns `false` when it already was, so a
    /// success and a timeout can never both count.
    pub(crate) fn resolve(&mut self) -> bool {
        if self.resolved {
            return false;
        }
        self.resolved = true;
        true
    }

    /// Moves the settled-transcript mark after the recognizer restarts from
    /// an empty transcript.
    pub(crate) fn rebase(&mut self, transcript_offset: usize) {
        self.transcript_offset = transcript_offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_flips_exactly_once() {
        let mut round = Round::spawn(0, 0, 1);
        assert!(!round.is_resolved());

        assert!(round.resolve());
        assert!(!round.resolve());
        assert!(round.is_resolved());
    }

    #[test]
    fn rebase_moves_the_offset() {
        let mut round = Round::spawn(2, 17, 3);
        round.rebase(0);

        assert_eq!(round.transcript_offset(), 0);
        assert_eq!(round.phrase_index(), 2);
    }
}
