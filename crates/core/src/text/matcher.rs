use super::normalize;

/// Similarity of two strings in `[0.0, 1.0]`, based on Levenshtein edit
/// distance scaled by the longer length.
///
/// Two empty strings count as identical (1.0); one empty string against a
/// non-empty one counts as completely different (0.0).
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Scores a transcript against a target phrase.
///
/// Both sides are normalized first. A transcript that contains the target
/// verbatim scores 1.0 outright. Otherwise the target is slid word by word
/// across the transcript and the best window wins, so filler around a
/// correct pronunciation does not dilute the score. The whole-string
/// comparison sets the floor, covering word splits that disagree with the
/// target's. Transcripts shorter than the target fall back to the
/// whole-string comparison alone.
#[must_use]
pub fn match_score(transcript: &str, target: &str) -> f64 {
    let transcript = normalize(transcript);
    let target = normalize(target);

    if transcript.contains(&target) {
        return 1.0;
    }

    let transcript_words: Vec<&str> = transcript.split_whitespace().collect();
    let target_words: Vec<&str> = target.split_whitespace().collect();

    if transcript_words.len() < target_words.len() {
        return similarity(&transcript, &target);
    }

    let window = target_words.len();
    // The whole string is the floor; windows only raise it.
    let mut best = similarity(&transcript, &target);
    for start in 0..=(transcript_words.len() - window) {
        let candidate = transcript_words[start..start + window].join(" ");
        let score = similarity(&candidate, &target);
        if score > best {
            best = score;
        }
    }
    best
}
