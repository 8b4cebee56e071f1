//! Detection of explicit keyword confirmation in a user utterance.
//!
//! The keyword agent may only record a confirmed list when the user has
//! actually approved one. [`check_confirmation`] is the gate `save_keywords`
//! runs before honouring `confirmed=true`.

use scholar_core::SessionState;

const AFFIRMATIVE_WORDS: &[&str] = &[
    "ok", "okay", "yes", "y", "yep", "yeah", "sure", "confirm", "confirmed",
];

const AFFIRMATIVE_PHRASES: &[&str] = &["go ahead", "sounds good", "looks good"];

const PREFERENCE_PHRASES: &[&str] = &[
    "the confirmed keyword",
    "i would like to start with",
    "i'd like to start with",
    "let's use",
    "let us use",
    "i'll go with",
    "i will go with",
];

const NEGATIONS: &[&str] = &["no", "not", "nope", "don't", "dont", "never"];

/// Words that may sit between a negation and what it negates ("don't like X").
const NEGATION_FILLERS: &[&str] = &[
    "like", "want", "use", "the", "that", "those", "these", "it", "really", "to", "sound",
    "sounds", "look", "looks",
];

/// Words that mark a request to change the list rather than accept it.
const EDIT_WORDS: &[&str] = &[
    "drop", "remove", "add", "replace", "instead", "change", "but", "without", "except", "swap",
    "rather",
];

/// Why an utterance counts as confirmation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Signal {
    Affirmative,
    /// The user repeated this proposed phrase.
    Repetition(String),
    Preference,
}

/// Looks for an explicit approval of `proposed` in `utterance`.
///
/// A negation right before an approval ("not ok", "don't like qubits")
/// vetoes the whole utterance. Edit requests ("ok but drop qubits") never
/// count as affirmation or repetition.
pub fn confirmation_signal(utterance: &str, proposed: &[String]) -> Option<Signal> {
    let text = normalize(utterance);
    let words: Vec<&str> = text.split(' ').filter(|word| !word.is_empty()).collect();
    if words.is_empty() {
        return None;
    }

    let preference = phrase_starts(&words, PREFERENCE_PHRASES.iter().copied());
    let affirmative: Vec<usize> = words
        .iter()
        .enumerate()
        .filter(|(_, word)| AFFIRMATIVE_WORDS.contains(*word))
        .map(|(index, _)| index)
        .chain(phrase_starts(&words, AFFIRMATIVE_PHRASES.iter().copied()))
        .collect();
    let normalized_proposal: Vec<String> = proposed.iter().map(|phrase| normalize(phrase)).collect();
    let repeated = phrase_starts(&words, normalized_proposal.iter().map(String::as_str));

    let targets = preference.iter().chain(&affirmative).chain(&repeated);
    if targets.copied().any(|start| is_negated(&words, start)) {
        return None;
    }

    if !preference.is_empty() {
        return Some(Signal::Preference);
    }
    if words.iter().any(|word| EDIT_WORDS.contains(word)) {
        return None;
    }
    if !affirmative.is_empty() {
        return Some(Signal::Affirmative);
    }

    proposed
        .iter()
        .zip(&normalized_proposal)
        .find(|(_, normalized)| !phrase_starts(&words, [normalized.as_str()]).is_empty())
        .map(|(phrase, _)| Signal::Repetition(phrase.clone()))
}

/// Decides whether `save_keywords(keywords, confirmed=true)` made during
/// negotiation turn `turn` may stand.
///
/// Requires a proposal recorded in an earlier turn, an explicit signal in
/// the utterance that opened this turn, and a list the user actually
/// approved: the proposal itself after an affirmation, proposed phrases
/// including the repeated one after a repetition, and proposed or spoken
/// phrases after a preference statement.
pub fn check_confirmation(
    state: &SessionState,
    turn: u32,
    utterance: &str,
    keywords: &[String],
) -> Result<Signal, String> {
    if state.confirmed {
        return Ok(Signal::Affirmative);
    }

    if !state.first_proposal_turn.is_some_and(|proposed_in| proposed_in < turn) {
        return Err(
            "No keywords were proposed to the user before this turn. Present the list and wait \
             for the user's answer before confirming."
                .to_string(),
        );
    }

    let proposed = state.keywords.as_deref().unwrap_or(&[]);
    let signal = confirmation_signal(utterance, proposed).ok_or_else(|| {
        "The user has not explicitly confirmed the keywords. Ask them to confirm before \
         calling save_keywords with confirmed=true."
            .to_string()
    })?;

    let proposal: Vec<String> = proposed.iter().map(|phrase| normalize(phrase)).collect();
    let requested: Vec<String> = keywords.iter().map(|phrase| normalize(phrase)).collect();
    let in_proposal = |phrase: &String| proposal.contains(phrase);

    let approved = match &signal {
        Signal::Affirmative => {
            requested.iter().all(in_proposal) && proposal.iter().all(|p| requested.contains(p))
        }
        Signal::Repetition(phrase) => {
            requested.iter().all(in_proposal) && requested.contains(&normalize(phrase))
        }
        Signal::Preference => {
            let spoken = format!(" {} ", normalize(utterance));
            requested
                .iter()
                .all(|phrase| in_proposal(phrase) || spoken.contains(&format!(" {phrase} ")))
        }
    };

    if approved {
        Ok(signal)
    } else {
        Err(format!(
            "The user approved [{}], not [{}]. Propose the new list with confirmed=false and \
             ask the user to confirm it.",
            proposed.join(", "),
            keywords.join(", ")
        ))
    }
}

/// Word indexes at which any of `phrases` begins, matching whole words.
fn phrase_starts<'a>(words: &[&str], phrases: impl IntoIterator<Item = &'a str>) -> Vec<usize> {
    let mut starts = Vec::new();
    for phrase in phrases {
        let parts: Vec<&str> = phrase.split(' ').filter(|part| !part.is_empty()).collect();
        if parts.is_empty() || parts.len() > words.len() {
            continue;
        }
        starts.extend(
            words
                .windows(parts.len())
                .enumerate()
                .filter(|(_, window)| *window == parts.as_slice())
                .map(|(index, _)| index),
        );
    }
    starts
}

// Walks back over filler words from `start` looking for a negation.
fn is_negated(words: &[&str], start: usize) -> bool {
    words[..start]
        .iter()
        .rev()
        .copied()
        .find(|word| !NEGATION_FILLERS.contains(word))
        .is_some_and(|word| NEGATIONS.contains(&word))
}

// Lowercase, punctuation to spaces (apostrophes kept), single-spaced.
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .replace('’', "'")
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '\'' { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    fn proposal() -> Vec<String> {
        owned(&["graph neural networks", "drug discovery"])
    }

    fn proposed_in(turn: u32) -> SessionState {
        SessionState {
            keywords: Some(owned(&["graph neural networks", "drug discovery"])),
            first_proposal_turn: Some(turn),
            ..SessionState::default()
        }
    }

    #[test]
    fn affirmative_words_confirm() {
        for utterance in ["ok", "OK!", "Yes please", "y", "sure, go ahead", "Sounds good."] {
            assert_eq!(
                confirmation_signal(utterance, &[]),
                Some(Signal::Affirmative),
                "{utterance}"
            );
        }
    }

    #[test]
    fn affirmative_words_match_whole_words_only() {
        assert_eq!(confirmation_signal("bayesian okapi models", &[]), None);
        assert_eq!(confirmation_signal("yesterday's results", &[]), None);
    }

    #[test]
    fn negation_blocks_confirmation() {
        assert_eq!(confirmation_signal("no", &[]), None);
        assert_eq!(confirmation_signal("no, go ahead and change them", &[]), None);
        assert_eq!(confirmation_signal("not ok, change them", &[]), None);
        assert_eq!(
            confirmation_signal(
                "I don't like graph neural networks",
                &owned(&["graph neural networks"])
            ),
            None
        );
    }

    #[test]
    fn repeating_a_proposed_phrase_confirms() {
        let proposed = owned(&["Graph Neural Networks", "drug discovery"]);
        assert_eq!(
            confirmation_signal("graph neural networks please", &proposed),
            Some(Signal::Repetition("Graph Neural Networks".to_string()))
        );
    }

    #[test]
    fn preference_statements_confirm() {
        assert_eq!(
            confirmation_signal("The confirmed keyword is protein folding", &[]),
            Some(Signal::Preference)
        );
        assert_eq!(
            confirmation_signal("I would like to start with diffusion models", &[]),
            Some(Signal::Preference)
        );
        assert_eq!(confirmation_signal("Let's use those", &[]), Some(Signal::Preference));
    }

    #[test]
    fn negation_elsewhere_does_not_veto() {
        assert_eq!(confirmation_signal("yes, no problem", &[]), Some(Signal::Affirmative));
        assert_eq!(
            confirmation_signal("not bad, let's use those", &[]),
            Some(Signal::Preference)
        );
    }

    #[test]
    fn edit_requests_are_not_signals() {
        let proposed = owned(&["quantum computing", "qubits"]);
        assert_eq!(confirmation_signal("drop qubits and add surface codes", &proposed), None);
        assert_eq!(confirmation_signal("quantum computing but not qubits", &proposed), None);
        assert_eq!(confirmation_signal("ok, but replace qubits", &proposed), None);
        assert_eq!(confirmation_signal("use topological codes instead", &proposed), None);
    }

    #[test]
    fn unrelated_refinement_is_not_a_signal() {
        assert_eq!(
            confirmation_signal("focus more on molecules", &owned(&["graph neural networks"])),
            None
        );
    }

    #[test]
    fn confirmation_requires_an_earlier_proposal() {
        let state = SessionState::default();
        assert!(check_confirmation(&state, 1, "yes", &owned(&["qubits"])).is_err());

        // Proposed and confirmed within the same turn.
        let state = proposed_in(2);
        assert!(check_confirmation(&state, 2, "yes", &proposal()).is_err());
    }

    #[test]
    fn confirmation_requires_a_signal() {
        let state = proposed_in(1);
        assert!(check_confirmation(&state, 2, "hmm, tell me more", &proposal()).is_err());
        assert_eq!(
            check_confirmation(&state, 2, "ok", &proposal()),
            Ok(Signal::Affirmative)
        );
        assert_eq!(
            check_confirmation(&state, 2, "drug discovery it is", &owned(&["drug discovery"])),
            Ok(Signal::Repetition("drug discovery".to_string()))
        );
    }

    #[test]
    fn affirmation_only_confirms_the_proposed_list() {
        let state = proposed_in(1);
        assert!(check_confirmation(&state, 2, "yes", &owned(&["cooking recipes"])).is_err());
        assert!(check_confirmation(&state, 2, "yes", &owned(&["drug discovery"])).is_err());
        assert!(check_confirmation(
            &state,
            2,
            "Yes!",
            &owned(&["Drug Discovery", "graph neural networks"])
        )
        .is_ok());
    }

    #[test]
    fn repetition_confirms_a_subset_holding_the_repeated_phrase() {
        let state = proposed_in(1);
        let err = check_confirmation(
            &state,
            2,
            "drug discovery please",
            &owned(&["graph neural networks"]),
        )
        .unwrap_err();
        assert!(err.contains("not [graph neural networks]"));
        assert!(check_confirmation(
            &state,
            2,
            "drug discovery please",
            &owned(&["drug discovery", "protein folding"])
        )
        .is_err());
    }

    #[test]
    fn preference_may_name_new_phrases_the_user_spoke() {
        let state = proposed_in(1);
        assert_eq!(
            check_confirmation(
                &state,
                2,
                "I would like to start with protein folding",
                &owned(&["protein folding"])
            ),
            Ok(Signal::Preference)
        );
        assert!(check_confirmation(
            &state,
            2,
            "I would like to start with protein folding",
            &owned(&["cooking recipes"])
        )
        .is_err());
    }

    #[test]
    fn new_phrases_are_refinements_not_confirmations() {
        let state = proposed_in(1);
        assert!(
            check_confirmation(&state, 2, "molecular graphs", &owned(&["molecular graphs"])).is_err()
        );
    }

    #[test]
    fn already_confirmed_state_passes() {
        let state = SessionState {
            confirmed: true,
            ..proposed_in(1)
        };
        assert!(check_confirmation(&state, 1, "", &proposal()).is_ok());
    }
}
