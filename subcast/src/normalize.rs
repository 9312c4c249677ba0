use std::sync::OnceLock;

use regex::Regex;

/// Filler tokens whose leading repetition is compressed, in match priority order.
const CHORUS_TOKENS: [&str; 3] = ["Oh", "La", "Na"];

fn chorus_patterns() -> &'static [(Regex, String)] {
    static PATTERNS: OnceLock<Vec<(Regex, String)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        CHORUS_TOKENS
            .iter()
            .map(|token| {
                // The trailing word boundary keeps "Nancy" or "Later" plain.
                let pattern = format!(r"(?i)^{token}(?:\s+{token})*\b");
                let regex = Regex::new(&pattern).expect("valid chorus regex");
                (regex, format!("Chorus: {token} (singing)"))
            })
            .collect()
    })
}

/// Prepare recognized text for display as a cue.
///
/// Text that opens with a filler token as a whole word ("oh oh oh",
/// "La la land") becomes a short chorus label; everything else has its
/// whitespace runs collapsed to single spaces and is trimmed. All-whitespace
/// input yields "".
pub fn normalize(text: &str) -> String {
    let trimmed = text.trim();

    if let Some((_, label)) = chorus_patterns()
        .iter()
        .find(|(regex, _)| regex.is_match(trimmed))
    {
        return label.clone();
    }

    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}
