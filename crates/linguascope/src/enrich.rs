use anno_types::{CoarseTag, PronScheme, Sentence};
use pinyin_translit::Transliterator;

/// Synonyms shown per enriched verb before the list is cut off.
pub const MAX_SYNONYMS: usize = 5;

const TOKEN_SEPARATOR: &str = " | ";

/// Render Mandarin sentences with a per-token pronunciation aid:
/// `text [sound]` for every non-punctuation token, `EMPTY LINE` when a
/// sentence has nothing left to show. A token without a known reading is
/// shown bare; absence of data is silent.
pub fn mandarin_lines(
    sentences: &[Sentence],
    translit: &Transliterator,
    scheme: PronScheme,
) -> Vec<String> {
    sentences
        .iter()
        .enumerate()
        .map(|(idx, sent)| {
            let display: Vec<String> = sent
                .tokens
                .iter()
                .filter(|t| !t.tag.is_punct_or_sym() && !t.flags.is_space)
                .map(|t| {
                    let sound = translit.annotate(&t.text, scheme);
                    if sound.is_empty() {
                        t.text.clone()
                    } else {
                        format!("{} [{}]", t.text, sound)
                    }
                })
                .collect();
            if display.is_empty() {
                format!("{} >>> EMPTY LINE", idx + 1)
            } else {
                format!("{} >>> {}", idx + 1, display.join(TOKEN_SEPARATOR))
            }
        })
        .collect()
}

/// Render English sentences with verb synonyms pulled through the supplied
/// callback (a closure over the dictionary cache): `word (cf. a | b)`.
/// Verbs without synonyms and every other token pass through untouched.
pub fn english_lines<F>(sentences: &[Sentence], synonyms_for: F) -> Vec<String>
where
    F: Fn(&str) -> Vec<String>,
{
    sentences
        .iter()
        .enumerate()
        .map(|(idx, sent)| {
            let words: Vec<String> = sent
                .tokens
                .iter()
                .filter(|t| !t.flags.is_space)
                .map(|t| {
                    if t.tag == CoarseTag::Verb {
                        let mut syns = synonyms_for(&t.text);
                        syns.truncate(MAX_SYNONYMS);
                        if !syns.is_empty() {
                            return format!("{} (cf. {})", t.text, syns.join(" | "));
                        }
                    }
                    t.text.clone()
                })
                .collect();
            format!("{} >>> {}", idx + 1, words.join(" "))
        })
        .collect()
}

/// Render French sentences with each token followed by its IPA in
/// guillemets when the callback has one: `mouton «mu.tɔ̃»`. Tokens without
/// a pronunciation stay bare.
pub fn french_lines<F>(sentences: &[Sentence], ipa_for: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    sentences
        .iter()
        .enumerate()
        .map(|(idx, sent)| {
            let words: Vec<String> = sent
                .tokens
                .iter()
                .filter(|t| !t.flags.is_space)
                .map(|t| match ipa_for(&t.text) {
                    Some(ipa) => format!("{} «{}»", t.text, ipa),
                    None => t.text.clone(),
                })
                .collect();
            format!("{} >>> {}", idx + 1, words.join(" "))
        })
        .collect()
}
