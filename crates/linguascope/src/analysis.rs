use std::collections::{HashMap, HashSet};

use anno_types::{Keyword, Lang, Token};

/// A token the content filter drops: punctuation or symbol by tag, or flagged
/// as email/URL/number/whitespace-like. The tag check and the explicit
/// `is_punct` flag are both applied; flag semantics differ across pipelines
/// and a token only needs to trip one of them.
fn is_noise(tok: &Token) -> bool {
    tok.tag.is_punct_or_sym()
        || tok.flags.is_punct
        || tok.flags.is_space
        || tok.flags.like_email
        || tok.flags.like_url
        || tok.flags.like_num
}

/// Keep the content-bearing subsequence of a token stream. Order and
/// duplicates are preserved; the result borrows from the input.
pub fn filter_tokens<'a, I>(tokens: I) -> Vec<&'a Token>
where
    I: IntoIterator<Item = &'a Token>,
{
    tokens.into_iter().filter(|tok| !is_noise(tok)).collect()
}

/// Vocabulary key for native-script lookup: the surface text, excluding any
/// token containing an ASCII letter or digit; the target dictionary only
/// indexes native-script entries, so "COVID19" never becomes vocabulary.
pub fn native_text_key(tok: &Token) -> Option<String> {
    if tok.text.chars().any(|c| c.is_ascii_alphanumeric()) {
        None
    } else {
        Some(tok.text.clone())
    }
}

/// Vocabulary key for lemma-based lookup: `lemma | TAG`, restricted to the
/// parts of speech worth sending to a dictionary and excluding lemmas with
/// digits in them. The tag rides along so a later lookup can disambiguate
/// the lemma's part of speech.
pub fn lemma_tag_key(tok: &Token) -> Option<String> {
    if !tok.tag.is_lookup_pos() {
        return None;
    }
    if tok.lemma.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("{} | {}", tok.lemma, tok.tag))
}

/// The key function a language's page uses.
pub fn vocabulary_key(lang: Lang, tok: &Token) -> Option<String> {
    match lang {
        Lang::Mandarin => native_text_key(tok),
        Lang::English | Lang::French => lemma_tag_key(tok),
    }
}

/// Deduplicate filtered tokens into vocabulary, in first-occurrence order.
/// The ordering is deliberate: consumers render this directly and must not
/// depend on set iteration order.
pub fn extract_vocabulary<F>(filtered: &[&Token], keyer: F) -> Vec<String>
where
    F: Fn(&Token) -> Option<String>,
{
    let mut seen = HashSet::new();
    let mut vocab = Vec::new();
    for tok in filtered {
        if let Some(key) = keyer(tok)
            && seen.insert(key.clone())
        {
            vocab.push(key);
        }
    }
    vocab
}

/// Occurrence counts over token text, preserving first-seen insertion order.
///
/// Top-K selection sorts by count descending with ties broken by first-seen
/// order; the stable sort over the insertion-ordered entries makes that rule
/// structural rather than an accident of the underlying map.
#[derive(Debug, Clone)]
pub struct FrequencyTable {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl FrequencyTable {
    pub fn from_tokens(filtered: &[&Token]) -> Self {
        let mut entries: Vec<(String, usize)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for tok in filtered {
            match index.get(tok.text.as_str()) {
                Some(at) => entries[*at].1 += 1,
                None => {
                    index.insert(tok.text.clone(), entries.len());
                    entries.push((tok.text.clone(), 1));
                }
            }
        }
        Self { entries, index }
    }

    /// Distinct token texts counted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, text: &str) -> usize {
        self.index
            .get(text)
            .map(|at| self.entries[*at].1)
            .unwrap_or(0)
    }

    /// All counts in first-seen order (bar-chart input).
    pub fn entries(&self) -> &[(String, usize)] {
        &self.entries
    }

    /// The K most frequent texts, count descending, ties by first-seen order.
    pub fn top_k(&self, k: usize) -> Vec<(String, usize)> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(k);
        ranked
    }
}

/// Tokens whose surface form differs from their lemma, deduplicated by lemma
/// keeping the first occurrence. Feeds the morphology table.
pub fn inflected_forms<'a, I>(tokens: I) -> Vec<&'a Token>
where
    I: IntoIterator<Item = &'a Token>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for tok in tokens {
        if tok.is_inflected() && seen.insert(tok.lemma.to_lowercase()) {
            out.push(tok);
        }
    }
    out
}

/// Rank pipeline-supplied keywords: score descending (ties keep input
/// order), truncated to `n`, scores rounded to three decimals for display.
pub fn rank_keywords(keywords: &[Keyword], n: usize) -> Vec<Keyword> {
    let mut ranked: Vec<Keyword> = keywords.to_vec();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(n);
    for kw in &mut ranked {
        kw.score = (kw.score * 1000.0).round() / 1000.0;
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use anno_types::{CoarseTag, TokenFlags};

    fn tok(text: &str, lemma: &str, tag: CoarseTag) -> Token {
        Token {
            text: text.into(),
            lemma: lemma.into(),
            tag,
            flags: TokenFlags::default(),
        }
    }

    fn flagged(text: &str, tag: CoarseTag, set: impl Fn(&mut TokenFlags)) -> Token {
        let mut t = tok(text, text, tag);
        set(&mut t.flags);
        t
    }

    #[test]
    fn filter_drops_punct_sym_and_flagged_tokens() {
        let tokens = vec![
            tok("draw", "draw", CoarseTag::Verb),
            tok("!", "!", CoarseTag::Punct),
            tok("$", "$", CoarseTag::Sym),
            flagged("3.14", CoarseTag::Num, |f| f.like_num = true),
            flagged("a@b.com", CoarseTag::X, |f| f.like_email = true),
            flagged("https://x.test", CoarseTag::X, |f| f.like_url = true),
            flagged("\n", CoarseTag::Space, |f| f.is_space = true),
            tok("sheep", "sheep", CoarseTag::Noun),
        ];
        let kept = filter_tokens(&tokens);
        let texts: Vec<&str> = kept.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["draw", "sheep"]);
    }

    #[test]
    fn filter_honors_the_redundant_punct_flag() {
        // A coarser pipeline may tag punctuation X but still set the flag.
        let tokens = vec![
            flagged("—", CoarseTag::X, |f| f.is_punct = true),
            tok("word", "word", CoarseTag::Noun),
        ];
        let kept = filter_tokens(&tokens);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].text, "word");
    }

    #[test]
    fn filter_output_is_a_subsequence() {
        let tokens = vec![
            tok("a", "a", CoarseTag::Noun),
            tok(",", ",", CoarseTag::Punct),
            tok("b", "b", CoarseTag::Noun),
            tok("a", "a", CoarseTag::Noun),
        ];
        let kept = filter_tokens(&tokens);
        // Order and duplicates preserved.
        let texts: Vec<&str> = kept.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "a"]);
        let empty: Vec<Token> = Vec::new();
        assert!(filter_tokens(&empty).is_empty());
    }

    #[test]
    fn vocabulary_deduplicates_in_first_occurrence_order() {
        let tokens = vec![
            tok("the", "the", CoarseTag::Det),
            tok("sheep", "sheep", CoarseTag::Noun),
            tok("drew", "draw", CoarseTag::Verb),
            tok("sheep", "sheep", CoarseTag::Noun),
            tok("sheep", "sheep", CoarseTag::Noun),
        ];
        let filtered = filter_tokens(&tokens);
        let vocab = extract_vocabulary(&filtered, lemma_tag_key);
        assert_eq!(vocab, vec!["sheep | NOUN", "draw | VERB"]);
    }

    #[test]
    fn lemma_tag_key_limits_pos_and_digits() {
        assert_eq!(lemma_tag_key(&tok("the", "the", CoarseTag::Det)), None);
        assert_eq!(lemma_tag_key(&tok("b2b", "b2b", CoarseTag::Noun)), None);
        assert_eq!(
            lemma_tag_key(&tok("ran", "run", CoarseTag::Verb)).as_deref(),
            Some("run | VERB")
        );
    }

    #[test]
    fn native_key_excludes_mixed_script_tokens() {
        assert_eq!(native_text_key(&tok("COVID19", "COVID19", CoarseTag::Noun)), None);
        assert_eq!(native_text_key(&tok("綿羊2", "綿羊2", CoarseTag::Noun)), None);
        assert_eq!(
            native_text_key(&tok("綿羊", "綿羊", CoarseTag::Noun)).as_deref(),
            Some("綿羊")
        );
    }

    #[test]
    fn counts_and_top_k_break_ties_by_first_seen() {
        let tokens = vec![
            tok("a", "a", CoarseTag::Noun),
            tok("b", "b", CoarseTag::Noun),
            tok("a", "a", CoarseTag::Noun),
            tok("c", "c", CoarseTag::Noun),
            tok("a", "a", CoarseTag::Noun),
        ];
        let filtered = filter_tokens(&tokens);
        let table = FrequencyTable::from_tokens(&filtered);
        assert_eq!(table.get("a"), 3);
        assert_eq!(table.get("b"), 1);
        assert_eq!(table.get("c"), 1);
        assert_eq!(table.get("z"), 0);

        let top = table.top_k(2);
        assert_eq!(top, vec![("a".to_string(), 3), ("b".to_string(), 1)]);

        // K larger than the table is the whole table.
        assert_eq!(table.top_k(10).len(), 3);
    }

    #[test]
    fn entries_keep_first_seen_order() {
        let tokens = vec![
            tok("c", "c", CoarseTag::Noun),
            tok("a", "a", CoarseTag::Noun),
            tok("c", "c", CoarseTag::Noun),
        ];
        let filtered = filter_tokens(&tokens);
        let table = FrequencyTable::from_tokens(&filtered);
        let texts: Vec<&str> = table.entries().iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(texts, vec!["c", "a"]);
    }

    #[test]
    fn inflected_forms_dedup_by_lemma() {
        let tokens = vec![
            tok("was", "be", CoarseTag::Aux),
            tok("sheep", "sheep", CoarseTag::Noun),
            tok("Were", "be", CoarseTag::Aux),
            tok("drew", "draw", CoarseTag::Verb),
        ];
        let rows = inflected_forms(&tokens);
        let texts: Vec<&str> = rows.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["was", "drew"]);
    }

    #[test]
    fn keywords_rank_by_score_and_round() {
        let kws = vec![
            Keyword { text: "plane".into(), score: 0.12345 },
            Keyword { text: "desert".into(), score: 0.5 },
            Keyword { text: "sheep".into(), score: 0.5 },
        ];
        let ranked = rank_keywords(&kws, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].text, "desert");
        assert_eq!(ranked[1].text, "sheep");
        let all = rank_keywords(&kws, 10);
        assert_eq!(all[2].score, 0.123);
    }
}
