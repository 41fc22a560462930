use anno_types::{AnnotatedText, CoarseTag, Lang, Sentence, Token, TokenFlags};
use jieba_rs::Jieba;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_segmentation::UnicodeSegmentation;

/// Characters treated as symbols rather than punctuation, mirroring how
/// taggers split SYM from PUNCT.
const SYM_CHARS: &str = "$€£¥¢%+=<>^|~§©®°×÷";

/// Heuristic annotator used when a request carries raw text instead of
/// pipeline output. It segments sentences and words, sets the content-type
/// flags the filter needs, and labels only what its heuristics can defend:
/// `PUNCT`, `SYM`, `NUM`, `SPACE`, and `X` for everything else. It never
/// guesses real parts of speech; sections that need them ask for
/// pipeline-annotated input instead.
///
/// Lemmas are the lowercased Snowball stem for English and French and the
/// surface text for Mandarin.
pub struct FallbackAnnotator {
    jieba: Jieba,
    english: Stemmer,
    french: Stemmer,
}

impl FallbackAnnotator {
    pub fn new() -> Self {
        Self {
            jieba: Jieba::new(),
            english: Stemmer::create(Algorithm::English),
            french: Stemmer::create(Algorithm::French),
        }
    }

    pub fn annotate(&self, lang: Lang, text: &str) -> AnnotatedText {
        let sentences = text
            .split_sentence_bounds()
            .map(|sent| Sentence {
                tokens: self.tokenize(lang, sent),
            })
            .filter(|s| !s.tokens.is_empty())
            .collect();
        AnnotatedText {
            sentences,
            entities: Vec::new(),
            keywords: Vec::new(),
        }
    }

    fn tokenize(&self, lang: Lang, sentence: &str) -> Vec<Token> {
        let pieces: Vec<&str> = match lang {
            Lang::Mandarin => self.jieba.cut(sentence, false),
            Lang::English | Lang::French => sentence.split_word_bounds().collect(),
        };
        pieces
            .into_iter()
            .filter(|p| !p.is_empty())
            .map(|p| self.classify(lang, p))
            .collect()
    }

    fn classify(&self, lang: Lang, piece: &str) -> Token {
        let mut flags = TokenFlags::default();
        let tag;

        if piece.chars().all(char::is_whitespace) {
            flags.is_space = true;
            tag = CoarseTag::Space;
        } else if looks_like_url(piece) {
            flags.like_url = true;
            tag = CoarseTag::X;
        } else if looks_like_email(piece) {
            flags.like_email = true;
            tag = CoarseTag::X;
        } else if looks_like_num(piece) {
            flags.like_num = true;
            tag = CoarseTag::Num;
        } else if piece.chars().all(|c| !c.is_alphanumeric() && !c.is_whitespace()) {
            flags.is_punct = true;
            tag = if piece.chars().all(|c| SYM_CHARS.contains(c)) {
                CoarseTag::Sym
            } else {
                CoarseTag::Punct
            };
        } else {
            tag = CoarseTag::X;
        }

        let lemma = match lang {
            Lang::Mandarin => piece.to_string(),
            Lang::English => self.english.stem(&piece.to_lowercase()).to_string(),
            Lang::French => self.french.stem(&piece.to_lowercase()).to_string(),
        };

        Token {
            text: piece.to_string(),
            lemma,
            tag,
            flags,
        }
    }
}

impl Default for FallbackAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

fn looks_like_url(piece: &str) -> bool {
    piece.starts_with("http://")
        || piece.starts_with("https://")
        || piece.starts_with("www.")
        || piece.contains("://")
}

fn looks_like_email(piece: &str) -> bool {
    let Some((local, domain)) = piece.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.ends_with('.')
        && piece.chars().all(|c| !c.is_whitespace())
        && piece.matches('@').count() == 1
}

fn looks_like_num(piece: &str) -> bool {
    let body = piece.strip_prefix(['+', '-']).unwrap_or(piece);
    !body.is_empty()
        && body.chars().any(|c| c.is_ascii_digit())
        && body.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::filter_tokens;

    #[test]
    fn flags_urls_emails_and_numbers() {
        let annotator = FallbackAnnotator::new();
        let doc = annotator.annotate(
            Lang::English,
            "Write to sheep@farm.example or visit https://farm.example for 3.14 reasons.",
        );
        let tokens: Vec<&Token> = doc.tokens().collect();
        assert!(tokens.iter().any(|t| t.flags.like_email));
        assert!(tokens.iter().any(|t| t.flags.like_url));
        assert!(tokens.iter().any(|t| t.flags.like_num && t.tag == CoarseTag::Num));

        let filtered = filter_tokens(doc.tokens());
        assert!(filtered.iter().all(|t| {
            !t.flags.like_email && !t.flags.like_url && !t.flags.like_num && !t.flags.is_space
        }));
    }

    #[test]
    fn splits_sentences_and_marks_punctuation() {
        let annotator = FallbackAnnotator::new();
        let doc = annotator.annotate(Lang::English, "It said: draw me a sheep! I did.");
        assert_eq!(doc.sentences.len(), 2);
        let bang = doc
            .tokens()
            .find(|t| t.text == "!")
            .expect("exclamation token");
        assert_eq!(bang.tag, CoarseTag::Punct);
        assert!(bang.flags.is_punct);
    }

    #[test]
    fn english_lemmas_are_stems() {
        let annotator = FallbackAnnotator::new();
        let doc = annotator.annotate(Lang::English, "drawing sheep");
        let drawing = doc.tokens().find(|t| t.text == "drawing").unwrap();
        assert_eq!(drawing.lemma, "draw");
    }

    #[test]
    fn mandarin_segmentation_preserves_text_and_flags_punct() {
        let annotator = FallbackAnnotator::new();
        let text = "我想要一隻綿羊。";
        let doc = annotator.annotate(Lang::Mandarin, text);
        assert_eq!(doc.sentences.len(), 1);
        let joined: String = doc.tokens().map(|t| t.text.as_str()).collect();
        assert_eq!(joined, text);
        let stop = doc.tokens().find(|t| t.text == "。").unwrap();
        assert_eq!(stop.tag, CoarseTag::Punct);
        // Mandarin lemmas repeat the surface text.
        assert!(doc.tokens().all(|t| t.lemma == t.text));
    }

    #[test]
    fn currency_is_a_symbol() {
        let annotator = FallbackAnnotator::new();
        let doc = annotator.annotate(Lang::English, "costs $ 5");
        let dollar = doc.tokens().find(|t| t.text == "$").unwrap();
        assert_eq!(dollar.tag, CoarseTag::Sym);
    }
}
