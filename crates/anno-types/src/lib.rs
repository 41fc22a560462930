//! Shared types for annotated text as produced by an NLP pipeline.
//!
//! The goal is to mirror the token shape a tagging pipeline emits (surface
//! text, lemma, a coarse part-of-speech tag, and content-type flags) while
//! keeping everything plain data that serializes cleanly. Downstream crates
//! build filtering, vocabulary extraction, and dictionary lookup on top of
//! these types without knowing which pipeline produced them.
//!
//! Use [`Lang`] and [`CoarseTag`] to key behavior per language and tag,
//! [`Token`] and [`Sentence`] for annotated input, and [`DictEntry`] for the
//! normalized shape every external dictionary response is reduced to.
//!
//! ```rust
//! use anno_types::{CoarseTag, Lang, PronScheme};
//!
//! let lang = Lang::from_code("zh").unwrap();
//! assert_eq!(lang.to_string(), "mandarin");
//! assert!(CoarseTag::Punct.is_punct_or_sym());
//! assert_eq!(PronScheme::parse("zhuyin"), Some(PronScheme::Zhuyin));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Language a page analyzes. Selects the tokenizer fallback, the vocabulary
/// key function, and the external dictionary service.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Mandarin,
    English,
    French,
}

impl Lang {
    /// Parse an ISO 639-1 code (`zh`, `en`, `fr`).
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "zh" => Some(Lang::Mandarin),
            "en" => Some(Lang::English),
            "fr" => Some(Lang::French),
            _ => None,
        }
    }

    /// Emit the ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Lang::Mandarin => "zh",
            Lang::English => "en",
            Lang::French => "fr",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Lang::Mandarin => "mandarin",
            Lang::English => "english",
            Lang::French => "french",
        })
    }
}

/// Coarse part-of-speech tag, following the Universal Dependencies tag set
/// plus the `SPACE` marker pipelines attach to whitespace tokens.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CoarseTag {
    Adj,
    Adp,
    Adv,
    Aux,
    Cconj,
    Det,
    Intj,
    Noun,
    Num,
    Part,
    Pron,
    Propn,
    Punct,
    Sconj,
    Sym,
    Verb,
    X,
    Space,
}

impl CoarseTag {
    /// Parse the uppercase tag string used on the wire (`"NOUN"`, `"PUNCT"`).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ADJ" => Some(CoarseTag::Adj),
            "ADP" => Some(CoarseTag::Adp),
            "ADV" => Some(CoarseTag::Adv),
            "AUX" => Some(CoarseTag::Aux),
            "CCONJ" => Some(CoarseTag::Cconj),
            "DET" => Some(CoarseTag::Det),
            "INTJ" => Some(CoarseTag::Intj),
            "NOUN" => Some(CoarseTag::Noun),
            "NUM" => Some(CoarseTag::Num),
            "PART" => Some(CoarseTag::Part),
            "PRON" => Some(CoarseTag::Pron),
            "PROPN" => Some(CoarseTag::Propn),
            "PUNCT" => Some(CoarseTag::Punct),
            "SCONJ" => Some(CoarseTag::Sconj),
            "SYM" => Some(CoarseTag::Sym),
            "VERB" => Some(CoarseTag::Verb),
            "X" => Some(CoarseTag::X),
            "SPACE" => Some(CoarseTag::Space),
            _ => None,
        }
    }

    /// The uppercase wire form.
    pub fn as_str(self) -> &'static str {
        match self {
            CoarseTag::Adj => "ADJ",
            CoarseTag::Adp => "ADP",
            CoarseTag::Adv => "ADV",
            CoarseTag::Aux => "AUX",
            CoarseTag::Cconj => "CCONJ",
            CoarseTag::Det => "DET",
            CoarseTag::Intj => "INTJ",
            CoarseTag::Noun => "NOUN",
            CoarseTag::Num => "NUM",
            CoarseTag::Part => "PART",
            CoarseTag::Pron => "PRON",
            CoarseTag::Propn => "PROPN",
            CoarseTag::Punct => "PUNCT",
            CoarseTag::Sconj => "SCONJ",
            CoarseTag::Sym => "SYM",
            CoarseTag::Verb => "VERB",
            CoarseTag::X => "X",
            CoarseTag::Space => "SPACE",
        }
    }

    /// Tags excluded outright by the content filter.
    pub fn is_punct_or_sym(self) -> bool {
        matches!(self, CoarseTag::Punct | CoarseTag::Sym)
    }

    /// Tags considered content-bearing for dictionary lookup.
    pub fn is_lookup_pos(self) -> bool {
        matches!(
            self,
            CoarseTag::Verb | CoarseTag::Noun | CoarseTag::Adj | CoarseTag::Adv
        )
    }
}

impl fmt::Display for CoarseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content-type flags a pipeline attaches to each token. Flags are
/// descriptive, not mutually exclusive: a token may be both `like_num` and
/// `is_punct` ("3.14."), and filters must treat each independently.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TokenFlags {
    #[serde(default)]
    pub is_punct: bool,
    #[serde(default)]
    pub is_space: bool,
    #[serde(default)]
    pub like_url: bool,
    #[serde(default)]
    pub like_email: bool,
    #[serde(default)]
    pub like_num: bool,
}

/// One annotated token. Read-only to everything downstream of the pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    /// Canonical form; pipelines that cannot lemmatize repeat the text here.
    pub lemma: String,
    pub tag: CoarseTag,
    #[serde(default)]
    pub flags: TokenFlags,
}

impl Token {
    /// A token whose surface differs from its lemma ignoring case, i.e. an
    /// inflected form worth showing in a morphology table.
    pub fn is_inflected(&self) -> bool {
        self.text.to_lowercase() != self.lemma.to_lowercase()
    }
}

/// One sentence of annotated tokens, in surface order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sentence {
    pub tokens: Vec<Token>,
}

/// A named-entity span reported by the pipeline. Consumed for display only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub text: String,
    pub label: String,
}

/// A keyword and its pipeline-assigned relevance score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub text: String,
    pub score: f64,
}

/// Everything the pipeline reports for one input text.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedText {
    pub sentences: Vec<Sentence>,
    #[serde(default)]
    pub entities: Vec<EntitySpan>,
    #[serde(default)]
    pub keywords: Vec<Keyword>,
}

impl AnnotatedText {
    /// Iterate all tokens across sentences in surface order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.sentences.iter().flat_map(|s| s.tokens.iter())
    }
}

/// Normalized dictionary entry. Every external service's response is reduced
/// to this shape, with any missing field left empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DictEntry {
    #[serde(default)]
    pub definitions: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    /// IPA transcription, when the service reports one (French Wiktionary).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipa: Option<String>,
}

impl DictEntry {
    /// True when the service answered but carried nothing worth showing.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
            && self.examples.is_empty()
            && self.synonyms.is_empty()
            && self.ipa.is_none()
    }
}

/// Pronunciation scheme for Mandarin transliteration.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PronScheme {
    Pinyin,
    Zhuyin,
    Ipa,
}

impl PronScheme {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pinyin" => Some(PronScheme::Pinyin),
            "zhuyin" => Some(PronScheme::Zhuyin),
            "ipa" => Some(PronScheme::Ipa),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PronScheme::Pinyin => "pinyin",
            PronScheme::Zhuyin => "zhuyin",
            PronScheme::Ipa => "ipa",
        }
    }
}

impl fmt::Display for PronScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
