use anno_types::{DictEntry, Lang};
use dashmap::DashMap;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::wiktionary;

/// Why a fetch produced nothing usable. Internal only: every variant is
/// collapsed to the cached empty sentinel before a caller sees it, so the
/// end-user contract stays "no definitions found" regardless of cause.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("service returned status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// One external dictionary service. `Ok(None)` is a clean "word not listed";
/// `Err` is a failure worth logging. Implementations must not panic on any
/// response shape.
pub trait DefinitionSource: Send + Sync {
    fn fetch(&self, word: &str, pos: Option<&str>) -> Result<Option<DictEntry>, FetchError>;
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
struct CacheKey {
    lang: Lang,
    word: String,
    pos: Option<String>,
}

/// Process-wide dictionary lookup with a lazy, never-evicted cache.
///
/// The cache value `None` is the sentinel for "looked up, found nothing",
/// stored on clean misses, empty entries, and failures alike, so a word is
/// fetched at most once per process however the first attempt went. The map
/// is a `DashMap` because one service instance is shared across request
/// tasks; mutation during a render is the expected mode of operation.
pub struct DictService {
    cache: DashMap<CacheKey, Option<DictEntry>>,
    mandarin: Box<dyn DefinitionSource>,
    english: Box<dyn DefinitionSource>,
    french: Box<dyn DefinitionSource>,
}

impl DictService {
    /// Service backed by the real external dictionaries.
    pub fn new() -> Self {
        let agent = ureq::agent();
        Self::with_sources(
            Box::new(MoedictSource::new(agent.clone())),
            Box::new(FreeDictSource::new(agent.clone())),
            Box::new(WiktionarySource::new(agent)),
        )
    }

    /// Inject sources directly; used by tests and anyone fronting other
    /// services.
    pub fn with_sources(
        mandarin: Box<dyn DefinitionSource>,
        english: Box<dyn DefinitionSource>,
        french: Box<dyn DefinitionSource>,
    ) -> Self {
        Self {
            cache: DashMap::new(),
            mandarin,
            english,
            french,
        }
    }

    fn source(&self, lang: Lang) -> &dyn DefinitionSource {
        match lang {
            Lang::Mandarin => self.mandarin.as_ref(),
            Lang::English => self.english.as_ref(),
            Lang::French => self.french.as_ref(),
        }
    }

    /// Look a word up, consulting the cache first. `None` means "nothing to
    /// show", whether the word is unlisted, the entry was empty, or the
    /// service failed; failures are logged and never surfaced or retried.
    ///
    /// English entries are cached per word + part of speech (the service
    /// filters meanings by POS); the other languages cache by word alone.
    pub fn lookup(&self, lang: Lang, word: &str, pos: Option<&str>) -> Option<DictEntry> {
        let word = word.trim();
        if word.is_empty() {
            return None;
        }
        let key = CacheKey {
            lang,
            word: word.to_string(),
            pos: match lang {
                Lang::English => pos.map(|p| p.to_uppercase()),
                Lang::Mandarin | Lang::French => None,
            },
        };
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        let value = match self.source(lang).fetch(word, pos) {
            Ok(Some(entry)) if !entry.is_empty() => Some(entry),
            Ok(_) => {
                debug!("no dictionary entry for {word} ({lang})");
                None
            }
            Err(err) => {
                warn!("dictionary lookup for {word} ({lang}) failed: {err}");
                None
            }
        };
        self.cache.insert(key, value.clone());
        value
    }

    /// Number of cached keys, empty sentinels included.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

impl Default for DictService {
    fn default() -> Self {
        Self::new()
    }
}

/// Issue a GET and hand back the response, mapping 404 to a clean miss.
fn get(
    agent: &ureq::Agent,
    url: &str,
) -> Result<Option<ureq::Response>, FetchError> {
    match agent.get(url).call() {
        Ok(response) => Ok(Some(response)),
        Err(ureq::Error::Status(404, _)) => Ok(None),
        Err(ureq::Error::Status(code, _)) => Err(FetchError::Status(code)),
        Err(err) => Err(FetchError::Transport(err.to_string())),
    }
}

// --- moedict (Mandarin) ----------------------------------------------------

pub struct MoedictSource {
    agent: ureq::Agent,
}

impl MoedictSource {
    pub fn new(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

#[derive(Deserialize)]
struct MoedictResponse {
    #[serde(default)]
    heteronyms: Vec<MoedictHeteronym>,
}

#[derive(Deserialize)]
struct MoedictHeteronym {
    #[serde(default)]
    definitions: Vec<MoedictDefinition>,
}

#[derive(Deserialize)]
struct MoedictDefinition {
    #[serde(rename = "def", default)]
    def: String,
    #[serde(default)]
    example: Vec<String>,
    #[serde(default)]
    synonyms: Option<String>,
}

impl DefinitionSource for MoedictSource {
    fn fetch(&self, word: &str, _pos: Option<&str>) -> Result<Option<DictEntry>, FetchError> {
        let url = format!("https://www.moedict.tw/uni/{word}.json");
        let Some(response) = get(&self.agent, &url)? else {
            return Ok(None);
        };
        let parsed: MoedictResponse = response
            .into_json()
            .map_err(|e| FetchError::Malformed(e.to_string()))?;
        Ok(normalize_moedict(parsed))
    }
}

fn normalize_moedict(parsed: MoedictResponse) -> Option<DictEntry> {
    // Only the first heteronym is shown.
    let heteronym = parsed.heteronyms.into_iter().next()?;
    let mut entry = DictEntry::default();
    for def in heteronym.definitions {
        if !def.def.is_empty() {
            entry.definitions.push(def.def);
        }
        entry.examples.extend(def.example);
        if let Some(synonyms) = def.synonyms {
            entry.synonyms.extend(
                synonyms
                    .split(['、', ','])
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from),
            );
        }
    }
    Some(entry)
}

// --- Free Dictionary API (English) -----------------------------------------

pub struct FreeDictSource {
    agent: ureq::Agent,
}

impl FreeDictSource {
    pub fn new(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

#[derive(Deserialize)]
struct FreeDictEntry {
    #[serde(default)]
    meanings: Vec<FreeDictMeaning>,
}

#[derive(Deserialize)]
struct FreeDictMeaning {
    #[serde(rename = "partOfSpeech", default)]
    part_of_speech: String,
    #[serde(default)]
    definitions: Vec<FreeDictDefinition>,
    #[serde(default)]
    synonyms: Vec<String>,
}

#[derive(Deserialize)]
struct FreeDictDefinition {
    #[serde(default)]
    definition: String,
    #[serde(default)]
    example: Option<String>,
    #[serde(default)]
    synonyms: Vec<String>,
}

impl DefinitionSource for FreeDictSource {
    fn fetch(&self, word: &str, pos: Option<&str>) -> Result<Option<DictEntry>, FetchError> {
        let url = format!("https://api.dictionaryapi.dev/api/v2/entries/en/{word}");
        let Some(response) = get(&self.agent, &url)? else {
            return Ok(None);
        };
        let parsed: Vec<FreeDictEntry> = response
            .into_json()
            .map_err(|e| FetchError::Malformed(e.to_string()))?;
        Ok(normalize_free_dict(parsed, pos))
    }
}

fn normalize_free_dict(parsed: Vec<FreeDictEntry>, pos: Option<&str>) -> Option<DictEntry> {
    let first = parsed.into_iter().next()?;
    let mut entry = DictEntry::default();
    for meaning in first.meanings {
        if let Some(wanted) = pos
            && !meaning.part_of_speech.eq_ignore_ascii_case(wanted)
        {
            continue;
        }
        for def in meaning.definitions {
            if !def.definition.is_empty() {
                entry.definitions.push(def.definition);
            }
            entry.examples.extend(def.example);
            entry.synonyms.extend(def.synonyms);
        }
        entry.synonyms.extend(meaning.synonyms);
    }
    Some(entry)
}

// --- French Wiktionary -----------------------------------------------------

pub struct WiktionarySource {
    agent: ureq::Agent,
}

impl WiktionarySource {
    pub fn new(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

#[derive(Deserialize)]
struct WikiPage {
    #[serde(default)]
    source: String,
}

impl DefinitionSource for WiktionarySource {
    fn fetch(&self, word: &str, _pos: Option<&str>) -> Result<Option<DictEntry>, FetchError> {
        // Wiktionary lowercases its common-noun titles.
        let title = word.to_lowercase();
        let url = format!("https://fr.wiktionary.org/w/rest.php/v1/page/{title}");
        let Some(response) = get(&self.agent, &url)? else {
            return Ok(None);
        };
        let page: WikiPage = response
            .into_json()
            .map_err(|e| FetchError::Malformed(e.to_string()))?;
        if page.source.is_empty() {
            return Ok(None);
        }
        Ok(Some(wiktionary::parse_entry(&page.source)))
    }
}
