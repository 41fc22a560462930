//! Mandarin transliteration without any model or network dependency.
//!
//! Input is numbered pinyin (`"mian2 yang2"`, tones 1–4, 5 or no digit for
//! neutral). Each syllable is parsed into initial + final + tone and rendered
//! as tone-marked pinyin, zhuyin (bopomofo), or a broad IPA transcription.
//! [`Transliterator`] adds a word → reading table loaded from optional data
//! files; a word with no reading annotates as the empty string, never an
//! error.
//!
//! # How a word is annotated
//! 1. Look the word up in the reading table.
//! 2. Fall back to joining per-character readings; any gap means no reading.
//! 3. Convert every syllable to the requested scheme.
//!
//! # Example
//! ```rust
//! use anno_types::PronScheme;
//! use pinyin_translit::{Transliterator, syllable_to_zhuyin};
//!
//! let mut translit = Transliterator::default();
//! translit.add_reading("綿羊", "mian2 yang2");
//! assert_eq!(translit.annotate("綿羊", PronScheme::Pinyin), "miányáng");
//! assert_eq!(translit.annotate("綿羊", PronScheme::Zhuyin), "ㄇㄧㄢˊ ㄧㄤˊ");
//! assert_eq!(syllable_to_zhuyin("shi4").as_deref(), Some("ㄕˋ"));
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anno_types::PronScheme;
use anyhow::{Context, Result};

/// Syllable initials, longest first so `zh` wins over `z`.
const INITIALS: &[&str] = &[
    "zh", "ch", "sh", "b", "p", "m", "f", "d", "t", "n", "l", "g", "k", "h", "j", "q", "x", "r",
    "z", "c", "s",
];

/// Finals keyed in normalized spelling: `v` stands for ü, contractions are
/// expanded (`iu` → `iou`, `ui` → `uei`, `un` → `uen`), and standalone
/// `y`/`w` forms are rewritten to their `i`/`u` finals before lookup.
const FINALS: &[(&str, &str, &str)] = &[
    // (final, zhuyin, ipa)
    ("a", "ㄚ", "a"),
    ("o", "ㄛ", "o"),
    ("e", "ㄜ", "ɤ"),
    ("ai", "ㄞ", "aɪ"),
    ("ei", "ㄟ", "eɪ"),
    ("ao", "ㄠ", "ɑʊ"),
    ("ou", "ㄡ", "oʊ"),
    ("an", "ㄢ", "an"),
    ("en", "ㄣ", "ən"),
    ("ang", "ㄤ", "ɑŋ"),
    ("eng", "ㄥ", "əŋ"),
    ("er", "ㄦ", "ɑɻ"),
    ("ong", "ㄨㄥ", "ʊŋ"),
    ("i", "ㄧ", "i"),
    ("ia", "ㄧㄚ", "ja"),
    ("ie", "ㄧㄝ", "jɛ"),
    ("iao", "ㄧㄠ", "jɑʊ"),
    ("iou", "ㄧㄡ", "joʊ"),
    ("ian", "ㄧㄢ", "jɛn"),
    ("in", "ㄧㄣ", "in"),
    ("iang", "ㄧㄤ", "jɑŋ"),
    ("ing", "ㄧㄥ", "iŋ"),
    ("iong", "ㄩㄥ", "jʊŋ"),
    ("u", "ㄨ", "u"),
    ("ua", "ㄨㄚ", "wa"),
    ("uo", "ㄨㄛ", "wo"),
    ("uai", "ㄨㄞ", "waɪ"),
    ("uei", "ㄨㄟ", "weɪ"),
    ("uan", "ㄨㄢ", "wan"),
    ("uen", "ㄨㄣ", "wən"),
    ("uang", "ㄨㄤ", "wɑŋ"),
    ("ueng", "ㄨㄥ", "wəŋ"),
    ("v", "ㄩ", "y"),
    ("ve", "ㄩㄝ", "ɥɛ"),
    ("van", "ㄩㄢ", "ɥɛn"),
    ("vn", "ㄩㄣ", "yn"),
];

const INITIAL_ZHUYIN: &[(&str, &str)] = &[
    ("b", "ㄅ"),
    ("p", "ㄆ"),
    ("m", "ㄇ"),
    ("f", "ㄈ"),
    ("d", "ㄉ"),
    ("t", "ㄊ"),
    ("n", "ㄋ"),
    ("l", "ㄌ"),
    ("g", "ㄍ"),
    ("k", "ㄎ"),
    ("h", "ㄏ"),
    ("j", "ㄐ"),
    ("q", "ㄑ"),
    ("x", "ㄒ"),
    ("zh", "ㄓ"),
    ("ch", "ㄔ"),
    ("sh", "ㄕ"),
    ("r", "ㄖ"),
    ("z", "ㄗ"),
    ("c", "ㄘ"),
    ("s", "ㄙ"),
];

const INITIAL_IPA: &[(&str, &str)] = &[
    ("b", "p"),
    ("p", "pʰ"),
    ("m", "m"),
    ("f", "f"),
    ("d", "t"),
    ("t", "tʰ"),
    ("n", "n"),
    ("l", "l"),
    ("g", "k"),
    ("k", "kʰ"),
    ("h", "x"),
    ("j", "tɕ"),
    ("q", "tɕʰ"),
    ("x", "ɕ"),
    ("zh", "ʈʂ"),
    ("ch", "ʈʂʰ"),
    ("sh", "ʂ"),
    ("r", "ʐ"),
    ("z", "ts"),
    ("c", "tsʰ"),
    ("s", "s"),
];

/// Initials after which a bare `i` is the syllabic consonant, not the vowel.
const SIBILANTS: &[&str] = &["zh", "ch", "sh", "r", "z", "c", "s"];

/// A parsed numbered-pinyin syllable.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Syllable {
    /// Empty for zero-initial syllables.
    pub initial: &'static str,
    /// Normalized final spelling (`v` for ü).
    pub final_: String,
    /// 1–4, or 5 for the neutral tone.
    pub tone: u8,
}

/// Parse one numbered syllable (`"zhong1"`, `"lv4"`, `"ma"`). Returns `None`
/// for anything that is not a well-formed Mandarin syllable.
pub fn parse_syllable(raw: &str) -> Option<Syllable> {
    let raw = raw.trim().to_lowercase().replace('ü', "v");
    let (body, tone) = match raw.rfind(|c: char| c.is_ascii_digit()) {
        Some(idx) if idx == raw.len() - 1 => {
            let tone: u8 = raw[idx..].parse().ok()?;
            if !(1..=5).contains(&tone) && tone != 0 {
                return None;
            }
            (raw[..idx].to_string(), if tone == 0 { 5 } else { tone })
        }
        Some(_) => return None,
        None => (raw, 5),
    };
    if body.is_empty() || !body.bytes().all(|b| b.is_ascii_lowercase() || b == b'v') {
        return None;
    }

    let initial = INITIALS
        .iter()
        .find(|i| body.starts_with(**i))
        .copied()
        .unwrap_or("");
    let rest = &body[initial.len()..];
    let final_ = normalize_final(initial, rest)?;
    if FINALS.iter().any(|(f, _, _)| *f == final_) {
        Some(Syllable {
            initial,
            final_,
            tone,
        })
    } else {
        None
    }
}

/// Rewrite surface spellings to the normalized final table key.
fn normalize_final(initial: &str, rest: &str) -> Option<String> {
    if rest.is_empty() {
        // A bare initial is not a syllable.
        return None;
    }

    let mut f = if initial.is_empty() {
        if let Some(tail) = rest.strip_prefix("yu") {
            format!("v{tail}")
        } else if let Some(tail) = rest.strip_prefix("yi") {
            format!("i{tail}")
        } else if let Some(tail) = rest.strip_prefix('y') {
            format!("i{tail}")
        } else if let Some(tail) = rest.strip_prefix("wu") {
            format!("u{tail}")
        } else if let Some(tail) = rest.strip_prefix('w') {
            format!("u{tail}")
        } else {
            rest.to_string()
        }
    } else {
        rest.to_string()
    };

    // After j/q/x a written u is ü.
    if matches!(initial, "j" | "q" | "x") && f.starts_with('u') {
        f.replace_range(0..1, "v");
    }

    // Expand contracted finals.
    f = match f.as_str() {
        "iu" => "iou".to_string(),
        "ui" => "uei".to_string(),
        "un" => "uen".to_string(),
        _ => f,
    };

    Some(f)
}

/// Render one numbered syllable as tone-marked pinyin, preserving the surface
/// spelling (`"yang2"` → `"yáng"`, not its normalized final).
pub fn mark_numbered(raw: &str) -> Option<String> {
    let raw = raw.trim().to_lowercase();
    let (body, tone) = match raw.rfind(|c: char| c.is_ascii_digit()) {
        Some(idx) if idx == raw.len() - 1 => {
            let tone: u8 = raw[idx..].parse().ok()?;
            (raw[..idx].replace('v', "ü"), if tone == 0 { 5 } else { tone })
        }
        Some(_) => return None,
        None => (raw.replace('v', "ü"), 5),
    };
    if body.is_empty() {
        return None;
    }
    if tone == 5 || !(1..=4).contains(&tone) {
        return Some(body);
    }

    let chars: Vec<char> = body.chars().collect();
    let mark_at = tone_mark_position(&chars)?;
    let mut out = String::with_capacity(body.len() + 2);
    for (idx, ch) in chars.iter().enumerate() {
        if idx == mark_at {
            out.push_str(marked_vowel(*ch, tone)?);
        } else {
            out.push(*ch);
        }
    }
    Some(out)
}

/// Standard placement: `a` wins, then `e`, then the `o` of `ou`, else the
/// last vowel.
fn tone_mark_position(chars: &[char]) -> Option<usize> {
    if let Some(idx) = chars.iter().position(|c| *c == 'a') {
        return Some(idx);
    }
    if let Some(idx) = chars.iter().position(|c| *c == 'e') {
        return Some(idx);
    }
    for win in 0..chars.len().saturating_sub(1) {
        if chars[win] == 'o' && chars[win + 1] == 'u' {
            return Some(win);
        }
    }
    chars
        .iter()
        .rposition(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'ü'))
}

fn marked_vowel(vowel: char, tone: u8) -> Option<&'static str> {
    let row: [&'static str; 4] = match vowel {
        'a' => ["ā", "á", "ǎ", "à"],
        'e' => ["ē", "é", "ě", "è"],
        'i' => ["ī", "í", "ǐ", "ì"],
        'o' => ["ō", "ó", "ǒ", "ò"],
        'u' => ["ū", "ú", "ǔ", "ù"],
        'ü' => ["ǖ", "ǘ", "ǚ", "ǜ"],
        _ => return None,
    };
    row.get(tone as usize - 1).copied()
}

/// Convert one numbered syllable to zhuyin. `None` for unparseable input.
/// `zhi`, `chi`, `shi`, `ri`, `zi`, `ci`, `si` are written with the initial
/// symbol alone.
pub fn syllable_to_zhuyin(raw: &str) -> Option<String> {
    let syl = parse_syllable(raw)?;
    let mut out = String::new();
    if syl.tone == 5 {
        out.push('˙');
    }
    if !syl.initial.is_empty() {
        out.push_str(lookup(INITIAL_ZHUYIN, syl.initial)?);
    }
    if !(is_sibilant(syl.initial) && syl.final_ == "i") {
        let (_, zhuyin, _) = FINALS.iter().find(|(f, _, _)| *f == syl.final_)?;
        out.push_str(zhuyin);
    }
    match syl.tone {
        2 => out.push('ˊ'),
        3 => out.push('ˇ'),
        4 => out.push('ˋ'),
        _ => {}
    }
    Some(out)
}

/// Convert one numbered syllable to a broad IPA transcription with tone
/// contour digits (`"zhong1"` → `"ʈʂʊŋ⁵⁵"`).
pub fn syllable_to_ipa(raw: &str) -> Option<String> {
    let syl = parse_syllable(raw)?;
    let mut out = String::new();
    if !syl.initial.is_empty() {
        out.push_str(lookup(INITIAL_IPA, syl.initial)?);
    }
    if is_sibilant(syl.initial) && syl.final_ == "i" {
        out.push_str(if matches!(syl.initial, "z" | "c" | "s") {
            "ɹ̩"
        } else {
            "ɻ̩"
        });
    } else {
        let (_, _, ipa) = FINALS.iter().find(|(f, _, _)| *f == syl.final_)?;
        out.push_str(ipa);
    }
    out.push_str(match syl.tone {
        1 => "⁵⁵",
        2 => "³⁵",
        3 => "²¹⁴",
        4 => "⁵¹",
        _ => "",
    });
    Some(out)
}

fn is_sibilant(initial: &str) -> bool {
    SIBILANTS.contains(&initial)
}

fn lookup(table: &[(&str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Split a numbered-pinyin reading into syllables: whitespace first, then
/// after each tone digit for run-together spellings (`"mian2yang2"`).
pub fn split_numbered(reading: &str) -> Vec<String> {
    let mut out = Vec::new();
    for chunk in reading.split_whitespace() {
        let mut start = 0;
        for (idx, ch) in chunk.char_indices() {
            if ch.is_ascii_digit() {
                let end = idx + ch.len_utf8();
                out.push(chunk[start..end].to_string());
                start = end;
            }
        }
        if start < chunk.len() {
            out.push(chunk[start..].to_string());
        }
    }
    out
}

/// Convert a whole numbered reading to the requested scheme. Pinyin syllables
/// join without a separator (matching how readings are printed for words);
/// zhuyin and IPA join with spaces. `None` when any syllable fails to parse.
pub fn convert_reading(reading: &str, scheme: PronScheme) -> Option<String> {
    let syllables = split_numbered(reading);
    if syllables.is_empty() {
        return None;
    }
    let mut parts = Vec::with_capacity(syllables.len());
    for syl in &syllables {
        let rendered = match scheme {
            PronScheme::Pinyin => mark_numbered(syl)?,
            PronScheme::Zhuyin => syllable_to_zhuyin(syl)?,
            PronScheme::Ipa => syllable_to_ipa(syl)?,
        };
        parts.push(rendered);
    }
    Some(match scheme {
        PronScheme::Pinyin => parts.concat(),
        PronScheme::Zhuyin | PronScheme::Ipa => parts.join(" "),
    })
}

/// Word → numbered-pinyin reading table with per-character fallback.
#[derive(Default)]
pub struct Transliterator {
    readings: HashMap<String, String>,
}

impl Transliterator {
    /// Load readings from a data directory. `readings.tsv` holds
    /// `word<TAB>numbered-pinyin` lines; a missing file is treated as empty,
    /// like any other optional reference data.
    pub fn load(data_dir: impl AsRef<Path>) -> Result<Self> {
        let mut translit = Self::default();
        translit.load_file(data_dir.as_ref().join("readings.tsv"))?;
        Ok(translit)
    }

    fn load_file(&mut self, path: PathBuf) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let file =
            File::open(&path).with_context(|| format!("open readings {}", path.display()))?;
        let reader = BufReader::new(file);
        for (lineno, line) in reader.lines().enumerate() {
            let line = line
                .with_context(|| format!("read line {} in {}", lineno + 1, path.display()))?;
            let mut parts = line.splitn(2, '\t');
            let (Some(word), Some(reading)) = (parts.next(), parts.next()) else {
                continue;
            };
            let word = word.trim();
            let reading = reading.trim();
            if !word.is_empty() && !reading.is_empty() {
                self.readings.insert(word.to_string(), reading.to_string());
            }
        }
        Ok(())
    }

    /// Register or override a reading. Later insertions win, so callers can
    /// layer curated tables (a graded word list) over the base file.
    pub fn add_reading(&mut self, word: &str, reading: &str) {
        self.readings.insert(word.to_string(), reading.to_string());
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// The numbered reading for a word: exact table hit, else per-character
    /// readings joined with spaces. Any character gap yields `None`.
    pub fn reading_for(&self, word: &str) -> Option<String> {
        if let Some(reading) = self.readings.get(word) {
            return Some(reading.clone());
        }
        if word.chars().count() < 2 {
            return None;
        }
        let mut parts = Vec::new();
        for ch in word.chars() {
            let reading = self.readings.get(ch.to_string().as_str())?;
            parts.push(reading.clone());
        }
        Some(parts.join(" "))
    }

    /// Annotate a word in the requested scheme. Absence of a reading or an
    /// unparseable reading yields the empty string, never an error.
    pub fn annotate(&self, word: &str, scheme: PronScheme) -> String {
        self.reading_for(word)
            .and_then(|reading| convert_reading(&reading, scheme))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_contracted_syllables() {
        let syl = parse_syllable("zhong1").unwrap();
        assert_eq!(syl.initial, "zh");
        assert_eq!(syl.final_, "ong");
        assert_eq!(syl.tone, 1);

        assert_eq!(parse_syllable("liu2").unwrap().final_, "iou");
        assert_eq!(parse_syllable("hui4").unwrap().final_, "uei");
        assert_eq!(parse_syllable("jun1").unwrap().final_, "vn");
        assert_eq!(parse_syllable("lv4").unwrap().final_, "v");
        assert_eq!(parse_syllable("yang2").unwrap().final_, "iang");
        assert_eq!(parse_syllable("wen4").unwrap().final_, "uen");
        assert_eq!(parse_syllable("yue4").unwrap().final_, "ve");
        assert!(parse_syllable("xyz9").is_none());
        assert!(parse_syllable("").is_none());
    }

    #[test]
    fn marks_tones_on_the_right_vowel() {
        assert_eq!(mark_numbered("ma1").as_deref(), Some("mā"));
        assert_eq!(mark_numbered("mian2").as_deref(), Some("mián"));
        assert_eq!(mark_numbered("dou4").as_deref(), Some("dòu"));
        assert_eq!(mark_numbered("lv4").as_deref(), Some("lǜ"));
        assert_eq!(mark_numbered("shui3").as_deref(), Some("shuǐ"));
        // Neutral tone keeps the bare spelling.
        assert_eq!(mark_numbered("ma5").as_deref(), Some("ma"));
        assert_eq!(mark_numbered("de").as_deref(), Some("de"));
    }

    #[test]
    fn zhuyin_covers_sibilants_and_tones() {
        assert_eq!(syllable_to_zhuyin("zhong1").as_deref(), Some("ㄓㄨㄥ"));
        assert_eq!(syllable_to_zhuyin("mian2").as_deref(), Some("ㄇㄧㄢˊ"));
        assert_eq!(syllable_to_zhuyin("shi4").as_deref(), Some("ㄕˋ"));
        assert_eq!(syllable_to_zhuyin("nv3").as_deref(), Some("ㄋㄩˇ"));
        assert_eq!(syllable_to_zhuyin("de5").as_deref(), Some("˙ㄉㄜ"));
        assert_eq!(syllable_to_zhuyin("yang2").as_deref(), Some("ㄧㄤˊ"));
        assert!(syllable_to_zhuyin("brzl1").is_none());
    }

    #[test]
    fn ipa_renders_contours() {
        assert_eq!(syllable_to_ipa("zhong1").as_deref(), Some("ʈʂʊŋ⁵⁵"));
        assert_eq!(syllable_to_ipa("ma3").as_deref(), Some("ma²¹⁴"));
        assert_eq!(syllable_to_ipa("si4").as_deref(), Some("sɹ̩⁵¹"));
        assert_eq!(syllable_to_ipa("shi2").as_deref(), Some("ʂɻ̩³⁵"));
    }

    #[test]
    fn splits_spaced_and_run_together_readings() {
        assert_eq!(split_numbered("mian2 yang2"), vec!["mian2", "yang2"]);
        assert_eq!(split_numbered("mian2yang2"), vec!["mian2", "yang2"]);
        assert_eq!(split_numbered("sha1mo4 fei1"), vec!["sha1", "mo4", "fei1"]);
    }

    #[test]
    fn converts_whole_readings() {
        assert_eq!(
            convert_reading("mian2 yang2", PronScheme::Pinyin).as_deref(),
            Some("miányáng")
        );
        assert_eq!(
            convert_reading("mian2 yang2", PronScheme::Zhuyin).as_deref(),
            Some("ㄇㄧㄢˊ ㄧㄤˊ")
        );
        assert_eq!(convert_reading("", PronScheme::Pinyin), None);
        assert_eq!(convert_reading("not pinyin!", PronScheme::Zhuyin), None);
    }

    #[test]
    fn word_reading_falls_back_per_character() {
        let mut translit = Transliterator::default();
        translit.add_reading("綿", "mian2");
        translit.add_reading("羊", "yang2");
        assert_eq!(
            translit.reading_for("綿羊").as_deref(),
            Some("mian2 yang2")
        );
        // One missing character: no reading at all.
        assert_eq!(translit.reading_for("綿狼"), None);
        assert_eq!(translit.annotate("綿狼", PronScheme::Pinyin), "");
    }

    #[test]
    fn exact_reading_beats_per_character() {
        let mut translit = Transliterator::default();
        translit.add_reading("長", "chang2");
        translit.add_reading("大", "da4");
        translit.add_reading("長大", "zhang3 da4");
        assert_eq!(
            translit.annotate("長大", PronScheme::Pinyin),
            "zhǎngdà"
        );
    }

    #[test]
    fn loads_optional_readings_file() {
        let dir = std::env::temp_dir().join("pinyin-translit-test-readings");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("readings.tsv"),
            "綿羊\tmian2 yang2\nbad-line\n羊\tyang2\n",
        )
        .unwrap();
        let translit = Transliterator::load(&dir).unwrap();
        assert_eq!(translit.len(), 2);
        assert_eq!(translit.annotate("羊", PronScheme::Zhuyin), "ㄧㄤˊ");

        // Missing directory behaves as empty.
        let empty = Transliterator::load(dir.join("nope")).unwrap();
        assert!(empty.is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }
}
