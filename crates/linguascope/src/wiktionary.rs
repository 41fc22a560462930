//! Wikitext scraping for French Wiktionary pages.
//!
//! The dictionary client fetches a page's raw wikitext; everything here is
//! pure string processing so it stays testable offline. Only the French
//! language section is read: definitions are `# ` lines, examples `#* `
//! lines, synonyms the starred links under a `{{S|synonymes}}` heading, and
//! the IPA comes from the first `{{pron|…|fr}}` template.

use anno_types::DictEntry;

/// Parse the French section of a page's wikitext into a normalized entry.
/// Anything the page lacks stays empty; junk lines are skipped, not errors.
pub fn parse_entry(source: &str) -> DictEntry {
    let section = french_section(source);
    let mut entry = DictEntry::default();
    let mut in_synonyms = false;

    for line in section.lines() {
        let line = line.trim();
        if line.starts_with("===") {
            in_synonyms = line.contains("{{S|synonymes");
            continue;
        }
        if let Some(rest) = line.strip_prefix("#*") {
            let cleaned = strip_markup(rest);
            if !cleaned.is_empty() {
                entry.examples.push(cleaned);
            }
        } else if let Some(rest) = line.strip_prefix('#') {
            // `#:` lines are usage notes attached to the definition above.
            if rest.starts_with(':') || rest.starts_with('#') {
                continue;
            }
            let cleaned = strip_markup(rest);
            if !cleaned.is_empty() {
                entry.definitions.push(cleaned);
            }
        } else if in_synonyms && let Some(rest) = line.strip_prefix('*') {
            let cleaned = strip_markup(rest);
            if !cleaned.is_empty() {
                entry.synonyms.push(cleaned);
            }
        } else if entry.ipa.is_none()
            && let Some(ipa) = extract_pron(line)
        {
            entry.ipa = Some(ipa);
        }
    }

    entry
}

/// Slice out the `== {{langue|fr}} ==` section; a page without one (or a
/// fragment) is used whole.
fn french_section(source: &str) -> &str {
    let Some(start) = source.find("{{langue|fr}}") else {
        return source;
    };
    let rest = &source[start..];
    match rest[1..].find("== {{langue|") {
        Some(end) => &rest[..end + 1],
        None => rest,
    }
}

/// First `{{pron|…|…}}` transcription on a line, if non-empty.
fn extract_pron(line: &str) -> Option<String> {
    let start = line.find("{{pron|")? + "{{pron|".len();
    let rest = &line[start..];
    let end = rest.find(['|', '}'])?;
    let ipa = rest[..end].trim();
    if ipa.is_empty() {
        None
    } else {
        Some(ipa.to_string())
    }
}

/// Reduce wiki markup to display text: templates dropped, links resolved to
/// their display form, bold/italic quotes removed, whitespace collapsed.
pub fn strip_markup(raw: &str) -> String {
    let without_templates = drop_templates(raw);
    let resolved = resolve_links(&without_templates);
    let unquoted = resolved.replace("'''", "").replace("''", "");
    let collapsed: Vec<&str> = unquoted.split_whitespace().collect();
    collapsed.join(" ").trim_matches([' ', ':', ';']).to_string()
}

fn drop_templates(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut depth = 0usize;
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '{' && chars.peek() == Some(&'{') {
            chars.next();
            depth += 1;
        } else if ch == '}' && chars.peek() == Some(&'}') && depth > 0 {
            chars.next();
            depth -= 1;
        } else if depth == 0 {
            out.push(ch);
        }
    }
    out
}

fn resolve_links(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(open) = rest.find("[[") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        match after.find("]]") {
            Some(close) => {
                let inner = &after[..close];
                // `[[target|display]]` shows the display form.
                out.push_str(inner.rsplit('|').next().unwrap_or(inner));
                rest = &after[close + 2..];
            }
            None => {
                // Unterminated link: keep the raw text.
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOUTON: &str = r#"== {{langue|fr}} ==
=== {{S|étymologie}} ===
: Du gaulois.

=== {{S|nom|fr}} ===
'''mouton''' {{pron|mu.tɔ̃|fr}} {{m}}
# {{zoologie|fr}} [[mammifère|Mammifère]] domestique de la famille des ovidés.
#* ''Dessine-moi un '''mouton''' !''
#: Note d'usage.
# [[viande|Viande]] de cet animal.

==== {{S|synonymes}} ====
* [[ovin]]
* [[bête à laine|bête à laine]]

== {{langue|en}} ==
=== {{S|nom|en}} ===
# An English sense that must not leak.
"#;

    #[test]
    fn parses_definitions_examples_synonyms_and_ipa() {
        let entry = parse_entry(MOUTON);
        assert_eq!(
            entry.definitions,
            vec![
                "Mammifère domestique de la famille des ovidés.",
                "Viande de cet animal.",
            ]
        );
        assert_eq!(entry.examples, vec!["Dessine-moi un mouton !"]);
        assert_eq!(entry.synonyms, vec!["ovin", "bête à laine"]);
        assert_eq!(entry.ipa.as_deref(), Some("mu.tɔ̃"));
    }

    #[test]
    fn other_language_sections_do_not_leak() {
        let entry = parse_entry(MOUTON);
        assert!(!entry
            .definitions
            .iter()
            .any(|d| d.contains("English sense")));
    }

    #[test]
    fn page_without_french_section_is_used_whole() {
        let entry = parse_entry("# [[sens|Seul sens]].\n");
        assert_eq!(entry.definitions, vec!["Seul sens."]);
        assert_eq!(entry.ipa, None);
    }

    #[test]
    fn empty_pron_template_yields_no_ipa() {
        let entry = parse_entry("'''mot''' {{pron||fr}}\n# Sens.\n");
        assert_eq!(entry.ipa, None);
    }

    #[test]
    fn strip_markup_handles_nested_templates_and_links() {
        assert_eq!(
            strip_markup(" {{term|a {{nested|b}}}} [[target|Display]] '''bold'''"),
            "Display bold"
        );
        assert_eq!(strip_markup("[[plain]]"), "plain");
        assert_eq!(strip_markup("[[broken"), "[[broken");
        assert_eq!(strip_markup("{{only-template}}"), "");
    }
}
