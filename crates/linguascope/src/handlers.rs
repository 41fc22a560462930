use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use anno_types::{
    AnnotatedText, DictEntry, EntitySpan, Keyword, Lang, PronScheme, Token,
};
use pinyin_translit::Transliterator;
use wordband_db::BandList;

use crate::analysis::{
    FrequencyTable, extract_vocabulary, filter_tokens, inflected_forms, rank_keywords,
    vocabulary_key,
};
use crate::annotate::FallbackAnnotator;
use crate::dict::DictService;
use crate::enrich;

/// Upper bound on raw text per analysis request.
pub const MAX_TEXT_LEN: usize = 20_000;
/// Longest word accepted by the lookup endpoints.
pub const MAX_LOOKUP_LEN: usize = 64;
const DEFAULT_TOP_K: usize = 5;

#[derive(Clone)]
pub struct AppState {
    pub dict: Arc<DictService>,
    pub translit: Arc<Transliterator>,
    pub bands: Arc<BandList>,
    pub annotator: Arc<FallbackAnnotator>,
    pub disable_cache: bool,
}

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    pub lang: String,
    /// Raw text for the built-in fallback annotator.
    #[serde(default)]
    pub text: Option<String>,
    /// Pre-annotated output from an external NLP pipeline; wins over `text`.
    #[serde(default)]
    pub annotations: Option<AnnotatedText>,
    #[serde(default)]
    pub options: AnalyzeOptions,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AnalyzeOptions {
    pub enriched_text: bool,
    pub vocabulary: bool,
    pub frequency: bool,
    pub morphology: bool,
    pub keywords: bool,
    pub entities: bool,
    /// Mandarin pronunciation scheme for the enriched-text section.
    pub scheme: String,
    pub top_k: Option<usize>,
    pub keyword_count: usize,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            enriched_text: true,
            vocabulary: true,
            frequency: true,
            morphology: false,
            keywords: false,
            entities: true,
            scheme: PronScheme::Pinyin.as_str().to_string(),
            top_k: None,
            keyword_count: 3,
        }
    }
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    lang: &'static str,
    token_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    enriched: Option<EnrichedSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vocabulary: Option<VocabularySection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency: Option<FrequencySection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    morphology: Option<MorphologySection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keywords: Option<Vec<Keyword>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entities: Option<Vec<EntitySpan>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Serialize)]
struct EnrichedSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    scheme: Option<PronScheme>,
    lines: Vec<String>,
}

#[derive(Serialize)]
struct VocabularySection {
    items: Vec<String>,
    band_rows: Vec<BandRow>,
    band_distribution: Vec<BandCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Serialize)]
struct BandRow {
    word: String,
    pinyin: String,
    zhuyin: String,
    category: String,
    band: String,
}

#[derive(Serialize)]
struct BandCount {
    band: String,
    count: usize,
}

#[derive(Serialize)]
struct FrequencySection {
    entries: Vec<CountRow>,
    top: Vec<CountRow>,
}

#[derive(Serialize)]
struct CountRow {
    text: String,
    count: usize,
}

#[derive(Serialize)]
struct MorphologySection {
    rows: Vec<InflectionRow>,
}

#[derive(Serialize)]
struct InflectionRow {
    word: String,
    tag: String,
    lemma: String,
}

#[derive(Deserialize)]
pub struct DefineQuery {
    pub lang: String,
    pub word: String,
    pub pos: Option<String>,
}

#[derive(Serialize)]
pub struct DefineResponse {
    word: String,
    lang: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pos: Option<String>,
    found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    entry: Option<DictEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Deserialize)]
pub struct PronounceQuery {
    pub word: String,
    pub scheme: Option<String>,
}

#[derive(Serialize)]
pub struct PronounceResponse {
    word: String,
    scheme: PronScheme,
    pronunciation: String,
    found: bool,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(frontend))
        .route("/robots.txt", get(robots))
        .route("/healthz", get(healthz))
        .route("/v1/analyze", post(analyze))
        .route("/v1/define", get(define))
        .route("/v1/pronounce", get(pronounce))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

async fn robots(State(state): State<AppState>) -> Response {
    let headers = axum::http::HeaderMap::from_iter([
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        ),
        (
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=86400, immutable"),
        ),
    ]);
    if state.disable_cache {
        return "User-agent: *\nDisallow: /".into_response();
    }
    (headers, "User-agent: *\nDisallow: /").into_response()
}

async fn frontend(State(state): State<AppState>) -> Response {
    let html = Html(analyze_html());
    if state.disable_cache {
        return html.into_response();
    }
    (
        [(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=3600, immutable"),
        )],
        html,
    )
        .into_response()
}

async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let lang = Lang::from_code(&req.lang)
        .ok_or_else(|| ApiError::bad_request(format!("unknown language code: {}", req.lang)))?;
    let scheme = PronScheme::parse(&req.options.scheme)
        .ok_or_else(|| ApiError::bad_request(format!("unknown scheme: {}", req.options.scheme)))?;

    if let Some(text) = &req.text
        && text.chars().count() > MAX_TEXT_LEN
    {
        return Err(ApiError::bad_request(format!(
            "text must be at most {MAX_TEXT_LEN} characters"
        )));
    }

    let AnalyzeRequest {
        text, annotations, options, ..
    } = req;
    if annotations.is_none() && text.as_deref().is_none_or(|t| t.trim().is_empty()) {
        // Nothing to analyze is not an error: the page shows a hint instead.
        return Ok(Json(empty_response(lang, "enter some text to analyze")));
    }

    // Annotation and any dictionary-backed enrichment run blocking calls, so
    // the whole build happens off the async runtime.
    let state2 = state.clone();
    let response = tokio::task::spawn_blocking(move || {
        let doc = match annotations {
            Some(doc) => doc,
            None => state2
                .annotator
                .annotate(lang, text.as_deref().unwrap_or_default()),
        };
        build_analysis(&state2, lang, scheme, &doc, &options)
    })
    .await
    .map_err(|_| ApiError::Internal)?;

    Ok(Json(response))
}

fn empty_response(lang: Lang, message: &str) -> AnalyzeResponse {
    AnalyzeResponse {
        lang: lang.code(),
        token_count: 0,
        enriched: None,
        vocabulary: None,
        frequency: None,
        morphology: None,
        keywords: None,
        entities: None,
        message: Some(message.to_string()),
    }
}

fn build_analysis(
    state: &AppState,
    lang: Lang,
    scheme: PronScheme,
    doc: &AnnotatedText,
    options: &AnalyzeOptions,
) -> AnalyzeResponse {
    let token_count = doc.tokens().count();
    if token_count == 0 {
        return empty_response(lang, "no tokens to analyze");
    }
    let filtered: Vec<&Token> = filter_tokens(doc.tokens());

    let enriched = options.enriched_text.then(|| {
        let lines = match lang {
            Lang::Mandarin => enrich::mandarin_lines(&doc.sentences, &state.translit, scheme),
            Lang::English => enrich::english_lines(&doc.sentences, |word| {
                state
                    .dict
                    .lookup(Lang::English, word, Some("VERB"))
                    .map(|e| e.synonyms)
                    .unwrap_or_default()
            }),
            Lang::French => enrich::french_lines(&doc.sentences, |word| {
                state
                    .dict
                    .lookup(Lang::French, &word.to_lowercase(), None)
                    .and_then(|e| e.ipa)
            }),
        };
        EnrichedSection {
            scheme: (lang == Lang::Mandarin).then_some(scheme),
            lines,
        }
    });

    let vocabulary = options.vocabulary.then(|| {
        let items = extract_vocabulary(&filtered, |tok| vocabulary_key(lang, tok));
        let (band_rows, band_distribution) = if lang == Lang::Mandarin {
            let rows = state.bands.classify(&items);
            let distribution = BandList::band_distribution(&rows)
                .into_iter()
                .map(|(band, count)| BandCount { band, count })
                .collect();
            let rows = rows
                .into_iter()
                .map(|row| BandRow {
                    word: row.word.clone(),
                    pinyin: row.pinyin.clone(),
                    zhuyin: row.zhuyin.clone(),
                    category: row.category.clone(),
                    band: row.band.clone(),
                })
                .collect();
            (rows, distribution)
        } else {
            (Vec::new(), Vec::new())
        };
        let message = if items.is_empty() {
            if lang == Lang::Mandarin {
                Some("no vocabulary found in this text".to_string())
            } else {
                Some(
                    "no vocabulary found; lemma-based vocabulary needs part-of-speech \
                     annotations from an NLP pipeline"
                        .to_string(),
                )
            }
        } else {
            None
        };
        VocabularySection {
            items,
            band_rows,
            band_distribution,
            message,
        }
    });

    let frequency = options.frequency.then(|| {
        let table = FrequencyTable::from_tokens(&filtered);
        let k = options.top_k.unwrap_or(DEFAULT_TOP_K).min(table.len());
        FrequencySection {
            entries: table
                .entries()
                .iter()
                .map(|(text, count)| CountRow {
                    text: text.clone(),
                    count: *count,
                })
                .collect(),
            top: table
                .top_k(k)
                .into_iter()
                .map(|(text, count)| CountRow { text, count })
                .collect(),
        }
    });

    let morphology = options.morphology.then(|| MorphologySection {
        rows: inflected_forms(doc.tokens())
            .into_iter()
            .map(|tok| InflectionRow {
                word: tok.text.to_lowercase(),
                tag: tok.tag.as_str().to_string(),
                lemma: tok.lemma.clone(),
            })
            .collect(),
    });

    let keywords = options
        .keywords
        .then(|| rank_keywords(&doc.keywords, options.keyword_count));

    let entities = options.entities.then(|| doc.entities.clone());

    AnalyzeResponse {
        lang: lang.code(),
        token_count,
        enriched,
        vocabulary,
        frequency,
        morphology,
        keywords,
        entities,
        message: None,
    }
}

async fn define(
    State(state): State<AppState>,
    axum::extract::Query(params): axum::extract::Query<DefineQuery>,
) -> Result<Json<DefineResponse>, ApiError> {
    let lang = Lang::from_code(&params.lang)
        .ok_or_else(|| ApiError::bad_request(format!("unknown language code: {}", params.lang)))?;
    let word = params.word.trim().to_string();
    if word.is_empty() {
        return Err(ApiError::bad_request("word is required"));
    }
    if word.chars().count() > MAX_LOOKUP_LEN {
        return Err(ApiError::bad_request(format!(
            "word must be at most {MAX_LOOKUP_LEN} characters"
        )));
    }
    if word.chars().any(char::is_whitespace) {
        return Err(ApiError::bad_request("word must be a single term"));
    }

    let pos = params.pos.clone();
    let dict = Arc::clone(&state.dict);
    let lookup_word = word.clone();
    let entry = tokio::task::spawn_blocking(move || {
        dict.lookup(lang, &lookup_word, pos.as_deref())
    })
    .await
    .map_err(|_| ApiError::Internal)?;

    let found = entry.is_some();
    Ok(Json(DefineResponse {
        word,
        lang: lang.code(),
        pos: params.pos,
        found,
        entry,
        message: (!found).then(|| "no definitions found".to_string()),
    }))
}

async fn pronounce(
    State(state): State<AppState>,
    axum::extract::Query(params): axum::extract::Query<PronounceQuery>,
) -> Result<Json<PronounceResponse>, ApiError> {
    let word = params.word.trim().to_string();
    if word.is_empty() {
        return Err(ApiError::bad_request("word is required"));
    }
    let scheme = match params.scheme.as_deref() {
        None => PronScheme::Pinyin,
        Some(raw) => PronScheme::parse(raw)
            .ok_or_else(|| ApiError::bad_request(format!("unknown scheme: {raw}")))?,
    };

    let pronunciation = state.translit.annotate(&word, scheme);
    let found = !pronunciation.is_empty();
    Ok(Json(PronounceResponse {
        word,
        scheme,
        pronunciation,
        found,
    }))
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    fn bad_request<T: Into<String>>(msg: T) -> Self {
        ApiError::BadRequest(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                let body = Json(ErrorResponse { error: msg });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::Internal => {
                let body = Json(json!({ "error": "internal server error" }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

const BASE_HTML: &str = include_str!("../templates/base.html");
const STYLE_HTML: &str = include_str!("../templates/style.html");
const HEADER_HTML: &str = include_str!("../templates/header.html");
const FOOTER_HTML: &str = include_str!("../templates/footer.html");
const ANALYZE_BODY_HTML: &str = include_str!("../templates/analyze_body.html");
const ANALYZE_SCRIPT: &str = include_str!("../templates/analyze_script.js");

fn render_page(title: &str, body: &str, script: &str) -> String {
    let header = HEADER_HTML.replace("{{title}}", title);
    BASE_HTML
        .replace("{{title}}", title)
        .replace("{{style}}", STYLE_HTML)
        .replace("{{header}}", &header)
        .replace("{{body}}", body)
        .replace("{{footer}}", FOOTER_HTML)
        .replace(
            "{{scripts}}",
            &format!(r#"<script>{}</script>"#, script),
        )
}

fn analyze_html() -> String {
    render_page("Linguascope", ANALYZE_BODY_HTML, ANALYZE_SCRIPT)
}
