//! Reply → [`Persona`] repair pipeline.
//!
//! The model is asked for JSON but promises nothing: replies arrive wrapped
//! in code fences, prefixed with commentary, with fields missing, typed
//! wrong, or padded with placeholder links. [`normalize_reply`] turns any of
//! that into a record the front-end can render without checks of its own.
//!
//! The steps run in a fixed order and later steps depend on earlier ones:
//!
//! 1. strip code fences, isolate the text between the first `{` and the last `}`
//! 2. parse; on failure return [`fallback_persona`]
//! 3. attach the citations as `sources`
//! 4. default-fill missing fields
//! 5. drop platforms that are not ACTIVE or whose url is a placeholder
//! 6. recover Telegram links the model left in `bio`
//! 7. if `found` but no platforms remain, synthesize the primary platform
//! 8. ghost protocol: mirror-site citations promote `found` to true
//!
//! Running the pipeline over its own serialized output changes nothing.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::i18n::Language;
use crate::lookup::Handle;
use crate::persona::{
    HIDDEN, PRIMARY_PLATFORM, Persona, Platform, PlatformStatus, RUNTIME_ERROR, RiskScore, Source,
    Technical, UNKNOWN,
};

/// Suffix appended to `analysis` when mirror evidence overrides the model.
pub const GHOST_MARKER: &str = "[GHOST_PROTOCOL: Found via Mirrors]";

/// Citation URI fragments that count as indirect evidence of a profile.
pub const MIRROR_MARKERS: [&str; 3] = ["urlebird", "exolyt", "tiktok"];

static TELEGRAM_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:t\.me|telegram\.me)/[A-Za-z0-9_]+").expect("telegram link pattern is valid")
});

/// Shape a raw model reply into a persona. Never fails.
///
/// `sources` are the provenance citations returned with the reply; they are
/// attached as-is. `handle` supplies the default `handle` field and the
/// synthesized profile URL. `lang` only affects the fallback record.
pub fn normalize_reply(raw: &str, sources: Vec<Source>, handle: &Handle, lang: Language) -> Persona {
    let Some(body) = extract_json_body(raw) else {
        warn!(
            "model reply for {} has no JSON object ({} chars)",
            handle.raw(),
            raw.len()
        );
        return fallback_persona(handle, lang, sources);
    };

    let object = match serde_json::from_str::<Value>(&body) {
        Ok(Value::Object(object)) => object,
        Ok(other) => {
            warn!("model reply for {} is not an object: {other}", handle.raw());
            return fallback_persona(handle, lang, sources);
        }
        Err(e) => {
            warn!("model reply for {} failed to parse: {e}", handle.raw());
            return fallback_persona(handle, lang, sources);
        }
    };

    let mut persona = fill_defaults(&object, sources, handle);
    recover_bio_links(&mut persona);

    if persona.found && persona.platforms.is_empty() {
        debug!("found without evidence, synthesizing {PRIMARY_PLATFORM} entry");
        persona.platforms.push(Platform::primary(handle.bare()));
    }

    apply_ghost_protocol(&mut persona, handle);

    debug!(
        "normalized {}: found={}, platforms={}, sources={}",
        persona.handle,
        persona.found,
        persona.platforms.len(),
        persona.sources.len()
    );
    persona
}

/// The record returned when the reply cannot be parsed at all.
pub fn fallback_persona(handle: &Handle, lang: Language, sources: Vec<Source>) -> Persona {
    let labels = lang.labels();
    Persona {
        found: false,
        handle: handle.raw().to_string(),
        real_name: RUNTIME_ERROR.into(),
        location: UNKNOWN.into(),
        public_contact: UNKNOWN.into(),
        bio: labels.runtime_error_bio.into(),
        followers: UNKNOWN.into(),
        risk_score: RiskScore::Low,
        technical: None,
        platforms: Vec::new(),
        analysis: labels.runtime_error_analysis.into(),
        sources,
    }
}

/// Strip Markdown fences and cut the text down to `{ ... }`.
fn extract_json_body(raw: &str) -> Option<String> {
    let unfenced = raw.replace("```json", "").replace("```", "");
    let trimmed = unfenced.trim();
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end < start {
        return None;
    }
    trimmed.get(start..=end).map(str::to_string)
}

fn fill_defaults(object: &Map<String, Value>, sources: Vec<Source>, handle: &Handle) -> Persona {
    let handle_field = match text_field(object, "handle") {
        Some(h) if h.starts_with('@') => h,
        Some(h) => format!("@{h}"),
        None => handle.sigiled(),
    };

    let platforms = object
        .get("platforms")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(active_platform).collect())
        .unwrap_or_default();

    Persona {
        found: flag_field(object, "found"),
        handle: handle_field,
        real_name: text_field(object, "realName").unwrap_or_else(|| UNKNOWN.into()),
        location: text_field(object, "location").unwrap_or_else(|| UNKNOWN.into()),
        public_contact: text_field(object, "publicContact").unwrap_or_else(|| HIDDEN.into()),
        bio: text_field(object, "bio").unwrap_or_else(|| UNKNOWN.into()),
        followers: text_field(object, "followers").unwrap_or_else(|| UNKNOWN.into()),
        risk_score: text_field(object, "riskScore")
            .and_then(|s| RiskScore::parse(&s))
            .unwrap_or_default(),
        technical: object
            .get("technical")
            .and_then(Value::as_object)
            .map(|t| Technical {
                user_id: text_field(t, "userId"),
                region: text_field(t, "region"),
                language: text_field(t, "language"),
                created: text_field(t, "created"),
            }),
        platforms,
        analysis: text_field(object, "analysis").unwrap_or_default(),
        sources,
    }
}

/// Keep a platform entry only if it is ACTIVE with a real-looking url.
fn active_platform(entry: &Value) -> Option<Platform> {
    let entry = entry.as_object()?;
    let status = entry.get("status").and_then(Value::as_str)?;
    if !status.trim().eq_ignore_ascii_case("ACTIVE") {
        return None;
    }
    let url = entry.get("url").and_then(Value::as_str)?;
    if !is_usable_url(url) {
        return None;
    }
    Some(Platform {
        name: text_field(entry, "name").unwrap_or_else(|| UNKNOWN.into()),
        url: url.to_string(),
        username: text_field(entry, "username"),
        status: PlatformStatus::Active,
    })
}

/// Longer than 8 characters, no ellipsis, not the UNKNOWN placeholder.
pub fn is_usable_url(url: &str) -> bool {
    url.chars().count() > 8 && !url.contains("...") && !url.contains('\u{2026}') && url != UNKNOWN
}

/// Append Telegram links mentioned in `bio` that no platform already covers.
fn recover_bio_links(persona: &mut Persona) {
    let bio = persona.bio.clone();
    for found in TELEGRAM_LINK.find_iter(&bio) {
        let link = found.as_str();
        if persona.platforms.iter().any(|p| p.url.contains(link)) {
            continue;
        }
        let url = format!("https://{link}");
        debug!("recovered Telegram link from bio: {url}");
        persona.platforms.push(Platform::active("Telegram", url.clone()));
        if persona.contact_is_sentinel() {
            persona.public_contact = url;
        }
    }
}

fn is_mirror(uri: &str) -> bool {
    MIRROR_MARKERS.iter().any(|m| uri.contains(m))
}

fn apply_ghost_protocol(persona: &mut Persona, handle: &Handle) {
    if persona.found || !persona.sources.iter().any(|s| is_mirror(&s.uri)) {
        return;
    }
    debug!("mirror citations found for {}, overriding found=false", persona.handle);
    persona.found = true;
    if persona.analysis.is_empty() {
        persona.analysis = GHOST_MARKER.to_string();
    } else {
        persona.analysis.push(' ');
        persona.analysis.push_str(GHOST_MARKER);
    }
    if !persona.platforms.iter().any(|p| p.name == PRIMARY_PLATFORM) {
        persona.platforms.insert(0, Platform::primary(handle.bare()));
    }
}

/// Free text. Numbers and booleans are rendered; empty strings count as absent.
fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn flag_field(object: &Map<String, Value>, key: &str) -> bool {
    match object.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}
