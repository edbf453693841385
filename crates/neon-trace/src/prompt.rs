//! Prompt text sent to the model.
//!
//! Both prompts are pure functions of their inputs. The lookup prompt frames
//! the model as the interpreter of a fictional scraping script; the script
//! never runs anywhere, it only tells the model what to search for and what
//! shape to answer in.

use crate::i18n::Language;
use crate::lookup::Handle;
use crate::persona::Persona;

/// Builder for the bracketed-section prompts the model is given.
///
/// Blocks are joined with blank lines. Empty blocks are skipped.
///
/// ```
/// use neon_trace::prompt::PromptBuilder;
///
/// let prompt = PromptBuilder::new()
///     .field("ROLE", "Interpreter")
///     .section("RULES", "1. Be terse.")
///     .section("EMPTY", "  ")
///     .build();
///
/// assert!(prompt.starts_with("ROLE: Interpreter"));
/// assert!(prompt.contains("[RULES]\n1. Be terse."));
/// assert!(!prompt.contains("EMPTY"));
/// ```
#[derive(Debug, Default)]
pub struct PromptBuilder {
    blocks: Vec<String>,
    fields: Vec<String>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A `KEY: value` line. Consecutive fields share one block.
    pub fn field(mut self, key: &str, value: impl AsRef<str>) -> Self {
        self.fields.push(format!("{key}: {}", value.as_ref()));
        self
    }

    /// A free-standing block of text.
    pub fn text(mut self, content: impl Into<String>) -> Self {
        self.flush_fields();
        let content = content.into();
        if !content.trim().is_empty() {
            self.blocks.push(content);
        }
        self
    }

    /// A block introduced by a `[HEADING]` line.
    pub fn section(mut self, heading: &str, content: impl Into<String>) -> Self {
        self.flush_fields();
        let content = content.into();
        if !content.trim().is_empty() {
            self.blocks.push(format!("[{heading}]\n{content}"));
        }
        self
    }

    pub fn build(mut self) -> String {
        self.flush_fields();
        self.blocks.join("\n\n")
    }

    fn flush_fields(&mut self) {
        if !self.fields.is_empty() {
            self.blocks.push(self.fields.join("\n"));
            self.fields.clear();
        }
    }
}

/// Mirror sites the model is told to search, in query order.
pub const MIRROR_SITES: [&str; 4] = ["urlebird.com", "exolyt.com", "tiktokstalk.com", "tik.fail"];

/// The output-language line of the lookup prompt.
pub fn language_instruction(lang: Language) -> &'static str {
    match lang {
        Language::Ru => "OUTPUT LANGUAGE: RUSSIAN (Technical keys stay in English).",
        Language::En => "OUTPUT LANGUAGE: ENGLISH.",
    }
}

const SCRIPT_LOGIC: &str = r#"def main(target):
    # STEP 1: MIRROR SEARCH
    sources = web_search([
{queries}
    ])

    # STEP 2: BIO & CONTACT EXTRACTION
    bio_text = extract_text_from_snippets(sources)

    # Telegram links hide in bios, e.g. "TG: t.me/some_channel"
    contacts = regex_findall(r"(t\.me\/[\w_]+|telegram\.me\/[\w_]+|instagram\.com\/[\w_\.]+|vk\.com\/[\w_\.]+)", bio_text)

    # STEP 3: REGION INFERENCE
    if "Moscow" in bio_text or is_cyrillic_russian(bio_text):
        region = "RU (Russia)"
    elif "Kiev" in bio_text or "Odessa" in bio_text:
        region = "UA (Ukraine)"
    else:
        region = extract_region_from_exolyt_metadata(sources)

    # STEP 4: SOCIAL GRAPH
    found_platforms = []
    if check_url(f"tiktok.com/@{target}"):
        found_platforms.append({"name": "TikTok", "url": f"https://www.tiktok.com/@{target}", "status": "ACTIVE"})
    for contact in contacts:
        if "t.me" in contact or "telegram.me" in contact:
            found_platforms.append({"name": "Telegram", "url": "https://" + contact, "status": "ACTIVE"})
        if "instagram.com" in contact:
            found_platforms.append({"name": "Instagram", "url": "https://" + contact, "status": "ACTIVE"})

    return compile_json(region, contacts, found_platforms)"#;

const INSTRUCTION: &str = "Act as the interpreter.
1. SCRAPE the bio and search results.
2. POPULATE 'platforms' DYNAMICALLY.
3. IMPORTANT: If you see a Telegram link (t.me/...) in the bio text, YOU MUST ADD IT to 'platforms' and 'publicContact'.
4. DO NOT include platforms with \"UNKNOWN\" status or empty URLs.";

const OUTPUT_SCHEMA: &str = r#"{
  "found": boolean,
  "handle": "{handle}",
  "realName": "string",
  "location": "string",
  "publicContact": "string",
  "bio": "string",
  "followers": "string",
  "riskScore": "HIGH/MEDIUM/LOW",
  "technical": {
     "userId": "string",
     "region": "string",
     "language": "string",
     "created": "string"
  },
  "platforms": [
     // ONLY ACTIVE LINKS HERE. NO PLACEHOLDERS.
     { "name": "String", "url": "String", "status": "ACTIVE" }
  ],
  "analysis": "string"
}"#;

/// The generation prompt for one handle.
pub fn lookup_prompt(handle: &Handle, lang: Language) -> String {
    let queries = MIRROR_SITES
        .iter()
        .map(|site| format!("        f\"site:{site} {{target}}\""))
        .collect::<Vec<_>>()
        .join(",\n");

    PromptBuilder::new()
        .field("SYSTEM_ROLE", "VIRTUAL_PYTHON_BACKEND_V3.")
        .field("MODE", "EXECUTE_SCRIPT \"osint_tiktok_deep_scan.py\"")
        .field("TARGET_USER", format!("\"{}\"", handle.bare()))
        .text(language_instruction(lang))
        .section(
            "VIRTUAL_SCRIPT_LOGIC",
            SCRIPT_LOGIC.replace("{queries}", &queries),
        )
        .section("INSTRUCTION", INSTRUCTION)
        .text(format!(
            "OUTPUT SCHEMA (JSON Only):\n{}",
            OUTPUT_SCHEMA.replace("{handle}", &handle.sigiled())
        ))
        .build()
}

/// The hidden system instruction of a chat session.
pub fn chat_instruction(persona: &Persona, lang: Language) -> String {
    let context = serde_json::to_string(persona).unwrap_or_else(|_| "{}".into());
    PromptBuilder::new()
        .field("ROLE", "CLI Output Interface.")
        .field("Language", format!("{}.", lang.name()))
        .field("CONTEXT", context)
        .field(
            "BEHAVIOR",
            "Explain the results technically. If multiple platforms were found \
             (e.g. YouTube + TikTok), mention the cross-reference connection.",
        )
        .build()
}
