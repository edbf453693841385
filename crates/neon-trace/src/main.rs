//! Run a NEON TRACE lookup from the terminal, then chat about the result.
//!
//! Reads the API key from the `OPENROUTER_KEY` environment variable.
//!
//! # Examples
//!
//! ```sh
//! # Full deep scan with the Russian labels (the default)
//! neon-trace @alice
//!
//! # English output, machine-readable persona, no follow-up chat
//! neon-trace @alice --lang en --json --no-chat
//!
//! # Skip the scan animation pacing
//! neon-trace @alice --instant
//! ```
//!
//! Scan log lines and the disclaimer go to stderr so `--json` output can be
//! piped. Set `RUST_LOG=neon_trace=debug` for request metadata.

use std::process;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use neon_trace::i18n::Labels;
use neon_trace::persona::Technical;
use neon_trace::prelude::*;
use neon_trace::{CHAT_MODEL, DEFAULT_MODEL};

/// Look up a handle's public footprint and chat about the dossier.
#[derive(Parser)]
#[command(name = "neon-trace")]
struct Cli {
    /// Target handle, including the leading '@'
    handle: String,

    // ── Output ─────────────────────────────────────────────────
    /// Output language: en or ru
    #[arg(long, default_value = "ru", value_parser = parse_language)]
    lang: Language,

    /// Print the persona as JSON instead of the dossier
    #[arg(long)]
    json: bool,

    /// Exit after the dossier instead of opening a chat session
    #[arg(long)]
    no_chat: bool,

    /// Reveal results as soon as they arrive (no minimum scan time)
    #[arg(long)]
    instant: bool,

    // ── Model selection ────────────────────────────────────────
    /// Model used for the lookup
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Model used for follow-up chat
    #[arg(long, default_value = CHAT_MODEL)]
    chat_model: String,

    /// Maximum tokens to generate per call (provider default if unset)
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Sampling temperature (provider default if unset)
    #[arg(long)]
    temperature: Option<f32>,

    /// Maximum web search results per call
    #[arg(long)]
    web_max_results: Option<u32>,
}

fn parse_language(s: &str) -> Result<Language, String> {
    Language::parse(s).ok_or_else(|| format!("unknown language '{s}' (expected en or ru)"))
}

impl Cli {
    fn config(&self) -> TraceConfig {
        let base = if self.instant {
            TraceConfig::instant()
        } else {
            TraceConfig::default()
        };
        let mut config = base
            .with_model(&self.model)
            .with_chat_model(&self.chat_model);
        if let Some(max_tokens) = self.max_tokens {
            config = config.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = self.temperature {
            config = config.with_temperature(temperature);
        }
        if let Some(n) = self.web_max_results {
            config = config.with_web_max_results(n);
        }
        config
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<(), String> {
    let labels = cli.lang.labels();

    let handle = Handle::parse(&cli.handle).map_err(|e| e.localized(cli.lang).to_string())?;

    let api_key = std::env::var("OPENROUTER_KEY")
        .map_err(|_| "OPENROUTER_KEY environment variable is not set".to_string())?;
    let client = Arc::new(OpenRouterClient::with_headers(
        api_key,
        "https://github.com/tacryt-socryp/neon-trace",
        "neon-trace",
    )?);
    let config = cli.config();

    print_disclaimer(labels);

    // ── Deep scan ───────────────────────────────────────────────
    let scan_log = FnEventHandler::new(|event: &TraceEvent<'_>| match event {
        TraceEvent::Log(line) => {
            eprintln!("  [{}] {line}", chrono::Local::now().format("%H:%M:%S"));
        }
        TraceEvent::Status(status) => eprintln!("  :: {status} ::"),
        _ => {}
    });
    let handler = CompositeEventHandler::new()
        .with(scan_log)
        .with(LoggingHandler);

    let reveal = Lookup::new(client.as_ref(), &config, cli.lang)
        .run(&handle, &handler)
        .await
        .map_err(|e| e.localized(cli.lang).to_string())?;

    if cli.json {
        let json = serde_json::to_string_pretty(&reveal.persona)
            .map_err(|e| format!("failed to serialize persona: {e}"))?;
        println!("{json}");
    } else {
        println!("{}", render_dossier(&reveal.persona, labels));
    }

    if cli.no_chat {
        return Ok(());
    }

    // ── Follow-up chat ──────────────────────────────────────────
    let mut chat = ChatSession::open(client, &reveal.persona, cli.lang, &config);
    for message in chat.transcript() {
        print_message(message);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("{} ", labels.chat_placeholder);
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => return Err(format!("failed to read stdin: {e}")),
        };
        if line.trim() == "/exit" {
            break;
        }
        match chat.submit(&line, &LoggingHandler).await {
            Ok(reply) => print_message(&reply),
            Err(TraceError::EmptyMessage) => continue,
            Err(e) => eprintln!("{}", e.localized(cli.lang)),
        }
    }

    Ok(())
}

fn print_disclaimer(labels: &Labels) {
    eprintln!("!! {} // {}", labels.disclaimer_title, labels.disclaimer_subtitle);
    for paragraph in labels.disclaimer_body {
        eprintln!("   {paragraph}");
    }
    eprintln!();
}

fn print_message(message: &ChatMessage) {
    match message.sender {
        Sender::User => println!("> {}", message.text),
        Sender::Assistant => println!("< {}", message.text),
    }
}

/// Plain-text rendering of the result card.
fn render_dossier(persona: &Persona, labels: &Labels) -> String {
    let mut out = Vec::new();

    if !persona.found {
        out.push(format!("== {} ==", labels.not_found_title));
        out.push(persona.handle.clone());
        out.push(labels.not_found_desc.to_string());
        out.push(labels.causes.to_string());
        if !persona.analysis.is_empty() {
            out.push(String::new());
            out.push(format!("{}:", labels.deep_analysis));
            out.push(format!("  {}", persona.analysis));
        }
        out.push(String::new());
        out.push(labels.footer.to_string());
        return out.join("\n");
    }

    out.push(format!("== {} ==", labels.target_id));
    out.push(format!("{}  [{}]", persona.handle, labels.profile_active));
    out.push(format!("{} {}", labels.aka, persona.real_name));
    out.push(format!("{}: {}", labels.threat, persona.risk_score));
    out.push(format!("{}: {}", labels.geolocation, persona.location));
    out.push(format!("{}: {}", labels.public_contact, persona.public_contact));
    out.push(format!("{}: {}", labels.est_reach, persona.followers));
    out.push(format!("{}: {}", labels.bio_data, persona.bio));

    if let Some(technical) = persona.technical.as_ref().filter(|t| !t.is_empty()) {
        out.push(String::new());
        out.extend(technical_lines(technical, labels));
    }

    out.push(String::new());
    out.push(format!("{}:", labels.network_nodes));
    for platform in &persona.platforms {
        out.push(format!("  - {:<10} {}", platform.name, platform.url));
    }

    if !persona.sources.is_empty() {
        out.push(String::new());
        out.push(format!("{}:", labels.evidence));
        for source in &persona.sources {
            out.push(format!("  - {} <{}>", source.title, source.uri));
        }
    }

    if !persona.analysis.is_empty() {
        out.push(String::new());
        out.push(format!("{}:", labels.deep_analysis));
        out.push(format!("  {}", persona.analysis));
    }

    out.push(String::new());
    out.push(labels.footer.to_string());
    out.join("\n")
}

fn technical_lines(technical: &Technical, labels: &Labels) -> Vec<String> {
    let or_na = |v: &Option<String>| v.clone().unwrap_or_else(|| labels.not_linked.to_string());
    vec![
        format!("{}: {}", labels.tech_id, or_na(&technical.user_id)),
        format!("{}: {}", labels.tech_region, or_na(&technical.region)),
        format!("{}: {}", labels.tech_lang, or_na(&technical.language)),
        format!("{}: {}", labels.tech_created, or_na(&technical.created)),
    ]
}
