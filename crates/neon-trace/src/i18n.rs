//! EN/RU label table.
//!
//! Pure presentation lookup: nothing in the lookup pipeline branches on
//! these strings except the localized fallback and chat failure texts.

use serde::{Deserialize, Serialize};

/// Output language selected by the user-facing toggle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Language {
    En,
    #[default]
    Ru,
}

impl Language {
    pub fn labels(self) -> &'static Labels {
        match self {
            Language::En => &EN,
            Language::Ru => &RU,
        }
    }

    /// English name of the language, as used in model instructions.
    pub fn name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Ru => "Russian",
        }
    }

    /// Lenient parse for CLI flags and query strings.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "eng" | "english" => Some(Language::En),
            "ru" | "rus" | "russian" => Some(Language::Ru),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::En => f.write_str("EN"),
            Language::Ru => f.write_str("RU"),
        }
    }
}

/// All user-facing strings for one language.
#[derive(Debug, Serialize)]
pub struct Labels {
    // ── Form ──
    pub title: &'static str,
    pub subtitle: &'static str,
    pub input_placeholder: &'static str,
    pub execute: &'static str,
    pub reset_terminal: &'static str,

    // ── Disclaimer gate ──
    pub disclaimer_title: &'static str,
    pub disclaimer_subtitle: &'static str,
    pub disclaimer_body: [&'static str; 3],
    pub disclaimer_wait: &'static str,
    pub disclaimer_accept: &'static str,

    // ── Result card ──
    pub target_id: &'static str,
    pub profile_active: &'static str,
    pub profile_not_found: &'static str,
    pub aka: &'static str,
    pub threat: &'static str,
    pub deep_analysis: &'static str,
    pub geolocation: &'static str,
    pub public_contact: &'static str,
    pub est_reach: &'static str,
    pub bio_data: &'static str,
    pub evidence: &'static str,
    pub network_nodes: &'static str,
    pub not_found_title: &'static str,
    pub not_found_desc: &'static str,
    pub causes: &'static str,
    pub terminate: &'static str,
    pub not_linked: &'static str,
    pub tech_id: &'static str,
    pub tech_region: &'static str,
    pub tech_lang: &'static str,
    pub tech_created: &'static str,
    pub footer: &'static str,

    // ── Errors ──
    pub syntax_error: &'static str,
    pub empty_handle: &'static str,
    pub invalid_handle: &'static str,
    pub connection_terminated: &'static str,
    pub disclaimer_pending: &'static str,
    pub runtime_error_bio: &'static str,
    pub runtime_error_analysis: &'static str,

    // ── Chat ──
    pub chat_greeting: &'static str,
    pub chat_network_error: &'static str,
    pub chat_placeholder: &'static str,
    pub empty_message: &'static str,
    pub chat_scanning: &'static str,
    pub chat_typing_lines: [&'static str; 6],
}

pub static EN: Labels = Labels {
    title: "NEON TRACE",
    subtitle: "OSINT PUBLIC DATA ANALYZER V3.1 PRO",
    input_placeholder: "ENTER @USERNAME",
    execute: ":: EXECUTE PROTOCOL ::",
    reset_terminal: "RESET TERMINAL",

    disclaimer_title: "NEURAL STABILITY WARNING",
    disclaimer_subtitle: "MANDATORY PROTOCOL READ",
    disclaimer_body: [
        "The 'NEON TRACE' module uses experimental generative AI for OSINT analysis.",
        "ACCURACY DISCLAIMER: AI is probabilistic. It may occasionally 'hallucinate' (generate plausible but incorrect links). This does NOT mean all data is fake, but verification is required.",
        "User assumes full responsibility for manually verifying all extracted endpoints.",
    ],
    disclaimer_wait: "LOADING SECURITY PROTOCOLS...",
    disclaimer_accept: "I UNDERSTAND // INITIALIZE SYSTEM",

    target_id: "TARGET IDENTIFIED",
    profile_active: "PROFILE: ACTIVE",
    profile_not_found: "PROFILE: NOT FOUND",
    aka: "KNOWN AS:",
    threat: "THREAT SCORE",
    deep_analysis: "DEEP ANALYSIS LOG",
    geolocation: "GEOLOCATION",
    public_contact: "DECRYPTED CONTACTS",
    est_reach: "AUDIENCE REACH",
    bio_data: "BIO_METADATA",
    evidence: "SOURCE NODES",
    network_nodes: "SOCIAL GRAPH",
    not_found_title: "TARGET UNREACHABLE",
    not_found_desc: "The handle did not return a 200 OK status on major platforms.",
    causes: "POSSIBLE CAUSES: Account Deleted, Banned, or 100% Private.",
    terminate: "FLUSH & RESTART",
    not_linked: "N/A",
    tech_id: "UID (RAW)",
    tech_region: "REGION LOCK",
    tech_lang: "LOCALE",
    tech_created: "FIRST SEEN",
    footer: "NEON TRACE // SYSTEM V3.1 // UNAUTHORIZED USE PROHIBITED",

    syntax_error: "SYNTAX ERROR: HANDLE MUST START WITH '@'",
    empty_handle: "SYNTAX ERROR: EMPTY HANDLE",
    invalid_handle: "SYNTAX ERROR: ILLEGAL CHARACTERS IN HANDLE",
    connection_terminated: "CONNECTION TERMINATED. TARGET UNRESPONSIVE.",
    disclaimer_pending: "ACCESS DENIED: ACCEPT THE PROTOCOL WARNING FIRST",
    runtime_error_bio: "Script execution failed.",
    runtime_error_analysis: "Virtual Machine Critical Error.",

    chat_greeting: "Yo. I dug up what I could. If you need me to go deeper or have questions about this target, hit me up. I'm online. \u{1F441}\u{FE0F}",
    chat_network_error: "Connection drop... Network error.",
    chat_placeholder: "Send command...",
    empty_message: "EMPTY COMMAND IGNORED.",
    chat_scanning: "ACTIVE SCANNING",
    chat_typing_lines: [
        "> PINGING TIKTOK SERVERS...",
        "> BYPASSING INSTAGRAM AUTH...",
        "> ANALYZING DISCORD INVITES...",
        "> DECRYPTING GEO-TAGS...",
        "> SEARCHING PUBLIC DATABASES...",
        "> CORRELATING USERNAMES...",
    ],
};

pub static RU: Labels = Labels {
    title: "NEON TRACE",
    subtitle: "OSINT PUBLIC DATA ANALYZER V3.1 PRO",
    input_placeholder: "ВВЕДИТЕ @USERNAME",
    execute: ":: ЗАПУСТИТЬ ПРОТОКОЛ ::",
    reset_terminal: "СБРОС ТЕРМИНАЛА",

    disclaimer_title: "ПРЕДУПРЕЖДЕНИЕ О ТОЧНОСТИ",
    disclaimer_subtitle: "ОБЯЗАТЕЛЬНО К ПРОЧТЕНИЮ",
    disclaimer_body: [
        "Модуль 'NEON TRACE' использует экспериментальный ИИ для анализа открытых данных.",
        "ВАЖНО: ИИ работает на основе вероятностей. Возможны 'галлюцинации' (правдоподобные, но несуществующие ссылки). Это НЕ значит, что все данные ложные, но ручная проверка обязательна.",
        "Используя систему, вы подтверждаете, что будете проверять найденную информацию вручную.",
    ],
    disclaimer_wait: "ЗАГРУЗКА ПРОТОКОЛОВ БЕЗОПАСНОСТИ...",
    disclaimer_accept: "Я ПОНЯЛ // ЗАПУСТИТЬ СИСТЕМУ",

    target_id: "ЦЕЛЬ ОПОЗНАНА",
    profile_active: "СТАТУС: АКТИВЕН",
    profile_not_found: "СТАТУС: НЕ НАЙДЕН",
    aka: "ИМЯ:",
    threat: "УРОВЕНЬ УГРОЗЫ",
    deep_analysis: "ОТЧЕТ АНАЛИЗА",
    geolocation: "ГЕО-МЕТКА",
    public_contact: "РАСШИФРОВАННЫЕ КОНТАКТЫ",
    est_reach: "АУДИТОРИЯ",
    bio_data: "БИО-ДАННЫЕ",
    evidence: "ИСТОЧНИКИ ДАННЫХ",
    network_nodes: "СОЦ. ГРАФ",
    not_found_title: "ЦЕЛЬ НЕДОСТУПНА",
    not_found_desc: "Хэндл не вернул статус 200 OK на основных платформах.",
    causes: "ПРИЧИНЫ: Аккаунт удален, забанен или полностью скрыт.",
    terminate: "СБРОС И ПОВТОР",
    not_linked: "Н/Д",
    tech_id: "UID (RAW)",
    tech_region: "РЕГИОН",
    tech_lang: "ЛОКАЛЬ",
    tech_created: "ДАТА СОЗДАНИЯ",
    footer: "NEON TRACE // SYSTEM V3.1 // ТОЛЬКО ДЛЯ СЛУЖЕБНОГО ПОЛЬЗОВАНИЯ",

    syntax_error: "SYNTAX ERROR: HANDLE MUST START WITH '@'",
    empty_handle: "SYNTAX ERROR: EMPTY HANDLE",
    invalid_handle: "SYNTAX ERROR: НЕДОПУСТИМЫЕ СИМВОЛЫ В ХЭНДЛЕ",
    connection_terminated: "CONNECTION TERMINATED. TARGET UNRESPONSIVE.",
    disclaimer_pending: "ДОСТУП ЗАПРЕЩЕН: СНАЧАЛА ПРИМИТЕ ПРЕДУПРЕЖДЕНИЕ",
    runtime_error_bio: "Script execution failed.",
    runtime_error_analysis: "Критическая ошибка виртуальной машины.",

    chat_greeting: "Йо. Я нарыл кое-что. Если нужно копнуть глубже или есть вопросы по этому юзеру, пиши. Я на связи. \u{1F441}\u{FE0F}",
    chat_network_error: "Связь прервана... Ошибка сети.",
    chat_placeholder: "Отправить команду...",
    empty_message: "ПУСТАЯ КОМАНДА ПРОИГНОРИРОВАНА.",
    chat_scanning: "АКТИВНЫЙ ПОИСК",
    chat_typing_lines: [
        "> ПИНГ TIKTOK СЕРВЕРОВ...",
        "> ОБХОД АВТОРИЗАЦИИ INSTAGRAM...",
        "> АНАЛИЗ DISCORD ИНВАЙТОВ...",
        "> ДЕШИФРОВКА ГЕО-МЕТОК...",
        "> ПОИСК В ПУБЛИЧНЫХ БАЗАХ...",
        "> КОРРЕЛЯЦИЯ НИКНЕЙМОВ...",
    ],
};
