//! Smart copy: substitute the reader's stored API keys into code samples
//!
//! Plain text substitution over a fixed set of environment-variable
//! spellings; code is never parsed.

use super::PreferencesState;

/// An API provider whose keys can be injected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiProvider {
    pub id: &'static str,
    pub name: &'static str,
    /// Example of the key format, shown when asking for a key
    pub placeholder: &'static str,
    pub env_vars: &'static [&'static str],
}

/// Providers known to smart copy
pub const API_PROVIDERS: &[ApiProvider] = &[
    ApiProvider {
        id: "openai",
        name: "OpenAI",
        placeholder: "sk-...",
        env_vars: &["OPENAI_API_KEY"],
    },
    ApiProvider {
        id: "anthropic",
        name: "Anthropic",
        placeholder: "sk-ant-...",
        env_vars: &["ANTHROPIC_API_KEY"],
    },
    ApiProvider {
        id: "google",
        name: "Google Gemini",
        placeholder: "AIza...",
        env_vars: &["GOOGLE_API_KEY", "GEMINI_API_KEY"],
    },
    ApiProvider { id: "groq", name: "Groq", placeholder: "gsk_...", env_vars: &["GROQ_API_KEY"] },
    ApiProvider {
        id: "deepseek",
        name: "DeepSeek",
        placeholder: "sk-...",
        env_vars: &["DEEPSEEK_API_KEY"],
    },
];

/// Look up a provider by id
pub fn provider(id: &str) -> Option<&'static ApiProvider> {
    API_PROVIDERS.iter().find(|p| p.id == id)
}

/// Providers that are enabled and have a non-empty key
fn active_providers(prefs: &PreferencesState) -> impl Iterator<Item = (&'static ApiProvider, &str)> {
    API_PROVIDERS.iter().filter_map(move |p| {
        if !prefs.inject_keys {
            return None;
        }
        prefs.api_keys.get(p.id).map(String::as_str).filter(|k| !k.is_empty()).map(|k| (p, k))
    })
}

/// Replace environment-variable references with stored keys
pub fn inject_keys(content: &str, prefs: &PreferencesState) -> String {
    let mut processed = content.to_string();

    for (provider, key) in active_providers(prefs) {
        let quoted = format!("\"{key}\"");
        for var in provider.env_vars {
            for pattern in [
                format!("os.environ[\"{var}\"]"),
                format!("os.environ['{var}']"),
                format!("os.environ.get(\"{var}\")"),
                format!("process.env.{var}"),
            ] {
                processed = processed.replace(&pattern, &quoted);
            }
            processed = processed.replace(&format!("YOUR_{var}"), key);
        }
    }

    processed
}

/// Would copying `content` inject at least one key?
pub fn has_smart_content(content: &str, prefs: &PreferencesState) -> bool {
    active_providers(prefs).any(|(p, _)| p.env_vars.iter().any(|var| content.contains(var)))
}
