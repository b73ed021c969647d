//! Whisper model metadata catalog.

use crate::defaults;
use std::path::PathBuf;

/// Metadata for a Whisper model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    /// Model identifier (e.g., "tiny.en", "base", "large")
    pub name: &'static str,
    /// Model size in megabytes
    pub size_mb: u32,
    /// Whether this model supports English only
    pub english_only: bool,
}

impl ModelInfo {
    /// Download URL on HuggingFace.
    pub fn url(&self) -> String {
        format!(
            "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-{}.bin",
            self.name
        )
    }
}

/// Catalog of available Whisper models.
///
/// Models range from tiny (75 MB, fast, lower accuracy) to large (3094 MB,
/// slower, highest accuracy). The `.en` suffix marks English-only variants,
/// which are faster at the same size.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "tiny.en",
        size_mb: 75,
        english_only: true,
    },
    ModelInfo {
        name: "tiny",
        size_mb: 75,
        english_only: false,
    },
    ModelInfo {
        name: "base.en",
        size_mb: 142,
        english_only: true,
    },
    ModelInfo {
        name: "base",
        size_mb: 142,
        english_only: false,
    },
    ModelInfo {
        name: "small.en",
        size_mb: 466,
        english_only: true,
    },
    ModelInfo {
        name: "small",
        size_mb: 466,
        english_only: false,
    },
    ModelInfo {
        name: "medium.en",
        size_mb: 1533,
        english_only: true,
    },
    ModelInfo {
        name: "medium",
        size_mb: 1533,
        english_only: false,
    },
    ModelInfo {
        name: "large",
        size_mb: 3094,
        english_only: false,
    },
];

/// Find a model by name.
pub fn get_model(name: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|m| m.name == name)
}

/// Get all available models.
pub fn list_models() -> &'static [ModelInfo] {
    MODELS
}

/// Resolve the model variant for a session language.
///
/// English sessions use the English-only variant of the requested model
/// when one exists ("base" → "base.en"); "large" has no English-only
/// variant. Any other language (or "auto") keeps the multilingual model.
pub fn english_variant(name: &str, language: &str) -> String {
    if language == defaults::DEFAULT_LANGUAGE
        && !name.ends_with(defaults::ENGLISH_ONLY_SUFFIX)
        && get_model(&format!("{name}{}", defaults::ENGLISH_ONLY_SUFFIX)).is_some()
    {
        format!("{name}{}", defaults::ENGLISH_ONLY_SUFFIX)
    } else {
        name.to_string()
    }
}

/// Get the directory where models are stored.
///
/// `~/.cache/livecap/models/` on Linux.
pub fn models_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("livecap")
        .join("models")
}

/// Get the full path for a model file.
///
/// Always returns a path; the file may or may not exist on disk.
pub fn model_path(name: &str) -> PathBuf {
    models_dir().join(format!("ggml-{name}.bin"))
}

/// Check if a model is installed.
pub fn is_model_installed(name: &str) -> bool {
    model_path(name).exists()
}

/// Find any installed model from the catalog.
///
/// Used as a fallback when the configured model is missing and downloads
/// are disabled.
pub fn find_any_installed_model() -> Option<String> {
    MODELS
        .iter()
        .find(|m| is_model_installed(m.name))
        .map(|m| m.name.to_string())
}

/// Format model information for display.
pub fn format_model_info(model: &ModelInfo) -> String {
    let status = if is_model_installed(model.name) {
        "[installed]"
    } else {
        "[not installed]"
    };
    let lang = if model.english_only {
        "en-only"
    } else {
        "multi"
    };
    format!("{:12} {:5} MB  {:8} {}", model.name, model.size_mb, lang, status)
}
