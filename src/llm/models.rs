//! Catalog of models the ranked provider can choose from
//!
//! Cost is a relative price per million tokens, quality a 0..1 score. Both
//! only matter relative to each other.

use std::str::FromStr;

/// Organisation serving a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Mistral,
    Meta,
    HuggingFace,
    Tii,
    Cohere,
}

impl Backend {
    /// Name used in configuration (`RELAY_EXCLUDE_PROVIDERS`)
    pub fn name(self) -> &'static str {
        match self {
            Backend::Mistral => "mistral",
            Backend::Meta => "meta",
            Backend::HuggingFace => "huggingface",
            Backend::Tii => "tii",
            Backend::Cohere => "cohere",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Backend::Mistral => "Mistral AI",
            Backend::Meta => "Meta",
            Backend::HuggingFace => "Hugging Face",
            Backend::Tii => "TII",
            Backend::Cohere => "Cohere",
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mistral" | "mistralai" => Ok(Backend::Mistral),
            "meta" | "meta-llama" => Ok(Backend::Meta),
            "huggingface" | "huggingfaceh4" => Ok(Backend::HuggingFace),
            "tii" | "tiiuae" => Ok(Backend::Tii),
            "cohere" | "cohereforai" => Ok(Backend::Cohere),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// Model definition with ranking metadata
#[derive(Debug, Clone)]
pub struct ModelDef {
    /// Model path on the inference endpoint
    pub id: &'static str,
    pub backend: Backend,
    pub description: &'static str,
    pub cost: f64,
    pub quality: f64,
}

/// Get all known model definitions
pub fn all_models() -> &'static [ModelDef] {
    &[
        ModelDef {
            id: "mistralai/Mistral-7B-Instruct-v0.2",
            backend: Backend::Mistral,
            description: "Mistral 7B Instruct (balanced)",
            cost: 0.2,
            quality: 0.62,
        },
        ModelDef {
            id: "meta-llama/Meta-Llama-3-8B-Instruct",
            backend: Backend::Meta,
            description: "Llama 3 8B Instruct",
            cost: 0.2,
            quality: 0.68,
        },
        ModelDef {
            id: "meta-llama/Meta-Llama-3-70B-Instruct",
            backend: Backend::Meta,
            description: "Llama 3 70B Instruct (strong, slower)",
            cost: 0.9,
            quality: 0.82,
        },
        ModelDef {
            id: "HuggingFaceH4/zephyr-7b-beta",
            backend: Backend::HuggingFace,
            description: "Zephyr 7B beta",
            cost: 0.15,
            quality: 0.55,
        },
        ModelDef {
            id: "tiiuae/falcon-7b-instruct",
            backend: Backend::Tii,
            description: "Falcon 7B Instruct (cheapest)",
            cost: 0.1,
            quality: 0.4,
        },
        ModelDef {
            id: "CohereForAI/c4ai-command-r-plus",
            backend: Backend::Cohere,
            description: "Command R+ (most capable, expensive)",
            cost: 3.0,
            quality: 0.85,
        },
    ]
}

/// Look up a model by id
pub fn find_model(id: &str) -> Option<&'static ModelDef> {
    all_models().iter().find(|m| m.id == id.trim())
}
