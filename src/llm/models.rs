use serde::{Deserialize, Serialize};
use std::fmt;

/// Primary model chain, tried in order. First success wins.
pub const DEFAULT_PRIMARY_MODELS: [&str; 2] = [
    "arcee-ai/trinity-large-preview:free",
    "stepfun/step-3.5-flash:free",
];

/// Fallback chain, used only once the primary chain is exhausted.
///
/// Ships with the same models as the primary chain; override it in config to
/// escalate to different models.
pub const DEFAULT_FALLBACK_MODELS: [&str; 2] = [
    "arcee-ai/trinity-large-preview:free",
    "stepfun/step-3.5-flash:free",
];

/// Opaque identifier of a provider-hosted model (e.g. `vendor/model:free`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ModelId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Which escalation stage a tier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierKind {
    Primary,
    Fallback,
}

impl TierKind {
    pub fn label(&self) -> &'static str {
        match self {
            TierKind::Primary => "primary",
            TierKind::Fallback => "fallback",
        }
    }
}

impl fmt::Display for TierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered, duplicate-free list of models attempted as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<ModelId>", into = "Vec<ModelId>")]
pub struct ModelTier {
    models: Vec<ModelId>,
}

impl ModelTier {
    /// Build a tier from configured ids: each id is trimmed, blank ids are
    /// dropped and the first occurrence of each model is kept.
    pub fn new<I, M>(models: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<ModelId>,
    {
        let mut tier = Self { models: Vec::new() };
        for model in models {
            let model = model.into();
            tier.push_unique(ModelId::new(model.as_str().trim()));
        }
        tier
    }

    pub fn default_primary() -> Self {
        Self::new(DEFAULT_PRIMARY_MODELS)
    }

    pub fn default_fallback() -> Self {
        Self::new(DEFAULT_FALLBACK_MODELS)
    }

    fn push_unique(&mut self, model: ModelId) {
        if model.as_str().trim().is_empty() {
            return;
        }
        if !self.models.contains(&model) {
            self.models.push(model);
        }
    }

    /// Effective attempt order with a caller-preferred model moved to the front.
    ///
    /// The preferred id is used verbatim and compared by plain string equality;
    /// it appears exactly once and later duplicates are dropped. A blank id
    /// counts as no preference.
    pub fn with_preferred(&self, preferred: Option<&str>) -> Self {
        match preferred {
            Some(preferred) => {
                let mut tier = Self {
                    models: Vec::with_capacity(self.models.len() + 1),
                };
                tier.push_unique(ModelId::new(preferred));
                for model in &self.models {
                    tier.push_unique(model.clone());
                }
                tier
            }
            None => self.clone(),
        }
    }

    pub fn models(&self) -> &[ModelId] {
        &self.models
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelId> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl From<Vec<ModelId>> for ModelTier {
    fn from(models: Vec<ModelId>) -> Self {
        Self::new(models)
    }
}

impl From<ModelTier> for Vec<ModelId> {
    fn from(tier: ModelTier) -> Self {
        tier.models
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.models.iter().map(ModelId::as_str).collect();
        write!(f, "[{}]", ids.join(", "))
    }
}
