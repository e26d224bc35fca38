use std::fmt;

use serde::Serialize;

pub const UNLABELED: &str = "unlabeled";
pub const NO_CALL: &str = "<no call>";

/// Published fine-grained label after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PublishedLabel {
    Labeled(String),
    Unlabeled,
}

impl PublishedLabel {
    pub fn is_labeled(&self) -> bool {
        matches!(self, PublishedLabel::Labeled(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            PublishedLabel::Labeled(label) => label,
            PublishedLabel::Unlabeled => UNLABELED,
        }
    }
}

impl fmt::Display for PublishedLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predictor output for one cell.
///
/// `NoCall` means the predictor declined to assign a label. It orders after
/// every named label so it lands in the last column of the fine table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Prediction {
    Label(String),
    NoCall,
}

impl Prediction {
    pub fn label(&self) -> Option<&str> {
        match self {
            Prediction::Label(label) => Some(label),
            Prediction::NoCall => None,
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label().unwrap_or(NO_CALL))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoarseLabel {
    Malignant,
    Stromal,
}

impl CoarseLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            CoarseLabel::Malignant => "malignant",
            CoarseLabel::Stromal => "stromal",
        }
    }
}

impl fmt::Display for CoarseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
