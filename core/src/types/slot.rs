use std::fmt;

/// Anatomical image slot for an orthodontic case
///
/// A complete case has exactly one image per slot. Iteration order is fixed
/// and drives page order in the generated report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum AnatomicalSlot {
    Frontal,
    RightLateral,
    LeftLateral,
    UpperOcclusal,
    LowerOcclusal,
}

impl AnatomicalSlot {
    /// All slots in report order
    pub const ALL: [AnatomicalSlot; 5] = [
        AnatomicalSlot::Frontal,
        AnatomicalSlot::RightLateral,
        AnatomicalSlot::LeftLateral,
        AnatomicalSlot::UpperOcclusal,
        AnatomicalSlot::LowerOcclusal,
    ];

    /// Returns the storage key used for this slot
    pub fn as_str(&self) -> &'static str {
        match self {
            AnatomicalSlot::Frontal => "frontal",
            AnatomicalSlot::RightLateral => "right_lateral",
            AnatomicalSlot::LeftLateral => "left_lateral",
            AnatomicalSlot::UpperOcclusal => "upper_occlusal",
            AnatomicalSlot::LowerOcclusal => "lower_occlusal",
        }
    }

    /// Position of this slot in [`AnatomicalSlot::ALL`]
    pub fn index(&self) -> usize {
        match self {
            AnatomicalSlot::Frontal => 0,
            AnatomicalSlot::RightLateral => 1,
            AnatomicalSlot::LeftLateral => 2,
            AnatomicalSlot::UpperOcclusal => 3,
            AnatomicalSlot::LowerOcclusal => 4,
        }
    }

    /// Detection model used for this slot
    ///
    /// Both lateral views share one model, as do both occlusal views.
    pub fn model_kind(&self) -> ModelKind {
        match self {
            AnatomicalSlot::Frontal => ModelKind::Frontal,
            AnatomicalSlot::RightLateral | AnatomicalSlot::LeftLateral => ModelKind::Lateral,
            AnatomicalSlot::UpperOcclusal | AnatomicalSlot::LowerOcclusal => ModelKind::Occlusal,
        }
    }

    /// Title shown above the annotated page, e.g. `Right_lateral Predictions`
    pub fn page_title(&self) -> String {
        let key = self.as_str();
        let mut chars = key.chars();
        match chars.next() {
            Some(first) => format!("{}{} Predictions", first.to_uppercase(), chars.as_str()),
            None => "Predictions".to_string(),
        }
    }

    /// Parses a slot from a key or a file name such as `upper_occlusal.jpg`
    ///
    /// Matching is case-insensitive and accepts `-` or spaces in place of `_`.
    pub fn from_key(s: &str) -> Option<Self> {
        let stem = match s.trim().rsplit_once('.') {
            Some((stem, _ext)) if !stem.is_empty() => stem,
            _ => s.trim(),
        };
        let normalized = stem.to_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|slot| slot.as_str() == normalized)
    }
}

impl fmt::Display for AnatomicalSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Detection model family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "lowercase"))]
pub enum ModelKind {
    Frontal,
    Lateral,
    Occlusal,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [ModelKind::Frontal, ModelKind::Lateral, ModelKind::Occlusal];

    pub fn simple_name(&self) -> &'static str {
        match self {
            ModelKind::Frontal => "frontal",
            ModelKind::Lateral => "lateral",
            ModelKind::Occlusal => "occlusal",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}
