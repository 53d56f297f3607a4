//! Operator Style System
//!
//! Maps ONNX-style operator types to a colour, gradient, icon and semantic
//! category. The table is an immutable [`StyleTaxonomy`] value handed to
//! whoever needs it; nothing here is global or mutable.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// RGB color representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self::rgb(r, g, b))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value).ok_or_else(|| format!("invalid hex color: {value}"))
    }
}

/// Two-stop diagonal gradient used as a node background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gradient {
    pub from: Color,
    pub to: Color,
}

impl Gradient {
    pub const fn new(from: Color, to: Color) -> Self {
        Self { from, to }
    }

    /// CSS rendering for web hosts.
    pub fn css(&self) -> String {
        format!("linear-gradient(45deg, {}, {})", self.from, self.to)
    }
}

/// Visual style of one operator type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDescriptor {
    pub color: Color,
    pub gradient: Gradient,
    pub icon: String,
    pub category: String,
}

impl StyleDescriptor {
    pub fn new(
        color: Color,
        gradient: Gradient,
        icon: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            color,
            gradient,
            icon: icon.into(),
            category: category.into(),
        }
    }

    pub fn color_hex(&self) -> String {
        self.color.to_hex()
    }
}

/// Anything that can answer "how is this operator drawn".
///
/// Implementations must be total: unknown operator types resolve to a
/// fallback descriptor rather than failing.
pub trait StyleLookup {
    fn resolve(&self, op_type: &str) -> &StyleDescriptor;
}

// ============================================================================
// Built-in Palette
// ============================================================================

struct Family {
    category: &'static str,
    from: Color,
    to: Color,
}

const FEATURE_EXTRACTION: Family = Family {
    category: "Feature Extraction",
    from: Color::rgb(0x42, 0x85, 0xf4),
    to: Color::rgb(0x2b, 0x6c, 0xb0),
};
const DENSE: Family = Family {
    category: "Dense",
    from: Color::rgb(0xea, 0x43, 0x35),
    to: Color::rgb(0xc5, 0x30, 0x30),
};
const SEQUENCE: Family = Family {
    category: "Sequence",
    from: Color::rgb(0xec, 0x48, 0x99),
    to: Color::rgb(0xbe, 0x18, 0x5d),
};
const ATTENTION: Family = Family {
    category: "Attention",
    from: Color::rgb(0x93, 0x33, 0xea),
    to: Color::rgb(0x6b, 0x21, 0xa8),
};
const ACTIVATION: Family = Family {
    category: "Activation",
    from: Color::rgb(0x34, 0xa8, 0x53),
    to: Color::rgb(0x16, 0x65, 0x34),
};
const NORMALIZATION: Family = Family {
    category: "Normalization",
    from: Color::rgb(0x00, 0x96, 0x88),
    to: Color::rgb(0x04, 0x74, 0x81),
};
const SHAPE: Family = Family {
    category: "Shape",
    from: Color::rgb(0x9c, 0x27, 0xb0),
    to: Color::rgb(0x6b, 0x46, 0xc1),
};
const ELEMENT_WISE: Family = Family {
    category: "Element-wise",
    from: Color::rgb(0x67, 0x3a, 0xb7),
    to: Color::rgb(0x4c, 0x51, 0xbf),
};
const REDUCTION: Family = Family {
    category: "Reduction",
    from: Color::rgb(0x64, 0x74, 0x8b),
    to: Color::rgb(0x47, 0x55, 0x69),
};
const CONSTANTS: Family = Family {
    category: "Constants",
    from: Color::rgb(0x0e, 0xa5, 0xe9),
    to: Color::rgb(0x02, 0x84, 0xc7),
};
const OTHER: Family = Family {
    category: "Other",
    from: Color::rgb(0x73, 0x73, 0x73),
    to: Color::rgb(0x40, 0x40, 0x40),
};

const DEFAULT_ICON: &str = "◆";

const BUILTIN_STYLES: &[(&str, &str, Family)] = &[
    ("Conv", "⊞", FEATURE_EXTRACTION),
    ("ConvTranspose", "⊟", FEATURE_EXTRACTION),
    ("MaxPool", "▼", FEATURE_EXTRACTION),
    ("AveragePool", "▽", FEATURE_EXTRACTION),
    ("GlobalAveragePool", "◇", FEATURE_EXTRACTION),
    ("Linear", "→", DENSE),
    ("Gemm", "→", DENSE),
    ("MatMul", "⊗", DENSE),
    ("LSTM", "↻", SEQUENCE),
    ("GRU", "↻", SEQUENCE),
    ("RNN", "↻", SEQUENCE),
    ("Embedding", "⋈", SEQUENCE),
    ("MultiHeadAttention", "⊕", ATTENTION),
    ("Attention", "⊕", ATTENTION),
    ("SelfAttention", "⊕", ATTENTION),
    ("ReLU", "⌈", ACTIVATION),
    // ONNX spells it `Relu`.
    ("Relu", "⌈", ACTIVATION),
    ("GELU", "∿", ACTIVATION),
    ("Sigmoid", "σ", ACTIVATION),
    ("Tanh", "∫", ACTIVATION),
    ("BatchNormalization", "β", NORMALIZATION),
    ("LayerNorm", "λ", NORMALIZATION),
    ("GroupNorm", "γ", NORMALIZATION),
    ("Dropout", "⊘", NORMALIZATION),
    ("Reshape", "⇄", SHAPE),
    ("Transpose", "⇄", SHAPE),
    ("Flatten", "⇒", SHAPE),
    ("Squeeze", "⇒", SHAPE),
    ("Add", "+", ELEMENT_WISE),
    ("Mul", "×", ELEMENT_WISE),
    ("Div", "÷", ELEMENT_WISE),
    ("Sub", "−", ELEMENT_WISE),
    ("ReduceMean", "μ", REDUCTION),
    ("ReduceSum", "Σ", REDUCTION),
    ("ReduceMax", "∨", REDUCTION),
    ("ReduceMin", "∧", REDUCTION),
    ("Constant", "∁", CONSTANTS),
    ("Identity", "≡", CONSTANTS),
];

fn family_descriptor(family: &Family, icon: &str) -> StyleDescriptor {
    StyleDescriptor::new(
        family.from,
        Gradient::new(family.from, family.to),
        icon,
        family.category,
    )
}

// ============================================================================
// Taxonomy
// ============================================================================

/// Immutable operator-type -> style table with a mandatory fallback entry.
#[derive(Debug, Clone)]
pub struct StyleTaxonomy {
    entries: Vec<(String, StyleDescriptor)>,
    index: HashMap<String, usize>,
    fallback: StyleDescriptor,
}

impl Default for StyleTaxonomy {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StyleTaxonomy {
    /// The operator families shipped with the viewer.
    pub fn builtin() -> Self {
        Self::from_entries(
            BUILTIN_STYLES
                .iter()
                .map(|(op_type, icon, family)| (op_type.to_string(), family_descriptor(family, icon))),
            family_descriptor(&OTHER, DEFAULT_ICON),
        )
    }

    /// Build a custom table. Later duplicates of an operator type win.
    pub fn from_entries<I>(entries: I, fallback: StyleDescriptor) -> Self
    where
        I: IntoIterator<Item = (String, StyleDescriptor)>,
    {
        let mut table: Vec<(String, StyleDescriptor)> = Vec::new();
        let mut index = HashMap::new();
        for (op_type, descriptor) in entries {
            match index.get(&op_type) {
                Some(&existing) => table[existing] = (op_type, descriptor),
                None => {
                    index.insert(op_type.clone(), table.len());
                    table.push((op_type, descriptor));
                }
            }
        }

        Self {
            entries: table,
            index,
            fallback,
        }
    }

    pub fn fallback(&self) -> &StyleDescriptor {
        &self.fallback
    }

    pub fn contains(&self, op_type: &str) -> bool {
        self.index.contains_key(op_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleDescriptor)> {
        self.entries.iter().map(|(op, style)| (op.as_str(), style))
    }

    /// Distinct categories in table order, fallback category last.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        let all = self
            .entries
            .iter()
            .map(|(_, style)| style.category.as_str())
            .chain(std::iter::once(self.fallback.category.as_str()));
        for category in all {
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
        categories
    }
}

impl StyleLookup for StyleTaxonomy {
    fn resolve(&self, op_type: &str) -> &StyleDescriptor {
        self.index
            .get(op_type)
            .map(|&i| &self.entries[i].1)
            .unwrap_or(&self.fallback)
    }
}
