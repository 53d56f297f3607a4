use crate::style::{Gradient, StyleLookup};
use netscope_core::GraphNode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Label used in the legend for nodes without an operator type.
pub const UNTYPED_LABEL: &str = "default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeStat {
    pub op_type: String,
    pub count: usize,
    pub icon: String,
    pub gradient: Gradient,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStat {
    pub category: String,
    pub count: usize,
    /// Share of all nodes, in `[0, 100]`.
    pub percentage: f64,
    /// Sorted by count, descending.
    pub types: Vec<TypeStat>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub total_nodes: usize,
    /// Sorted by count, descending. Ties keep first-appearance order.
    pub categories: Vec<CategoryStat>,
}

impl Legend {
    pub fn from_nodes(nodes: &[GraphNode], styles: &impl StyleLookup) -> Self {
        aggregate(nodes.iter().map(|n| n.op_type.as_str()), styles)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn category(&self, name: &str) -> Option<&CategoryStat> {
        self.categories.iter().find(|c| c.category == name)
    }
}

/// Group operator types by style category.
///
/// Counts are gathered in one pass, percentages filled in a second once the
/// total is known.
pub fn aggregate<'a, I>(op_types: I, styles: &impl StyleLookup) -> Legend
where
    I: IntoIterator<Item = &'a str>,
{
    let mut categories: Vec<CategoryStat> = Vec::new();
    let mut category_slots: HashMap<String, usize> = HashMap::new();
    let mut type_slots: Vec<HashMap<String, usize>> = Vec::new();
    let mut total = 0usize;

    for op_type in op_types {
        total += 1;
        let style = styles.resolve(op_type);
        let label = if op_type.is_empty() {
            UNTYPED_LABEL
        } else {
            op_type
        };

        let slot = *category_slots
            .entry(style.category.clone())
            .or_insert_with(|| {
                categories.push(CategoryStat {
                    category: style.category.clone(),
                    count: 0,
                    percentage: 0.0,
                    types: Vec::new(),
                });
                type_slots.push(HashMap::new());
                categories.len() - 1
            });

        let category = &mut categories[slot];
        category.count += 1;

        let type_slot = *type_slots[slot].entry(label.to_string()).or_insert_with(|| {
            category.types.push(TypeStat {
                op_type: label.to_string(),
                count: 0,
                icon: style.icon.clone(),
                gradient: style.gradient,
            });
            category.types.len() - 1
        });
        category.types[type_slot].count += 1;
    }

    for category in &mut categories {
        category.percentage = category.count as f64 / total as f64 * 100.0;
        category.types.sort_by(|a, b| b.count.cmp(&a.count));
    }
    categories.sort_by(|a, b| b.count.cmp(&a.count));

    Legend {
        total_nodes: total,
        categories,
    }
}
