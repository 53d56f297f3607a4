pub mod graph;
pub mod layout;
pub mod legend;
pub mod render;
pub mod style;
pub mod viewport;

pub use graph::{EdgeIndex, GraphModel, GraphSummary, NodeIndex};
pub use layout::{GraphLayout, LayeredLayouter, LayoutConfig, LayoutNode, Layouter, Separation};
pub use legend::{CategoryStat, Legend, TypeStat, aggregate};
pub use render::{RenderedEdge, StyledNode, render_edges, style_nodes};
pub use style::{Color, Gradient, StyleDescriptor, StyleLookup, StyleTaxonomy};
pub use viewport::{Bounds, FitOptions, Focus, ViewportAnimator, ViewportSpec, fit};
