use crate::layout::LayoutNode;
use netscope_core::NodeId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Screen transform: `screen = world * zoom + pan`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSpec {
    pub zoom: f32,
    pub pan_x: f32,
    pub pan_y: f32,
}

impl Default for ViewportSpec {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewportSpec {
    pub const IDENTITY: Self = Self {
        zoom: 1.0,
        pan_x: 0.0,
        pan_y: 0.0,
    };

    pub fn to_screen(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.zoom + self.pan_x, y * self.zoom + self.pan_y)
    }
}

/// Axis-aligned world-space box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn of<'a>(nodes: impl IntoIterator<Item = &'a LayoutNode>) -> Option<Self> {
        nodes.into_iter().fold(None, |acc: Option<Bounds>, node| {
            let (x1, y1, x2, y2) = (node.x, node.y, node.x + node.width, node.y + node.height);
            Some(match acc {
                None => Bounds {
                    min_x: x1,
                    min_y: y1,
                    max_x: x2,
                    max_y: y2,
                },
                Some(b) => Bounds {
                    min_x: b.min_x.min(x1),
                    min_y: b.min_y.min(y1),
                    max_x: b.max_x.max(x2),
                    max_y: b.max_y.max(y2),
                },
            })
        })
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// Which nodes a fit should frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Focus {
    #[default]
    All,
    /// The first `n` nodes in node order.
    First(usize),
    Nodes(Vec<NodeId>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Fraction of the box added as margin.
    pub padding: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub focus: Focus,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self::full()
    }
}

impl FitOptions {
    pub const DEFAULT_PADDING: f32 = 0.2;
    pub const DEFAULT_VIEWPORT: (f32, f32) = (1280.0, 800.0);
    pub const INITIAL_FOCUS_COUNT: usize = 5;
    pub const FULL_ZOOM: (f32, f32) = (0.1, 2.0);

    /// Fit used right after a graph loads: frames the leading nodes with
    /// tighter zoom limits.
    pub fn initial_load() -> Self {
        Self {
            padding: Self::DEFAULT_PADDING,
            min_zoom: 0.5,
            max_zoom: 1.5,
            viewport_width: Self::DEFAULT_VIEWPORT.0,
            viewport_height: Self::DEFAULT_VIEWPORT.1,
            focus: Focus::First(Self::INITIAL_FOCUS_COUNT),
        }
    }

    /// Toolbar fit over the whole graph.
    pub fn full() -> Self {
        Self {
            padding: Self::DEFAULT_PADDING,
            min_zoom: Self::FULL_ZOOM.0,
            max_zoom: Self::FULL_ZOOM.1,
            viewport_width: Self::DEFAULT_VIEWPORT.0,
            viewport_height: Self::DEFAULT_VIEWPORT.1,
            focus: Focus::All,
        }
    }

    pub fn with_viewport(mut self, width: f32, height: f32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    pub fn with_focus(mut self, focus: Focus) -> Self {
        self.focus = focus;
        self
    }

    /// `(min, max)` zoom in ascending order. Non-finite or non-positive
    /// limits fall back to the toolbar limits.
    pub fn zoom_limits(&self) -> (f32, f32) {
        let usable = |z: f32, fallback: f32| if z.is_finite() && z > 0.0 { z } else { fallback };
        let min = usable(self.min_zoom, Self::FULL_ZOOM.0);
        let max = usable(self.max_zoom, Self::FULL_ZOOM.1);
        (min.min(max), min.max(max))
    }
}

fn focused<'a>(nodes: &'a [LayoutNode], focus: &Focus) -> Vec<&'a LayoutNode> {
    let subset: Vec<&LayoutNode> = match focus {
        Focus::All => Vec::new(),
        Focus::First(n) => nodes.iter().take(*n).collect(),
        Focus::Nodes(ids) => nodes.iter().filter(|n| ids.contains(n.id())).collect(),
    };
    if subset.is_empty() {
        nodes.iter().collect()
    } else {
        subset
    }
}

/// Zoom and pan that frame the focused nodes in the viewing area.
///
/// No nodes gives the identity viewport. A focus that matches nothing
/// frames every node instead.
pub fn fit(nodes: &[LayoutNode], options: &FitOptions) -> ViewportSpec {
    let Some(bounds) = Bounds::of(focused(nodes, &options.focus)) else {
        return ViewportSpec::IDENTITY;
    };

    let padding = if options.padding.is_finite() {
        options.padding.max(0.0)
    } else {
        0.0
    };
    let scale = 1.0 + padding;
    let axis_zoom = |available: f32, extent: f32| {
        if extent > 0.0 && available.is_finite() && available > 0.0 {
            available / (extent * scale)
        } else {
            f32::INFINITY
        }
    };
    let (min_zoom, max_zoom) = options.zoom_limits();
    let zoom = axis_zoom(options.viewport_width, bounds.width())
        .min(axis_zoom(options.viewport_height, bounds.height()))
        .clamp(min_zoom, max_zoom);

    let (cx, cy) = bounds.center();
    ViewportSpec {
        zoom,
        pan_x: options.viewport_width / 2.0 - cx * zoom,
        pan_y: options.viewport_height / 2.0 - cy * zoom,
    }
}

/// Eased transition between two viewports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportAnimator {
    pub from: ViewportSpec,
    pub to: ViewportSpec,
    pub duration: Duration,
}

impl ViewportAnimator {
    pub const DEFAULT_DURATION: Duration = Duration::from_millis(800);

    pub fn new(from: ViewportSpec, to: ViewportSpec) -> Self {
        Self {
            from,
            to,
            duration: Self::DEFAULT_DURATION,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }

    pub fn sample(&self, elapsed: Duration) -> ViewportSpec {
        if self.is_finished(elapsed) {
            return self.to;
        }
        let t = elapsed.as_secs_f32() / self.duration.as_secs_f32();
        let eased = t * t * (3.0 - 2.0 * t);
        let lerp = |a: f32, b: f32| a + (b - a) * eased;
        ViewportSpec {
            zoom: lerp(self.from.zoom, self.to.zoom),
            pan_x: lerp(self.from.pan_x, self.to.pan_x),
            pan_y: lerp(self.from.pan_y, self.to.pan_y),
        }
    }
}
