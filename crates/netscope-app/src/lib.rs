use anyhow::Context;
use crossbeam_channel::Receiver;
use netscope_core::{GraphError, LayoutDirection, NodeDetails, NodeId, RawGraph, WeightInfo};
use netscope_events::telemetry::{
    CMD_FIT_VIEW, CMD_LOAD_GRAPH, CMD_SELECT_NODE, CMD_SET_DIRECTION, CMD_TOGGLE_LABELS,
    CommandSpan,
};
use netscope_events::{Event, EventBus};
use netscope_graph::{
    FitOptions, GraphLayout, GraphModel, GraphSummary, LayeredLayouter, Layouter, StyleTaxonomy,
    ViewportAnimator, ViewportSpec, fit,
};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub mod settings;
pub mod snapshot;

pub use settings::ViewerSettings;
pub use snapshot::GraphSnapshot;

struct LoadedGraph {
    model: GraphModel,
    layout: GraphLayout,
    weights: BTreeMap<String, WeightInfo>,
}

struct ViewerState {
    settings: ViewerSettings,
    graph: Option<LoadedGraph>,
}

/// Headless viewer: every command computes a fresh snapshot and swaps it in
/// whole, so readers never observe a half-updated layout.
#[derive(Clone)]
pub struct ViewerController {
    styles: Arc<StyleTaxonomy>,
    state: Arc<Mutex<ViewerState>>,
    snapshot: Arc<RwLock<Arc<GraphSnapshot>>>,
    events: EventBus,
}

impl Default for ViewerController {
    fn default() -> Self {
        Self::new(ViewerSettings::default())
    }
}

impl ViewerController {
    pub fn new(settings: ViewerSettings) -> Self {
        Self::with_styles(settings, StyleTaxonomy::builtin())
    }

    pub fn with_styles(settings: ViewerSettings, styles: StyleTaxonomy) -> Self {
        let initial = GraphSnapshot {
            direction: settings.layout_direction,
            show_edge_labels: settings.show_edge_labels,
            ..GraphSnapshot::default()
        };
        Self {
            styles: Arc::new(styles),
            state: Arc::new(Mutex::new(ViewerState {
                settings,
                graph: None,
            })),
            snapshot: Arc::new(RwLock::new(Arc::new(initial))),
            events: EventBus::new(),
        }
    }

    pub fn events(&self) -> Receiver<Event> {
        self.events.receiver()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.events
    }

    pub fn snapshot(&self) -> Arc<GraphSnapshot> {
        self.snapshot.read().clone()
    }

    pub fn settings(&self) -> ViewerSettings {
        self.state.lock().settings.clone()
    }

    pub fn summary(&self) -> Option<GraphSummary> {
        self.state.lock().graph.as_ref().map(|g| g.model.summary())
    }

    fn publish(&self, snapshot: GraphSnapshot) -> Arc<GraphSnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.snapshot.write() = snapshot.clone();
        snapshot
    }

    fn viewport_event(viewport: ViewportSpec) -> Event {
        Event::ViewportChanged {
            zoom: viewport.zoom,
            pan_x: viewport.pan_x,
            pan_y: viewport.pan_y,
        }
    }

    fn run_layout(settings: &ViewerSettings, model: &GraphModel) -> GraphLayout {
        LayeredLayouter::with_config(settings.layout.clone(), settings.layout_direction)
            .execute(model)
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Replace the current graph. On failure the previous snapshot stays
    /// published and `LoadFailed` is emitted.
    pub fn load_graph(&self, raw: RawGraph) -> anyhow::Result<Arc<GraphSnapshot>> {
        self.load_with(CMD_LOAD_GRAPH, || GraphModel::from_payload(raw))
    }

    pub fn load_json(&self, json: &str) -> anyhow::Result<Arc<GraphSnapshot>> {
        self.load_with(CMD_LOAD_GRAPH, || GraphModel::from_json(json))
    }

    pub fn load_file(&self, path: &Path) -> anyhow::Result<Arc<GraphSnapshot>> {
        let content = match std::fs::read_to_string(path)
            .with_context(|| format!("failed to load graph: cannot read {}", path.display()))
        {
            Ok(content) => content,
            Err(e) => {
                CommandSpan::begin(CMD_LOAD_GRAPH).fail(format!("{e:#}"));
                self.events.publish(Event::LoadFailed {
                    error: format!("{e:#}"),
                });
                return Err(e);
            }
        };
        self.load_json(&content)
    }

    fn load_with<F>(&self, command: &'static str, build: F) -> anyhow::Result<Arc<GraphSnapshot>>
    where
        F: FnOnce() -> Result<GraphModel, GraphError>,
    {
        let span = CommandSpan::begin(command);
        let model = match build() {
            Ok(model) => model,
            Err(e) => {
                span.fail(&e);
                self.events.publish(Event::LoadFailed {
                    error: e.to_string(),
                });
                return Err(e.into());
            }
        };

        let mut state = self.state.lock();
        let layout = Self::run_layout(&state.settings, &model);
        let viewport = fit(&layout.nodes, &state.settings.initial_fit);
        let snapshot = GraphSnapshot::build(
            &model,
            &layout,
            &self.styles,
            state.settings.show_edge_labels,
            viewport,
        );
        span.context(&format!(
            "{} nodes, {} edges, {} ranks",
            model.node_count(),
            model.edge_count(),
            layout.rank_count
        ));
        tracing::info!(
            "Loaded graph with {} nodes and {} edges",
            model.node_count(),
            model.edge_count()
        );

        let loaded_event = Event::GraphLoaded {
            node_count: model.node_count(),
            edge_count: model.edge_count(),
            direction: layout.direction,
        };
        let empty = model.is_empty();
        state.graph = Some(LoadedGraph {
            model,
            layout,
            weights: BTreeMap::new(),
        });
        let published = self.publish(snapshot);
        drop(state);

        self.events.publish(loaded_event);
        if empty {
            tracing::warn!("Loaded graph has no nodes");
            self.events.publish(Event::GraphEmpty);
        }
        self.events.publish(Self::viewport_event(viewport));
        span.succeed();
        Ok(published)
    }

    /// Initializer table used when answering node detail requests.
    pub fn attach_weights(&self, weights: BTreeMap<String, WeightInfo>) -> anyhow::Result<()> {
        let mut state = self.state.lock();
        let graph = state.graph.as_mut().context("no graph loaded")?;
        graph.weights = weights;
        Ok(())
    }

    // ========================================================================
    // View commands
    // ========================================================================

    /// Re-run layout in `direction` and frame the whole graph again.
    pub fn set_direction(&self, direction: LayoutDirection) -> Arc<GraphSnapshot> {
        self.change_direction(|_| direction)
    }

    pub fn toggle_direction(&self) -> Arc<GraphSnapshot> {
        self.change_direction(LayoutDirection::toggled)
    }

    /// `pick` sees the direction held under the state lock, so concurrent
    /// toggles apply one after another.
    fn change_direction<F>(&self, pick: F) -> Arc<GraphSnapshot>
    where
        F: FnOnce(LayoutDirection) -> LayoutDirection,
    {
        let span = CommandSpan::begin(CMD_SET_DIRECTION);
        let mut state = self.state.lock();
        let direction = pick(state.settings.layout_direction);
        state.settings.layout_direction = direction;

        let current = self.snapshot();
        let Some(graph) = state.graph.as_ref() else {
            let published = self.publish(GraphSnapshot {
                direction,
                ..(*current).clone()
            });
            span.succeed();
            return published;
        };

        let layout = Self::run_layout(&state.settings, &graph.model);
        let viewport = fit(&layout.nodes, &state.settings.toolbar_fit);
        let mut snapshot = GraphSnapshot::build(
            &graph.model,
            &layout,
            &self.styles,
            state.settings.show_edge_labels,
            viewport,
        );
        snapshot.selected = current.selected.clone();
        let rank_count = layout.rank_count;
        if let Some(graph) = state.graph.as_mut() {
            graph.layout = layout;
        }
        let published = self.publish(snapshot);
        drop(state);

        self.events.publish(Event::LayoutChanged {
            direction,
            rank_count,
        });
        self.events.publish(Self::viewport_event(viewport));
        span.succeed();
        published
    }

    /// Edge labels only change the edge projection; positions are kept.
    pub fn set_edge_labels(&self, visible: bool) -> Arc<GraphSnapshot> {
        self.change_edge_labels(|_| visible)
    }

    pub fn toggle_edge_labels(&self) -> Arc<GraphSnapshot> {
        self.change_edge_labels(|visible| !visible)
    }

    fn change_edge_labels<F>(&self, pick: F) -> Arc<GraphSnapshot>
    where
        F: FnOnce(bool) -> bool,
    {
        let span = CommandSpan::begin(CMD_TOGGLE_LABELS);
        let mut state = self.state.lock();
        let visible = pick(state.settings.show_edge_labels);
        state.settings.show_edge_labels = visible;

        let mut snapshot = (*self.snapshot()).clone();
        snapshot.show_edge_labels = visible;
        if let Some(graph) = state.graph.as_ref() {
            snapshot.edges = netscope_graph::render_edges(&graph.model, visible);
        }
        let published = self.publish(snapshot);
        drop(state);

        self.events.publish(Event::EdgeLabelsToggled { visible });
        span.succeed();
        published
    }

    /// Frame the whole graph. Returns the transition from the current
    /// viewport; the published snapshot already holds the target.
    pub fn fit_view(&self) -> ViewportAnimator {
        let options = self.state.lock().settings.toolbar_fit.clone();
        self.fit_with(&options)
    }

    pub fn fit_with(&self, options: &FitOptions) -> ViewportAnimator {
        let span = CommandSpan::begin(CMD_FIT_VIEW);
        let state = self.state.lock();
        let duration = Duration::from_millis(state.settings.fit_duration_ms);
        let current = self.snapshot();
        let target = match state.graph.as_ref() {
            Some(graph) => fit(&graph.layout.nodes, options),
            None => ViewportSpec::IDENTITY,
        };
        self.publish(GraphSnapshot {
            viewport: target,
            ..(*current).clone()
        });
        drop(state);

        self.events.publish(Self::viewport_event(target));
        span.succeed();
        ViewportAnimator::new(current.viewport, target).with_duration(duration)
    }

    /// Resize the viewing area used by subsequent fits.
    pub fn set_viewport_size(&self, width: f32, height: f32) {
        let mut state = self.state.lock();
        let settings = &mut state.settings;
        for options in [&mut settings.initial_fit, &mut settings.toolbar_fit] {
            options.viewport_width = width;
            options.viewport_height = height;
        }
    }

    // ========================================================================
    // Selection
    // ========================================================================

    pub fn select_node(&self, id: &NodeId) -> anyhow::Result<NodeDetails> {
        let span = CommandSpan::begin(CMD_SELECT_NODE);
        let state = self.state.lock();
        let details = state
            .graph
            .as_ref()
            .context("no graph loaded")
            .and_then(|graph| Ok(graph.model.node_details(id, &graph.weights)?));

        let details = match details {
            Ok(details) => details,
            Err(e) => {
                span.fail(format!("{e:#}"));
                return Err(e);
            }
        };

        self.publish(GraphSnapshot {
            selected: Some(id.clone()),
            ..(*self.snapshot()).clone()
        });
        drop(state);

        self.events.publish(Event::NodeSelected { id: id.clone() });
        span.succeed();
        Ok(details)
    }

    pub fn clear_selection(&self) {
        let state = self.state.lock();
        self.publish(GraphSnapshot {
            selected: None,
            ..(*self.snapshot()).clone()
        });
        drop(state);
        self.events.publish(Event::SelectionCleared);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAIN: &str = r#"{
        "nodes": [
            {"id": "a", "type": "Conv"},
            {"id": "b", "type": "Relu"},
            {"id": "c", "type": "Gemm"}
        ],
        "edges": [
            {"source": "a", "target": "b", "data": {"tensor_name": "x1"}},
            {"source": "b", "target": "c", "data": {"tensor_name": "x2"}}
        ]
    }"#;

    #[test]
    fn test_initial_snapshot_is_empty() {
        let controller = ViewerController::default();
        let snapshot = controller.snapshot();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.viewport, ViewportSpec::IDENTITY);
        assert!(controller.summary().is_none());
    }

    #[test]
    fn test_load_publishes_snapshot() {
        let controller = ViewerController::default();
        let snapshot = controller.load_json(CHAIN).unwrap();

        assert_eq!(snapshot.nodes.len(), 3);
        assert_eq!(snapshot.rank_count, 3);
        assert_eq!(snapshot.edges[0].label.as_deref(), Some("x1"));
        assert!(snapshot.warning.is_none());
        assert!(Arc::ptr_eq(&snapshot, &controller.snapshot()));
        assert_eq!(controller.summary().unwrap().num_edges, 2);
    }

    #[test]
    fn test_select_unknown_node_fails() {
        let controller = ViewerController::default();
        assert!(controller.select_node(&NodeId::from("a")).is_err());

        controller.load_json(CHAIN).unwrap();
        let err = controller.select_node(&NodeId::from("zzz")).unwrap_err();
        assert!(err.to_string().contains("zzz"));
        assert!(controller.snapshot().selected.is_none());
    }
}
