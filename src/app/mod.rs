use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use eframe::egui::{self, Context, Pos2, TextureHandle, TextureOptions, Vec2};

use crate::graph::{EdgeKey, GraphSnapshot, QueryTicket, SnapshotPipeline};
use crate::query::{QueryResult, QuerySource};
use crate::render::programs::{CompoundEdgeProgram, GlyphNodeProgram, ParallelSlot};
use crate::render::{FrameScheduler, GlyphAtlas};

mod graph;
mod render_utils;
mod ui;

type FetchResult = Result<Option<QueryResult>, String>;

/// Startup settings taken from the command line.
#[derive(Clone, Debug)]
pub struct ExplorerConfig {
    pub input: Option<PathBuf>,
    pub kind_tag: String,
    pub edge_width: f32,
    pub layout_iterations: usize,
}

pub struct ExplorerApp {
    pipeline: SnapshotPipeline,
    in_flight: Vec<InFlight>,
    status: QueryStatus,
    scheduler: Arc<dyn FrameScheduler>,
    view: ViewModel,
}

struct InFlight {
    ticket: QueryTicket,
    source: QuerySource,
    rx: Receiver<FetchResult>,
}

/// Fallback poll interval while a query runs, in case a wake-up is missed.
const PENDING_POLL: Duration = Duration::from_millis(250);

enum QueryStatus {
    Ready,
    Failed { source: QuerySource, error: String },
}

/// Input produced by clicking the canvas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum GraphEvent {
    NodeClicked(String),
    EdgeClicked(EdgeKey),
    BackgroundClicked,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Selection {
    Node(String),
    Edge(EdgeKey),
}

struct ViewModel {
    snapshot: Arc<GraphSnapshot>,
    node_program: GlyphNodeProgram,
    edge_program: CompoundEdgeProgram,
    /// Keeps the atlas texture alive for as long as the node program samples it.
    _atlas_texture: TextureHandle,
    /// Layout positions by node id; snapshots themselves are never mutated.
    positions: HashMap<String, Pos2>,
    draw_cache: Option<DrawCache>,
    fit_pending: bool,
    pan: Vec2,
    zoom: f32,
    selection: Option<Selection>,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    input_path: String,
    kind_tag: String,
    export_path: String,
    export_status: Option<Result<String, String>>,
    edge_width: f32,
    layout_iterations: usize,
    show_node_labels: bool,
    show_edge_labels: bool,
    visible_node_count: usize,
    visible_edge_count: usize,
}

struct SearchMatchCache {
    query: String,
    sequence: u64,
    matches: Arc<Vec<usize>>,
}

/// Index-based view of the current snapshot, rebuilt when a new one lands.
struct DrawCache {
    sequence: u64,
    ids: Vec<String>,
    index_by_id: HashMap<String, usize>,
    /// `(source, target)` node indices, parallel to the snapshot's edge list.
    endpoints: Vec<(usize, usize)>,
    slots: Vec<ParallelSlot>,
    neighbors: Vec<Vec<usize>>,
    /// Centerlines from the last drawn frame, world space, for hit testing.
    edge_paths: Vec<Vec<Pos2>>,
}

impl ExplorerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: ExplorerConfig) -> Self {
        let atlas = Arc::new(GlyphAtlas::build());
        let texture =
            cc.egui_ctx
                .load_texture("glyph-atlas", atlas.color_image(), TextureOptions::LINEAR);
        let scheduler: Arc<dyn FrameScheduler> = Arc::new(cc.egui_ctx.clone());

        let mut app = Self {
            pipeline: SnapshotPipeline::new(),
            in_flight: Vec::new(),
            status: QueryStatus::Ready,
            scheduler,
            view: ViewModel::new(&config, atlas, texture),
        };
        if let Some(input) = &config.input {
            app.start_query(QuerySource::new(input, config.kind_tag.clone()));
        }
        app
    }

    fn start_query(&mut self, source: QuerySource) {
        let ticket = self.pipeline.begin();
        tracing::info!(
            path = %source.path.display(),
            kind = %source.kind_tag,
            "starting query"
        );
        let rx = spawn_query(source.clone(), Arc::clone(&self.scheduler));
        self.in_flight.push(InFlight { ticket, source, rx });
        self.status = QueryStatus::Ready;
    }

    /// Drains finished workers into the pipeline. Superseded results are dropped there.
    fn poll_queries(&mut self) {
        let mut still_running = Vec::with_capacity(self.in_flight.len());
        for query in std::mem::take(&mut self.in_flight) {
            match query.rx.try_recv() {
                Ok(Ok(result)) => {
                    self.pipeline.complete(query.ticket, result.map(Arc::new));
                }
                Ok(Err(error)) => {
                    tracing::warn!(error = %error, "query failed");
                    if !self.pipeline.is_superseded(query.ticket) {
                        self.status = QueryStatus::Failed {
                            source: query.source,
                            error,
                        };
                    }
                }
                Err(TryRecvError::Empty) => still_running.push(query),
                Err(TryRecvError::Disconnected) => {
                    tracing::warn!("query worker disconnected");
                    if !self.pipeline.is_superseded(query.ticket) {
                        self.status = QueryStatus::Failed {
                            source: query.source,
                            error: "Background query worker disconnected".to_owned(),
                        };
                    }
                }
            }
        }
        self.in_flight = still_running;
        self.view.set_snapshot(self.pipeline.current());
    }
}

/// Fetches on a worker thread and asks for a frame once the result is queued.
fn spawn_query(source: QuerySource, scheduler: Arc<dyn FrameScheduler>) -> Receiver<FetchResult> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let result = source.fetch().map_err(|error| format!("{error:#}"));
        let _ = tx.send(result);
        scheduler.request_frame();
    });

    rx
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.poll_queries();

        if let QueryStatus::Failed { source, error } = &self.status {
            let mut retry = None;
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.heading("Failed to load query result");
                ui.add_space(6.0);
                ui.label(error.as_str());
                ui.add_space(10.0);
                if ui.button("Retry").clicked() {
                    retry = Some(source.clone());
                }
            });
            if let Some(source) = retry {
                self.start_query(source);
            }
            return;
        }

        let is_pending = !self.in_flight.is_empty() && self.pipeline.is_pending();
        if is_pending {
            self.scheduler.request_frame_after(PENDING_POLL);
        }
        let mut run_requested = None;
        self.view.show(ctx, is_pending, &mut run_requested);
        if let Some(source) = run_requested {
            self.start_query(source);
        }
    }
}
