//! Typing-reactive spark engine.
//!
//! Two kinds of sparks run over the published node snapshot:
//! edge pulses travel along a link between two nodes, path pulses travel from
//! a core node toward the search box. Emission rates depend on the current
//! [`Mode`]. A major trigger fires the [`PerimeterBeam`] and holds the engine in
//! search mode for [`SEARCH_MODE_MS`].
//!
//! Pulses store indices into the snapshot, not positions, and resolve them
//! every frame. A snapshot replacement that invalidates an index retires the
//! pulse instead of failing.

use crate::beam::PerimeterBeam;
use crate::canvas::{Canvas, Stroke};
use crate::field::core_nodes;
use crate::geometry::{ease_out_cubic, Point, Rect};
use crate::mode::{Mode, ModeController, SEARCH_MODE_MS};
use crate::registry::{Node, NodeRegistry, PulseTriggers, TypingSignal};
use rand::prelude::*;
use std::collections::VecDeque;
use std::ops::Range;

pub const MAX_EDGE_PULSES: usize = 40;
const EDGE_STEP: f32 = 0.01;

const PATH_STEP: f32 = 0.006;
const PATH_WINDOW: f32 = 0.25;
const MAX_SEARCH_PATH_PULSES: usize = 25;
/// Burst window for search-mode path pulses, measured from search entry
const SEARCH_BURST_MS: f64 = 2000.0;

const RECENT_CAPACITY: usize = 3;

/// Randomized gap between edge emissions for a mode
fn edge_interval(mode: Mode) -> Range<f64> {
    match mode {
        Mode::Idle => 300.0..500.0,
        Mode::Typing => 150.0..300.0,
        Mode::Search => 80.0..120.0,
    }
}

/// Path pulse cap while typing
pub fn typing_path_cap(intensity: usize) -> usize {
    (3 + intensity / 3).min(15)
}

fn typing_path_interval(intensity: usize, rng: &mut StdRng) -> f64 {
    let base = (400.0 - 15.0 * intensity as f64).max(80.0);
    base + rng.gen_range(0.0..50.0)
}

fn path_speed(mode: Mode, intensity: usize) -> f32 {
    match mode {
        Mode::Typing => (1.0 + intensity as f32 / 20.0).min(2.5),
        _ => 1.0,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgePulse {
    pub id: u64,
    pub node: usize,
    pub link: usize,
    pub progress: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PathPulse {
    pub id: u64,
    pub node: usize,
    pub progress: f32,
}

/// Bounded history of recently used origin nodes.
#[derive(Debug, Default)]
pub struct RecentRing {
    items: VecDeque<usize>,
}

impl RecentRing {
    pub fn push(&mut self, node: usize) {
        self.items.push_back(node);
        while self.items.len() > RECENT_CAPACITY {
            self.items.pop_front();
        }
    }

    pub fn contains(&self, node: usize) -> bool {
        self.items.contains(&node)
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[allow(dead_code)]  // inspected by tests
    pub fn iter(&self) -> impl Iterator<Item = &usize> {
        self.items.iter()
    }
}

pub struct PulseEngine {
    nodes: NodeRegistry,
    typing: TypingSignal,
    triggers: PulseTriggers,
    target: Rect,
    rng: StdRng,

    modes: ModeController,
    edge_pulses: Vec<EdgePulse>,
    path_pulses: Vec<PathPulse>,
    core: Option<Vec<usize>>,
    recent: RecentRing,
    beam: Option<PerimeterBeam>,

    next_edge_at: f64,
    next_path_at: f64,
    next_id: u64,
}

impl PulseEngine {
    pub fn new(nodes: NodeRegistry, typing: TypingSignal, triggers: PulseTriggers, target: Rect, rng: StdRng) -> Self {
        Self {
            nodes,
            typing,
            triggers,
            target,
            rng,
            modes: ModeController::new(),
            edge_pulses: Vec::new(),
            path_pulses: Vec::new(),
            core: None,
            recent: RecentRing::default(),
            beam: None,
            next_edge_at: 0.0,
            next_path_at: 0.0,
            next_id: 0,
        }
    }

    /// Move the search box (terminal resize, layout change)
    pub fn set_target(&mut self, target: Rect) {
        self.target = target;
    }

    pub fn set_base_mode(&mut self, mode: Mode) {
        self.modes.set_base(mode);
    }

    pub fn mode(&mut self, now: f64) -> Mode {
        self.modes.current(now)
    }

    #[allow(dead_code)]  // inspected by tests
    pub fn edge_pulses(&self) -> &[EdgePulse] {
        &self.edge_pulses
    }

    #[allow(dead_code)]
    pub fn path_pulses(&self) -> &[PathPulse] {
        &self.path_pulses
    }

    #[allow(dead_code)]
    pub fn core_nodes(&self) -> Option<&[usize]> {
        self.core.as_deref()
    }

    #[allow(dead_code)]
    pub fn recent_nodes(&self) -> &RecentRing {
        &self.recent
    }

    #[allow(dead_code)]
    pub fn beam(&self) -> Option<&PerimeterBeam> {
        self.beam.as_ref()
    }

    /// Run one animation frame at `now` (ms on the frame clock).
    pub fn frame(&mut self, now: f64, canvas: &mut dyn Canvas) {
        self.handle_triggers(now);
        let mode = self.modes.current(now);
        let intensity = self.typing.get();

        let nodes = self.nodes.clone();
        nodes.with_nodes(|nodes| {
            if self.core.is_none() && !nodes.is_empty() {
                let core = core_nodes(nodes);
                tracing::debug!(?core, total = nodes.len(), "core nodes selected");
                self.core = Some(core);
            }

            self.emit_edge(now, mode, nodes);
            self.emit_path(now, mode, intensity);
            self.update_edges(mode, nodes, canvas);
            self.update_paths(mode, intensity, nodes, canvas);
        });

        if let Some(beam) = &mut self.beam {
            if beam.advance() {
                beam.draw(canvas, self.target);
            } else {
                tracing::debug!("perimeter beam retired");
                self.beam = None;
            }
        }
    }

    /// Cancel timers and drop every live effect
    pub fn dispose(&mut self) {
        self.modes.dispose();
        self.edge_pulses.clear();
        self.path_pulses.clear();
        self.beam = None;
    }

    fn handle_triggers(&mut self, now: f64) {
        let (major, minor) = self.triggers.take();

        if major {
            if self.beam.is_some() {
                tracing::trace!("major pulse ignored, beam already in flight");
            } else {
                tracing::debug!(now, window_ms = SEARCH_MODE_MS, "major pulse");
                self.beam = Some(PerimeterBeam::new());
                self.modes.force_search(now);
                // search cadence takes effect immediately
                self.next_edge_at = now;
                self.next_path_at = now;
            }
        }

        if minor > 0 {
            let nodes = self.nodes.clone();
            nodes.with_nodes(|nodes| {
                for _ in 0..minor {
                    self.spawn_edge(nodes);
                }
            });
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn emit_edge(&mut self, now: f64, mode: Mode, nodes: &[Node]) {
        if now < self.next_edge_at {
            return;
        }
        self.next_edge_at = now + self.rng.gen_range(edge_interval(mode));
        self.spawn_edge(nodes);
    }

    fn spawn_edge(&mut self, nodes: &[Node]) {
        if nodes.is_empty() || self.edge_pulses.len() >= MAX_EDGE_PULSES {
            return;
        }
        let node = self.rng.gen_range(0..nodes.len());
        let degree = nodes[node].degree();
        if degree == 0 {
            return;
        }
        let link = self.rng.gen_range(0..degree);
        let id = self.next_id();
        self.edge_pulses.push(EdgePulse { id, node, link, progress: 0.0 });
    }

    fn emit_path(&mut self, now: f64, mode: Mode, intensity: usize) {
        let (cap, interval) = match mode {
            Mode::Typing if intensity > 0 => (typing_path_cap(intensity), typing_path_interval(intensity, &mut self.rng)),
            Mode::Search if self.modes.search_elapsed(now).is_some_and(|e| e < SEARCH_BURST_MS) => {
                (MAX_SEARCH_PATH_PULSES, 60.0 + self.rng.gen_range(0.0..40.0))
            }
            _ => return,
        };

        if now < self.next_path_at || self.path_pulses.len() >= cap {
            return;
        }
        let Some(node) = self.pick_origin() else {
            return;
        };

        self.next_path_at = now + interval;
        self.recent.push(node);
        let id = self.next_id();
        self.path_pulses.push(PathPulse { id, node, progress: 0.0 });
    }

    /// Core node outside the recent ring, or any core node if all are recent.
    fn pick_origin(&mut self) -> Option<usize> {
        let core = self.core.as_deref()?;
        let fresh: Vec<usize> = core.iter().copied().filter(|n| !self.recent.contains(*n)).collect();
        let pool = if fresh.is_empty() { core } else { &fresh[..] };
        pool.choose(&mut self.rng).copied()
    }

    fn update_edges(&mut self, mode: Mode, nodes: &[Node], canvas: &mut dyn Canvas) {
        let (dash, stroke) = if mode == Mode::Search {
            (12.0, Stroke::new(1.0, 30.0))
        } else {
            (10.0, Stroke::new(0.95, 25.0))
        };

        self.edge_pulses.retain_mut(|pulse| {
            pulse.progress += EDGE_STEP;
            if pulse.progress >= 1.0 {
                return false;
            }
            let Some(node) = nodes.get(pulse.node) else {
                return false;
            };
            let Some(&target) = node.links.get(pulse.link) else {
                return false;
            };

            let from = node.pos();
            let len = from.distance(target);
            if len == 0.0 {
                return false;
            }
            let dir = Point::new((target.x - from.x) / len, (target.y - from.y) / len);
            let head = from.lerp(target, ease_out_cubic(pulse.progress));
            let tail = Point::new(head.x - dir.x * dash, head.y - dir.y * dash);

            if mode == Mode::Typing {
                canvas.line(from, target, Stroke::plain(0.15));
            }
            canvas.line(tail, head, stroke);
            true
        });
    }

    fn update_paths(&mut self, mode: Mode, intensity: usize, nodes: &[Node], canvas: &mut dyn Canvas) {
        let step = PATH_STEP * path_speed(mode, intensity);
        let rect = self.target;

        self.path_pulses.retain_mut(|pulse| {
            pulse.progress += step;
            if pulse.progress >= 1.0 {
                return false;
            }
            let Some(node) = nodes.get(pulse.node) else {
                return false;
            };

            let origin = node.pos();
            let target = rect.closest_point(origin);
            if origin.distance(target) == 0.0 {
                return false;
            }

            let start = (pulse.progress - PATH_WINDOW).max(0.0);
            let tail = origin.lerp(target, ease_out_cubic(start));
            let head = origin.lerp(target, ease_out_cubic(pulse.progress));
            canvas.line(tail, head, Stroke::new(0.9, 20.0));
            true
        });
    }
}

impl Drop for PulseEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}
