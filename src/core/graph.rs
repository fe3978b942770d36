//! core::graph
//!
//! Commit graph lane layout.
//!
//! # Architecture
//!
//! Commits arrive newest first. A single pass walks them top to bottom
//! while carrying `active_lanes`: for each lane, the commit hash the lane is
//! waiting for (a parent reserved by some row above), or `None` if the lane
//! is free. Each row places its commit, emits connector edges for that row
//! and reserves lanes for the commit's parents.
//!
//! # Invariants
//!
//! - At most one lane waits for a given hash at any row
//! - Trailing free lanes are trimmed after every row
//! - Same input order produces the same layout
//! - Lane state is local to one [`layout`] call
//!
//! # Example
//!
//! ```ignore
//! use gitlane::core::graph::{layout, LayoutMetrics};
//!
//! let graph = layout(&records, LayoutMetrics::default());
//! for node in &graph.nodes {
//!     println!("{} lane {}", node.hash.short(7), node.lane);
//! }
//! ```

use std::collections::HashMap;

use serde::Serialize;

use super::history::CommitRecord;
use super::types::Oid;

/// Lane colors, indexed by `lane % LANE_COLORS.len()`.
pub const LANE_COLORS: [&str; 8] = [
    "#4fc1ff", "#f14c4c", "#89d185", "#cca700", "#c586c0", "#ce9178", "#3dc9b0", "#d7ba7d",
];

/// Color hint for a lane.
pub fn lane_color(lane: usize) -> &'static str {
    LANE_COLORS[lane % LANE_COLORS.len()]
}

/// Geometry of the layout grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutMetrics {
    pub row_height: f32,
    pub lane_width: f32,
    /// Horizontal offset of lane 0.
    pub offset: f32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            row_height: 24.0,
            lane_width: 14.0,
            offset: 10.0,
        }
    }
}

impl LayoutMetrics {
    pub fn with_row_height(row_height: f32) -> Self {
        Self {
            row_height,
            ..Self::default()
        }
    }

    fn lane_x(&self, lane: usize) -> f32 {
        lane as f32 * self.lane_width + self.offset
    }

    fn row_top(&self, row: usize) -> f32 {
        row as f32 * self.row_height
    }

    fn row_mid(&self, row: usize) -> f32 {
        self.row_top(row) + self.row_height / 2.0
    }

    fn row_bottom(&self, row: usize) -> f32 {
        self.row_top(row + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Connector geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EdgePath {
    Line {
        from: Point,
        to: Point,
    },
    /// Cubic Bézier with both control points at the vertical midpoint.
    Curve {
        from: Point,
        c1: Point,
        c2: Point,
        to: Point,
    },
}

impl EdgePath {
    /// A line when both ends share an x, a curve otherwise.
    fn between(from: Point, to: Point) -> Self {
        if from.x == to.x {
            EdgePath::Line { from, to }
        } else {
            let mid_y = (from.y + to.y) / 2.0;
            EdgePath::Curve {
                from,
                c1: Point::new(from.x, mid_y),
                c2: Point::new(to.x, mid_y),
                to,
            }
        }
    }

    pub fn is_curve(&self) -> bool {
        matches!(self, EdgePath::Curve { .. })
    }

    pub fn endpoints(&self) -> (Point, Point) {
        match *self {
            EdgePath::Line { from, to } | EdgePath::Curve { from, to, .. } => (from, to),
        }
    }
}

/// What an edge connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// A lane unrelated to this row's commit, spanning the full row.
    PassThrough,
    /// From the row top down to the commit, in the commit's lane.
    Incoming,
    /// From the commit to its primary parent's lane.
    Parent,
    /// From the commit to a secondary parent's lane.
    Merge,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub hash: Oid,
    pub row: usize,
    pub lane: usize,
    pub x: f32,
    pub y: f32,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub row: usize,
    pub kind: EdgeKind,
    /// Lane the edge ends in; also decides its color.
    pub lane: usize,
    pub path: EdgePath,
    pub color: &'static str,
}

/// Result of one layout pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphLayout {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Peak number of active lanes over all rows.
    pub width: usize,
}

impl GraphLayout {
    /// Lane assigned to a commit.
    pub fn lane_of(&self, hash: &Oid) -> Option<usize> {
        self.nodes.iter().find(|n| &n.hash == hash).map(|n| n.lane)
    }

    /// Lane of every commit, keyed by hash.
    pub fn lanes(&self) -> HashMap<&Oid, usize> {
        self.nodes.iter().map(|n| (&n.hash, n.lane)).collect()
    }

    pub fn edges_in_row(&self, row: usize) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(move |e| e.row == row)
    }

    /// Text rendition, one line per row: `*` marks the commit, `|` a
    /// lane passing through the row.
    pub fn render_text(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(|node| {
                let mut cells = vec![' '; self.width.max(node.lane + 1)];
                for edge in self.edges_in_row(node.row) {
                    if edge.kind == EdgeKind::PassThrough && edge.lane < cells.len() {
                        cells[edge.lane] = '|';
                    }
                }
                cells[node.lane] = '*';
                let line: String = cells
                    .iter()
                    .flat_map(|c| [*c, ' '])
                    .collect();
                line.trim_end().to_string()
            })
            .collect()
    }
}

/// Per-call lane state.
struct Lanes {
    active: Vec<Option<Oid>>,
}

impl Lanes {
    fn find(&self, hash: &Oid) -> Option<usize> {
        self.active.iter().position(|o| o.as_ref() == Some(hash))
    }

    /// First free lane, or a new one at the end.
    fn first_free(&mut self) -> usize {
        match self.active.iter().position(Option::is_none) {
            Some(lane) => lane,
            None => {
                self.active.push(None);
                self.active.len() - 1
            }
        }
    }

    /// Lane already waiting for `hash`, else a free or new lane.
    fn find_or_assign(&mut self, hash: &Oid) -> usize {
        self.find(hash).unwrap_or_else(|| self.first_free())
    }

    fn trim(&mut self) {
        while matches!(self.active.last(), Some(None)) {
            self.active.pop();
        }
    }
}

/// Lay out commits (newest first) into lanes.
pub fn layout(commits: &[CommitRecord], metrics: LayoutMetrics) -> GraphLayout {
    let mut lanes = Lanes { active: Vec::new() };
    let mut graph = GraphLayout::default();

    for (row, commit) in commits.iter().enumerate() {
        let top = metrics.row_top(row);
        let y = metrics.row_mid(row);
        let bottom = metrics.row_bottom(row);

        // Place the commit.
        let reserved = lanes.find(&commit.hash);
        let lane = match reserved {
            Some(lane) => lane,
            None => {
                let lane = lanes.first_free();
                lanes.active[lane] = Some(commit.hash.clone());
                lane
            }
        };
        let x = metrics.lane_x(lane);
        graph.nodes.push(GraphNode {
            hash: commit.hash.clone(),
            row,
            lane,
            x,
            y,
            color: lane_color(lane),
        });
        graph.width = graph.width.max(lanes.active.len());

        // Lanes continuing past this row, and the commit's own incoming edge.
        for (other, occupant) in lanes.active.iter().enumerate() {
            if other == lane || occupant.is_none() {
                continue;
            }
            let lx = metrics.lane_x(other);
            graph.edges.push(GraphEdge {
                row,
                kind: EdgeKind::PassThrough,
                lane: other,
                path: EdgePath::between(Point::new(lx, top), Point::new(lx, bottom)),
                color: lane_color(other),
            });
        }
        if reserved.is_some() {
            graph.edges.push(GraphEdge {
                row,
                kind: EdgeKind::Incoming,
                lane,
                path: EdgePath::between(Point::new(x, top), Point::new(x, y)),
                color: lane_color(lane),
            });
        }

        let node = Point::new(x, y);
        let mut parents = commit.parent_hashes.iter();

        match parents.next() {
            None => lanes.active[lane] = None,
            Some(primary) => {
                let target = match lanes.find(primary) {
                    Some(existing) => existing,
                    None => {
                        lanes.active[lane] = Some(primary.clone());
                        lane
                    }
                };
                if target != lane {
                    lanes.active[lane] = None;
                }
                graph.edges.push(GraphEdge {
                    row,
                    kind: EdgeKind::Parent,
                    lane: target,
                    path: EdgePath::between(node, Point::new(metrics.lane_x(target), bottom)),
                    color: lane_color(target),
                });
            }
        }

        for parent in parents {
            let target = lanes.find_or_assign(parent);
            lanes.active[target] = Some(parent.clone());
            graph.edges.push(GraphEdge {
                row,
                kind: EdgeKind::Merge,
                lane: target,
                path: EdgePath::between(node, Point::new(metrics.lane_x(target), bottom)),
                color: lane_color(target),
            });
        }

        graph.width = graph.width.max(lanes.active.len());
        lanes.trim();
    }

    tracing::trace!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        width = graph.width,
        "laid out commit graph"
    );
    graph
}
