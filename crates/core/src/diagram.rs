//! Architecture diagram layout and SVG generation.
//!
//! Layout is a layered drawing: every node sits on the row given by its
//! longest-path depth from a root, and edges run between rows. The output is
//! a self-contained SVG document; rasterizing it is the shell's job.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::Write;

use crate::project::{ArchitectureFacts, ProjectData};

pub const CANVAS_WIDTH: f32 = 1600.0;
pub const CANVAS_HEIGHT: f32 = 1100.0;

const MARGIN_X: f32 = 60.0;
const TOP: f32 = 130.0;
const BOTTOM: f32 = 90.0;
const MAX_BOX_WIDTH: f32 = 240.0;
const MAX_BOX_HEIGHT: f32 = 70.0;
const MAX_LABEL_CHARS: usize = 22;
/// Named nodes drawn before the rest fold into one overflow node.
pub const MAX_NODES: usize = 40;
const FONT_FAMILY: &str = "Inter, Helvetica, Arial, sans-serif";
const STROKE: &str = "#2d3748";
const LAYER_FILLS: [&str; 8] = [
    "#E3F2FD", "#FFF3E0", "#E8F5E9", "#FCE4EC", "#F3E5F5", "#E0F7FA", "#FFFDE7", "#EDE7F6",
];

#[derive(Debug, Clone, PartialEq)]
pub struct NodeBox {
    pub label: String,
    pub layer: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NodeBox {
    fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub nodes: Vec<NodeBox>,
    pub edges: Vec<Edge>,
    pub layers: usize,
}

/// Counts shown in the diagram footer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagramStats {
    pub pages: usize,
    pub frames: usize,
    pub components: usize,
}

/// Assign every node to a row and a column.
///
/// At most [`MAX_NODES`] distinct names are drawn; every later name folds
/// into a single "+k more" node that keeps their edges.
pub fn layout(facts: &ArchitectureFacts) -> Layout {
    let mut nodes = NodeIndex::default();
    let mut seen: BTreeSet<(usize, usize)> = BTreeSet::new();
    let mut edges: Vec<Edge> = Vec::new();

    for (source, targets) in facts {
        let from = nodes.id(source);
        for target in targets {
            let to = nodes.id(target);
            if from != to && seen.insert((from, to)) {
                edges.push(Edge { from, to });
            }
        }
    }

    let labels = nodes.into_labels();
    let count = labels.len();
    if count == 0 {
        return Layout {
            nodes: Vec::new(),
            edges,
            layers: 0,
        };
    }

    let depth = longest_path_depths(count, &edges);

    let mut used: Vec<usize> = depth.clone();
    used.sort_unstable();
    used.dedup();
    let row_of = |d: usize| used.binary_search(&d).unwrap_or(0);
    let layers = used.len();

    let mut rows: Vec<Vec<usize>> = vec![Vec::new(); layers];
    for (node, d) in depth.iter().enumerate() {
        rows[row_of(*d)].push(node);
    }

    let row_pitch = (CANVAS_HEIGHT - TOP - BOTTOM) / layers as f32;
    let height = MAX_BOX_HEIGHT.min(row_pitch * 0.6);

    let mut nodes: Vec<Option<NodeBox>> = vec![None; count];
    for (row, members) in rows.iter().enumerate() {
        let slot = (CANVAS_WIDTH - 2.0 * MARGIN_X) / members.len() as f32;
        let width = MAX_BOX_WIDTH.min(slot * 0.85);
        let y = TOP + row as f32 * row_pitch + (row_pitch - height) / 2.0;

        for (column, node) in members.iter().enumerate() {
            nodes[*node] = Some(NodeBox {
                label: labels[*node].clone(),
                layer: row,
                x: MARGIN_X + column as f32 * slot + (slot - width) / 2.0,
                y,
                width,
                height,
            });
        }
    }

    Layout {
        nodes: nodes.into_iter().flatten().collect(),
        edges,
        layers,
    }
}

/// Dense ids for node names, capped at [`MAX_NODES`].
#[derive(Default)]
struct NodeIndex<'a> {
    ids: BTreeMap<&'a str, usize>,
    labels: Vec<&'a str>,
    folded: BTreeSet<&'a str>,
    overflow: Option<usize>,
}

impl<'a> NodeIndex<'a> {
    fn id(&mut self, name: &'a str) -> usize {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        if self.labels.len() - usize::from(self.overflow.is_some()) < MAX_NODES {
            let id = self.labels.len();
            self.labels.push(name);
            self.ids.insert(name, id);
            return id;
        }

        self.folded.insert(name);
        match self.overflow {
            Some(id) => id,
            None => {
                let id = self.labels.len();
                self.labels.push("");
                self.overflow = Some(id);
                id
            }
        }
    }

    fn into_labels(self) -> Vec<String> {
        let mut labels: Vec<String> = self.labels.iter().map(|l| l.to_string()).collect();
        if let Some(id) = self.overflow {
            labels[id] = format!("+{} more", self.folded.len());
        }
        labels
    }
}

/// Depth of every node on its longest path from a root, in O(V + E).
///
/// Nodes are taken in topological order. When only cycles remain, the
/// lowest unresolved id is released as if it had no incoming edges, so every
/// depth stays below `count`.
fn longest_path_depths(count: usize, edges: &[Edge]) -> Vec<usize> {
    let mut indegree = vec![0usize; count];
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); count];
    for edge in edges {
        indegree[edge.to] += 1;
        outgoing[edge.from].push(edge.to);
    }

    let mut depth = vec![0usize; count];
    let mut done = vec![false; count];
    let mut queue: VecDeque<usize> = (0..count).filter(|n| indegree[*n] == 0).collect();
    let mut next_released = 0;
    let mut resolved = 0;

    while resolved < count {
        let node = match queue.pop_front() {
            Some(node) => node,
            None => {
                while done[next_released] {
                    next_released += 1;
                }
                next_released
            }
        };
        if done[node] {
            continue;
        }
        done[node] = true;
        resolved += 1;

        for &to in &outgoing[node] {
            if done[to] {
                continue;
            }
            depth[to] = depth[to].max(depth[node] + 1);
            indegree[to] -= 1;
            if indegree[to] == 0 {
                queue.push_back(to);
            }
        }
    }

    depth
}

/// Shorten `label` to at most `max` characters, marking the cut with "...".
pub fn truncate_label(label: &str, max: usize) -> String {
    let count = label.chars().count();
    if count <= max {
        return label.to_string();
    }
    let keep = max.saturating_sub(3).max(1);
    format!("{}...", label.chars().take(keep).collect::<String>())
}

/// SVG for a project, or the placeholder when it has no architecture facts.
pub fn project_svg(project: &ProjectData) -> String {
    let stats = DiagramStats {
        pages: project.pages.len(),
        frames: project.frames.len(),
        components: project.components.len(),
    };
    render_svg(&project.project_name, &project.architecture, stats)
}

/// Render `facts` as a standalone SVG document.
pub fn render_svg(project_name: &str, facts: &ArchitectureFacts, stats: DiagramStats) -> String {
    let layout = layout(facts);
    if layout.nodes.is_empty() {
        return placeholder_svg(project_name);
    }

    let mut svg = open_canvas(project_name);

    for edge in &layout.edges {
        let (source, target) = (&layout.nodes[edge.from], &layout.nodes[edge.to]);
        let (y1, y2) = if target.y > source.y {
            (source.y + source.height, target.y)
        } else {
            (source.y, target.y + target.height)
        };
        let _ = writeln!(
            svg,
            r##"  <line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="#4a5568" stroke-width="2" marker-end="url(#arrow)"/>"##,
            source.center_x(),
            y1,
            target.center_x(),
            y2
        );
    }

    for node in &layout.nodes {
        let fill = LAYER_FILLS[node.layer % LAYER_FILLS.len()];
        let font_size = (node.height * 0.3).min(18.0);
        let fit = (node.width / (font_size * 0.55)).floor() as usize;
        let label = truncate_label(&node.label, MAX_LABEL_CHARS.min(fit.max(4)));

        let _ = writeln!(
            svg,
            r#"  <rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" rx="10" fill="{fill}" stroke="{STROKE}" stroke-width="2"/>"#,
            node.x, node.y, node.width, node.height
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{:.1}" y="{:.1}" text-anchor="middle" font-family="{FONT_FAMILY}" font-size="{:.1}" font-weight="bold" fill="{STROKE}">{}</text>"#,
            node.center_x(),
            node.y + node.height / 2.0 + font_size * 0.35,
            font_size,
            html_escape::encode_text(&label)
        );
    }

    let footer = format!(
        "Generated from: {} pages, {} frames, {} components",
        stats.pages, stats.frames, stats.components
    );
    close_canvas(svg, &footer)
}

/// Minimal diagram used when there is nothing to lay out.
pub fn placeholder_svg(project_name: &str) -> String {
    let mut svg = open_canvas(project_name);
    let (width, height) = (600.0, 160.0);
    let x = (CANVAS_WIDTH - width) / 2.0;
    let y = (CANVAS_HEIGHT - height) / 2.0;

    let _ = writeln!(
        svg,
        r#"  <rect x="{x:.1}" y="{y:.1}" width="{width:.1}" height="{height:.1}" rx="14" fill="{}" stroke="{STROKE}" stroke-width="2" stroke-dasharray="10 6"/>"#,
        LAYER_FILLS[0]
    );
    let _ = writeln!(
        svg,
        r#"  <text x="{:.1}" y="{:.1}" text-anchor="middle" font-family="{FONT_FAMILY}" font-size="26" font-weight="bold" fill="{STROKE}">{}</text>"#,
        CANVAS_WIDTH / 2.0,
        y + 70.0,
        html_escape::encode_text(&truncate_label(project_name, 36))
    );
    let _ = writeln!(
        svg,
        r##"  <text x="{:.1}" y="{:.1}" text-anchor="middle" font-family="{FONT_FAMILY}" font-size="18" fill="#4a5568">No architecture facts available</text>"##,
        CANVAS_WIDTH / 2.0,
        y + 110.0
    );

    close_canvas(svg, "Placeholder diagram")
}

fn open_canvas(project_name: &str) -> String {
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{CANVAS_WIDTH}" height="{CANVAS_HEIGHT}" viewBox="0 0 {CANVAS_WIDTH} {CANVAS_HEIGHT}">"#
    );
    svg.push_str("  <defs>\n");
    svg.push_str(
        r##"    <pattern id="grid" width="20" height="20" patternUnits="userSpaceOnUse"><circle cx="2" cy="2" r="1.6" fill="#CBD5E0"/></pattern>"##,
    );
    svg.push('\n');
    svg.push_str(
        r##"    <marker id="arrow" viewBox="0 0 10 10" refX="10" refY="5" markerWidth="8" markerHeight="8" orient="auto"><path d="M0,0 L10,5 L0,10 z" fill="#4a5568"/></marker>"##,
    );
    svg.push('\n');
    svg.push_str("  </defs>\n");
    let _ = writeln!(
        svg,
        r#"  <rect x="0" y="0" width="{CANVAS_WIDTH}" height="{CANVAS_HEIGHT}" fill="white"/>"#
    );
    let _ = writeln!(
        svg,
        r#"  <rect x="0" y="0" width="{CANVAS_WIDTH}" height="{CANVAS_HEIGHT}" fill="url(#grid)"/>"#
    );
    let _ = writeln!(
        svg,
        r#"  <text x="{:.1}" y="70" text-anchor="middle" font-family="{FONT_FAMILY}" font-size="34" font-weight="bold" fill="{STROKE}">{} - System Architecture</text>"#,
        CANVAS_WIDTH / 2.0,
        html_escape::encode_text(&truncate_label(project_name, 48))
    );
    svg
}

fn close_canvas(mut svg: String, footer: &str) -> String {
    let _ = writeln!(
        svg,
        r##"  <text x="{:.1}" y="{:.1}" text-anchor="middle" font-family="{FONT_FAMILY}" font-size="16" font-style="italic" fill="#4a5568">{}</text>"##,
        CANVAS_WIDTH / 2.0,
        CANVAS_HEIGHT - 40.0,
        html_escape::encode_text(footer)
    );
    svg.push_str("</svg>\n");
    svg
}
