//! Layered flowchart layout.
//!
//! Nodes are assigned to ranks by longest path (cycles broken at back edges),
//! ordered inside each rank by barycenter sweeps with subgraph members kept
//! together, then placed on a grid. Subgraph boxes wrap their members and
//! nested subgraphs.

use std::collections::HashMap;

use crate::flowchart::{Flowchart, Node, Shape};

pub const CHAR_WIDTH: f64 = 8.0;
pub const LINE_HEIGHT: f64 = 20.0;
pub const ICON_SIZE: f64 = 48.0;
pub const LABEL_CHAR_WIDTH: f64 = 7.0;
pub const LABEL_HEIGHT: f64 = 18.0;

const PAD_X: f64 = 16.0;
const PAD_Y: f64 = 10.0;
const MIN_WIDTH: f64 = 60.0;
const NODE_GAP: f64 = 40.0;
const RANK_GAP: f64 = 60.0;
const MARGIN: f64 = 16.0;
const CLUSTER_PAD: f64 = 16.0;
const CLUSTER_TITLE: f64 = 24.0;

/// Position and size of a node, centered on `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NodeBox {
    fn left(&self) -> f64 {
        self.x - self.width / 2.0
    }
    fn right(&self) -> f64 {
        self.x + self.width / 2.0
    }
    fn top(&self) -> f64 {
        self.y - self.height / 2.0
    }
    fn bottom(&self) -> f64 {
        self.y + self.height / 2.0
    }
}

/// Axis-aligned box with its top-left corner at `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    fn union(self, other: Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Rect {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }
}

impl From<NodeBox> for Rect {
    fn from(b: NodeBox) -> Self {
        Rect {
            x: b.left(),
            y: b.top(),
            width: b.width,
            height: b.height,
        }
    }
}

/// Route of one edge.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRoute {
    pub points: Vec<(f64, f64)>,
    /// Center of the label, when the edge has one
    pub label: Option<(f64, f64)>,
}

/// A laid-out flowchart. Vectors are index-aligned with the chart's nodes,
/// edges and subgraphs.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub width: f64,
    pub height: f64,
    pub nodes: Vec<NodeBox>,
    pub edges: Vec<EdgeRoute>,
    /// `None` for subgraphs without members
    pub clusters: Vec<Option<Rect>>,
}

/// Size of a node's outline for its label, icon and shape.
pub fn node_size(node: &Node) -> (f64, f64) {
    let longest = node
        .label
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0) as f64;
    let text_width = longest * CHAR_WIDTH;
    let text_height = node.label.len() as f64 * LINE_HEIGHT;

    if node.icon.is_some() {
        let label_height = if node.label.is_empty() {
            0.0
        } else {
            text_height + 4.0
        };
        return (
            ICON_SIZE.max(text_width) + 2.0 * PAD_X,
            ICON_SIZE + label_height + 2.0 * PAD_Y,
        );
    }

    let w = (text_width + 2.0 * PAD_X).max(MIN_WIDTH);
    let h = text_height.max(LINE_HEIGHT) + 2.0 * PAD_Y;

    match node.shape {
        Shape::Circle => {
            let d = w.max(h);
            (d, d)
        }
        Shape::Rhombus => (w + h, h * 1.8),
        Shape::Hexagon => (w + h / 2.0, h),
        Shape::Stadium => (w + h / 2.0, h),
        Shape::Cylinder => (w, h + 16.0),
        Shape::Subroutine => (w + 16.0, h),
        Shape::Asymmetric => (w + 12.0, h),
        Shape::Rect | Shape::Round => (w, h),
    }
}

/// Lay out a flowchart.
pub fn layout(chart: &Flowchart) -> Layout {
    let n = chart.nodes.len();
    let index: HashMap<&str, usize> = chart
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (node.id.as_str(), i))
        .collect();

    let links: Vec<Option<(usize, usize)>> = chart
        .edges
        .iter()
        .map(|e| Some((*index.get(e.from.as_str())?, *index.get(e.to.as_str())?)))
        .collect();

    let sizes: Vec<(f64, f64)> = chart.nodes.iter().map(node_size).collect();
    let ranks = assign_ranks(n, &links);
    let order = order_ranks(chart, &ranks, &links);

    let vertical = chart.direction.is_vertical();
    let main_size = |i: usize| if vertical { sizes[i].1 } else { sizes[i].0 };
    let cross_size = |i: usize| if vertical { sizes[i].0 } else { sizes[i].1 };

    let depth = max_subgraph_depth(chart);
    let has_clusters = depth > 0;
    let lead = if has_clusters {
        (CLUSTER_PAD + CLUSTER_TITLE) * depth as f64
    } else {
        0.0
    };
    let rank_gap = RANK_GAP + if has_clusters { CLUSTER_TITLE } else { 0.0 };

    // Main axis: one band per rank
    let mut rank_center = Vec::with_capacity(order.len());
    let mut cursor = MARGIN + lead;
    for rank in &order {
        let extent = rank.iter().map(|&i| main_size(i)).fold(0.0, f64::max);
        rank_center.push(cursor + extent / 2.0);
        cursor += extent + rank_gap;
    }
    let main_total = cursor - rank_gap + MARGIN + lead;

    // Cross axis: pack each rank, then center it
    let top_cluster = |i: usize| {
        chart.nodes[i]
            .subgraph
            .and_then(|s| chart.subgraph_ancestry(s).last().copied())
    };
    let mut cross = vec![0.0; n];
    let mut rank_widths = Vec::with_capacity(order.len());
    for rank in &order {
        let mut cursor = 0.0;
        let mut previous: Option<usize> = None;
        for &i in rank {
            if let Some(p) = previous {
                cursor += NODE_GAP;
                if top_cluster(p) != top_cluster(i) {
                    cursor += 2.0 * CLUSTER_PAD * depth as f64;
                }
            }
            cross[i] = cursor + cross_size(i) / 2.0;
            cursor += cross_size(i);
            previous = Some(i);
        }
        rank_widths.push(cursor);
    }
    let widest = rank_widths.iter().copied().fold(0.0, f64::max);
    let side = MARGIN + CLUSTER_PAD * depth as f64;
    for (rank, width) in order.iter().zip(&rank_widths) {
        let offset = side + (widest - width) / 2.0;
        for &i in rank {
            cross[i] += offset;
        }
    }

    let reversed = chart.direction.is_reversed();
    let main_of = |m: f64| if reversed { main_total - m } else { m };

    let mut nodes: Vec<NodeBox> = (0..n)
        .map(|i| {
            let m = main_of(rank_center[ranks[i]]);
            let (x, y) = if vertical { (cross[i], m) } else { (m, cross[i]) };
            NodeBox {
                x,
                y,
                width: sizes[i].0,
                height: sizes[i].1,
            }
        })
        .collect();

    let rank_main: Vec<f64> = rank_center.iter().map(|&m| main_of(m)).collect();

    let mut edges: Vec<EdgeRoute> = chart
        .edges
        .iter()
        .zip(&links)
        .map(|(edge, link)| {
            let points = match link {
                Some((from, to)) => route(
                    &nodes[*from],
                    &nodes[*to],
                    ranks[*from],
                    ranks[*to],
                    &rank_main,
                    vertical,
                    from == to,
                ),
                None => Vec::new(),
            };
            let label = edge
                .label
                .as_ref()
                .filter(|_| !points.is_empty())
                .map(|_| midpoint(&points));
            EdgeRoute { points, label }
        })
        .collect();

    let mut clusters = cluster_boxes(chart, &nodes);

    // Shift everything so the drawing starts at the margin
    let mut bounds: Option<Rect> = None;
    let mut extend = |r: Rect| {
        bounds = Some(match bounds {
            Some(b) => b.union(r),
            None => r,
        })
    };
    nodes.iter().for_each(|b| extend((*b).into()));
    clusters.iter().flatten().for_each(|c| extend(*c));
    for (edge, route) in chart.edges.iter().zip(&edges) {
        for &(x, y) in &route.points {
            extend(Rect {
                x,
                y,
                width: 0.0,
                height: 0.0,
            });
        }
        if let (Some(text), Some((x, y))) = (&edge.label, route.label) {
            let (w, h) = label_size(text);
            extend(Rect {
                x: x - w / 2.0,
                y: y - h / 2.0,
                width: w,
                height: h,
            });
        }
    }

    let bounds = bounds.unwrap_or(Rect {
        x: MARGIN,
        y: MARGIN,
        width: 0.0,
        height: 0.0,
    });
    let dx = MARGIN - bounds.x;
    let dy = MARGIN - bounds.y;

    for b in &mut nodes {
        b.x += dx;
        b.y += dy;
    }
    for c in clusters.iter_mut().flatten() {
        c.x += dx;
        c.y += dy;
    }
    for route in &mut edges {
        for p in &mut route.points {
            p.0 += dx;
            p.1 += dy;
        }
        if let Some(l) = &mut route.label {
            l.0 += dx;
            l.1 += dy;
        }
    }

    Layout {
        width: (bounds.width + 2.0 * MARGIN).ceil(),
        height: (bounds.height + 2.0 * MARGIN).ceil(),
        nodes,
        edges,
        clusters,
    }
}

/// Size of the background box behind an edge label.
pub fn label_size(text: &str) -> (f64, f64) {
    (text.chars().count() as f64 * LABEL_CHAR_WIDTH + 8.0, LABEL_HEIGHT)
}

/// Longest-path ranks over the edges left after removing DFS back edges.
fn assign_ranks(n: usize, links: &[Option<(usize, usize)>]) -> Vec<usize> {
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
    for &(from, to) in links.iter().flatten() {
        if from != to {
            adjacency[from].push(to);
        }
    }

    // 0 = unvisited, 1 = on stack, 2 = done
    let mut state = vec![0u8; n];
    let mut forward: Vec<Vec<usize>> = vec![Vec::new(); n];
    for root in 0..n {
        if state[root] != 0 {
            continue;
        }
        let mut stack = vec![(root, 0usize)];
        state[root] = 1;
        while let Some((node, next)) = stack.pop() {
            if next < adjacency[node].len() {
                stack.push((node, next + 1));
                let target = adjacency[node][next];
                match state[target] {
                    0 => {
                        forward[node].push(target);
                        state[target] = 1;
                        stack.push((target, 0));
                    }
                    2 => forward[node].push(target),
                    _ => {} // back edge
                }
            } else {
                state[node] = 2;
            }
        }
    }

    let mut indegree = vec![0usize; n];
    for targets in &forward {
        for &t in targets {
            indegree[t] += 1;
        }
    }

    let mut rank = vec![0usize; n];
    let mut ready: Vec<usize> = (0..n).rev().filter(|&i| indegree[i] == 0).collect();
    while let Some(node) = ready.pop() {
        for &t in &forward[node] {
            rank[t] = rank[t].max(rank[node] + 1);
            indegree[t] -= 1;
            if indegree[t] == 0 {
                ready.push(t);
            }
        }
    }

    rank
}

/// Node order inside each rank.
fn order_ranks(
    chart: &Flowchart,
    ranks: &[usize],
    links: &[Option<(usize, usize)>],
) -> Vec<Vec<usize>> {
    let rank_count = ranks.iter().copied().max().map_or(0, |r| r + 1);
    let mut order: Vec<Vec<usize>> = vec![Vec::new(); rank_count];
    for (node, &rank) in ranks.iter().enumerate() {
        order[rank].push(node);
    }

    let mut up: Vec<Vec<usize>> = vec![Vec::new(); ranks.len()];
    let mut down: Vec<Vec<usize>> = vec![Vec::new(); ranks.len()];
    for &(from, to) in links.iter().flatten() {
        if ranks[from] < ranks[to] {
            down[from].push(to);
            up[to].push(from);
        } else if ranks[from] > ranks[to] {
            down[to].push(from);
            up[from].push(to);
        }
    }

    let top_cluster = |i: usize| {
        chart.nodes[i]
            .subgraph
            .and_then(|s| chart.subgraph_ancestry(s).last().copied())
    };

    let mut position = vec![0.0f64; ranks.len()];
    let refresh = |order: &Vec<Vec<usize>>, position: &mut Vec<f64>| {
        for rank in order {
            for (p, &node) in rank.iter().enumerate() {
                position[node] = p as f64;
            }
        }
    };
    refresh(&order, &mut position);

    for sweep in 0..4 {
        let neighbors = if sweep % 2 == 0 { &up } else { &down };
        let rank_indices: Vec<usize> = if sweep % 2 == 0 {
            (1..rank_count).collect()
        } else {
            (0..rank_count.saturating_sub(1)).rev().collect()
        };

        for r in rank_indices {
            let barycenter: HashMap<usize, f64> = order[r]
                .iter()
                .map(|&node| {
                    let adjacent = &neighbors[node];
                    let value = if adjacent.is_empty() {
                        position[node]
                    } else {
                        adjacent.iter().map(|&a| position[a]).sum::<f64>() / adjacent.len() as f64
                    };
                    (node, value)
                })
                .collect();

            // Members of one top-level subgraph share a key so they stay adjacent
            let mut group_key: HashMap<usize, (f64, usize)> = HashMap::new();
            for &node in &order[r] {
                if let Some(cluster) = top_cluster(node) {
                    let entry = group_key.entry(cluster).or_insert((0.0, 0));
                    entry.0 += barycenter[&node];
                    entry.1 += 1;
                }
            }

            let subgraph_count = chart.subgraphs.len();
            let key = |node: usize| match top_cluster(node) {
                Some(cluster) => {
                    let (sum, count) = group_key[&cluster];
                    (sum / count as f64, cluster, barycenter[&node])
                }
                None => (barycenter[&node], subgraph_count + node, barycenter[&node]),
            };

            order[r].sort_by(|&a, &b| {
                let (ka, ga, ba) = key(a);
                let (kb, gb, bb) = key(b);
                ka.total_cmp(&kb)
                    .then(ga.cmp(&gb))
                    .then(ba.total_cmp(&bb))
                    .then(a.cmp(&b))
            });

            refresh(&order, &mut position);
        }
    }

    order
}

fn max_subgraph_depth(chart: &Flowchart) -> usize {
    (0..chart.subgraphs.len())
        .map(|s| chart.subgraph_ancestry(s).len())
        .max()
        .unwrap_or(0)
}

/// Boxes for every subgraph, innermost first so parents can wrap children.
fn cluster_boxes(chart: &Flowchart, nodes: &[NodeBox]) -> Vec<Option<Rect>> {
    let mut clusters: Vec<Option<Rect>> = vec![None; chart.subgraphs.len()];

    // Children are always declared after their parent
    for s in (0..chart.subgraphs.len()).rev() {
        let mut content: Option<Rect> = None;
        let mut add = |r: Rect| {
            content = Some(match content {
                Some(c) => c.union(r),
                None => r,
            })
        };

        for (node, b) in chart.nodes.iter().zip(nodes) {
            if node.subgraph == Some(s) {
                add((*b).into());
            }
        }
        for (child, subgraph) in chart.subgraphs.iter().enumerate() {
            if subgraph.parent == Some(s) {
                if let Some(r) = clusters[child] {
                    add(r);
                }
            }
        }

        clusters[s] = content.map(|c| Rect {
            x: c.x - CLUSTER_PAD,
            y: c.y - CLUSTER_PAD - CLUSTER_TITLE,
            width: c.width + 2.0 * CLUSTER_PAD,
            height: c.height + 2.0 * CLUSTER_PAD + CLUSTER_TITLE,
        });
    }

    clusters
}

/// Points from the border of `from` to the border of `to`.
fn route(
    from: &NodeBox,
    to: &NodeBox,
    from_rank: usize,
    to_rank: usize,
    rank_main: &[f64],
    vertical: bool,
    self_loop: bool,
) -> Vec<(f64, f64)> {
    if self_loop {
        let r = from.right();
        return vec![
            (r, from.y - from.height / 4.0),
            (r + 24.0, from.y - from.height / 4.0),
            (r + 24.0, from.y + from.height / 4.0),
            (r, from.y + from.height / 4.0),
        ];
    }

    if from_rank == to_rank {
        // Same rank: connect facing sides across the cross axis
        return if vertical {
            if to.x >= from.x {
                vec![(from.right(), from.y), (to.left(), to.y)]
            } else {
                vec![(from.left(), from.y), (to.right(), to.y)]
            }
        } else if to.y >= from.y {
            vec![(from.x, from.bottom()), (to.x, to.top())]
        } else {
            vec![(from.x, from.top()), (to.x, to.bottom())]
        };
    }

    let (start, end) = if vertical {
        if to.y > from.y {
            ((from.x, from.bottom()), (to.x, to.top()))
        } else {
            ((from.x, from.top()), (to.x, to.bottom()))
        }
    } else if to.x > from.x {
        ((from.right(), from.y), (to.left(), to.y))
    } else {
        ((from.left(), from.y), (to.right(), to.y))
    };

    let mut points = vec![start];

    // One waypoint per rank the edge passes through
    let (low, high) = (from_rank.min(to_rank), from_rank.max(to_rank));
    let span = (high - low) as f64;
    let mut between: Vec<usize> = (low + 1..high).collect();
    if from_rank > to_rank {
        between.reverse();
    }
    for r in between {
        let t = (r as f64 - from_rank as f64).abs() / span;
        if vertical {
            points.push((start.0 + (end.0 - start.0) * t, rank_main[r]));
        } else {
            points.push((rank_main[r], start.1 + (end.1 - start.1) * t));
        }
    }

    points.push(end);
    points
}

/// Midpoint of the middle segment of a polyline.
fn midpoint(points: &[(f64, f64)]) -> (f64, f64) {
    if points.len() == 1 {
        return points[0];
    }
    let segment = (points.len() - 1) / 2;
    let (a, b) = (points[segment], points[segment + 1]);
    ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}
