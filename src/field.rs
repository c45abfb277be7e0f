//! Drifting particle field and its published node snapshots.
//!
//! The field simulates on every frame but only publishes to the
//! [`NodeRegistry`] on its own slower clock, so readers may see a snapshot up
//! to one publish interval old.

use crate::geometry::Point;
use crate::mode::ScopedTimer;
use crate::registry::{Node, NodeRegistry};
use rand::prelude::*;

const SPEED_MIN: f32 = 0.05;
const SPEED_MAX: f32 = 0.35;

/// Core selection bounds
const CORE_MIN: usize = 4;
const CORE_MAX: usize = 6;

#[derive(Clone, Debug)]
pub struct FieldConfig {
    pub nodes: usize,
    pub link_distance: f32,
    pub max_links: usize,
    pub publish_interval_ms: f64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            nodes: 70,
            link_distance: 28.0,
            max_links: 5,
            publish_interval_ms: 1000.0,
        }
    }
}

struct Particle {
    pos: Point,
    vx: f32,
    vy: f32,
}

impl Particle {
    fn new(rng: &mut StdRng, w: f32, h: f32) -> Self {
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let speed = rng.gen_range(SPEED_MIN..SPEED_MAX);
        Self {
            pos: Point::new(rng.gen_range(0.0..w.max(1.0)), rng.gen_range(0.0..h.max(1.0))),
            vx: angle.cos() * speed,
            vy: angle.sin() * speed,
        }
    }
}

pub struct ParticleField {
    config: FieldConfig,
    particles: Vec<Particle>,
    width: f32,
    height: f32,
    publish_timer: ScopedTimer,
    registry: NodeRegistry,
    /// Neighbour indices per particle, refreshed on publish
    neighbours: Vec<Vec<usize>>,
}

impl ParticleField {
    pub fn new(config: FieldConfig, width: f32, height: f32, registry: NodeRegistry, rng: &mut StdRng) -> Self {
        let particles = (0..config.nodes)
            .map(|_| Particle::new(rng, width, height))
            .collect();
        Self {
            config,
            particles,
            width,
            height,
            publish_timer: ScopedTimer::new(),
            registry,
            neighbours: Vec::new(),
        }
    }

    /// Rescale particle positions into new bounds
    pub fn resize(&mut self, width: f32, height: f32) {
        let sx = if self.width > 0.0 { width / self.width } else { 1.0 };
        let sy = if self.height > 0.0 { height / self.height } else { 1.0 };
        for p in &mut self.particles {
            p.pos.x = (p.pos.x * sx).clamp(0.0, width);
            p.pos.y = (p.pos.y * sy).clamp(0.0, height);
        }
        self.width = width;
        self.height = height;
    }

    /// Advance the drift one frame, then publish if the publish clock is due.
    pub fn tick(&mut self, now: f64) {
        for p in &mut self.particles {
            p.pos.x += p.vx;
            p.pos.y += p.vy;
            if p.pos.x < 0.0 || p.pos.x > self.width {
                p.vx = -p.vx;
                p.pos.x = p.pos.x.clamp(0.0, self.width);
            }
            if p.pos.y < 0.0 || p.pos.y > self.height {
                p.vy = -p.vy;
                p.pos.y = p.pos.y.clamp(0.0, self.height);
            }
        }

        if !self.publish_timer.is_pending(now) {
            self.publish();
            self.publish_timer.arm(now, self.config.publish_interval_ms);
        }
    }

    /// Recompute links and replace the registry snapshot.
    pub fn publish(&mut self) {
        self.neighbours = self.nearest_neighbours();
        self.registry.publish(self.nodes_from(&self.neighbours));
    }

    /// Current positions with links to the nearest neighbours in range.
    #[allow(dead_code)]
    pub fn snapshot(&self) -> Vec<Node> {
        self.nodes_from(&self.nearest_neighbours())
    }

    fn nodes_from(&self, neighbours: &[Vec<usize>]) -> Vec<Node> {
        self.particles
            .iter()
            .zip(neighbours)
            .map(|(p, near)| Node {
                x: p.pos.x,
                y: p.pos.y,
                links: near.iter().map(|&j| self.particles[j].pos).collect(),
            })
            .collect()
    }

    /// Up to `max_links` closest other particles within `link_distance`, nearest first.
    fn nearest_neighbours(&self) -> Vec<Vec<usize>> {
        let max_d = self.config.link_distance;
        self.particles
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let mut near: Vec<(f32, usize)> = self
                    .particles
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(j, q)| (p.pos.distance(q.pos), j))
                    .filter(|(d, _)| *d <= max_d)
                    .collect();
                near.sort_by(|a, b| a.0.total_cmp(&b.0));
                near.truncate(self.config.max_links);
                near.into_iter().map(|(_, j)| j).collect()
            })
            .collect()
    }

    /// Links from the last publish, drawn between current particle positions.
    pub fn links(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.neighbours.iter().enumerate().flat_map(move |(i, near)| {
            let from = self.particles[i].pos;
            near.iter().map(move |&j| (from, self.particles[j].pos))
        })
    }

    pub fn positions(&self) -> impl Iterator<Item = Point> + '_ {
        self.particles.iter().map(|p| p.pos)
    }
}

/// Indices of the best-connected nodes, `clamp(n / 20, 4, 6)` of them (never more than n).
/// Ties go to the lower index.
pub fn core_nodes(nodes: &[Node]) -> Vec<usize> {
    let count = (nodes.len() / 20).clamp(CORE_MIN, CORE_MAX).min(nodes.len());
    let mut indices: Vec<usize> = (0..nodes.len()).collect();
    indices.sort_by(|&a, &b| nodes[b].degree().cmp(&nodes[a].degree()).then(a.cmp(&b)));
    indices.truncate(count);
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_with_degree(degree: usize) -> Node {
        Node {
            x: 0.0,
            y: 0.0,
            links: vec![Point::default(); degree],
        }
    }

    #[test]
    fn core_size_follows_node_count() {
        for (n, expected) in [(4, 4), (10, 4), (80, 4), (100, 5), (119, 5), (120, 6), (1000, 6)] {
            let nodes: Vec<Node> = (0..n).map(|i| node_with_degree(i % 7)).collect();
            assert_eq!(core_nodes(&nodes).len(), expected, "n = {n}");
        }
    }

    #[test]
    fn core_prefers_high_degree_then_low_index() {
        let nodes: Vec<Node> = [1, 5, 3, 5, 0, 2].into_iter().map(node_with_degree).collect();
        assert_eq!(core_nodes(&nodes), vec![1, 3, 2, 5]);
    }

    #[test]
    fn tiny_snapshots_yield_small_core() {
        assert!(core_nodes(&[]).is_empty());
        assert_eq!(core_nodes(&[node_with_degree(1), node_with_degree(2)]), vec![1, 0]);
    }

    #[test]
    fn publishes_on_its_own_clock() {
        let registry = NodeRegistry::new();
        let mut rng = StdRng::seed_from_u64(7);
        let config = FieldConfig { nodes: 12, ..FieldConfig::default() };
        let mut field = ParticleField::new(config, 160.0, 96.0, registry.clone(), &mut rng);

        field.tick(0.0);
        assert_eq!(registry.len(), 12);
        let first = registry.with_nodes(|n| n[0].pos());

        field.tick(500.0);
        assert_eq!(registry.with_nodes(|n| n[0].pos()), first);

        field.tick(1000.0);
        assert_ne!(registry.with_nodes(|n| n[0].pos()), first);
    }

    #[test]
    fn links_respect_distance_and_cap() {
        let registry = NodeRegistry::new();
        let mut rng = StdRng::seed_from_u64(3);
        let config = FieldConfig {
            nodes: 60,
            link_distance: 30.0,
            max_links: 3,
            ..FieldConfig::default()
        };
        let mut field = ParticleField::new(config, 100.0, 60.0, registry.clone(), &mut rng);
        let snapshot = field.snapshot();
        for node in &snapshot {
            assert!(node.links.len() <= 3);
            for link in &node.links {
                assert!(node.pos().distance(*link) <= 30.0);
            }
        }

        field.publish();
        assert_eq!(registry.with_nodes(|nodes| nodes.to_vec()), snapshot);
    }

    #[test]
    fn drawn_links_follow_particles_between_publishes() {
        let registry = NodeRegistry::new();
        let mut rng = StdRng::seed_from_u64(5);
        let config = FieldConfig { nodes: 40, link_distance: 40.0, ..FieldConfig::default() };
        let mut field = ParticleField::new(config, 120.0, 80.0, registry.clone(), &mut rng);
        assert_eq!(field.links().count(), 0);

        field.tick(0.0);
        let published: usize = registry.with_nodes(|n| n.iter().map(Node::degree).sum());
        assert!(published > 0);
        assert_eq!(field.links().count(), published);

        // no publish yet: same link set, endpoints at the moved positions
        field.tick(16.0);
        let positions: Vec<Point> = field.positions().collect();
        assert_eq!(field.links().count(), published);
        for (from, to) in field.links() {
            assert!(positions.contains(&from) && positions.contains(&to));
        }
        let stale = registry.with_nodes(|n| n[0].pos());
        assert_ne!(stale, positions[0]);
    }

    #[test]
    fn particles_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut field = ParticleField::new(FieldConfig::default(), 40.0, 20.0, NodeRegistry::new(), &mut rng);
        for frame in 0..500 {
            field.tick(frame as f64 * 16.0);
        }
        field.resize(20.0, 10.0);
        assert!(field.positions().all(|p| (0.0..=20.0).contains(&p.x) && (0.0..=10.0).contains(&p.y)));
    }
}
