//! Node and connection registry
//!
//! Built once from the episode records. Nodes carry a fixed local position on
//! the sphere; connections join every pair of nodes sharing a theme.

use glam::Vec3;
use std::collections::HashMap;

use crate::config::{ConfigError, Episode};
use crate::geometry::spherical_to_cartesian;

/// Index of a hit-testable primitive (one per node)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimitiveId(pub usize);

#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub title: String,
    pub media_ref: String,
    pub themes: Vec<String>,
    pub theta: f32,
    pub phi: f32,
    /// Position inside the sphere group; never changes after build
    pub local: Vec3,
    pub primitive: PrimitiveId,
}

impl Node {
    /// Theme shown on directional labels
    pub fn primary_theme(&self) -> &str {
        self.themes.first().map(String::as_str).unwrap_or("")
    }
}

/// Unordered pair of nodes with at least one shared theme
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub source: String,
    pub target: String,
    pub shared_themes: Vec<String>,
    source_index: usize,
    target_index: usize,
}

impl Connection {
    pub fn endpoints(&self) -> (usize, usize) {
        (self.source_index, self.target_index)
    }

    /// Id at the other end, if `node_id` is an endpoint
    pub fn other_end(&self, node_id: &str) -> Option<&str> {
        if self.source == node_id {
            Some(&self.target)
        } else if self.target == node_id {
            Some(&self.source)
        } else {
            None
        }
    }

    #[cfg(test)]
    fn joins(&self, a: &str, b: &str) -> bool {
        self.other_end(a) == Some(b)
    }
}

#[derive(Debug, Clone)]
pub struct Registry {
    nodes: Vec<Node>,
    connections: Vec<Connection>,
    by_id: HashMap<String, usize>,
}

impl Registry {
    pub fn build(episodes: &[Episode], radius: f32) -> Result<Self, ConfigError> {
        let mut nodes = Vec::with_capacity(episodes.len());
        let mut by_id = HashMap::with_capacity(episodes.len());

        for (index, episode) in episodes.iter().enumerate() {
            if by_id.insert(episode.id.clone(), index).is_some() {
                return Err(ConfigError::DuplicateEpisode(episode.id.clone()));
            }
            nodes.push(Node {
                id: episode.id.clone(),
                title: episode.title.clone(),
                media_ref: episode.media_ref.clone(),
                themes: episode.themes.clone(),
                theta: episode.theta,
                phi: episode.phi,
                local: spherical_to_cartesian(episode.theta, episode.phi, radius),
                primitive: PrimitiveId(index),
            });
        }

        let connections = derive_connections(&nodes);
        tracing::debug!(
            "Registry built: {} nodes, {} connections",
            nodes.len(),
            connections.len()
        );

        Ok(Self {
            nodes,
            connections,
            by_id,
        })
    }

    pub fn all_nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn find_node_by_id(&self, id: &str) -> Option<&Node> {
        self.by_id.get(id).map(|&i| &self.nodes[i])
    }

    pub fn all_connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Node owning a hit-test primitive
    pub fn node_for_primitive(&self, primitive: PrimitiveId) -> Option<&Node> {
        self.nodes.get(primitive.0)
    }

    /// Nodes sharing at least one theme with `node_id`
    pub fn neighbors(&self, node_id: &str) -> Vec<&Node> {
        self.connections
            .iter()
            .filter_map(|c| c.other_end(node_id))
            .filter_map(|id| self.find_node_by_id(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

fn derive_connections(nodes: &[Node]) -> Vec<Connection> {
    let mut connections = Vec::new();
    for (i, a) in nodes.iter().enumerate() {
        for (j, b) in nodes.iter().enumerate().skip(i + 1) {
            let shared: Vec<String> = a
                .themes
                .iter()
                .filter(|t| b.themes.contains(t))
                .cloned()
                .collect();
            if !shared.is_empty() {
                connections.push(Connection {
                    source: a.id.clone(),
                    target: b.id.clone(),
                    shared_themes: shared,
                    source_index: i,
                    target_index: j,
                });
            }
        }
    }
    connections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::episodes::builtin_episodes;

    fn registry() -> Registry {
        Registry::build(&builtin_episodes(), 950.0).unwrap()
    }

    #[test]
    fn test_lookup() {
        let registry = registry();
        assert_eq!(registry.len(), 8);
        let node = registry.find_node_by_id("episode-003").unwrap();
        assert_eq!(node.title, "The Rise of Remote Work Culture");
        assert_eq!(node.primary_theme(), "business");
        assert!(registry.find_node_by_id("episode-999").is_none());
        assert!((node.local.length() - 950.0).abs() < 0.01);
    }

    #[test]
    fn test_connection_iff_shared_theme() {
        let registry = registry();
        let nodes = registry.all_nodes();
        for a in nodes {
            for b in nodes {
                let shares = a.themes.iter().any(|t| b.themes.contains(t));
                let connected = registry.all_connections().iter().any(|c| c.joins(&a.id, &b.id));
                if a.id == b.id {
                    assert!(!connected, "self pair for {}", a.id);
                } else {
                    assert_eq!(shares, connected, "{} / {}", a.id, b.id);
                    // Symmetric lookup
                    let reverse = registry.all_connections().iter().any(|c| c.joins(&b.id, &a.id));
                    assert_eq!(connected, reverse);
                }
            }
        }
    }

    #[test]
    fn test_each_pair_listed_once() {
        let registry = registry();
        let connections = registry.all_connections();
        for (i, c) in connections.iter().enumerate() {
            assert_ne!(c.source, c.target);
            for other in &connections[i + 1..] {
                assert!(!other.joins(&c.source, &c.target));
            }
        }
        // episode-001 (technology, science) and episode-004 (science, health)
        let c = connections
            .iter()
            .find(|c| c.joins("episode-001", "episode-004"))
            .unwrap();
        assert_eq!(c.shared_themes, vec!["science".to_string()]);
        assert_eq!(c.endpoints(), (0, 3));
    }

    #[test]
    fn test_neighbors() {
        let registry = registry();
        let neighbors: Vec<&str> = registry
            .neighbors("episode-001")
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert!(neighbors.contains(&"episode-004"));
        assert!(!neighbors.contains(&"episode-001"));
        assert!(registry.neighbors("episode-404").is_empty());
    }

    #[test]
    fn test_primitive_maps_to_node() {
        let registry = registry();
        for node in registry.all_nodes() {
            assert_eq!(registry.node_for_primitive(node.primitive).unwrap().id, node.id);
        }
        assert!(registry.node_for_primitive(PrimitiveId(99)).is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut episodes = builtin_episodes();
        episodes.push(episodes[1].clone());
        assert!(Registry::build(&episodes, 950.0).is_err());
    }
}
