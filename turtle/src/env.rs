//! The prefixing environment (spec §4.5): a base URI plus an ordered
//! `prefix -> URI` map. Insertion order (not hash order) drives iteration
//! so serialized output is reproducible, per the "prefix map ordering"
//! design note.

use rdf_api::model::NodeKind;
use rdf_api::Node;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    base: Option<Node>,
    // Ordered insertion map: re-setting an existing prefix updates in
    // place rather than moving it to the end, so earlier `qualify` ties
    // still break toward the original insertion.
    prefixes: Vec<(String, Node)>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self {
            base: None,
            prefixes: Vec::new(),
        }
    }

    pub fn set_base(&mut self, uri: Node) {
        self.base = Some(uri);
    }

    pub fn get_base(&self) -> Option<&Node> {
        self.base.as_ref()
    }

    /// Binds `name` to `uri`. Rejected (returns `false`, no change) if
    /// `uri` is not a URI-kind node.
    pub fn set_prefix(&mut self, name: &str, uri: Node) -> bool {
        if uri.kind() != NodeKind::Uri {
            return false;
        }
        if let Some(entry) = self.prefixes.iter_mut().find(|(n, _)| n == name) {
            entry.1 = uri;
        } else {
            self.prefixes.push((name.to_string(), uri));
        }
        true
    }

    /// Expands a `prefix:local` CURIE body into a full URI node. Returns
    /// `None` if the prefix is unbound.
    pub fn expand(&self, curie: &str) -> Option<Node> {
        let (prefix, local) = curie.split_once(':')?;
        let (_, uri) = self.prefixes.iter().find(|(n, _)| n == prefix)?;
        Some(Node::new_uri(format!("{}{}", uri.as_str(), local)))
    }

    /// Finds the longest bound prefix URI that `uri` starts with and
    /// returns the CURIE form. Ties are broken by insertion order (first
    /// wins).
    pub fn qualify(&self, uri: &str) -> Option<Node> {
        let mut best: Option<(&str, &str, usize)> = None;
        for (name, prefix_uri) in &self.prefixes {
            let prefix_uri = prefix_uri.as_str();
            if let Some(local) = uri.strip_prefix(prefix_uri) {
                // Equal-length ties keep the first (earlier-inserted) match.
                if best.is_none_or(|(_, _, best_len)| prefix_uri.len() > best_len) {
                    best = Some((name, local, prefix_uri.len()));
                }
            }
        }
        best.map(|(name, local, _)| Node::new_curie(format!("{name}:{local}")))
    }

    pub fn iter_prefixes(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.prefixes.iter().map(|(n, u)| (n.as_str(), u))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_prefix_rejects_non_uri() {
        let mut env = Environment::new();
        assert!(!env.set_prefix("eg", Node::new_blank("b1")));
        assert!(env.expand("eg:x").is_none());
    }

    #[test]
    fn expand_is_inverse_of_qualify() {
        let mut env = Environment::new();
        env.set_prefix("eg", Node::new_uri("http://example.org/"));
        let expanded = env.expand("eg:thing").unwrap();
        assert_eq!(expanded.as_str(), "http://example.org/thing");
        let qualified = env.qualify(expanded.as_str()).unwrap();
        assert_eq!(qualified.as_str(), "eg:thing");
    }

    #[test]
    fn qualify_picks_longest_match_first_wins_tie() {
        let mut env = Environment::new();
        env.set_prefix("a", Node::new_uri("http://example.org/"));
        env.set_prefix("b", Node::new_uri("http://example.org/ns/"));
        assert_eq!(
            env.qualify("http://example.org/ns/thing").unwrap().as_str(),
            "b:thing"
        );
        env.set_prefix("c", Node::new_uri("http://example.org/"));
        assert_eq!(
            env.qualify("http://example.org/thing").unwrap().as_str(),
            "a:thing"
        );
    }

    #[test]
    fn iteration_order_is_insertion_order() {
        let mut env = Environment::new();
        env.set_prefix("z", Node::new_uri("http://z.example/"));
        env.set_prefix("a", Node::new_uri("http://a.example/"));
        let names: Vec<&str> = env.iter_prefixes().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["z", "a"]);
    }
}
