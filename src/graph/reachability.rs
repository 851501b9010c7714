//! Bounded reachability search over accepted connection edges.
//!
//! A user's degree of separation from another is the shortest-path hop
//! count over accepted edges, treated as undirected, capped at
//! [`MAX_DEGREE`]. The search is a level-order BFS with a visited set, so
//! it reports the minimum depth at which the target first appears and
//! terminates on cyclic graphs.

use std::collections::HashSet;

use crate::error::Result;
use crate::graph::store::GraphStore;

/// The directory's reachability bound: three degrees of separation.
pub const MAX_DEGREE: u32 = 3;

// ---------------------------------------------------------------------------
// Result type
// ---------------------------------------------------------------------------

/// Outcome of a degree search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    /// The target is reachable at this minimum hop count (1..=MAX_DEGREE).
    Degree(u32),
    /// No path within the bound.
    OutOfRange,
}

impl Reachability {
    pub fn is_within_range(&self) -> bool {
        matches!(self, Self::Degree(_))
    }
}

// ---------------------------------------------------------------------------
// bounded_bfs
// ---------------------------------------------------------------------------

/// Level-order BFS from `source`, bounded to `max_depth` hops.
///
/// Returns the depth at which `target` first appears, or `None` when the
/// bound is exhausted. `neighbors` is queried once per visited node; the
/// visited set guarantees termination and that the reported depth is
/// minimal regardless of neighbor order.
pub fn bounded_bfs<F>(
    source: &str,
    target: &str,
    max_depth: u32,
    mut neighbors: F,
) -> Result<Option<u32>>
where
    F: FnMut(&str) -> Result<Vec<String>>,
{
    if source == target {
        return Ok(Some(0));
    }

    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(source.to_string());
    let mut frontier: Vec<String> = vec![source.to_string()];

    for depth in 1..=max_depth {
        let mut next: Vec<String> = Vec::new();
        for user in &frontier {
            for peer in neighbors(user)? {
                if peer == target {
                    return Ok(Some(depth));
                }
                if visited.insert(peer.clone()) {
                    next.push(peer);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    Ok(None)
}

// ---------------------------------------------------------------------------
// ReachabilityEngine
// ---------------------------------------------------------------------------

/// Degree-of-separation search over the accepted-edge graph of a store.
///
/// Read-only: issues lookups through [`GraphStore::accepted_peers`] and
/// never writes. Runs on the store's single connection, so it observes a
/// serialized view of the graph.
pub struct ReachabilityEngine<'a> {
    store: &'a GraphStore,
}

impl<'a> ReachabilityEngine<'a> {
    pub fn new(store: &'a GraphStore) -> Self {
        Self { store }
    }

    /// Minimum degree of separation between `source` and `target`, capped
    /// at [`MAX_DEGREE`]. A user is at degree 0 from themselves; request
    /// validation rejects self-connections before this runs.
    pub fn find_degree(&self, source: &str, target: &str) -> Result<Reachability> {
        let found = bounded_bfs(source, target, MAX_DEGREE, |user| {
            self.store.accepted_peers(user)
        })?;
        match found {
            Some(depth) => Ok(Reachability::Degree(depth)),
            None => Ok(Reachability::OutOfRange),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::db::schema::initialize_database;
    use crate::types::{EdgeStatus, NewUser};

    // -- bounded_bfs over a pure adjacency map ---------------------------

    fn adjacency(edges: &[(&str, &str)]) -> HashMap<String, Vec<String>> {
        let mut adj: HashMap<String, Vec<String>> = HashMap::new();
        for (a, b) in edges {
            adj.entry(a.to_string()).or_default().push(b.to_string());
            adj.entry(b.to_string()).or_default().push(a.to_string());
        }
        adj
    }

    fn bfs_over(
        adj: &HashMap<String, Vec<String>>,
        source: &str,
        target: &str,
        max_depth: u32,
    ) -> Option<u32> {
        bounded_bfs(source, target, max_depth, |user| {
            Ok(adj.get(user).cloned().unwrap_or_default())
        })
        .unwrap()
    }

    #[test]
    fn bfs_finds_each_level_of_a_chain() {
        let adj = adjacency(&[("a", "b"), ("b", "c"), ("c", "d"), ("d", "e")]);
        assert_eq!(bfs_over(&adj, "a", "b", 3), Some(1));
        assert_eq!(bfs_over(&adj, "a", "c", 3), Some(2));
        assert_eq!(bfs_over(&adj, "a", "d", 3), Some(3));
        assert_eq!(bfs_over(&adj, "a", "e", 3), None, "four hops is out of bound");
    }

    #[test]
    fn bfs_self_is_distance_zero() {
        let adj = adjacency(&[("a", "b")]);
        assert_eq!(bfs_over(&adj, "a", "a", 3), Some(0));
    }

    #[test]
    fn bfs_reports_minimum_over_multiple_paths() {
        // a-b-c-d long way round, plus a direct a-d edge.
        let adj = adjacency(&[("a", "b"), ("b", "c"), ("c", "d"), ("a", "d")]);
        assert_eq!(bfs_over(&adj, "a", "d", 3), Some(1));
    }

    #[test]
    fn bfs_terminates_on_cycles() {
        let adj = adjacency(&[("a", "b"), ("b", "c"), ("c", "a")]);
        assert_eq!(bfs_over(&adj, "a", "c", 3), Some(1));
        assert_eq!(bfs_over(&adj, "a", "zz", 3), None);
    }

    #[test]
    fn bfs_isolated_source_is_unreachable() {
        let adj = adjacency(&[("b", "c")]);
        assert_eq!(bfs_over(&adj, "a", "c", 3), None);
    }

    // -- engine over a real store ----------------------------------------

    fn setup() -> GraphStore {
        let conn = initialize_database(":memory:").expect("schema init should succeed on :memory:");
        GraphStore::from_connection(conn)
    }

    fn seed_users(store: &GraphStore, ids: &[&str]) {
        for id in ids {
            store
                .insert_user(&NewUser {
                    user_id: id.to_string(),
                    password: "pw".to_string(),
                    name: id.to_string(),
                    email: format!("{id}@example.com"),
                    date_of_birth: None,
                })
                .unwrap();
        }
    }

    fn accept_edge(store: &GraphStore, a: &str, b: &str) {
        let id = store.insert_edge(a, b, EdgeStatus::Requested).unwrap();
        store.resolve_edge(id, EdgeStatus::Accepted, 1).unwrap();
    }

    #[test]
    fn degree_chain_through_the_store() {
        let store = setup();
        seed_users(&store, &["a", "b", "c", "d", "e"]);
        accept_edge(&store, "a", "b");
        accept_edge(&store, "b", "c");
        accept_edge(&store, "c", "d");
        accept_edge(&store, "d", "e");

        let engine = ReachabilityEngine::new(&store);
        assert_eq!(engine.find_degree("a", "b").unwrap(), Reachability::Degree(1));
        assert_eq!(engine.find_degree("a", "c").unwrap(), Reachability::Degree(2));
        assert_eq!(engine.find_degree("a", "d").unwrap(), Reachability::Degree(3));
        assert_eq!(engine.find_degree("a", "e").unwrap(), Reachability::OutOfRange);
    }

    #[test]
    fn accepted_edges_are_undirected() {
        let store = setup();
        seed_users(&store, &["a", "b", "c"]);
        // b asked a, c asked b — the path a-b-c exists regardless of who
        // requested whom.
        accept_edge(&store, "b", "a");
        accept_edge(&store, "c", "b");

        let engine = ReachabilityEngine::new(&store);
        assert_eq!(engine.find_degree("a", "c").unwrap(), Reachability::Degree(2));
        assert_eq!(engine.find_degree("c", "a").unwrap(), Reachability::Degree(2));
    }

    #[test]
    fn pending_and_rejected_edges_do_not_count() {
        let store = setup();
        seed_users(&store, &["a", "b", "c"]);
        store.insert_edge("a", "b", EdgeStatus::Requested).unwrap();
        let id = store.insert_edge("b", "c", EdgeStatus::Requested).unwrap();
        store.resolve_edge(id, EdgeStatus::Rejected, 1).unwrap();

        let engine = ReachabilityEngine::new(&store);
        assert_eq!(engine.find_degree("a", "b").unwrap(), Reachability::OutOfRange);
        assert_eq!(engine.find_degree("b", "c").unwrap(), Reachability::OutOfRange);
    }

    #[test]
    fn diamond_reports_minimum_degree() {
        let store = setup();
        seed_users(&store, &["a", "b", "c", "d", "e"]);
        // Long path a-b-c-d plus short path a-e-d.
        accept_edge(&store, "a", "b");
        accept_edge(&store, "b", "c");
        accept_edge(&store, "c", "d");
        accept_edge(&store, "a", "e");
        accept_edge(&store, "e", "d");

        let engine = ReachabilityEngine::new(&store);
        assert_eq!(engine.find_degree("a", "d").unwrap(), Reachability::Degree(2));
    }

    #[test]
    fn cycle_in_store_graph_terminates() {
        let store = setup();
        seed_users(&store, &["a", "b", "c", "x"]);
        accept_edge(&store, "a", "b");
        accept_edge(&store, "b", "c");
        accept_edge(&store, "c", "a");

        let engine = ReachabilityEngine::new(&store);
        assert_eq!(engine.find_degree("a", "c").unwrap(), Reachability::Degree(1));
        assert_eq!(engine.find_degree("a", "x").unwrap(), Reachability::OutOfRange);
    }

    // -- properties -------------------------------------------------------

    use proptest::prelude::*;

    const PROP_USERS: usize = 8;

    fn user_name(i: usize) -> String {
        format!("u{i}")
    }

    /// Reference shortest-path search, unbounded, over an undirected edge
    /// list.
    fn reference_distance(edges: &[(usize, usize)], source: usize, target: usize) -> Option<u32> {
        let mut adj: HashMap<usize, Vec<usize>> = HashMap::new();
        for &(a, b) in edges {
            adj.entry(a).or_default().push(b);
            adj.entry(b).or_default().push(a);
        }
        let mut dist: HashMap<usize, u32> = HashMap::new();
        dist.insert(source, 0);
        let mut queue = std::collections::VecDeque::new();
        queue.push_back(source);
        while let Some(node) = queue.pop_front() {
            let d = dist[&node];
            for &next in adj.get(&node).into_iter().flatten() {
                if !dist.contains_key(&next) {
                    dist.insert(next, d + 1);
                    queue.push_back(next);
                }
            }
        }
        dist.get(&target).copied()
    }

    fn store_with_accepted_edges(edges: &[(usize, usize)]) -> GraphStore {
        let store = setup();
        for i in 0..PROP_USERS {
            seed_users(&store, &[user_name(i).as_str()]);
        }
        for &(a, b) in edges {
            accept_edge(&store, &user_name(a), &user_name(b));
        }
        store
    }

    /// Dedup raw pairs to one edge per unordered pair, dropping self loops
    /// (the active-pair index allows at most one).
    fn normalize_edges(raw: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        for (a, b) in raw {
            if a == b {
                continue;
            }
            let key = (a.min(b), a.max(b));
            if seen.insert(key) {
                edges.push((a, b));
            }
        }
        edges
    }

    proptest! {
        #[test]
        fn find_degree_matches_reference_search(
            raw in proptest::collection::vec((0..PROP_USERS, 0..PROP_USERS), 0..16)
        ) {
            let edges = normalize_edges(raw);
            let store = store_with_accepted_edges(&edges);
            let engine = ReachabilityEngine::new(&store);

            for target in 1..PROP_USERS {
                let expected = match reference_distance(&edges, 0, target) {
                    Some(d) if d >= 1 && d <= MAX_DEGREE => Reachability::Degree(d),
                    _ => Reachability::OutOfRange,
                };
                let actual = engine.find_degree("u0", &user_name(target)).unwrap();
                prop_assert_eq!(actual, expected, "target u{}", target);
            }
        }

        #[test]
        fn find_degree_is_insertion_order_independent(
            raw in proptest::collection::vec((0..PROP_USERS, 0..PROP_USERS), 0..16)
        ) {
            let edges = normalize_edges(raw);
            let mut reversed = edges.clone();
            reversed.reverse();

            let store_a = store_with_accepted_edges(&edges);
            let store_b = store_with_accepted_edges(&reversed);
            let engine_a = ReachabilityEngine::new(&store_a);
            let engine_b = ReachabilityEngine::new(&store_b);

            for target in 1..PROP_USERS {
                let name = user_name(target);
                prop_assert_eq!(
                    engine_a.find_degree("u0", &name).unwrap(),
                    engine_b.find_degree("u0", &name).unwrap()
                );
            }
        }
    }
}
