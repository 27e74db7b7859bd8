//! Directed graph container used by `tapir`.
//!
//! Nodes and edges keep insertion order so every traversal is deterministic. Labels are
//! generic; the layout engine stores geometry in them while the graph only tracks structure.

use rustc_hash::FxBuildHasher;
use std::fmt;

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

#[derive(Debug, Clone, Copy, Default)]
pub struct GraphOptions {
    /// Allow several edges between the same ordered pair, distinguished by name.
    pub multigraph: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub v: String,
    pub w: String,
    pub name: Option<String>,
}

impl EdgeKey {
    pub fn new(
        v: impl Into<String>,
        w: impl Into<String>,
        name: Option<impl Into<String>>,
    ) -> Self {
        Self {
            v: v.into(),
            w: w.into(),
            name: name.map(Into::into),
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.v == self.w
    }
}

#[derive(Debug, Clone)]
struct NodeEntry<N> {
    id: String,
    label: N,
}

#[derive(Debug, Clone)]
struct EdgeEntry<E> {
    key: EdgeKey,
    label: E,
}

pub struct Graph<N, E, G>
where
    N: Default + 'static,
    E: Default + 'static,
    G: Default,
{
    options: GraphOptions,

    graph_label: G,

    nodes: Vec<NodeEntry<N>>,
    node_index: HashMap<String, usize>,

    edges: Vec<EdgeEntry<E>>,
    edge_index: HashMap<EdgeKey, usize>,

    // Edge indices per node index.
    out_adj: Vec<Vec<usize>>,
    in_adj: Vec<Vec<usize>>,
}

impl<N, E, G> Default for Graph<N, E, G>
where
    N: Default + 'static,
    E: Default + 'static,
    G: Default,
{
    fn default() -> Self {
        Self::new(GraphOptions::default())
    }
}

impl<N, E, G> fmt::Debug for Graph<N, E, G>
where
    N: Default + fmt::Debug + 'static,
    E: Default + fmt::Debug + 'static,
    G: Default + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("options", &self.options)
            .field("graph", &self.graph_label)
            .field("nodes", &self.nodes)
            .field("edges", &self.edges)
            .finish()
    }
}

impl<N, E, G> Graph<N, E, G>
where
    N: Default + 'static,
    E: Default + 'static,
    G: Default,
{
    pub fn new(options: GraphOptions) -> Self {
        Self {
            options,
            graph_label: G::default(),
            nodes: Vec::new(),
            node_index: HashMap::default(),
            edges: Vec::new(),
            edge_index: HashMap::default(),
            out_adj: Vec::new(),
            in_adj: Vec::new(),
        }
    }

    pub fn options(&self) -> GraphOptions {
        self.options
    }

    pub fn set_graph(&mut self, label: G) -> &mut Self {
        self.graph_label = label;
        self
    }

    pub fn graph(&self) -> &G {
        &self.graph_label
    }

    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph_label
    }

    // ---- nodes ----

    pub fn has_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    /// Inserts a node or replaces the label of an existing one. Order is kept on replace.
    pub fn set_node(&mut self, id: impl Into<String>, label: N) -> &mut Self {
        let id = id.into();
        if let Some(&idx) = self.node_index.get(id.as_str()) {
            self.nodes[idx].label = label;
            return self;
        }
        self.push_node(id, label);
        self
    }

    pub fn ensure_node(&mut self, id: impl Into<String>) -> &mut Self {
        let id = id.into();
        if !self.node_index.contains_key(id.as_str()) {
            self.push_node(id, N::default());
        }
        self
    }

    fn push_node(&mut self, id: String, label: N) {
        let idx = self.nodes.len();
        self.node_index.insert(id.clone(), idx);
        self.nodes.push(NodeEntry { id, label });
        self.out_adj.push(Vec::new());
        self.in_adj.push(Vec::new());
    }

    pub fn node(&self, id: &str) -> Option<&N> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx].label)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut N> {
        let idx = *self.node_index.get(id)?;
        Some(&mut self.nodes[idx].label)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.id.as_str())
    }

    pub fn node_ids(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }

    pub fn for_each_node_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&str, &mut N),
    {
        for n in &mut self.nodes {
            f(n.id.as_str(), &mut n.label);
        }
    }

    /// Removes the node and every incident edge.
    pub fn remove_node(&mut self, id: &str) -> bool {
        let Some(idx) = self.node_index.remove(id) else {
            return false;
        };
        self.nodes.remove(idx);
        self.edges.retain(|e| e.key.v != id && e.key.w != id);
        self.reindex();
        true
    }

    // ---- edges ----

    fn canonical_name(&self, name: Option<String>) -> Option<String> {
        if self.options.multigraph { name } else { None }
    }

    fn lookup(&self, v: &str, w: &str, name: Option<&str>) -> Option<usize> {
        let key = EdgeKey {
            v: v.to_string(),
            w: w.to_string(),
            name: self.canonical_name(name.map(str::to_string)),
        };
        self.edge_index.get(&key).copied()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeKey> {
        self.edges.iter().map(|e| &e.key)
    }

    pub fn edge_keys(&self) -> Vec<EdgeKey> {
        self.edges.iter().map(|e| e.key.clone()).collect()
    }

    pub fn set_edge(&mut self, v: impl Into<String>, w: impl Into<String>) -> &mut Self {
        self.set_edge_named(v, w, None::<String>, None)
    }

    pub fn set_edge_with_label(
        &mut self,
        v: impl Into<String>,
        w: impl Into<String>,
        label: E,
    ) -> &mut Self {
        self.set_edge_named(v, w, None::<String>, Some(label))
    }

    /// Inserts an edge, creating missing endpoints. An existing edge keeps its slot and only
    /// has its label replaced when one is given.
    pub fn set_edge_named(
        &mut self,
        v: impl Into<String>,
        w: impl Into<String>,
        name: Option<impl Into<String>>,
        label: Option<E>,
    ) -> &mut Self {
        let v = v.into();
        let w = w.into();
        self.ensure_node(v.as_str());
        self.ensure_node(w.as_str());

        let name = self.canonical_name(name.map(Into::into));
        let key = EdgeKey { v, w, name };

        if let Some(&idx) = self.edge_index.get(&key) {
            if let Some(label) = label {
                self.edges[idx].label = label;
            }
            return self;
        }

        let idx = self.edges.len();
        let v_idx = self.node_index[key.v.as_str()];
        let w_idx = self.node_index[key.w.as_str()];
        self.out_adj[v_idx].push(idx);
        self.in_adj[w_idx].push(idx);
        self.edge_index.insert(key.clone(), idx);
        self.edges.push(EdgeEntry {
            key,
            label: label.unwrap_or_default(),
        });
        self
    }

    pub fn set_edge_key(&mut self, key: EdgeKey, label: E) -> &mut Self {
        self.set_edge_named(key.v, key.w, key.name, Some(label))
    }

    pub fn has_edge(&self, v: &str, w: &str, name: Option<&str>) -> bool {
        self.lookup(v, w, name).is_some()
    }

    pub fn edge(&self, v: &str, w: &str, name: Option<&str>) -> Option<&E> {
        let idx = self.lookup(v, w, name)?;
        Some(&self.edges[idx].label)
    }

    pub fn edge_by_key(&self, key: &EdgeKey) -> Option<&E> {
        self.edge(&key.v, &key.w, key.name.as_deref())
    }

    pub fn edge_mut_by_key(&mut self, key: &EdgeKey) -> Option<&mut E> {
        let idx = self.lookup(&key.v, &key.w, key.name.as_deref())?;
        Some(&mut self.edges[idx].label)
    }

    pub fn for_each_edge_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&EdgeKey, &mut E),
    {
        for e in &mut self.edges {
            f(&e.key, &mut e.label);
        }
    }

    pub fn remove_edge(&mut self, v: &str, w: &str, name: Option<&str>) -> Option<E> {
        let idx = self.lookup(v, w, name)?;
        let entry = self.edges.remove(idx);
        self.reindex();
        Some(entry.label)
    }

    pub fn remove_edge_key(&mut self, key: &EdgeKey) -> Option<E> {
        self.remove_edge(&key.v, &key.w, key.name.as_deref())
    }

    fn reindex(&mut self) {
        self.node_index.clear();
        for (i, n) in self.nodes.iter().enumerate() {
            self.node_index.insert(n.id.clone(), i);
        }
        self.edge_index.clear();
        self.out_adj = vec![Vec::new(); self.nodes.len()];
        self.in_adj = vec![Vec::new(); self.nodes.len()];
        for (i, e) in self.edges.iter().enumerate() {
            self.edge_index.insert(e.key.clone(), i);
            if let (Some(&v), Some(&w)) = (
                self.node_index.get(e.key.v.as_str()),
                self.node_index.get(e.key.w.as_str()),
            ) {
                self.out_adj[v].push(i);
                self.in_adj[w].push(i);
            }
        }
    }

    // ---- adjacency ----

    fn out_edge_indices(&self, v: &str) -> &[usize] {
        match self.node_index.get(v) {
            Some(&idx) => &self.out_adj[idx],
            None => &[],
        }
    }

    fn in_edge_indices(&self, v: &str) -> &[usize] {
        match self.node_index.get(v) {
            Some(&idx) => &self.in_adj[idx],
            None => &[],
        }
    }

    /// Distinct successors of `v`, in edge insertion order.
    pub fn successors(&self, v: &str) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for &i in self.out_edge_indices(v) {
            let w = self.edges[i].key.w.as_str();
            if !out.contains(&w) {
                out.push(w);
            }
        }
        out
    }

    /// Distinct predecessors of `v`, in edge insertion order.
    pub fn predecessors(&self, v: &str) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for &i in self.in_edge_indices(v) {
            let u = self.edges[i].key.v.as_str();
            if !out.contains(&u) {
                out.push(u);
            }
        }
        out
    }

    pub fn out_edges(&self, v: &str, w: Option<&str>) -> Vec<EdgeKey> {
        self.out_edge_indices(v)
            .iter()
            .map(|&i| &self.edges[i].key)
            .filter(|k| w.is_none_or(|w| k.w == w))
            .cloned()
            .collect()
    }

    pub fn for_each_out_edge<F>(&self, v: &str, mut f: F)
    where
        F: FnMut(&EdgeKey, &E),
    {
        for &i in self.out_edge_indices(v) {
            let e = &self.edges[i];
            f(&e.key, &e.label);
        }
    }

    pub fn for_each_in_edge<F>(&self, v: &str, mut f: F)
    where
        F: FnMut(&EdgeKey, &E),
    {
        for &i in self.in_edge_indices(v) {
            let e = &self.edges[i];
            f(&e.key, &e.label);
        }
    }

    /// Nodes with no incoming edges.
    pub fn sources(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(i, _)| self.in_adj[*i].is_empty())
            .map(|(_, n)| n.id.as_str())
            .collect()
    }

}

impl<N, E, G> Clone for Graph<N, E, G>
where
    N: Default + Clone + 'static,
    E: Default + Clone + 'static,
    G: Default + Clone,
{
    fn clone(&self) -> Self {
        Self {
            options: self.options,
            graph_label: self.graph_label.clone(),
            nodes: self.nodes.clone(),
            node_index: self.node_index.clone(),
            edges: self.edges.clone(),
            edge_index: self.edge_index.clone(),
            out_adj: self.out_adj.clone(),
            in_adj: self.in_adj.clone(),
        }
    }
}

pub mod alg {
    use super::Graph;
    use std::collections::{BTreeMap, BTreeSet, VecDeque};
    use std::fmt;

    /// Returned by [`topsort`] when the graph is not a DAG.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct CycleError {
        /// Nodes that could not be ordered.
        pub remaining: Vec<String>,
    }

    impl fmt::Display for CycleError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "graph has a cycle through {} node(s)", self.remaining.len())
        }
    }

    impl std::error::Error for CycleError {}

    /// Kahn's algorithm. Ties are broken by node insertion order.
    pub fn topsort<N, E, G>(g: &Graph<N, E, G>) -> Result<Vec<String>, CycleError>
    where
        N: Default + 'static,
        E: Default + 'static,
        G: Default,
    {
        let mut indegree: BTreeMap<&str, usize> = BTreeMap::new();
        for v in g.nodes() {
            indegree.insert(v, g.predecessors(v).len());
        }
        let mut queue: VecDeque<&str> = g.nodes().filter(|v| indegree[v] == 0).collect();
        let mut out: Vec<String> = Vec::with_capacity(g.node_count());

        while let Some(v) = queue.pop_front() {
            out.push(v.to_string());
            for w in g.successors(v) {
                if let Some(d) = indegree.get_mut(w) {
                    *d -= 1;
                    if *d == 0 {
                        queue.push_back(w);
                    }
                }
            }
        }

        if out.len() == g.node_count() {
            Ok(out)
        } else {
            let done: BTreeSet<&str> = out.iter().map(String::as_str).collect();
            let remaining = g
                .nodes()
                .filter(|v| !done.contains(v))
                .map(str::to_string)
                .collect();
            Err(CycleError { remaining })
        }
    }
}
