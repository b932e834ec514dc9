//! Representation of the analysis document graph.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexSet;
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::Dfs;
use petgraph::visit::EdgeRef;
use url::Url;

use crate::SourceRange;
use crate::document::Document;

/// The URI of the synthetic editor root document.
///
/// Open editor buffers are modeled as inclusions from this root, so the
/// reachability collection needs no special case for them.
pub(crate) const EDITOR_URI: &str = "editor://buffers";

/// Represents a document graph.
///
/// Each node in the graph is a document and each edge is an include
/// relationship from includer to included, weighted with the ranges of the
/// include sites.
#[derive(Debug)]
pub(crate) struct DocumentGraph {
    /// The inner graph.
    inner: StableDiGraph<Document, Vec<SourceRange>>,
    /// Map from document URI to graph node index.
    indexes: HashMap<Arc<Url>, NodeIndex>,
    /// The synthetic editor root node.
    editor: NodeIndex,
}

impl Default for DocumentGraph {
    fn default() -> Self {
        let mut inner = StableDiGraph::new();
        let uri = Arc::new(Url::parse(EDITOR_URI).expect("editor URI should parse"));
        let editor = inner.add_node(Document::new(uri.clone()));
        let mut indexes = HashMap::new();
        indexes.insert(uri, editor);
        Self {
            inner,
            indexes,
            editor,
        }
    }
}

impl DocumentGraph {
    /// Gets a document from the graph.
    pub fn get(&self, index: NodeIndex) -> &Document {
        &self.inner[index]
    }

    /// Gets a mutable document from the graph.
    pub fn get_mut(&mut self, index: NodeIndex) -> &mut Document {
        &mut self.inner[index]
    }

    /// Gets the node index for a document URI.
    pub fn get_index(&self, uri: &Url) -> Option<NodeIndex> {
        let index = *self.indexes.get(uri)?;
        (index != self.editor).then_some(index)
    }

    /// Whether a node is still present in the graph.
    pub fn contains(&self, index: NodeIndex) -> bool {
        self.inner.contains_node(index)
    }

    /// Adds a document to the graph, returning the existing node if the URI
    /// is already known.
    pub fn add_document(&mut self, uri: Arc<Url>) -> NodeIndex {
        if let Some(index) = self.indexes.get(&uri) {
            return *index;
        }

        let index = self.inner.add_node(Document::new(uri.clone()));
        let previous = self.indexes.insert(uri, index);
        assert!(previous.is_none());
        index
    }

    /// Adds an include edge, recording the include site.
    pub fn add_include(&mut self, from: NodeIndex, to: NodeIndex, site: SourceRange) {
        match self.inner.find_edge(from, to) {
            Some(edge) => self.inner[edge].push(site),
            None => {
                self.inner.add_edge(from, to, vec![site]);
            }
        }
    }

    /// Removes every include edge out of a document.
    ///
    /// Called before a reparse, as the document's includes may have changed.
    pub fn remove_include_edges(&mut self, from: NodeIndex) {
        let edges: Vec<_> = self.inner.edges(from).map(|e| e.id()).collect();
        for edge in edges {
            self.inner.remove_edge(edge);
        }
    }

    /// Marks a document as open in the editor.
    pub fn open_in_editor(&mut self, index: NodeIndex) {
        if self.inner.find_edge(self.editor, index).is_none() {
            self.inner.add_edge(self.editor, index, Vec::new());
        }
    }

    /// Marks a document as closed in the editor.
    pub fn close_in_editor(&mut self, index: NodeIndex) {
        if let Some(edge) = self.inner.find_edge(self.editor, index) {
            self.inner.remove_edge(edge);
        }
    }

    /// Whether a document is open in the editor.
    pub fn is_open(&self, index: NodeIndex) -> bool {
        self.inner.find_edge(self.editor, index).is_some()
    }

    /// Iterates the documents in the graph, excluding the editor root.
    pub fn documents(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        let editor = self.editor;
        self.inner.node_indices().filter(move |i| *i != editor)
    }

    /// Gets the documents a document includes, with their include sites.
    pub fn includes(&self, index: NodeIndex) -> Vec<(NodeIndex, &[SourceRange])> {
        self.inner
            .edges_directed(index, Direction::Outgoing)
            .map(|e| (e.target(), e.weight().as_slice()))
            .collect()
    }

    /// Gets the documents that include a document, excluding the editor root.
    pub fn included_by(&self, index: NodeIndex) -> Vec<NodeIndex> {
        self.inner
            .edges_directed(index, Direction::Incoming)
            .map(|e| e.source())
            .filter(|source| *source != self.editor)
            .collect()
    }

    /// Computes the transitive closure of the given seeds along reverse
    /// include edges.
    ///
    /// A change to a document's definitions requires re-checking every
    /// document that directly or transitively includes it.
    pub fn dependents_closure(
        &self,
        seeds: impl IntoIterator<Item = NodeIndex>,
    ) -> IndexSet<NodeIndex> {
        let mut closure: IndexSet<NodeIndex> = seeds.into_iter().collect();
        let mut cursor = 0;
        while cursor < closure.len() {
            let index = closure[cursor];
            cursor += 1;
            for dependent in self.included_by(index) {
                closure.insert(dependent);
            }
        }
        closure
    }

    /// Removes every document that is unreachable from the editor root.
    ///
    /// Returns the URIs of the removed documents. Cyclic include graphs are
    /// collected as a unit once nothing reachable references them.
    pub fn gc(&mut self) -> Vec<Arc<Url>> {
        let mut reachable = IndexSet::new();
        let mut dfs = Dfs::new(&self.inner, self.editor);
        while let Some(index) = dfs.next(&self.inner) {
            reachable.insert(index);
        }

        let unreachable: Vec<NodeIndex> = self
            .inner
            .node_indices()
            .filter(|i| !reachable.contains(i))
            .collect();

        let mut removed = Vec::new();
        for index in unreachable {
            if let Some(document) = self.inner.remove_node(index) {
                self.indexes.remove(document.uri());
                removed.push(document.uri().clone());
            }
        }
        removed
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::SourcePosition;

    /// Creates a URI for a test document.
    fn uri(name: &str) -> Arc<Url> {
        Arc::new(Url::parse(&format!("file:///{name}")).expect("URI should parse"))
    }

    /// Creates an include site range.
    fn site() -> SourceRange {
        SourceRange::at(SourcePosition::new(0, 0), 8)
    }

    #[test]
    fn it_mirrors_include_edges() {
        let mut graph = DocumentGraph::default();
        let a = graph.add_document(uri("a.awk"));
        let b = graph.add_document(uri("b.awk"));
        graph.add_include(a, b, site());

        assert_eq!(
            graph.includes(a).iter().map(|(i, _)| *i).collect::<Vec<_>>(),
            vec![b]
        );
        assert_eq!(graph.included_by(b), vec![a]);
        assert!(graph.included_by(a).is_empty());
    }

    #[test]
    fn it_accumulates_include_sites() {
        let mut graph = DocumentGraph::default();
        let a = graph.add_document(uri("a.awk"));
        let b = graph.add_document(uri("b.awk"));
        graph.add_include(a, b, site());
        graph.add_include(a, b, SourceRange::at(SourcePosition::new(1, 0), 8));

        assert_eq!(graph.includes(a)[0].1.len(), 2);
    }

    #[test]
    fn it_collects_unreachable_documents() {
        let mut graph = DocumentGraph::default();
        let a = graph.add_document(uri("a.awk"));
        let b = graph.add_document(uri("b.awk"));
        graph.open_in_editor(a);
        graph.add_include(a, b, site());

        assert!(graph.gc().is_empty());

        graph.close_in_editor(a);
        let removed = graph.gc();
        assert_eq!(removed.len(), 2);
        assert!(graph.get_index(&uri("a.awk")).is_none());
        assert!(graph.get_index(&uri("b.awk")).is_none());
    }

    #[test]
    fn it_collects_include_cycles_as_a_unit() {
        let mut graph = DocumentGraph::default();
        let a = graph.add_document(uri("a.awk"));
        let b = graph.add_document(uri("b.awk"));
        graph.open_in_editor(a);
        graph.add_include(a, b, site());
        graph.add_include(b, a, site());

        // Both are alive while `a` is open, despite the cycle.
        assert!(graph.gc().is_empty());

        // Once `a` closes, the cycle keeps both documents' include counts
        // non-zero, but neither is reachable.
        graph.close_in_editor(a);
        assert_eq!(graph.gc().len(), 2);
    }

    #[test]
    fn it_computes_the_dependents_closure() {
        let mut graph = DocumentGraph::default();
        let lib = graph.add_document(uri("lib.awk"));
        let mid = graph.add_document(uri("mid.awk"));
        let app = graph.add_document(uri("app.awk"));
        let other = graph.add_document(uri("other.awk"));
        graph.add_include(app, mid, site());
        graph.add_include(mid, lib, site());

        let closure = graph.dependents_closure([lib]);
        assert!(closure.contains(&lib));
        assert!(closure.contains(&mid));
        assert!(closure.contains(&app));
        assert!(!closure.contains(&other));
    }

    #[test]
    fn it_hides_the_editor_root() {
        let mut graph = DocumentGraph::default();
        let a = graph.add_document(uri("a.awk"));
        graph.open_in_editor(a);

        assert_eq!(graph.documents().collect::<Vec<_>>(), vec![a]);
        assert!(graph.included_by(a).is_empty());
        assert!(
            graph
                .get_index(&Url::parse(EDITOR_URI).expect("URI should parse"))
                .is_none()
        );
    }
}
