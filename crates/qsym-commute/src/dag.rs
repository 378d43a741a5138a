//! Commutation DAG of a circuit.
//!
//! Nodes are the circuit's operations in insertion order. An edge `i → j`
//! means operation `i` comes before `j` and the two do not commute. Edges
//! implied by transitivity are left out, so the graph is the transitive
//! reduction of the "must stay ordered" relation; the full closure is kept
//! per node.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex as PetNodeIndex};
use petgraph::visit::EdgeRef;
use qsym_ir::{IrError, IrResult, Measurement, Operator, Tape, Wire, Wires};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};

use crate::checker::{CommutationChecker, ensure_supported};
use crate::error::{CommuteError, CommuteResult};

/// Node index type for the commutation DAG.
pub type NodeIndex = PetNodeIndex<u32>;

/// One operation of the circuit.
///
/// Wire fields hold remapped indices (positions in [`CommutationDag::wires`]),
/// the operator itself keeps its original labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommutationNode {
    index: usize,
    op: Operator,
    wires: Vec<usize>,
    target_wires: Vec<usize>,
    control_wires: Vec<usize>,
    direct_predecessors: Vec<usize>,
    direct_successors: Vec<usize>,
    predecessors: Vec<usize>,
    successors: Vec<usize>,
}

impl CommutationNode {
    /// Position in insertion order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The operation.
    pub fn op(&self) -> &Operator {
        &self.op
    }

    /// Remapped wires in the operator's own order.
    pub fn wires(&self) -> &[usize] {
        &self.wires
    }

    /// Remapped target wires.
    pub fn target_wires(&self) -> &[usize] {
        &self.target_wires
    }

    /// Remapped control wires.
    pub fn control_wires(&self) -> &[usize] {
        &self.control_wires
    }

    /// Nodes with an edge into this one, ascending.
    pub fn direct_predecessors(&self) -> &[usize] {
        &self.direct_predecessors
    }

    /// Nodes this one has an edge to, ascending.
    pub fn direct_successors(&self) -> &[usize] {
        &self.direct_successors
    }

    /// Every node that must come before this one, ascending.
    pub fn predecessors(&self) -> &[usize] {
        &self.predecessors
    }

    /// Every node that must come after this one, ascending.
    pub fn successors(&self) -> &[usize] {
        &self.successors
    }
}

/// An ordering constraint between two operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommutationEdge {
    /// Always `false`: edges only join non-commuting operations.
    pub commute: bool,
}

/// An edge as `(source, target, weight)`.
pub type EdgeEntry = (usize, usize, CommutationEdge);

/// Commutation DAG over a sequence of operations.
///
/// ## Performance
///
/// Each wire keeps the list of nodes touching it, so a new node is only
/// compared against operations it shares a wire with. Ancestors of a
/// non-commuting node are skipped, since the order with them is already
/// implied.
#[derive(Debug, Clone)]
pub struct CommutationDag {
    graph: DiGraph<CommutationNode, CommutationEdge, u32>,
    checker: CommutationChecker,
    /// Original wire label to remapped index.
    wire_map: FxHashMap<Wire, usize>,
    /// Original wire labels in remapped order.
    wires: Vec<Wire>,
    /// Per remapped wire, the nodes acting on it in insertion order.
    frontier: Vec<Vec<usize>>,
    observables: Vec<Measurement>,
}

impl Default for CommutationDag {
    fn default() -> Self {
        Self::new()
    }
}

impl CommutationDag {
    /// Empty DAG using the default checker.
    pub fn new() -> Self {
        Self::with_checker(CommutationChecker::default())
    }

    /// Empty DAG using `checker` for commutation queries.
    pub fn with_checker(checker: CommutationChecker) -> Self {
        Self {
            graph: DiGraph::default(),
            checker,
            wire_map: FxHashMap::default(),
            wires: Vec::new(),
            frontier: Vec::new(),
            observables: Vec::new(),
        }
    }

    /// Build the DAG of `operations`; `observables` are stored alongside.
    ///
    /// Wires are numbered in order of first appearance, operations first.
    #[instrument(skip_all, fields(num_ops = operations.len(), num_observables = observables.len()))]
    pub fn build(operations: &[Operator], observables: &[Measurement]) -> CommuteResult<Self> {
        Self::new().populate(operations, observables)
    }

    /// [`build`](Self::build) with a custom checker.
    #[instrument(skip_all, fields(num_ops = operations.len()))]
    pub fn build_with(
        checker: CommutationChecker,
        operations: &[Operator],
        observables: &[Measurement],
    ) -> CommuteResult<Self> {
        Self::with_checker(checker).populate(operations, observables)
    }

    /// DAG of a recorded tape.
    pub fn from_tape(tape: &Tape) -> CommuteResult<Self> {
        Self::build(tape.operations(), tape.measurements())
    }

    /// Record a circuit with `f` and build its DAG.
    ///
    /// # Errors
    ///
    /// [`CommuteError::InvalidInput`] if `f` applies no operation.
    pub fn from_recorder<F>(f: F) -> CommuteResult<Self>
    where
        F: FnOnce(&mut Tape) -> IrResult<()>,
    {
        let tape = Tape::record(f)?;
        if tape.operations().is_empty() {
            return Err(CommuteError::InvalidInput(
                "function contains no quantum operation".into(),
            ));
        }
        Self::from_tape(&tape)
    }

    fn populate(mut self, operations: &[Operator], observables: &[Measurement]) -> CommuteResult<Self> {
        for op in operations {
            self.add_node(op.clone())?;
        }
        for m in observables {
            for w in m.wires.iter() {
                self.remap_wire(w);
            }
            self.observables.push(m.clone());
        }
        info!(
            nodes = self.num_nodes(),
            edges = self.graph.edge_count(),
            wires = self.wires.len(),
            "commutation DAG built"
        );
        Ok(self)
    }

    fn remap_wire(&mut self, wire: &Wire) -> usize {
        if let Some(&i) = self.wire_map.get(wire) {
            return i;
        }
        let i = self.wires.len();
        self.wire_map.insert(wire.clone(), i);
        self.wires.push(wire.clone());
        self.frontier.push(Vec::new());
        i
    }

    fn remap(&mut self, wires: &Wires) -> Vec<usize> {
        wires.iter().map(|w| self.remap_wire(w)).collect()
    }

    /// Append an operation and connect it to every earlier operation it must
    /// stay ordered after. Returns the new node's index.
    ///
    /// On error the DAG is left unchanged.
    pub fn add_node(&mut self, op: Operator) -> CommuteResult<usize> {
        ensure_supported(&op)?;
        let index = self.graph.node_count();

        let mut candidates: Vec<usize> = op
            .wires()
            .iter()
            .filter_map(|w| self.wire_map.get(w))
            .flat_map(|&w| self.frontier[w].iter().copied())
            .collect();
        candidates.sort_unstable();
        candidates.dedup();

        let mut reachable = vec![true; index];
        let mut direct_predecessors = Vec::new();
        for &prev in candidates.iter().rev() {
            if !reachable[prev] {
                continue;
            }
            let prev_node = &self.graph[PetNodeIndex::new(prev)];
            let commutes = self.checker.commutes(&prev_node.op, &op)?;
            trace!(prev, new = index, commutes, "pair checked");
            if !commutes {
                direct_predecessors.push(prev);
                for &p in &prev_node.predecessors {
                    reachable[p] = false;
                }
            }
        }
        direct_predecessors.sort_unstable();

        let mut predecessors = direct_predecessors.clone();
        for &d in &direct_predecessors {
            predecessors.extend_from_slice(&self.graph[PetNodeIndex::new(d)].predecessors);
        }
        predecessors.sort_unstable();
        predecessors.dedup();

        let wires = self.remap(op.wires());
        let control_wires = self.remap(&op.control_wires());
        let target_wires: Vec<usize> = wires
            .iter()
            .copied()
            .filter(|w| !control_wires.contains(w))
            .collect();

        let node = self.graph.add_node(CommutationNode {
            index,
            op,
            wires: wires.clone(),
            target_wires,
            control_wires,
            direct_predecessors: direct_predecessors.clone(),
            direct_successors: Vec::new(),
            predecessors: predecessors.clone(),
            successors: Vec::new(),
        });

        for &d in &direct_predecessors {
            let source = PetNodeIndex::new(d);
            self.graph.add_edge(source, node, CommutationEdge { commute: false });
            self.graph[source].direct_successors.push(index);
            debug!(source = d, target = index, "edge added");
        }
        for &p in &predecessors {
            self.graph[PetNodeIndex::new(p)].successors.push(index);
        }
        for &w in &wires {
            self.frontier[w].push(index);
        }

        Ok(index)
    }

    fn node_index(&self, i: usize) -> CommuteResult<NodeIndex> {
        if i < self.graph.node_count() {
            Ok(PetNodeIndex::new(i))
        } else {
            Err(CommuteError::InvalidNode(i))
        }
    }

    /// Number of nodes.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the DAG has no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Node `i`.
    pub fn get_node(&self, i: usize) -> CommuteResult<&CommutationNode> {
        Ok(&self.graph[self.node_index(i)?])
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &CommutationNode> {
        self.graph.node_weights()
    }

    /// Direct predecessors of node `i`, ascending.
    pub fn direct_predecessors(&self, i: usize) -> CommuteResult<&[usize]> {
        Ok(self.get_node(i)?.direct_predecessors())
    }

    /// Direct successors of node `i`, ascending.
    pub fn direct_successors(&self, i: usize) -> CommuteResult<&[usize]> {
        Ok(self.get_node(i)?.direct_successors())
    }

    /// All predecessors of node `i`, ascending.
    pub fn predecessors(&self, i: usize) -> CommuteResult<&[usize]> {
        Ok(self.get_node(i)?.predecessors())
    }

    /// All successors of node `i`, ascending.
    pub fn successors(&self, i: usize) -> CommuteResult<&[usize]> {
        Ok(self.get_node(i)?.successors())
    }

    /// The edge `i → j`, if there is one.
    ///
    /// # Errors
    ///
    /// [`CommuteError::InvalidNode`] if either index is out of range.
    pub fn get_edge(&self, i: usize, j: usize) -> CommuteResult<Option<&CommutationEdge>> {
        let source = self.node_index(i)?;
        let target = self.node_index(j)?;
        Ok(self.graph.find_edge(source, target).map(|e| &self.graph[e]))
    }

    /// Every edge, sorted by `(source, target)`.
    pub fn edges(&self) -> Vec<EdgeEntry> {
        let mut edges: Vec<EdgeEntry> = self
            .graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index(), *e.weight()))
            .collect();
        edges.sort_unstable_by_key(|&(s, t, _)| (s, t));
        edges
    }

    /// [`edges`](Self::edges) as a JSON array of `[source, target, {"commute": ..}]`.
    pub fn edges_json(&self) -> CommuteResult<String> {
        Ok(serde_json::to_string(&self.edges()).map_err(IrError::from)?)
    }

    /// Observables passed at build time.
    pub fn observables(&self) -> &[Measurement] {
        &self.observables
    }

    /// Original wire labels; position `k` is remapped wire `k`.
    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    /// Remapped index of an original wire label.
    pub fn wire_index(&self, wire: &Wire) -> Option<usize> {
        self.wire_map.get(wire).copied()
    }

    /// The checker used for commutation queries.
    pub fn checker(&self) -> &CommutationChecker {
        &self.checker
    }

    /// The underlying graph.
    pub fn graph(&self) -> &DiGraph<CommutationNode, CommutationEdge, u32> {
        &self.graph
    }

    /// Verify the structural invariants of the DAG.
    ///
    /// Checks that:
    /// 1. The graph is acyclic
    /// 2. Every edge points from an earlier to a later node and none commutes
    /// 3. Cached direct neighbours agree with the graph's edges
    /// 4. Predecessor and successor closures mirror each other
    pub fn verify_integrity(&self) -> CommuteResult<()> {
        if petgraph::algo::is_cyclic_directed(&self.graph) {
            return Err(CommuteError::InvalidDag("graph contains a cycle".into()));
        }

        for e in self.graph.edge_references() {
            let (s, t) = (e.source().index(), e.target().index());
            if s >= t {
                return Err(CommuteError::InvalidDag(format!(
                    "edge ({s}, {t}) does not follow insertion order"
                )));
            }
            if e.weight().commute {
                return Err(CommuteError::InvalidDag(format!(
                    "edge ({s}, {t}) joins commuting operations"
                )));
            }
        }

        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            if node.index != idx.index() {
                return Err(CommuteError::InvalidDag(format!(
                    "node at position {} reports index {}",
                    idx.index(),
                    node.index
                )));
            }

            let mut incoming: Vec<usize> = self
                .graph
                .neighbors_directed(idx, Direction::Incoming)
                .map(|n| n.index())
                .collect();
            incoming.sort_unstable();
            let mut outgoing: Vec<usize> = self
                .graph
                .neighbors_directed(idx, Direction::Outgoing)
                .map(|n| n.index())
                .collect();
            outgoing.sort_unstable();
            if incoming != node.direct_predecessors || outgoing != node.direct_successors {
                return Err(CommuteError::InvalidDag(format!(
                    "node {} has stale direct neighbours",
                    node.index
                )));
            }

            if node.predecessors.contains(&node.index) || node.successors.contains(&node.index) {
                return Err(CommuteError::InvalidDag(format!(
                    "node {} is its own ancestor",
                    node.index
                )));
            }
            for &s in &node.successors {
                let other = self.get_node(s)?;
                if other.predecessors.binary_search(&node.index).is_err() {
                    return Err(CommuteError::InvalidDag(format!(
                        "{s} is a successor of {} but not the reverse",
                        node.index
                    )));
                }
            }
            for &p in &node.predecessors {
                let other = self.get_node(p)?;
                if other.successors.binary_search(&node.index).is_err() {
                    return Err(CommuteError::InvalidDag(format!(
                        "{p} is a predecessor of {} but not the reverse",
                        node.index
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsym_ir::{Gate, GateKind};

    fn op(kind: GateKind, wires: &[i64]) -> Operator {
        Gate::new(kind, wires.iter().copied(), []).unwrap().into()
    }

    #[test]
    fn test_empty_dag() {
        let dag = CommutationDag::build(&[], &[]).unwrap();
        assert!(dag.is_empty());
        assert_eq!(dag.num_edges(), 0);
        assert!(dag.observables().is_empty());
        assert!(dag.verify_integrity().is_ok());
        assert!(matches!(dag.get_node(0), Err(CommuteError::InvalidNode(0))));
    }

    #[test]
    fn test_wire_remap_order() {
        let ops = vec![op(GateKind::CNOT, &[7, 3]), op(GateKind::PauliX, &[5])];
        let obs = vec![Measurement::expval(op(GateKind::PauliZ, &[9]))];
        let dag = CommutationDag::build(&ops, &obs).unwrap();
        assert_eq!(
            dag.wires(),
            &[Wire::Int(7), Wire::Int(3), Wire::Int(5), Wire::Int(9)]
        );
        let node = dag.get_node(0).unwrap();
        assert_eq!(node.wires(), &[0, 1]);
        assert_eq!(node.control_wires(), &[0]);
        assert_eq!(node.target_wires(), &[1]);
        assert_eq!(dag.wire_index(&Wire::Int(9)), Some(3));
        // node ops keep their labels
        assert_eq!(node.op().wires(), &Wires::new([7, 3]));
    }

    #[test]
    fn test_transitive_edge_skipped() {
        // X, Z, X on one wire: 0→1→2 only
        let ops = vec![
            op(GateKind::PauliX, &[0]),
            op(GateKind::PauliZ, &[0]),
            op(GateKind::PauliX, &[0]),
        ];
        let dag = CommutationDag::build(&ops, &[]).unwrap();
        let edges: Vec<(usize, usize)> = dag.edges().iter().map(|&(s, t, _)| (s, t)).collect();
        assert_eq!(edges, vec![(0, 1), (1, 2)]);
        assert_eq!(dag.predecessors(2).unwrap(), &[0, 1]);
        assert_eq!(dag.successors(0).unwrap(), &[1, 2]);
        assert!(dag.get_edge(0, 2).unwrap().is_none());
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_add_node_incrementally() {
        let mut dag = CommutationDag::new();
        assert_eq!(dag.add_node(op(GateKind::Hadamard, &[0])).unwrap(), 0);
        assert_eq!(dag.add_node(op(GateKind::CNOT, &[0, 1])).unwrap(), 1);
        assert_eq!(dag.direct_successors(0).unwrap(), &[1]);
        assert_eq!(
            dag.get_edge(0, 1).unwrap(),
            Some(&CommutationEdge { commute: false })
        );
    }

    #[test]
    fn test_edges_json() {
        let ops = vec![op(GateKind::PauliZ, &[0]), op(GateKind::PauliX, &[0])];
        let dag = CommutationDag::build(&ops, &[]).unwrap();
        assert_eq!(dag.edges_json().unwrap(), r#"[[0,1,{"commute":false}]]"#);
    }
}
