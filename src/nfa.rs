use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// Handle to a node owned by an [`Nfa`].
///
/// A handle is only meaningful for the automaton that issued it. Moving
/// nodes between automata (see [`Nfa::merge`] and [`Nfa::acquire_nodes`])
/// issues new handles, reported through a [`Relocation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Condition a transition checks against one input character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharPredicate {
    /// Matches any character (`.`).
    Any,
    /// Matches exactly one character.
    Exact(char),
    /// Matches members of a bracket expression, or non-members when
    /// `negated` is set.
    Set {
        members: Vec<char>,
        ranges: Vec<RangeInclusive<char>>,
        negated: bool,
    },
}

impl CharPredicate {
    pub fn matches(&self, c: char) -> bool {
        match self {
            CharPredicate::Any => true,
            CharPredicate::Exact(expected) => *expected == c,
            CharPredicate::Set {
                members,
                ranges,
                negated,
            } => {
                let contains =
                    members.contains(&c) || ranges.iter().any(|r| r.contains(&c));
                contains != *negated
            }
        }
    }
}

/// Conditioned edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub target: NodeId,
    pub condition: CharPredicate,
}

/// Automaton state: conditioned transitions plus epsilon transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    transitions: Vec<Transition>,
    epsilon: BTreeSet<NodeId>,
}

impl Node {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn epsilon_transitions(&self) -> &BTreeSet<NodeId> {
        &self.epsilon
    }

    /// Nodes directly reachable by consuming `c`. Epsilon transitions are
    /// not followed.
    pub fn next_nodes(&self, c: char) -> impl Iterator<Item = NodeId> + '_ {
        self.transitions
            .iter()
            .filter(move |t| t.condition.matches(c))
            .map(|t| t.target)
    }

    /// Takes over every edge of `other`.
    pub fn absorb(&mut self, other: Node) {
        self.transitions.extend(other.transitions);
        self.epsilon.extend(other.epsilon);
    }

    /// Rewrites every edge through `map`, indexed by the old handle. Edges
    /// whose target has no entry are dropped.
    fn translate(&mut self, map: &[Option<NodeId>]) {
        let lookup = |id: NodeId| map.get(id.0).copied().flatten();

        self.epsilon = self.epsilon.iter().filter_map(|id| lookup(*id)).collect();
        self.transitions = std::mem::take(&mut self.transitions)
            .into_iter()
            .filter_map(|t| {
                lookup(t.target).map(|target| Transition {
                    target,
                    condition: t.condition,
                })
            })
            .collect();
    }
}

/// New handles given to the nodes of an automaton that was moved into
/// another one.
#[derive(Debug)]
pub struct Relocation {
    map: Vec<Option<NodeId>>,
    input: Option<NodeId>,
    output: Option<NodeId>,
}

impl Relocation {
    /// Handle that the node formerly known as `old` has now.
    pub fn get(&self, old: NodeId) -> Option<NodeId> {
        self.map.get(old.0).copied().flatten()
    }

    /// New handle of the source automaton's input node.
    pub fn input(&self) -> Option<NodeId> {
        self.input
    }

    /// New handle of the source automaton's output node.
    pub fn output(&self) -> Option<NodeId> {
        self.output
    }
}

/// Non-deterministic finite automaton.
///
/// The automaton owns its nodes in an arena; a [`NodeId`] is a slot index.
/// It intentionally does not implement `Clone`: use [`Nfa::duplicate`] to
/// get an independent deep copy.
#[derive(Debug)]
pub struct Nfa {
    slots: Vec<Option<Node>>,
    input: Option<NodeId>,
    output: Option<NodeId>,
}

impl Nfa {
    /// Creates an automaton with distinct input and output nodes and no
    /// transitions.
    pub fn new() -> Self {
        Self::fragment().0
    }

    /// Like [`Nfa::new`], also returning the input and output handles.
    pub(crate) fn fragment() -> (Self, NodeId, NodeId) {
        let input = NodeId(0);
        let output = NodeId(1);
        let nfa = Self {
            slots: vec![Some(Node::new()), Some(Node::new())],
            input: Some(input),
            output: Some(output),
        };
        (nfa, input, output)
    }

    /// Builds an independent copy of this automaton.
    pub fn duplicate(&self) -> Nfa {
        let map = self.compacting_map(0, None);
        let slots = self
            .slots
            .iter()
            .flatten()
            .map(|node| {
                let mut copy = node.clone();
                copy.translate(&map);
                Some(copy)
            })
            .collect();
        let lookup = |id: Option<NodeId>| id.and_then(|id| map.get(id.0).copied().flatten());

        Nfa {
            slots,
            input: lookup(self.input),
            output: lookup(self.output),
        }
    }

    /// Takes ownership of `node` and returns its handle.
    ///
    /// Edges carried by `node` are kept as they are, so they only make
    /// sense if they already refer to nodes of this automaton.
    pub fn insert_node(&mut self, node: Node) -> NodeId {
        self.slots.push(Some(node));
        NodeId(self.slots.len() - 1)
    }

    /// Adds a node without edges.
    pub fn new_node(&mut self) -> NodeId {
        self.insert_node(Node::new())
    }

    /// Detaches a node and hands it back to the caller. Clears input or
    /// output if they referred to it.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let node = self.slots.get_mut(id.0)?.take()?;
        if self.input == Some(id) {
            self.input = None;
        }
        if self.output == Some(id) {
            self.output = None;
        }
        Some(node)
    }

    /// Drops every node, including input and output.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.input = None;
        self.output = None;
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Handles of all owned nodes.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| NodeId(i))
    }

    /// Number of owned nodes.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn input(&self) -> Option<NodeId> {
        self.input
    }

    pub fn output(&self) -> Option<NodeId> {
        self.output
    }

    /// Input and output handles, if both are set.
    pub fn ports(&self) -> Option<(NodeId, NodeId)> {
        Some((self.input?, self.output?))
    }

    /// Sets the input node. Returns false, leaving the input unchanged, if
    /// `id` is not owned by this automaton.
    pub fn set_input(&mut self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.input = Some(id);
        true
    }

    /// Sets the output node. Returns false, leaving the output unchanged,
    /// if `id` is not owned by this automaton.
    pub fn set_output(&mut self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.output = Some(id);
        true
    }

    /// Adds a transition from `from` to `to` taken on characters accepted by
    /// `condition`. Ignored unless both nodes are owned.
    pub fn add_transition(&mut self, from: NodeId, to: NodeId, condition: CharPredicate) {
        if !self.contains(to) {
            return;
        }
        if let Some(node) = self.node_mut(from) {
            node.transitions.push(Transition { target: to, condition });
        }
    }

    /// Adds an epsilon transition. Ignored unless both nodes are owned.
    pub fn add_epsilon(&mut self, from: NodeId, to: NodeId) {
        if !self.contains(to) {
            return;
        }
        if let Some(node) = self.node_mut(from) {
            node.epsilon.insert(to);
        }
    }

    /// Appends `other` after this automaton, emptying `other`.
    ///
    /// This automaton's output and `other`'s input are fused into a single
    /// node carrying the edges of both, and `other`'s output becomes the new
    /// output. Returns false and leaves both automata untouched if either
    /// one lacks an input or an output.
    #[must_use]
    pub fn merge(&mut self, other: &mut Nfa) -> bool {
        let (Some((_, output)), Some((other_input, _))) = (self.ports(), other.ports()) else {
            log::trace!("refusing to merge an automaton without input or output");
            return false;
        };

        let relocation = self.take_nodes(other, Some((other_input, output)));
        self.output = relocation.output();
        true
    }

    /// Moves every node of `other` into this automaton without touching the
    /// topology. `other` is left empty, without input or output.
    pub fn acquire_nodes(&mut self, other: &mut Nfa) -> Relocation {
        self.take_nodes(other, None)
    }

    /// Maps the live slots of `self` onto consecutive handles starting at
    /// `base`. With `fuse = Some((from, into))` the node `from` maps onto the
    /// already existing `into` instead of receiving a slot.
    fn compacting_map(&self, base: usize, fuse: Option<(NodeId, NodeId)>) -> Vec<Option<NodeId>> {
        let mut next = base;
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.as_ref()?;
                match fuse {
                    Some((from, into)) if from.0 == i => Some(into),
                    _ => {
                        next += 1;
                        Some(NodeId(next - 1))
                    }
                }
            })
            .collect()
    }

    fn take_nodes(&mut self, other: &mut Nfa, fuse: Option<(NodeId, NodeId)>) -> Relocation {
        let map = other.compacting_map(self.slots.len(), fuse);

        for (i, slot) in std::mem::take(&mut other.slots).into_iter().enumerate() {
            let Some(mut node) = slot else {
                continue;
            };
            node.translate(&map);
            match fuse {
                Some((from, into)) if from.0 == i => {
                    if let Some(survivor) = self.node_mut(into) {
                        survivor.absorb(node);
                    }
                }
                _ => self.slots.push(Some(node)),
            }
        }

        let lookup = |id: Option<NodeId>| id.and_then(|id| map.get(id.0).copied().flatten());
        let relocation = Relocation {
            input: lookup(other.input),
            output: lookup(other.output),
            map,
        };
        other.input = None;
        other.output = None;
        relocation
    }
}

impl Default for Nfa {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn single(c: char) -> Nfa {
        let (mut nfa, input, output) = Nfa::fragment();
        nfa.add_transition(input, output, CharPredicate::Exact(c));
        nfa
    }

    #[test]
    fn test_new_has_distinct_ports() {
        let nfa = Nfa::new();
        let (input, output) = nfa.ports().unwrap();
        assert_ne!(input, output);
        assert_eq!(nfa.len(), 2);
        assert!(nfa.contains(input));
        assert!(nfa.contains(output));
    }

    #[test]
    fn test_predicates() {
        assert!(CharPredicate::Any.matches('\n'));
        assert!(CharPredicate::Exact('a').matches('a'));
        assert!(!CharPredicate::Exact('a').matches('b'));

        let set = CharPredicate::Set {
            members: vec!['x'],
            ranges: vec!['a'..='c'],
            negated: false,
        };
        assert!(set.matches('b'));
        assert!(set.matches('x'));
        assert!(!set.matches('d'));

        let negated = CharPredicate::Set {
            members: vec!['x'],
            ranges: vec!['a'..='c'],
            negated: true,
        };
        assert!(!negated.matches('b'));
        assert!(negated.matches('d'));
    }

    #[test]
    fn test_merge_fuses_output_and_input() {
        let mut left = single('a');
        let mut right = single('b');
        let (left_input, left_output) = left.ports().unwrap();

        assert!(left.merge(&mut right));

        assert_eq!(left.len(), 3);
        assert!(right.is_empty());
        assert_eq!(right.ports(), None);
        assert_eq!(left.input(), Some(left_input));

        let middle: Vec<_> = left.node(left_input).unwrap().next_nodes('a').collect();
        assert_eq!(middle, vec![left_output]);

        let end: Vec<_> = left.node(left_output).unwrap().next_nodes('b').collect();
        assert_eq!(end, vec![left.output().unwrap()]);
    }

    #[test]
    fn test_merge_redirects_edges_into_fused_input() {
        let mut left = single('a');
        let mut right = single('b');
        let (right_input, right_output) = right.ports().unwrap();
        right.add_epsilon(right_output, right_input);

        assert!(left.merge(&mut right));

        let left_output = left.output().unwrap();
        let fused = left
            .nodes()
            .find(|id| left.node(*id).unwrap().next_nodes('b').count() == 1)
            .unwrap();
        let loops_back = left.node(left_output).unwrap().epsilon_transitions();
        assert!(loops_back.contains(&fused));
    }

    #[test]
    fn test_merge_requires_ports() {
        let mut left = single('a');
        let mut right = single('b');
        let right_input = right.input().unwrap();
        right.remove_node(right_input);

        assert!(!left.merge(&mut right));
        assert_eq!(left.len(), 2);
        assert_eq!(right.len(), 1);

        let mut bare = Nfa::new();
        bare.clear();
        let mut other = single('c');
        assert!(!bare.merge(&mut other));
        assert_eq!(other.len(), 2);
    }

    #[test]
    fn test_acquire_keeps_topology() {
        let mut target = Nfa::new();
        let mut source = single('z');
        let relocation = target.acquire_nodes(&mut source);

        assert!(source.is_empty());
        assert_eq!(target.len(), 4);

        let input = relocation.input().unwrap();
        let output = relocation.output().unwrap();
        let reached: Vec<_> = target.node(input).unwrap().next_nodes('z').collect();
        assert_eq!(reached, vec![output]);
    }

    #[test]
    fn test_relocation_maps_every_moved_node() {
        let mut target = single('a');
        let mut source = single('b');
        let extra = source.new_node();
        let dropped = source.new_node();
        source.remove_node(dropped);
        let old: Vec<NodeId> = source.nodes().collect();

        let relocation = target.acquire_nodes(&mut source);

        let moved: Vec<NodeId> = old.iter().filter_map(|id| relocation.get(*id)).collect();
        assert_eq!(moved.len(), old.len());
        assert!(moved.iter().all(|id| target.contains(*id)));
        assert_eq!(relocation.get(dropped), None);
        assert_eq!(target.len(), 5);
        assert_eq!(relocation.input(), relocation.get(NodeId(0)));
        assert_eq!(relocation.output(), relocation.get(NodeId(1)));
        assert!(relocation.get(extra).is_some());
    }

    #[test]
    fn test_remove_node_clears_ports() {
        let mut nfa = Nfa::new();
        let (input, output) = nfa.ports().unwrap();

        assert!(nfa.remove_node(output).is_some());
        assert_eq!(nfa.output(), None);
        assert_eq!(nfa.input(), Some(input));
        assert!(nfa.remove_node(output).is_none());
        assert!(!nfa.set_output(output));
    }

    #[test]
    fn test_removed_node_moves_between_automata() {
        let mut first = Nfa::new();
        let mut second = Nfa::new();
        let id = first.new_node();
        first.add_epsilon(id, id);

        let (input, _) = first.ports().unwrap();
        first.add_transition(id, input, CharPredicate::Exact('q'));
        let expected = first.node(id).unwrap().clone();

        let node = first.remove_node(id).unwrap();
        assert!(!first.contains(id));
        assert_eq!(first.len(), 2);

        let moved = second.insert_node(node);
        assert_eq!(second.len(), 3);
        assert_eq!(moved.index(), id.index());
        assert_eq!(second.node(moved), Some(&expected));
        assert!(second.node(moved).unwrap().epsilon_transitions().contains(&moved));
    }

    #[test]
    fn test_edges_to_foreign_nodes_are_ignored() {
        let mut nfa = Nfa::new();
        let input = nfa.input().unwrap();
        nfa.add_epsilon(input, NodeId(42));
        nfa.add_transition(input, NodeId(42), CharPredicate::Any);
        let node = nfa.node(input).unwrap();
        assert!(node.epsilon_transitions().is_empty());
        assert!(node.transitions().is_empty());
    }

    #[test]
    fn test_duplicate_is_independent() {
        let mut original = single('a');
        let (input, output) = original.ports().unwrap();
        let copy = original.duplicate();

        original.add_epsilon(input, output);

        let (copy_input, _) = copy.ports().unwrap();
        assert!(copy.node(copy_input).unwrap().epsilon_transitions().is_empty());
        assert_eq!(copy.len(), 2);
    }

    #[test]
    fn test_duplicate_drops_dangling_edges() {
        let mut original = single('a');
        let extra = original.new_node();
        let (input, _) = original.ports().unwrap();
        original.add_epsilon(input, extra);
        original.remove_node(extra);

        let copy = original.duplicate();
        let (copy_input, copy_output) = copy.ports().unwrap();
        assert_eq!(copy.len(), 2);
        let indices: Vec<usize> = copy.nodes().map(NodeId::index).collect();
        assert_eq!(indices, vec![0, 1]);
        assert!(copy.node(copy_input).unwrap().epsilon_transitions().is_empty());
        let reached: Vec<_> = copy.node(copy_input).unwrap().next_nodes('a').collect();
        assert_eq!(reached, vec![copy_output]);
    }
}
