use std::collections::HashSet;

use crate::nfa::{Nfa, NodeId};

/// Runs input characters against a compiled automaton.
///
/// The runner tracks the set of active nodes, always closed under epsilon
/// transitions. It borrows the automaton, so any number of runners can
/// share one compiled automaton.
#[derive(Debug, Clone)]
pub struct Runner<'a> {
    nfa: &'a Nfa,
    state: HashSet<NodeId>,
}

impl<'a> Runner<'a> {
    /// Creates a runner positioned before the first character.
    pub fn new(nfa: &'a Nfa) -> Self {
        let mut runner = Self {
            nfa,
            state: HashSet::new(),
        };
        runner.reset();
        runner
    }

    /// Goes back to the epsilon closure of the automaton's input.
    pub fn reset(&mut self) {
        self.set_state(self.nfa.input());
    }

    /// Currently active nodes.
    pub fn state(&self) -> &HashSet<NodeId> {
        &self.state
    }

    /// Replaces the active set with the epsilon closure of `seed`.
    pub fn set_state(&mut self, seed: impl IntoIterator<Item = NodeId>) {
        self.state = self.epsilon_closure(seed);
    }

    /// True if the automaton's output node is active.
    pub fn acceptable(&self) -> bool {
        self.nfa
            .output()
            .is_some_and(|output| self.state.contains(&output))
    }

    /// True if no node is active, so no continuation of the input can match.
    pub fn is_dead(&self) -> bool {
        self.state.is_empty()
    }

    /// Consumes one character.
    pub fn step(&mut self, c: char) {
        let reached: Vec<NodeId> = self
            .state
            .iter()
            .filter_map(|id| self.nfa.node(*id))
            .flat_map(|node| node.next_nodes(c))
            .collect();
        self.state = self.epsilon_closure(reached);
        log::trace!("after {:?}: {} active nodes", c, self.state.len());
    }

    /// Checks whether the whole of `input` is accepted, starting over from
    /// the automaton's input.
    pub fn full_match(&mut self, input: &str) -> bool {
        self.reset();
        for c in input.chars() {
            if self.is_dead() {
                return false;
            }
            self.step(c);
        }
        self.acceptable()
    }

    /// Nodes reachable from `seed` through epsilon transitions only,
    /// including the seed itself. Handles the automaton doesn't own are
    /// skipped.
    pub fn epsilon_closure(&self, seed: impl IntoIterator<Item = NodeId>) -> HashSet<NodeId> {
        let mut closure = HashSet::new();
        let mut pending: Vec<NodeId> = seed.into_iter().collect();

        while let Some(id) = pending.pop() {
            let Some(node) = self.nfa.node(id) else {
                continue;
            };
            if !closure.insert(id) {
                continue;
            }
            pending.extend(
                node.epsilon_transitions()
                    .iter()
                    .filter(|next| !closure.contains(*next)),
            );
        }

        closure
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::nfa::CharPredicate;

    // a*: input -> loop -(a)-> loop, loop -> output
    fn a_star() -> Nfa {
        let mut nfa = Nfa::new();
        let (input, output) = nfa.ports().unwrap();
        let looping = nfa.new_node();
        nfa.add_epsilon(input, looping);
        nfa.add_transition(looping, looping, CharPredicate::Exact('a'));
        nfa.add_epsilon(looping, output);
        nfa
    }

    #[test]
    fn test_simple_char_match() {
        let mut nfa = Nfa::new();
        let (input, output) = nfa.ports().unwrap();
        nfa.add_transition(input, output, CharPredicate::Exact('a'));

        let mut runner = Runner::new(&nfa);
        assert!(runner.full_match("a"));
        assert!(!runner.full_match("b"));
        assert!(!runner.full_match(""));
        assert!(!runner.full_match("aa"));
    }

    #[test]
    fn test_initial_state_is_closed() {
        let nfa = a_star();
        let runner = Runner::new(&nfa);
        assert_eq!(runner.state().len(), 3);
        assert!(runner.acceptable());
    }

    #[test]
    fn test_step_by_step() {
        let nfa = a_star();
        let mut runner = Runner::new(&nfa);

        runner.step('a');
        assert!(runner.acceptable());
        runner.step('a');
        assert!(runner.acceptable());
        runner.step('b');
        assert!(runner.is_dead());
        assert!(!runner.acceptable());

        runner.reset();
        assert!(runner.acceptable());
    }

    #[test]
    fn test_epsilon_closure_with_cycle() {
        let mut nfa = Nfa::new();
        let (input, output) = nfa.ports().unwrap();
        let middle = nfa.new_node();
        nfa.add_epsilon(input, middle);
        nfa.add_epsilon(middle, input);
        nfa.add_epsilon(middle, output);
        nfa.add_epsilon(output, output);

        let runner = Runner::new(&nfa);
        let closure = runner.epsilon_closure([input]);
        assert_eq!(closure, HashSet::from([input, middle, output]));
    }

    #[test]
    fn test_epsilon_closure_is_idempotent() {
        let nfa = a_star();
        let runner = Runner::new(&nfa);
        let closed = runner.state().clone();
        assert_eq!(runner.epsilon_closure(closed.iter().copied()), closed);
    }

    #[test]
    fn test_set_state_closes_seed() {
        let nfa = a_star();
        let (_, output) = nfa.ports().unwrap();
        let mut runner = Runner::new(&nfa);

        runner.set_state([output]);
        assert_eq!(runner.state(), &HashSet::from([output]));
        assert!(runner.acceptable());

        runner.set_state([]);
        assert!(runner.is_dead());
    }

    #[test]
    fn test_automaton_without_ports() {
        let mut nfa = Nfa::new();
        nfa.clear();
        let mut runner = Runner::new(&nfa);
        assert!(runner.is_dead());
        assert!(!runner.full_match(""));
    }
}
