use crate::ast::Ast;
use crate::nfa::Nfa;

impl Ast {
    /// Compiles the tree into an automaton fragment with one input and one
    /// output node, consuming the tree.
    pub fn build(self) -> Nfa {
        match self {
            Ast::Leaf(condition) => {
                let (mut graph, input, output) = Nfa::fragment();
                graph.add_transition(input, output, condition);
                graph
            }
            Ast::Concat(items) => {
                let mut items = items.into_iter();
                let Some(first) = items.next() else {
                    return Nfa::new();
                };
                // Fold left to right so every merge only walks the new item.
                let mut graph = first.build();
                for item in items {
                    let mut next = item.build();
                    if !graph.merge(&mut next) {
                        log::trace!("concatenation dropped an item without ports");
                    }
                }
                graph
            }
            Ast::Choice(branches) => {
                let (mut graph, input, output) = Nfa::fragment();
                for branch in branches {
                    let mut branch = branch.build();
                    let relocation = graph.acquire_nodes(&mut branch);
                    if let (Some(branch_input), Some(branch_output)) =
                        (relocation.input(), relocation.output())
                    {
                        graph.add_epsilon(input, branch_input);
                        graph.add_epsilon(branch_output, output);
                    }
                }
                graph
            }
            Ast::KleeneStar(child) => repeat(*child, true),
            Ast::KleenePlus(child) => repeat(*child, false),
            Ast::Optional(child) => {
                let mut graph = child.build();
                if let Some((input, output)) = graph.ports() {
                    graph.add_epsilon(input, output);
                }
                graph
            }
            Ast::Subexpression(child) => child.build(),
        }
    }
}

// Wraps the child in a loop. With `allow_empty` the new input also links
// straight to the new output.
fn repeat(child: Ast, allow_empty: bool) -> Nfa {
    let (mut graph, input, output) = Nfa::fragment();
    let mut child = child.build();
    let relocation = graph.acquire_nodes(&mut child);

    if allow_empty {
        graph.add_epsilon(input, output);
    }
    if let (Some(child_input), Some(child_output)) = (relocation.input(), relocation.output()) {
        graph.add_epsilon(input, child_input);
        graph.add_epsilon(child_output, child_input);
        graph.add_epsilon(child_output, output);
    }
    graph
}
