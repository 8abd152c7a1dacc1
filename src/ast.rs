use crate::nfa::CharPredicate;

/// Abstract syntax tree of a pattern.
///
/// Every node exclusively owns its children. The tree is consumed when it
/// is compiled into an automaton (see [`Ast::build`]).
///
/// Alternatives and sequences are kept flat, so the depth of the tree only
/// grows with group nesting, never with the length of the pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ast {
    /// Alternation over the branches present. Empty alternatives in the
    /// pattern contribute no branch.
    Choice(Vec<Ast>),
    /// Sequence, matched left to right.
    Concat(Vec<Ast>),
    KleeneStar(Box<Ast>),
    KleenePlus(Box<Ast>),
    Optional(Box<Ast>),
    /// Capturing group. Parsed, but has no effect on matching.
    Subexpression(Box<Ast>),
    /// Consumes one character accepted by the predicate.
    Leaf(CharPredicate),
}

impl Ast {
    /// Leaf matching exactly `c`.
    pub fn single_character(c: char) -> Ast {
        Ast::Leaf(CharPredicate::Exact(c))
    }

    /// Leaf matching any character.
    pub fn any_character() -> Ast {
        Ast::Leaf(CharPredicate::Any)
    }

    pub fn choice(branches: Vec<Ast>) -> Ast {
        Ast::Choice(branches)
    }

    pub fn concat(items: Vec<Ast>) -> Ast {
        Ast::Concat(items)
    }

    pub fn kleene_star(child: Ast) -> Ast {
        Ast::KleeneStar(Box::new(child))
    }

    pub fn kleene_plus(child: Ast) -> Ast {
        Ast::KleenePlus(Box::new(child))
    }

    pub fn optional(child: Ast) -> Ast {
        Ast::Optional(Box::new(child))
    }

    pub fn subexpression(child: Ast) -> Ast {
        Ast::Subexpression(Box::new(child))
    }
}
