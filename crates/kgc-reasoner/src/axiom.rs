use kgc_ids::Id;

/// A single axiom, as a tagged variant carrying only the ids it needs —
/// modeled as a sum type rather than a class hierarchy, per the design
/// notes on dynamic dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axiom {
    SubClass { sub: Id, sup: Id },
    EquivalentClass { a: Id, b: Id },
    Disjoint { a: Id, b: Id },
    SubProperty { sub: Id, sup: Id },
    Domain { property: Id, class: Id },
    Range { property: Id, class: Id },
    Functional { property: Id },
    InverseFunctional { property: Id },
    Transitive { property: Id },
    Symmetric { property: Id },
    Reflexive { property: Id },
}
