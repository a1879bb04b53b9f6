use std::fmt;

/// The identifier sort an [`crate::Id`] belongs to. Each sort has its own
/// dense numbering and its own declared capacity; mixing IDs across sorts is
/// a caller bug the type system does not catch (the core is pre-condition
/// based, per spec), so `Sort` exists mainly to make error values
/// self-describing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sort {
    Subject,
    Predicate,
    Object,
    Class,
    Property,
    Shape,
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Sort::Subject => "subject",
            Sort::Predicate => "predicate",
            Sort::Object => "object",
            Sort::Class => "class",
            Sort::Property => "property",
            Sort::Shape => "shape",
        };
        f.write_str(name)
    }
}
