use kgc_ids::Id;
use smallvec::SmallVec;

/// An append-only unique set of object ids for one `(predicate, subject)`
/// cell. The first cell is the hot slot: the "subject has exactly one
/// object for this predicate" case is answered without walking past index
/// zero. Backed by a `SmallVec` so the single-object case never allocates;
/// multi-valued properties spill to the heap transparently without a
/// change in the public contract.
#[derive(Clone, Default)]
pub struct ObjectList {
    objects: SmallVec<[Id; 1]>,
}

impl ObjectList {
    pub fn new() -> Self {
        Self {
            objects: SmallVec::new(),
        }
    }

    /// Appends `o` if it is not already present. Idempotent.
    pub fn insert_unique(&mut self, o: Id) {
        if !self.objects.contains(&o) {
            self.objects.push(o);
        }
    }

    /// The hot slot: the first object inserted, if any.
    #[inline]
    pub fn head(&self) -> Option<Id> {
        self.objects.first().copied()
    }

    /// Tests membership, checking the hot slot first so the single-object
    /// case completes without a list walk.
    #[inline]
    pub fn contains_hot(&self, o: Id) -> bool {
        match self.objects.first() {
            Some(&head) if head == o => true,
            Some(_) => self.objects[1..].contains(&o),
            None => false,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Id> + '_ {
        self.objects.iter().copied()
    }
}
