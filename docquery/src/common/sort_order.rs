/// Direction of a sort key in [crate::collection::FindOptions].
///
/// Values order as described on [crate::common::Value]; a missing field sorts
/// as null, so it comes first in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Smallest to largest.
    #[default]
    Ascending,
    /// Largest to smallest.
    Descending,
}

impl SortOrder {
    /// Applies this direction to an ascending comparison result.
    pub fn apply(&self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}
