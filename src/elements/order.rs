//! Detector-native ordering positions.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Position of an element in a detector's native reading sequence.
///
/// `Unordered` marks elements with no native position (everything the visual
/// detector reports). It sorts after every `Native` position, so such elements
/// fall to the end of their page unless they adopt an order through overlap
/// reconciliation.
///
/// # Examples
///
/// ```
/// use layout_fusion::elements::OrderId;
///
/// assert!(OrderId::Native(7) < OrderId::Unordered);
/// assert!(OrderId::Native(2) < OrderId::Native(7));
/// assert_eq!(OrderId::Native(3).min(OrderId::Unordered), OrderId::Native(3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrderId {
    /// Sequence position reported by the structured extractor
    Native(u32),
    /// No native position
    #[default]
    Unordered,
}

impl PartialOrd for OrderId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (OrderId::Native(a), OrderId::Native(b)) => a.cmp(b),
            (OrderId::Native(_), OrderId::Unordered) => Ordering::Less,
            (OrderId::Unordered, OrderId::Native(_)) => Ordering::Greater,
            (OrderId::Unordered, OrderId::Unordered) => Ordering::Equal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unordered_sorts_last() {
        let mut ids = vec![
            OrderId::Unordered,
            OrderId::Native(5),
            OrderId::Unordered,
            OrderId::Native(0),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                OrderId::Native(0),
                OrderId::Native(5),
                OrderId::Unordered,
                OrderId::Unordered
            ]
        );
    }

    #[test]
    fn test_default_is_unordered() {
        assert_eq!(OrderId::default(), OrderId::Unordered);
        assert!(OrderId::Native(u32::MAX) < OrderId::default());
    }
}
