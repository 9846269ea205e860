use std::collections::VecDeque;

/// Capped list kept newest-first. Pushing past the cap drops the oldest items.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingHistory<T> {
    items: VecDeque<T>,
    cap: usize,
}

impl<T> RollingHistory<T> {
    pub fn new(cap: usize) -> Self {
        Self {
            items: VecDeque::new(),
            cap,
        }
    }

    /// Rebuilds a history from a persisted newest-first list, re-applying the cap.
    pub fn from_items(items: Vec<T>, cap: usize) -> Self {
        let mut items = VecDeque::from(items);
        items.truncate(cap);
        Self { items, cap }
    }

    pub fn push(&mut self, item: T) {
        self.items.push_front(item);
        self.items.truncate(self.cap);
    }

    /// Prepends a batch, keeping the batch's own order at the head.
    pub fn extend_front<I>(&mut self, batch: I)
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: DoubleEndedIterator,
    {
        for item in batch.into_iter().rev() {
            self.items.push_front(item);
        }
        self.items.truncate(self.cap);
    }

    pub fn newest(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items.into()
    }
}
