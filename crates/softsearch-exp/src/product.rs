/// Lazy cartesian product over ordered lists; the rightmost list varies fastest.
///
/// Any empty list makes the product empty. With no lists at all the product is
/// the single empty tuple.
#[derive(Debug, Clone)]
pub struct CartesianProduct<T> {
    lists: Vec<Vec<T>>,
    cursor: Vec<usize>,
    done: bool,
}

impl<T: Clone> CartesianProduct<T> {
    pub fn new(lists: Vec<Vec<T>>) -> Self {
        let done = lists.iter().any(Vec::is_empty);
        Self {
            cursor: vec![0; lists.len()],
            lists,
            done,
        }
    }

    /// Number of tuples the full traversal yields.
    pub fn total(&self) -> usize {
        self.lists.iter().map(Vec::len).product()
    }

    fn advance(&mut self) {
        for slot in (0..self.cursor.len()).rev() {
            self.cursor[slot] += 1;
            if self.cursor[slot] < self.lists[slot].len() {
                return;
            }
            self.cursor[slot] = 0;
        }
        self.done = true;
    }
}

impl<T: Clone> Iterator for CartesianProduct<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let tuple = self
            .cursor
            .iter()
            .zip(&self.lists)
            .map(|(&idx, list)| list[idx].clone())
            .collect();
        self.advance();
        Some(tuple)
    }
}
