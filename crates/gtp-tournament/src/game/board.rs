use super::types::Color;

/// Stones by coordinate. Only tracked for logging; nothing about a game's
/// result depends on it.
pub struct Board {
    size: usize,
    // One allocation per row
    cells: Vec<Vec<Option<Color>>>,
}

impl Board {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: (0..size).map(|_| vec![None; size]).collect(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Color> {
        self.cells.get(y).and_then(|row| row.get(x)).copied().flatten()
    }

    /// Returns `false` when `(x, y)` is off the board.
    pub fn set(&mut self, x: usize, y: usize, color: Color) -> bool {
        match self.cells.get_mut(y).and_then(|row| row.get_mut(x)) {
            Some(cell) => {
                *cell = Some(color);
                true
            }
            None => false,
        }
    }

    pub fn stones(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }
}
