//! A flat row-major 2D grid, the storage primitive for layers and noise fields.
//!
//! Origin is the top-left corner; +y points down. Unlike an equirectangular
//! world map nothing wraps: out-of-range coordinates are simply not cells.

#[derive(Clone, Debug)]
pub struct Grid<T> {
    pub width: u32,
    pub height: u32,
    data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); (width * height) as usize],
        }
    }
}

impl<T: Clone> Grid<T> {
    pub fn new_with(width: u32, height: u32, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; (width * height) as usize],
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    /// Whether a signed coordinate pair names a cell of this grid.
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    pub fn get(&self, x: u32, y: u32) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn get_mut(&mut self, x: u32, y: u32) -> &mut T {
        let idx = self.index(x, y);
        &mut self.data[idx]
    }

    pub fn set(&mut self, x: u32, y: u32, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Iterate over all cells with their coordinates, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &T)> {
        self.data.iter().enumerate().map(move |(idx, val)| {
            let x = idx as u32 % self.width;
            let y = idx as u32 / self.width;
            (x, y, val)
        })
    }

    /// Iterate mutably over all cells with their coordinates, row-major.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, u32, &mut T)> {
        let width = self.width;
        self.data.iter_mut().enumerate().map(move |(idx, val)| {
            let x = idx as u32 % width;
            let y = idx as u32 / width;
            (x, y, val)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_round_trip() {
        let mut grid: Grid<u8> = Grid::new(4, 3);
        grid.set(3, 2, 9);
        assert_eq!(*grid.get(3, 2), 9);
        assert_eq!(*grid.get(0, 0), 0);
    }

    #[test]
    fn test_iter_is_row_major() {
        let mut grid: Grid<u32> = Grid::new(3, 2);
        for (i, (x, y, _)) in grid.clone().iter().enumerate() {
            grid.set(x, y, i as u32);
        }
        let order: Vec<(u32, u32)> = grid.iter().map(|(x, y, _)| (x, y)).collect();
        assert_eq!(order[0], (0, 0));
        assert_eq!(order[1], (1, 0));
        assert_eq!(order[3], (0, 1));
    }

    #[test]
    fn test_in_bounds_rejects_edges() {
        let grid: Grid<u8> = Grid::new(4, 3);
        assert!(grid.in_bounds(0, 0));
        assert!(grid.in_bounds(3, 2));
        assert!(!grid.in_bounds(4, 2));
        assert!(!grid.in_bounds(3, 3));
        assert!(!grid.in_bounds(-1, 0));
    }
}
