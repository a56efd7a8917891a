use crate::entities::item::GridLocation;
use crate::world::catalog::CatalogItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub rotated: bool,
}

impl Placement {
    pub fn location(self) -> GridLocation {
        GridLocation {
            x: self.x,
            y: self.y,
            r: u8::from(self.rotated),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerGrid {
    cells: Vec<Vec<bool>>,
    width: u32,
    height: u32,
}

impl ContainerGrid {
    pub fn new(cells_h: u32, cells_v: u32) -> Self {
        Self {
            cells: vec![vec![false; cells_h as usize]; cells_v as usize],
            width: cells_h,
            height: cells_v,
        }
    }

    pub fn from_template(container: &CatalogItem) -> Option<Self> {
        let grid = container.first_grid()?;
        Some(Self::new(grid.props.cells_h, grid.props.cells_v))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_occupied(&self, x: u32, y: u32) -> bool {
        self.cells
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
            .unwrap_or(false)
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells
            .iter()
            .map(|row| row.iter().filter(|cell| **cell).count())
            .sum()
    }

    pub fn find_slot(&self, width: u32, height: u32) -> Option<Placement> {
        if let Some((x, y)) = self.first_fit(width, height) {
            return Some(Placement { x, y, rotated: false });
        }
        if width == height {
            return None;
        }
        self.first_fit(height, width)
            .map(|(x, y)| Placement { x, y, rotated: true })
    }

    pub fn fill(&mut self, placement: Placement, width: u32, height: u32) -> bool {
        let (width, height) = if placement.rotated {
            (height, width)
        } else {
            (width, height)
        };
        if !self.is_free(placement.x, placement.y, width, height) {
            return false;
        }
        for row in &mut self.cells[placement.y as usize..(placement.y + height) as usize] {
            for cell in &mut row[placement.x as usize..(placement.x + width) as usize] {
                *cell = true;
            }
        }
        true
    }

    pub fn place(&mut self, width: u32, height: u32) -> Option<Placement> {
        let placement = self.find_slot(width, height)?;
        self.fill(placement, width, height).then_some(placement)
    }

    fn first_fit(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        if width == 0 || height == 0 || width > self.width || height > self.height {
            return None;
        }
        for y in 0..=self.height - height {
            for x in 0..=self.width - width {
                if self.is_free(x, y, width, height) {
                    return Some((x, y));
                }
            }
        }
        None
    }

    fn is_free(&self, x: u32, y: u32, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        let (Some(right), Some(bottom)) = (x.checked_add(width), y.checked_add(height)) else {
            return false;
        };
        if right > self.width || bottom > self.height {
            return false;
        }
        self.cells[y as usize..bottom as usize]
            .iter()
            .all(|row| row[x as usize..right as usize].iter().all(|cell| !cell))
    }
}
