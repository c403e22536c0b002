//! Grid positions and neighbor iteration.

/// An integer grid position, including the dimension the position lives in.
///
/// Positions in different dimensions never compare equal, so one scheduler and
/// one grid accessor can serve several dimensions without key collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockPos {
    /// East/west axis.
    pub x: i32,
    /// Vertical axis.
    pub y: i32,
    /// North/south axis.
    pub z: i32,
    /// Dimension the position belongs to.
    pub dim: i32,
}

impl BlockPos {
    /// Creates a position in dimension 0.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z, dim: 0 }
    }

    /// Returns this position offset by the given deltas, same dimension.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
            dim: self.dim,
        }
    }

    /// The position directly below.
    #[must_use]
    pub const fn down(self) -> Self {
        self.offset(0, -1, 0)
    }

    /// The position directly above.
    #[must_use]
    pub const fn up(self) -> Self {
        self.offset(0, 1, 0)
    }

    /// The neighbor one step toward `dir`.
    #[must_use]
    pub const fn relative(self, dir: Direction) -> Self {
        let (dx, dy, dz) = dir.delta();
        self.offset(dx, dy, dz)
    }

    /// Horizontal Manhattan distance to another position.
    #[must_use]
    pub const fn horizontal_manhattan(self, other: Self) -> i32 {
        (self.x - other.x).abs() + (self.z - other.z).abs()
    }

    /// True if both positions share the same vertical column.
    #[must_use]
    pub const fn same_column(self, other: Self) -> bool {
        self.x == other.x && self.z == other.z && self.dim == other.dim
    }
}

/// One of the six face directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    /// -y
    Down = 0,
    /// +y
    Up = 1,
    /// -z
    North = 2,
    /// +z
    South = 3,
    /// -x
    West = 4,
    /// +x
    East = 5,
}

impl Direction {
    /// All six face directions.
    pub const ALL: [Direction; 6] = [
        Direction::Down,
        Direction::Up,
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// The four horizontal cardinals.
    pub const HORIZONTALS: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// The (dx, dy, dz) step for this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32, i32) {
        match self {
            Direction::Down => (0, -1, 0),
            Direction::Up => (0, 1, 0),
            Direction::North => (0, 0, -1),
            Direction::South => (0, 0, 1),
            Direction::West => (-1, 0, 0),
            Direction::East => (1, 0, 0),
        }
    }

    /// The opposite face.
    #[must_use]
    pub const fn opposite(self) -> Direction {
        match self {
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
        }
    }

    /// Index usable for per-face lookup tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The horizontal direction for a reduced (sign, sign) flow vector, if any.
    #[must_use]
    pub const fn from_flow_vector(dx: i32, dz: i32) -> Option<Direction> {
        match (dx, dz) {
            (0, -1) => Some(Direction::North),
            (0, 1) => Some(Direction::South),
            (-1, 0) => Some(Direction::West),
            (1, 0) => Some(Direction::East),
            _ => None,
        }
    }
}

/// The four horizontal diagonal offsets as (dx, dz).
pub const DIAGONAL_OFFSETS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// The eight horizontal neighbor offsets as (dx, dz), cardinals first.
pub const HORIZONTAL_OFFSETS: [(i32, i32); 8] = [
    (0, -1),
    (0, 1),
    (-1, 0),
    (1, 0),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];
