use std::collections::VecDeque;

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::{
    canvas::{Canvas, Point},
    color::{hsv_to_rgb, Rgba},
    plugin::{Surface, Visualizer},
    AudioFeatures, Result,
};

const NORTH: u8 = 1;
const EAST: u8 = 2;
const SOUTH: u8 = 4;
const WEST: u8 = 8;

type Cell = (usize, usize);

/// Perfect maze on a grid: every cell is reachable through exactly one path.
/// Each cell stores a bit per open side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maze {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl Maze {
    /// Carves a maze with an iterative recursive-backtracker walk.
    pub fn generate(width: usize, height: usize, seed: u64) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mut maze = Self {
            width,
            height,
            cells: vec![0; width * height],
        };

        let mut rng = StdRng::seed_from_u64(seed);
        let mut visited = vec![false; width * height];
        let mut stack = vec![(0, 0)];
        visited[0] = true;

        let mut candidates = Vec::with_capacity(4);
        while let Some(&(x, y)) = stack.last() {
            candidates.clear();
            candidates.extend(
                maze.neighbours(x, y)
                    .filter(|&(_, (nx, ny))| !visited[ny * width + nx]),
            );

            match candidates.choose(&mut rng) {
                Some(&(side, (nx, ny))) => {
                    maze.cells[y * width + x] |= side;
                    maze.cells[ny * width + nx] |= opposite(side);
                    visited[ny * width + nx] = true;
                    stack.push((nx, ny));
                }
                None => {
                    stack.pop();
                }
            }
        }

        maze
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn is_open(&self, x: usize, y: usize, side: u8) -> bool {
        self.cells[y * self.width + x] & side != 0
    }

    /// In-bounds neighbours of a cell, with the side leading to them.
    fn neighbours(&self, x: usize, y: usize) -> impl Iterator<Item = (u8, Cell)> {
        let (width, height) = (self.width, self.height);
        [
            (NORTH, y.checked_sub(1).map(|ny| (x, ny))),
            (EAST, (x + 1 < width).then(|| (x + 1, y))),
            (SOUTH, (y + 1 < height).then(|| (x, y + 1))),
            (WEST, x.checked_sub(1).map(|nx| (nx, y))),
        ]
        .into_iter()
        .filter_map(|(side, cell)| cell.map(|cell| (side, cell)))
    }

    /// Number of carved passages; `cells - 1` for a perfect maze.
    pub fn passage_count(&self) -> usize {
        self.cells
            .iter()
            .map(|cell| usize::from(cell & EAST != 0) + usize::from(cell & SOUTH != 0))
            .sum()
    }

    /// Shortest walk from `from` to `to` through open passages, both ends
    /// included. Empty when unreachable or out of bounds.
    pub fn shortest_path(&self, from: Cell, to: Cell) -> Vec<Cell> {
        let in_bounds = |(x, y): Cell| x < self.width && y < self.height;
        if !in_bounds(from) || !in_bounds(to) {
            return Vec::new();
        }

        let index = |(x, y): Cell| y * self.width + x;
        let mut previous: Vec<Option<Cell>> = vec![None; self.cells.len()];
        let mut seen = vec![false; self.cells.len()];
        let mut queue = VecDeque::from([from]);
        seen[index(from)] = true;

        while let Some(cell) = queue.pop_front() {
            if cell == to {
                let mut path = vec![cell];
                let mut cursor = cell;
                while let Some(prev) = previous[index(cursor)] {
                    path.push(prev);
                    cursor = prev;
                }
                path.reverse();
                return path;
            }
            for (side, next) in self.neighbours(cell.0, cell.1) {
                if self.is_open(cell.0, cell.1, side) && !seen[index(next)] {
                    seen[index(next)] = true;
                    previous[index(next)] = Some(cell);
                    queue.push_back(next);
                }
            }
        }

        Vec::new()
    }

    /// Wall segments in cell units, as `((x0, z0), (x1, z1))`.
    pub fn walls(&self) -> Vec<((f32, f32), (f32, f32))> {
        let mut walls = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let (fx, fy) = (x as f32, y as f32);
                if !self.is_open(x, y, NORTH) {
                    walls.push(((fx, fy), (fx + 1.0, fy)));
                }
                if !self.is_open(x, y, WEST) {
                    walls.push(((fx, fy), (fx, fy + 1.0)));
                }
                if x + 1 == self.width && !self.is_open(x, y, EAST) {
                    walls.push(((fx + 1.0, fy), (fx + 1.0, fy + 1.0)));
                }
                if y + 1 == self.height && !self.is_open(x, y, SOUTH) {
                    walls.push(((fx, fy + 1.0), (fx + 1.0, fy + 1.0)));
                }
            }
        }
        walls
    }
}

fn opposite(side: u8) -> u8 {
    match side {
        NORTH => SOUTH,
        EAST => WEST,
        SOUTH => NORTH,
        _ => EAST,
    }
}

/// Perspective camera orbiting the maze centre.
#[derive(Debug, Clone, Copy)]
struct Camera {
    yaw: f32,
    pitch: f32,
    distance: f32,
    elevation: f32,
    focal: f32,
    center: Point,
}

const NEAR_PLANE: f32 = 0.1;

impl Camera {
    fn new(yaw: f32, extent: f32, width: f32, height: f32) -> Self {
        let distance = extent * 1.2;
        let elevation = extent * 0.8;
        Self {
            yaw,
            pitch: (elevation / distance).atan(),
            distance,
            elevation,
            focal: width.min(height) * 0.9,
            center: Point::new(width * 0.5, height * 0.5),
        }
    }

    /// Projects a world point (`y` up) to screen space; `None` behind the camera.
    fn project(&self, x: f32, y: f32, z: f32) -> Option<(Point, f32)> {
        let (sy, cy) = self.yaw.sin_cos();
        let rx = x * cy - z * sy;
        let rz = x * sy + z * cy;

        let dy = y - self.elevation;
        let dz = rz + self.distance;
        let (sp, cp) = self.pitch.sin_cos();
        let view_y = dy * cp + dz * sp;
        let view_z = -dy * sp + dz * cp;

        if view_z < NEAR_PLANE {
            return None;
        }
        let screen = Point::new(
            self.center.x + self.focal * rx / view_z,
            self.center.y - self.focal * view_y / view_z,
        );
        Some((screen, view_z))
    }
}

const MAZE_SIZE: usize = 10;
const BEATS_PER_MAZE: u64 = 16;
const ORBIT_SPEED: f32 = 0.15;

/// Maze seen through an orbiting perspective camera, with a runner that
/// advances one cell per beat. A new maze is carved every 16 beats.
#[derive(Debug)]
pub struct MazeRunner {
    surface: Surface,
    seed: u64,
    maze: Maze,
    walls: Vec<((f32, f32), (f32, f32))>,
    path: Vec<Cell>,
    step: usize,
    beats: u64,
    wall_height: f32,
}

impl Default for MazeRunner {
    fn default() -> Self {
        let mut runner = Self {
            surface: Surface::default(),
            seed: 1,
            maze: Maze::generate(MAZE_SIZE, MAZE_SIZE, 1),
            walls: Vec::new(),
            path: Vec::new(),
            step: 0,
            beats: 0,
            wall_height: 0.6,
        };
        runner.rebuild();
        runner
    }
}

impl MazeRunner {
    pub const ID: &'static str = "maze";
    pub const NAME: &'static str = "Maze Runner";

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    fn rebuild(&mut self) {
        self.maze = Maze::generate(MAZE_SIZE, MAZE_SIZE, self.seed);
        self.walls = self.maze.walls();
        self.path = self
            .maze
            .shortest_path((0, 0), (MAZE_SIZE - 1, MAZE_SIZE - 1));
        self.step = 0;
    }

    fn update(&mut self, features: &AudioFeatures) {
        let target = 0.6 + 0.6 * features.bass.clamp(0.0, 1.0);
        self.wall_height += (target - self.wall_height) * 0.3;

        if !features.beat {
            return;
        }
        self.beats += 1;
        if self.beats % BEATS_PER_MAZE == 0 {
            self.seed = self.seed.wrapping_add(1);
            tracing::debug!(seed = self.seed, "carving new maze");
            self.rebuild();
        } else if !self.path.is_empty() {
            self.step = (self.step + 1) % self.path.len();
        }
    }

    fn draw(&self, features: &AudioFeatures, canvas: &mut dyn Canvas, width: f32, height: f32) {
        canvas.clear(Rgba::rgb(0.0, 0.0, 0.03));

        let extent = MAZE_SIZE as f32;
        let half = extent * 0.5;
        let camera = Camera::new(
            features.time_seconds as f32 * ORBIT_SPEED,
            extent,
            width,
            height,
        );
        let hue_shift = (self.beats % BEATS_PER_MAZE) as f32 * 12.0;

        canvas.set_line_width(1.0);
        for &((x0, z0), (x1, z1)) in &self.walls {
            let (x0, z0, x1, z1) = (x0 - half, z0 - half, x1 - half, z1 - half);
            let corners = [
                camera.project(x0, 0.0, z0),
                camera.project(x1, 0.0, z1),
                camera.project(x1, self.wall_height, z1),
                camera.project(x0, self.wall_height, z0),
            ];
            let mut points = [Point::default(); 4];
            let mut depth = 0.0;
            let mut visible = true;
            for (slot, corner) in points.iter_mut().zip(corners) {
                match corner {
                    Some((point, z)) => {
                        *slot = point;
                        depth += z * 0.25;
                    }
                    None => visible = false,
                }
            }
            if !visible {
                continue;
            }

            let fog = (1.0 - depth / (extent * 2.5)).clamp(0.15, 1.0);
            let color = hsv_to_rgb(190.0 + hue_shift, 0.7, fog);
            canvas.draw_lines(&points, color, true);
        }

        if let Some(&(x, y)) = self.path.get(self.step) {
            let wx = x as f32 + 0.5 - half;
            let wz = y as f32 + 0.5 - half;
            if let Some((point, z)) = camera.project(wx, 0.3, wz) {
                let radius = (camera.focal * 0.15 / z).max(1.0);
                canvas.fill_circle(point, radius, hsv_to_rgb(30.0, 0.9, 1.0));
            }
        }
    }
}

impl Visualizer for MazeRunner {
    fn id(&self) -> &str {
        Self::ID
    }

    fn display_name(&self) -> &str {
        Self::NAME
    }

    fn initialize(&mut self, width: u32, height: u32) -> Result<()> {
        self.surface.initialize(Self::ID, width, height)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.surface.resize(Self::ID, width, height)
    }

    fn render_frame(&mut self, features: &AudioFeatures, canvas: &mut dyn Canvas) -> Result<()> {
        let (width, height) = self.surface.dimensions(Self::ID)?;
        self.update(features);
        self.draw(features, canvas, width, height);
        Ok(())
    }

    fn dispose(&mut self) {
        *self = Self::default();
    }
}
