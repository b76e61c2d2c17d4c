//! Shape catalogue for falling bodies and wheel slots
//!
//! Each kind resolves once to a static descriptor holding its color and the
//! path generators a renderer needs. Physics never looks at the paths; it only
//! compares kinds.

use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Shape types a body can take and a slot can accept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum ShapeKind {
    Circle,
    Square,
    Triangle,
    Star,
    Diamond,
    Hexagon,
    Cross,
    Heart,
    Moon,
    Spiral,
}

impl ShapeKind {
    /// Every kind, in descriptor table order
    pub const ALL: [ShapeKind; 10] = [
        ShapeKind::Circle,
        ShapeKind::Square,
        ShapeKind::Triangle,
        ShapeKind::Star,
        ShapeKind::Diamond,
        ShapeKind::Hexagon,
        ShapeKind::Cross,
        ShapeKind::Heart,
        ShapeKind::Moon,
        ShapeKind::Spiral,
    ];

    pub fn as_str(&self) -> &'static str {
        self.descriptor().name
    }

    /// Parse a kind name, ignoring surrounding whitespace and case
    pub fn parse(s: &str) -> Option<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| kind.as_str() == wanted)
    }

    /// Static rendering descriptor for this kind
    #[inline]
    pub fn descriptor(self) -> &'static ShapeDescriptor {
        &DESCRIPTORS[self as usize]
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapeKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ConfigError::UnknownShape(s.to_string()))
    }
}

impl TryFrom<String> for ShapeKind {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ShapeKind> for &'static str {
    fn from(kind: ShapeKind) -> Self {
        kind.as_str()
    }
}

/// A single path command in shape-local coordinates (origin at shape center, +y down)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathOp {
    MoveTo(Vec2),
    LineTo(Vec2),
    /// Full circle (starts its own subpath)
    Circle { center: Vec2, radius: f32 },
    CubicTo { c1: Vec2, c2: Vec2, to: Vec2 },
    Close,
}

/// How a fill layer is painted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    /// Fill with the shape color
    Solid,
    /// Fill with the background color (cut-outs)
    Knockout,
    /// Stroke only with the shape color
    Stroke,
}

/// One painted layer of a shape's fill
#[derive(Debug, Clone, PartialEq)]
pub struct FillLayer {
    pub mode: FillMode,
    pub path: Vec<PathOp>,
}

impl FillLayer {
    fn solid(path: Vec<PathOp>) -> Self {
        Self {
            mode: FillMode::Solid,
            path,
        }
    }
}

/// Static per-kind rendering data
pub struct ShapeDescriptor {
    pub kind: ShapeKind,
    pub name: &'static str,
    /// 0xRRGGBB
    pub color: u32,
    /// Outline path for a shape of the given size
    pub outline: fn(f32) -> Vec<PathOp>,
    /// Fill layers for a shape of the given size, painted in order
    pub fill: fn(f32) -> Vec<FillLayer>,
}

impl fmt::Debug for ShapeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeDescriptor")
            .field("kind", &self.kind)
            .field("color", &format_args!("#{:06X}", self.color))
            .finish_non_exhaustive()
    }
}

static DESCRIPTORS: [ShapeDescriptor; 10] = [
    ShapeDescriptor {
        kind: ShapeKind::Circle,
        name: "circle",
        color: 0x4CAF50,
        outline: circle_path,
        fill: circle_fill,
    },
    ShapeDescriptor {
        kind: ShapeKind::Square,
        name: "square",
        color: 0xFF6B6B,
        outline: square_path,
        fill: square_fill,
    },
    ShapeDescriptor {
        kind: ShapeKind::Triangle,
        name: "triangle",
        color: 0x4ECDC4,
        outline: triangle_path,
        fill: triangle_fill,
    },
    ShapeDescriptor {
        kind: ShapeKind::Star,
        name: "star",
        color: 0xFFD700,
        outline: star_path,
        fill: star_fill,
    },
    ShapeDescriptor {
        kind: ShapeKind::Diamond,
        name: "diamond",
        color: 0x9C27B0,
        outline: diamond_path,
        fill: diamond_fill,
    },
    ShapeDescriptor {
        kind: ShapeKind::Hexagon,
        name: "hexagon",
        color: 0xFF9800,
        outline: hexagon_path,
        fill: hexagon_fill,
    },
    ShapeDescriptor {
        kind: ShapeKind::Cross,
        name: "cross",
        color: 0xE91E63,
        outline: cross_path,
        fill: cross_fill,
    },
    ShapeDescriptor {
        kind: ShapeKind::Heart,
        name: "heart",
        color: 0xF44336,
        outline: heart_path,
        fill: heart_fill,
    },
    ShapeDescriptor {
        kind: ShapeKind::Moon,
        name: "moon",
        color: 0x2196F3,
        outline: moon_outline,
        fill: moon_fill,
    },
    ShapeDescriptor {
        kind: ShapeKind::Spiral,
        name: "spiral",
        color: 0x00BCD4,
        outline: spiral_path,
        fill: spiral_fill,
    },
];

/// Single solid layer following the outline
macro_rules! solid_fill {
    ($($fill:ident => $path:ident),* $(,)?) => {
        $(
            fn $fill(size: f32) -> Vec<FillLayer> {
                vec![FillLayer::solid($path(size))]
            }
        )*
    };
}

solid_fill! {
    circle_fill => circle_path,
    square_fill => square_path,
    triangle_fill => triangle_path,
    star_fill => star_path,
    diamond_fill => diamond_path,
    hexagon_fill => hexagon_path,
    cross_fill => cross_path,
    heart_fill => heart_path,
}

/// Closed polygon through `points`
fn polygon(points: impl IntoIterator<Item = Vec2>) -> Vec<PathOp> {
    let mut ops: Vec<PathOp> = points
        .into_iter()
        .enumerate()
        .map(|(i, p)| if i == 0 { PathOp::MoveTo(p) } else { PathOp::LineTo(p) })
        .collect();
    ops.push(PathOp::Close);
    ops
}

fn circle_path(size: f32) -> Vec<PathOp> {
    vec![PathOp::Circle {
        center: Vec2::ZERO,
        radius: size / 2.0,
    }]
}

fn square_path(size: f32) -> Vec<PathOp> {
    let h = size / 2.0;
    polygon([
        Vec2::new(-h, -h),
        Vec2::new(h, -h),
        Vec2::new(h, h),
        Vec2::new(-h, h),
    ])
}

fn triangle_path(size: f32) -> Vec<PathOp> {
    let h = size / 2.0;
    polygon([Vec2::new(0.0, -h), Vec2::new(h, h), Vec2::new(-h, h)])
}

fn star_path(size: f32) -> Vec<PathOp> {
    // Five outer points with an inner point between each pair
    let points = (0..5).flat_map(|i| {
        let outer = i as f32 * TAU / 5.0 - FRAC_PI_2;
        let inner = outer + PI / 5.0;
        [
            Vec2::from_angle(outer) * (size / 2.0),
            Vec2::from_angle(inner) * (size * 0.2),
        ]
    });
    polygon(points)
}

fn diamond_path(size: f32) -> Vec<PathOp> {
    let h = size / 2.0;
    polygon([
        Vec2::new(0.0, -h),
        Vec2::new(h, 0.0),
        Vec2::new(0.0, h),
        Vec2::new(-h, 0.0),
    ])
}

fn hexagon_path(size: f32) -> Vec<PathOp> {
    polygon((0..6).map(|i| Vec2::from_angle(i as f32 * TAU / 6.0) * (size / 2.0)))
}

fn cross_path(size: f32) -> Vec<PathOp> {
    let h = size / 2.0;
    let a = size * 0.2;
    polygon([
        Vec2::new(-a, -h),
        Vec2::new(a, -h),
        Vec2::new(a, -a),
        Vec2::new(h, -a),
        Vec2::new(h, a),
        Vec2::new(a, a),
        Vec2::new(a, h),
        Vec2::new(-a, h),
        Vec2::new(-a, a),
        Vec2::new(-h, a),
        Vec2::new(-h, -a),
        Vec2::new(-a, -a),
    ])
}

fn heart_path(size: f32) -> Vec<PathOp> {
    let h = size / 2.0;
    let curve = size * 0.4;
    let bottom = Vec2::new(0.0, size * 0.35);
    vec![
        PathOp::MoveTo(bottom),
        PathOp::CubicTo {
            c1: Vec2::new(-h, 0.0),
            c2: Vec2::new(-h, -curve),
            to: Vec2::new(0.0, -h),
        },
        PathOp::CubicTo {
            c1: Vec2::new(h, -curve),
            c2: Vec2::new(h, 0.0),
            to: bottom,
        },
    ]
}

fn moon_bite(size: f32) -> PathOp {
    PathOp::Circle {
        center: Vec2::new(size / 5.0, 0.0),
        radius: size / 3.0,
    }
}

fn moon_outline(size: f32) -> Vec<PathOp> {
    let mut ops = circle_path(size);
    ops.push(moon_bite(size));
    ops
}

fn moon_fill(size: f32) -> Vec<FillLayer> {
    vec![
        FillLayer::solid(circle_path(size)),
        FillLayer {
            mode: FillMode::Knockout,
            path: vec![moon_bite(size)],
        },
    ]
}

fn spiral_path(size: f32) -> Vec<PathOp> {
    // Open polyline winding inward, never closed
    (0..8)
        .map(|i| {
            let p = Vec2::from_angle(i as f32 * PI / 4.0) * (size / 2.0 * (1.0 - i as f32 / 8.0));
            if i == 0 { PathOp::MoveTo(p) } else { PathOp::LineTo(p) }
        })
        .collect()
}

fn spiral_fill(size: f32) -> Vec<FillLayer> {
    vec![FillLayer {
        mode: FillMode::Stroke,
        path: spiral_path(size),
    }]
}
