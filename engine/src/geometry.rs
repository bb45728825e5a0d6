use std::ops;

use serde::{Deserialize, Serialize};

/// A point in screen or texture space.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

impl<T> Point<T> {
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T> ops::Add<Self> for Point<T>
where
    T: ops::Add<Output = T>,
{
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl<T> ops::Sub<Self> for Point<T>
where
    T: ops::Sub<Output = T>,
{
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl<T> ops::Mul<T> for Point<T>
where
    T: ops::Mul<Output = T> + Copy,
{
    type Output = Self;
    fn mul(self, rhs: T) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl<T> ops::Div<T> for Point<T>
where
    T: ops::Div<Output = T> + Copy,
{
    type Output = Self;
    fn div(self, rhs: T) -> Self::Output {
        Self {
            x: self.x / rhs,
            y: self.y / rhs,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Pixel count, `None` for negative sizes or when it overflows.
    #[allow(clippy::cast_sign_loss)]
    pub const fn area(self) -> Option<usize> {
        if self.width < 0 || self.height < 0 {
            return None;
        }
        (self.width as usize).checked_mul(self.height as usize)
    }
}

/// An axis aligned rectangle anchored at its top-left corner.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Rect {
    pub position: Point<i32>,
    pub size: Size,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            position: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub const fn left(&self) -> i32 {
        self.position.x
    }

    pub const fn top(&self) -> i32 {
        self.position.y
    }

    pub const fn right(&self) -> i32 {
        self.position.x + self.size.width
    }

    pub const fn bottom(&self) -> i32 {
        self.position.y + self.size.height
    }

    /// Open interval test: points on the edges are outside.
    pub const fn contains_strict(&self, x: i32, y: i32) -> bool {
        x > self.left() && x < self.right() && y > self.top() && y < self.bottom()
    }

    /// Half open test: the left and top edges are inside, the right and
    /// bottom ones are not.
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        within_area(Point::new(x, y), self.position, self.size)
    }

    /// Overlapping region of two rectangles, `None` when they only touch or
    /// don't meet at all.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        (left < right && top < bottom).then(|| Self::new(left, top, right - left, bottom - top))
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Circle {
    pub position: Point<i32>,
    pub radius: i32,
}

impl Circle {
    pub const fn new(x: i32, y: i32, radius: i32) -> Self {
        Self {
            position: Point::new(x, y),
            radius,
        }
    }
}

/// Which side of a rectangle another one hit.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum Side {
    NoCollision,
    Left,
    Right,
    Top,
    Bottom,
}

/// Whether `point` lies inside the `size` pixels starting at `origin`.
pub const fn within_area(point: Point<i32>, origin: Point<i32>, size: Size) -> bool {
    point.x >= origin.x
        && point.x - origin.x < size.width
        && point.y >= origin.y
        && point.y - origin.y < size.height
}

pub const fn within_rectangle(x: i32, y: i32, rect: &Rect) -> bool {
    rect.contains(x, y)
}

/// Axis aligned overlap test. Rectangles that only share an edge don't collide.
pub fn rectangle_collision(a: &Rect, b: &Rect) -> bool {
    a.intersection(b).is_some()
}

/// Classifies the side of `a` that `b` hits, picking the axis with the
/// shallowest penetration.
pub fn collision_side(a: &Rect, b: &Rect) -> Side {
    if a.intersection(b).is_none() {
        return Side::NoCollision;
    }

    let from_left = b.right() - a.left();
    let from_right = a.right() - b.left();
    let from_top = b.bottom() - a.top();
    let from_bottom = a.bottom() - b.top();

    let horizontal = from_left.min(from_right);
    let vertical = from_top.min(from_bottom);

    if horizontal <= vertical {
        if from_left <= from_right {
            Side::Left
        } else {
            Side::Right
        }
    } else if from_top <= from_bottom {
        Side::Top
    } else {
        Side::Bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn point_ops() {
        let p = Point { x: 10_i32, y: 10 };

        assert_eq!(p / 2, Point { x: 5, y: 5 });
        assert_eq!(p * 2, Point { x: 20, y: 20 });
        assert_eq!(p + Point { x: 1, y: 1 }, Point { x: 11, y: 11 });
        assert_eq!(p - Point { x: 1, y: 1 }, Point { x: 9, y: 9 });
    }

    #[test]
    fn strict_containment_excludes_edges() {
        let rect = Rect::new(10, 10, 16, 16);

        assert!(!rect.contains_strict(10, 15));
        assert!(rect.contains_strict(11, 15));
        assert!(rect.contains_strict(25, 25));
        assert!(!rect.contains_strict(26, 15));
        assert!(!rect.contains_strict(15, 26));
    }

    #[test]
    fn within_area_covers_exactly_the_pixels() {
        let rect = Rect::new(0, 0, 8, 8);

        assert!(within_rectangle(0, 0, &rect));
        assert!(within_rectangle(7, 7, &rect));
        assert!(!within_rectangle(8, 0, &rect));
        assert!(!within_rectangle(0, 8, &rect));
        assert!(!within_rectangle(-1, 0, &rect));
        assert!(rect.contains(3, 7));
        assert!(!rect.contains(3, 8));
    }

    #[test]
    fn area_rejects_overflow() {
        assert_eq!(Size::new(48, 16).area(), Some(768));
        assert_eq!(Size::new(-1, 16).area(), None);
        assert_eq!(Size::new(i32::MAX, i32::MAX).area(), Some(4_611_686_014_132_420_609));
    }

    #[test]
    fn intersection_of_overlapping_rects() {
        let a = Rect::new(0, 0, 32, 32);
        let b = Rect::new(16, 24, 32, 32);

        assert_eq!(a.intersection(&b), Some(Rect::new(16, 24, 16, 8)));
        assert!(rectangle_collision(&a, &b));
    }

    #[test]
    fn touching_rects_do_not_collide() {
        let a = Rect::new(0, 0, 32, 32);
        let b = Rect::new(32, 0, 32, 32);

        assert_eq!(a.intersection(&b), None);
        assert!(!rectangle_collision(&a, &b));
        assert_eq!(collision_side(&a, &b), Side::NoCollision);
    }

    #[test]
    fn side_classification() {
        let a = Rect::new(100, 100, 40, 40);

        assert_eq!(collision_side(&a, &Rect::new(70, 110, 40, 10)), Side::Left);
        assert_eq!(collision_side(&a, &Rect::new(130, 110, 40, 10)), Side::Right);
        assert_eq!(collision_side(&a, &Rect::new(110, 70, 10, 40)), Side::Top);
        assert_eq!(collision_side(&a, &Rect::new(110, 130, 10, 40)), Side::Bottom);
    }
}
