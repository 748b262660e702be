//! Popover behavior flags and placement.

use std::ops::{BitAnd, BitOr, BitOrAssign};

use crate::geometry::{Point, Rect, Size};

/// Flags controlling how a popover closes.
///
/// Flags can be combined with `|`:
///
/// ```
/// use horizon_facet::controller::PopoverFlags;
///
/// let flags = PopoverFlags::CLOSE_ON_ESCAPE | PopoverFlags::CLOSE_ON_OUTSIDE_POINTER;
/// assert_eq!(flags, PopoverFlags::DEFAULT);
/// assert!(!PopoverFlags::NONE.has(PopoverFlags::CLOSE_ON_ESCAPE));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PopoverFlags(u16);

impl PopoverFlags {
    /// No automatic closing.
    pub const NONE: PopoverFlags = PopoverFlags(0);

    /// Close when the pointer goes down outside the popover frame.
    pub const CLOSE_ON_OUTSIDE_POINTER: PopoverFlags = PopoverFlags(1 << 0);

    /// Close on a cancel (escape) event.
    pub const CLOSE_ON_ESCAPE: PopoverFlags = PopoverFlags(1 << 1);

    /// Default flags for a standard popover.
    pub const DEFAULT: PopoverFlags = PopoverFlags(Self::CLOSE_ON_OUTSIDE_POINTER.0 | Self::CLOSE_ON_ESCAPE.0);

    /// Check if a flag is set.
    pub fn has(&self, flag: PopoverFlags) -> bool {
        (self.0 & flag.0) == flag.0
    }

    /// Return these flags with `flag` set or cleared.
    pub fn with(self, flag: PopoverFlags, enabled: bool) -> Self {
        if enabled {
            Self(self.0 | flag.0)
        } else {
            Self(self.0 & !flag.0)
        }
    }

    /// The raw bits.
    pub fn bits(&self) -> u16 {
        self.0
    }
}

impl Default for PopoverFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl BitOr for PopoverFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        PopoverFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for PopoverFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for PopoverFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        PopoverFlags(self.0 & rhs.0)
    }
}

/// Where a popover sits relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PopoverPlacement {
    /// Centered below the anchor.
    #[default]
    Below,
    /// Centered above the anchor.
    Above,
    /// Left of the anchor, vertically centered.
    Left,
    /// Right of the anchor, vertically centered.
    Right,
    /// Centered over the anchor.
    Center,
}

impl PopoverPlacement {
    /// Compute the popover frame for an anchor.
    ///
    /// With `bounds`, a popover that would leave them flips to the opposite
    /// side of the anchor and is then shifted back inside.
    pub fn frame(&self, anchor: Rect, size: Size, bounds: Option<Rect>) -> Rect {
        let origin = self.initial_origin(anchor, size);
        let origin = match bounds {
            Some(bounds) => self.flip_and_shift(origin, size, anchor, bounds),
            None => origin,
        };
        Rect {
            origin,
            size,
        }
    }

    fn initial_origin(&self, anchor: Rect, size: Size) -> Point {
        let center_x = anchor.left() + anchor.width() / 2.0;
        let center_y = anchor.top() + anchor.height() / 2.0;

        match self {
            Self::Below => Point::new(center_x - size.width / 2.0, anchor.bottom()),
            Self::Above => Point::new(center_x - size.width / 2.0, anchor.top() - size.height),
            Self::Left => Point::new(anchor.left() - size.width, center_y - size.height / 2.0),
            Self::Right => Point::new(anchor.right(), center_y - size.height / 2.0),
            Self::Center => Point::new(center_x - size.width / 2.0, center_y - size.height / 2.0),
        }
    }

    fn flip_and_shift(&self, origin: Point, size: Size, anchor: Rect, bounds: Rect) -> Point {
        let mut result = origin;

        match self {
            Self::Below if origin.y + size.height > bounds.bottom() => {
                result.y = anchor.top() - size.height;
            }
            Self::Above if origin.y < bounds.top() => result.y = anchor.bottom(),
            Self::Left if origin.x < bounds.left() => result.x = anchor.right(),
            Self::Right if origin.x + size.width > bounds.right() => {
                result.x = anchor.left() - size.width;
            }
            _ => {}
        }

        result.x = result.x.min(bounds.right() - size.width).max(bounds.left());
        result.y = result.y.min(bounds.bottom() - size.height).max(bounds.top());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let flags = PopoverFlags::NONE | PopoverFlags::CLOSE_ON_ESCAPE;
        assert!(flags.has(PopoverFlags::CLOSE_ON_ESCAPE));
        assert!(!flags.has(PopoverFlags::CLOSE_ON_OUTSIDE_POINTER));
        assert_eq!(
            PopoverFlags::DEFAULT.with(PopoverFlags::CLOSE_ON_ESCAPE, false),
            PopoverFlags::CLOSE_ON_OUTSIDE_POINTER
        );
    }

    #[test]
    fn test_below_placement() {
        let anchor = Rect::new(100.0, 100.0, 40.0, 20.0);
        let frame = PopoverPlacement::Below.frame(anchor, Size::new(80.0, 50.0), None);
        assert_eq!(frame, Rect::new(80.0, 120.0, 80.0, 50.0));
    }

    #[test]
    fn test_flips_when_out_of_bounds() {
        let bounds = Rect::new(0.0, 0.0, 400.0, 300.0);
        let anchor = Rect::new(100.0, 260.0, 40.0, 20.0);
        let frame = PopoverPlacement::Below.frame(anchor, Size::new(80.0, 50.0), Some(bounds));
        assert_eq!(frame.origin, Point::new(80.0, 210.0));
    }

    #[test]
    fn test_shifts_into_bounds() {
        let bounds = Rect::new(0.0, 0.0, 400.0, 300.0);
        let anchor = Rect::new(0.0, 10.0, 20.0, 20.0);
        let frame = PopoverPlacement::Below.frame(anchor, Size::new(100.0, 50.0), Some(bounds));
        assert_eq!(frame.origin, Point::new(0.0, 30.0));
    }
}
