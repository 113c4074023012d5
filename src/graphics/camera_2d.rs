//! Aspect-preserving placement of a source rectangle onto the screen.

use bytemuck::Zeroable;
use glam::Vec2Swizzles;
use winit::dpi::PhysicalSize;

pub enum Mode {
    /// Scale the source so it completely covers the destination, cutting off
    /// edges as necessary to preserve aspect ratio.
    #[allow(dead_code)] // the display currently always fits
    Cover,
    /// Scale the source so all of it fits inside the destination, leaving
    /// letterbox bars as necessary to preserve aspect ratio.
    Fit,
}

/// Parameters for a vertex shader of the shape
/// `position = xy * scale + offset` over unit-quad `xy`, with the fragment
/// shader discarding anything outside `lower_bound..upper_bound` in
/// framebuffer coordinates.
#[derive(Copy, Clone, Zeroable, Debug)]
pub struct Placement {
    pub scale: glam::Vec2,
    pub offset: glam::Vec2,
    pub lower_bound: glam::Vec2,
    pub upper_bound: glam::Vec2,
}

pub struct ScreenRect {
    pub width: f32,
    pub height: f32,
}

impl From<PhysicalSize<u32>> for ScreenRect {
    fn from(size: PhysicalSize<u32>) -> Self {
        Self {
            width: size.width as f32,
            height: size.height as f32,
        }
    }
}

pub struct SourceRect {
    pub width: f32,
    pub height: f32,
}

pub struct DestinationRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Placement {
    /// Places `source` centered inside `destination` on a screen of the given
    /// size. The returned scale/offset already fold in the clip-space y-flip,
    /// so the top-left of the source lands at the top-left of the destination.
    pub fn source_to_screen(
        screen: ScreenRect,
        source: SourceRect,
        destination: DestinationRect,
        mode: Mode,
    ) -> Self {
        if source.width <= 0.0
            || source.height <= 0.0
            || destination.width <= 0.0
            || destination.height <= 0.0
        {
            return Placement::zeroed();
        }

        // Uniform scale: "cover" takes the larger of the two axis ratios,
        // "fit" the smaller. Centering fixes the offset.
        let source_size = glam::vec2(source.width, source.height);
        let destination_size = glam::vec2(destination.width, destination.height);
        let destination_offset = glam::vec2(destination.x, destination.y);
        let direct_scale = destination_size / source_size;
        let overall_scale = match mode {
            Mode::Cover => {
                if direct_scale.x > direct_scale.y {
                    direct_scale.xx()
                } else {
                    direct_scale.yy()
                }
            }
            Mode::Fit => {
                if direct_scale.x < direct_scale.y {
                    direct_scale.xx()
                } else {
                    direct_scale.yy()
                }
            }
        };
        let overall_offset =
            destination_offset + 0.5 * (destination_size - overall_scale * source_size);

        // Map screen pixels into clip space: x spans [-1, 1] left to right,
        // y spans [1, -1] top to bottom, hence the flip.
        let screen_size = glam::vec2(screen.width, screen.height);
        let flip = glam::vec2(1.0, -1.0);
        let scale = 2.0 * overall_scale * source_size / screen_size * flip;
        let offset = (2.0 * overall_offset / screen_size - 1.0) * flip;

        // Fragment-side clip rectangle, already in framebuffer coordinates.
        let lower_bound = destination_offset;
        let upper_bound = destination_offset + destination_size;

        Placement {
            scale,
            offset,
            lower_bound,
            upper_bound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_letterboxes_the_narrow_axis() {
        let placement = Placement::source_to_screen(
            ScreenRect {
                width: 200.0,
                height: 100.0,
            },
            SourceRect {
                width: 100.0,
                height: 100.0,
            },
            DestinationRect {
                x: 0.0,
                y: 0.0,
                width: 200.0,
                height: 100.0,
            },
            Mode::Fit,
        );
        // Source is square, destination 2:1: the square fills the height and
        // is centered horizontally.
        assert_eq!(placement.scale, glam::vec2(1.0, -2.0));
        assert_eq!(placement.offset, glam::vec2(-0.5, 1.0));
    }

    #[test]
    fn degenerate_rectangles_collapse_to_zero() {
        let placement = Placement::source_to_screen(
            ScreenRect {
                width: 200.0,
                height: 100.0,
            },
            SourceRect {
                width: 100.0,
                height: 100.0,
            },
            DestinationRect {
                x: 0.0,
                y: 0.0,
                width: 200.0,
                height: 0.0,
            },
            Mode::Fit,
        );
        assert_eq!(placement.scale, glam::Vec2::ZERO);
        assert_eq!(placement.upper_bound, glam::Vec2::ZERO);
    }
}
