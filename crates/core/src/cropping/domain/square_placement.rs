/// Where a `width × height` rectangle sits when centered on a square canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SquarePlacement {
    pub side: u32,
    pub offset_x: u32,
    pub offset_y: u32,
}

/// Centers a rectangle inside a `side × side` square, `side = max(w, h)`.
///
/// Offsets are floored, so an odd leftover puts the extra pixel on the
/// right/bottom. Already-square inputs yield zero offsets.
pub fn derive_square_placement(width: u32, height: u32) -> SquarePlacement {
    debug_assert!(width > 0 && height > 0, "placement of an empty rectangle");

    let side = width.max(height);
    SquarePlacement {
        side,
        offset_x: (side - width) / 2,
        offset_y: (side - height) / 2,
    }
}
