// Web Mercator tile layout around a viewport center
use crate::domain::viewport::Viewport;
use std::f64::consts::PI;

pub const TILE_SIZE: f64 = 256.0;

/// Latitude where the square Mercator world ends.
const MAX_LATITUDE: f64 = 85.051_128_78;

/// One basemap tile and its top-left corner relative to the map center, in px.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedTile {
    pub x: i64,
    pub y: i64,
    pub z: u8,
    pub left: f64,
    pub top: f64,
}

/// Global pixel coordinates of a position at `zoom`.
pub fn project(lat: f64, lon: f64, zoom: u8) -> (f64, f64) {
    let world = TILE_SIZE * f64::from(1u32 << zoom);
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();

    let x = (lon + 180.0) / 360.0 * world;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * world;
    (x, y)
}

/// Pixel offset of a position from the viewport center.
pub fn offset_from_center(viewport: &Viewport, lat: f64, lon: f64) -> (f64, f64) {
    let (cx, cy) = project(viewport.center_lat, viewport.center_lon, viewport.zoom);
    let (x, y) = project(lat, lon, viewport.zoom);
    (x - cx, y - cy)
}

/// Tiles covering `span` tiles on each side of the center tile.
///
/// Columns wrap around the antimeridian; rows outside the world are dropped.
pub fn tiles_around(viewport: &Viewport, span: u32) -> Vec<PlacedTile> {
    let zoom = viewport.zoom;
    let tiles_per_axis = 1i64 << zoom;
    let (cx, cy) = project(viewport.center_lat, viewport.center_lon, zoom);
    let center_x = (cx / TILE_SIZE).floor() as i64;
    let center_y = (cy / TILE_SIZE).floor() as i64;
    let span = i64::from(span);

    let mut tiles = Vec::new();
    for ty in (center_y - span)..=(center_y + span) {
        if ty < 0 || ty >= tiles_per_axis {
            continue;
        }
        for tx in (center_x - span)..=(center_x + span) {
            tiles.push(PlacedTile {
                x: tx.rem_euclid(tiles_per_axis),
                y: ty,
                z: zoom,
                left: tx as f64 * TILE_SIZE - cx,
                top: ty as f64 * TILE_SIZE - cy,
            });
        }
    }
    tiles
}
