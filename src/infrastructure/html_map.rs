// HTML map renderer - static basemap tiles plus colored device markers
use crate::domain::color_scale::Gradient;
use crate::domain::map_document::MapDocument;
use crate::domain::telemetry::Sample;
use crate::domain::viewport::Viewport;
use crate::infrastructure::config::{MapSettings, fill_template};
use crate::infrastructure::tile_layout::{PlacedTile, TILE_SIZE, offset_from_center, tiles_around};
use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;
use std::fmt::Write;

const UPDATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const MARKER_STROKE_PX: u32 = 3;

/// Upper bound on tiles drawn on each side of the center tile.
const MAX_TILE_SPAN: u32 = 16;

const STYLE: &str = r#"
    html, body { margin: 0; padding: 0; width: 100%; height: 100%; overflow: hidden; }
    body { font-family: sans-serif; background: #f2f2f0; }
    #map { position: relative; width: 100%; height: 100%; overflow: hidden; }
    .tile { position: absolute; display: block; border: 0; user-select: none; }
    .marker { position: absolute; box-sizing: border-box; border-radius: 50%; }
    .panel { position: fixed; border: 2px solid grey; background-color: white; z-index: 9999; font-size: 14px; }
    .legend { bottom: 30px; left: 30px; width: 125px; height: 95px; }
    .updated { top: 30px; right: 30px; width: 160px; height: 25px; }
    .swatch { display: inline-block; width: 12px; height: 12px; border-radius: 50%; vertical-align: middle; }
    .attribution { position: fixed; bottom: 0; right: 0; padding: 0 5px; font-size: 11px; background: rgba(255,255,255,0.8); z-index: 9998; }
"#;

const LEGEND: &str = r#"<div class="panel legend">&nbsp; Color Legend <br>
    &nbsp; High (100):&nbsp; <span class="swatch" style="background:red"></span><br>
    &nbsp; Med (&nbsp;&nbsp;50):&nbsp; <span class="swatch" style="background:#800080"></span><br>
    &nbsp; Low (&nbsp;&nbsp;&nbsp;0):&nbsp; <span class="swatch" style="background:blue"></span>
</div>"#;

#[derive(Debug, Clone)]
pub struct HtmlMapRenderer {
    settings: MapSettings,
    gradient: Gradient,
}

impl HtmlMapRenderer {
    pub fn new(settings: MapSettings) -> Self {
        Self {
            settings,
            gradient: Gradient::coolwarm(),
        }
    }

    /// Build the complete page for one tick.
    pub fn render(
        &self,
        viewport: &Viewport,
        samples: &[Sample],
        scale_max: f64,
        updated_at: &DateTime<FixedOffset>,
    ) -> MapDocument {
        let mut html = String::with_capacity(16 * 1024);

        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n");
        let _ = writeln!(html, "<title>{}</title>", html_escape::encode_text(&self.settings.title));
        let _ = writeln!(
            html,
            "<meta http-equiv=\"refresh\" content=\"{}\" />",
            self.settings.refresh_secs
        );
        html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\" />\n");
        let _ = writeln!(html, "<style>{}</style>\n</head>\n<body>", STYLE);

        let _ = writeln!(
            html,
            "<div id=\"map\" data-zoom=\"{}\" data-center=\"{:.6},{:.6}\">",
            viewport.zoom, viewport.center_lat, viewport.center_lon
        );
        for tile in tiles_around(viewport, self.tile_span(viewport, samples)) {
            self.write_tile(&mut html, &tile);
        }
        for sample in samples {
            self.write_marker(&mut html, viewport, sample, scale_max);
        }
        html.push_str("</div>\n");

        html.push_str(LEGEND);
        html.push('\n');
        let _ = writeln!(
            html,
            "<div class=\"panel updated\">&nbsp; {} <br></div>",
            updated_at.format(UPDATED_FORMAT)
        );
        let _ = writeln!(html, "<div class=\"attribution\">{}</div>", self.settings.attribution);
        html.push_str("</body>\n</html>\n");

        MapDocument::new(html)
    }

    /// Tiles per side: the configured span, widened until every marker sits
    /// on the basemap, capped at `MAX_TILE_SPAN`.
    fn tile_span(&self, viewport: &Viewport, samples: &[Sample]) -> u32 {
        let radius = f64::from(self.settings.marker_radius);
        let extent = samples
            .iter()
            .map(|s| {
                let (dx, dy) = offset_from_center(viewport, s.latitude, s.longitude);
                dx.abs().max(dy.abs()) + radius
            })
            .fold(0.0, f64::max);
        let needed = (extent / TILE_SIZE).ceil() as u32 + 1;

        self.settings.tile_span.max(needed).min(MAX_TILE_SPAN)
    }

    fn tile_url(&self, tile: &PlacedTile) -> String {
        let subdomains: Vec<char> = self.settings.tile_subdomains.chars().collect();
        let mut vars = HashMap::new();
        if !subdomains.is_empty() {
            let pick = (tile.x + tile.y).unsigned_abs() as usize % subdomains.len();
            vars.insert("s", subdomains[pick].to_string());
        }
        vars.insert("z", tile.z.to_string());
        vars.insert("x", tile.x.to_string());
        vars.insert("y", tile.y.to_string());
        fill_template(&self.settings.tile_url, &vars)
    }

    fn write_tile(&self, html: &mut String, tile: &PlacedTile) {
        let _ = writeln!(
            html,
            "<img class=\"tile\" src=\"{}\" alt=\"\" width=\"{size}\" height=\"{size}\" style=\"left:calc(50% + {:.1}px);top:calc(50% + {:.1}px)\" />",
            html_escape::encode_double_quoted_attribute(&self.tile_url(tile)),
            tile.left,
            tile.top,
            size = TILE_SIZE,
        );
    }

    fn write_marker(&self, html: &mut String, viewport: &Viewport, sample: &Sample, scale_max: f64) {
        let rgb = self.gradient.color_for(sample.value, scale_max);
        let color = rgb.to_hex();
        let radius = f64::from(self.settings.marker_radius);
        let (dx, dy) = offset_from_center(viewport, sample.latitude, sample.longitude);

        let _ = writeln!(
            html,
            "<div class=\"marker\" title=\"{id}\" data-device=\"{id}\" data-value=\"{value:.2}\" data-color=\"{color}\" \
             style=\"left:calc(50% + {left:.1}px);top:calc(50% + {top:.1}px);width:{diameter}px;height:{diameter}px;\
             background-color:rgba({channels},{opacity});border:{stroke}px solid {color}\"></div>",
            id = sample.device_id,
            value = sample.value,
            color = color,
            left = dx - radius,
            top = dy - radius,
            diameter = self.settings.marker_radius * 2,
            channels = rgb.to_css_channels(),
            opacity = self.settings.fill_opacity,
            stroke = MARKER_STROKE_PX,
        );
    }
}
