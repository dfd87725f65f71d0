//! Generate an HTML/SVG visualization of the Orion's Hands keymap.

use orion_keymap::{lookup, Keycode, Layer, ALL_LAYERS, COLS, COLS_PER_HALF, ROWS};

/// Physical key position and size for SVG rendering.
struct Key {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    row: usize,
    col: usize,
}

/// Key unit size in SVG pixels.
const U: f64 = 54.0;
/// Gap between keys.
const GAP: f64 = 4.0;
/// Step: key + gap.
const S: f64 = U + GAP;
/// Key corner radius.
const R: f64 = 4.0;
/// Spacing between left and right halves.
const HALF_GAP: f64 = 60.0;
/// Margin around the SVG content.
const MARGIN: f64 = 20.0;

/// Row stagger (x offset in units of S), as on a row-staggered board.
const ROW_STAGGER: [f64; ROWS] = [0.00, 0.25, 0.40, 0.65, 0.00];

/// Build all physical key positions for both halves.
fn build_keys() -> Vec<Key> {
    let mut keys = Vec::new();
    build_half(&mut keys, 0, 0.0);

    let right_x = (COLS_PER_HALF as f64 + 1.0) * S + HALF_GAP;
    build_half(&mut keys, COLS_PER_HALF, right_x);
    keys
}

/// Build key positions for one half, matrix columns `col_offset..col_offset + 7`.
fn build_half(keys: &mut Vec<Key>, col_offset: usize, bx: f64) {
    for (row, stagger) in ROW_STAGGER.iter().enumerate() {
        for lc in 0..COLS_PER_HALF {
            keys.push(Key {
                x: bx + (lc as f64 + stagger) * S,
                y: row as f64 * S,
                w: U,
                h: U,
                row,
                col: col_offset + lc,
            });
        }
    }
}

/// Compute the bounding box of all keys: (max_x + w, max_y + h).
fn bbox(keys: &[Key]) -> (f64, f64) {
    let mut max_x: f64 = 0.0;
    let mut max_y: f64 = 0.0;
    for k in keys {
        max_x = max_x.max(k.x + k.w);
        max_y = max_y.max(k.y + k.h);
    }
    (max_x, max_y)
}

fn layer_title(layer: Layer) -> &'static str {
    match layer {
        Layer::Base => "Base",
        Layer::Function => "Fn (hold Fn)",
    }
}

/// Render a single layer as an SVG group.
fn render_layer(keys: &[Key], layer: Layer, y_offset: f64) -> String {
    let mut svg = String::new();

    svg.push_str(&format!(
        r#"<g transform="translate({MARGIN}, {y_offset})">"#
    ));
    svg.push_str(&format!(
        r#"<text x="0" y="-10" class="layer-title">Layer {}</text>"#,
        layer_title(layer)
    ));

    for key in keys {
        let kc = layer.table()[key.row][key.col];
        // Fall-through keys show what they resolve to
        let display_kc = lookup(layer, key.row, key.col);
        let label = display_kc.display_name();

        let key_class = if display_kc == Keycode::Trans {
            "key unused"
        } else if kc.is_transparent() {
            "key transparent"
        } else if kc.is_function() {
            "key layer"
        } else if kc.is_modifier() {
            "key modifier"
        } else {
            "key"
        };

        svg.push_str(&format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{R}" class="{key_class}"/>"#,
            key.x, key.y, key.w, key.h,
        ));

        if !label.is_empty() {
            let font_class = if label.chars().count() > 3 { " small" } else { "" };
            svg.push_str(&format!(
                r#"<text x="{}" y="{}" class="label{font_class}">{}</text>"#,
                key.x + key.w / 2.0,
                key.y + key.h / 2.0 + 1.0,
                html_escape(label),
            ));
        }
    }

    svg.push_str("</g>");
    svg
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Generate the complete HTML document with inline SVG.
pub fn generate_html() -> String {
    let keys = build_keys();
    let (content_w, content_h) = bbox(&keys);
    let layer_height = content_h + 60.0;
    let total_width = content_w + 2.0 * MARGIN;
    let total_height = ALL_LAYERS.len() as f64 * layer_height + 2.0 * MARGIN;

    let mut html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Orion's Hands Layout</title>
<style>
  body {{
    background: #1a1a2e;
    color: #eee;
    font-family: system-ui, -apple-system, sans-serif;
    display: flex;
    justify-content: center;
    padding: 2em;
  }}
  .key {{
    fill: #16213e;
    stroke: #0f3460;
    stroke-width: 1.5;
  }}
  .key.unused {{
    fill: #0d1117;
    stroke: #21262d;
    stroke-dasharray: 3 3;
  }}
  .key.transparent {{
    fill: #1a1a2e;
    stroke: #30365e;
    stroke-dasharray: 2 2;
  }}
  .key.layer {{
    fill: #2d1b4e;
    stroke: #e94560;
    stroke-width: 2;
  }}
  .key.modifier {{
    fill: #1b2e4e;
    stroke: #53a8b6;
  }}
  .label {{
    fill: #eee;
    font-family: "JetBrains Mono", "Fira Code", monospace;
    font-size: 13px;
    text-anchor: middle;
    dominant-baseline: middle;
    pointer-events: none;
  }}
  .label.small {{
    font-size: 10px;
  }}
  .layer-title {{
    fill: #e94560;
    font-size: 16px;
    font-weight: bold;
  }}
</style>
</head>
<body>
<svg width="{total_width}" height="{total_height}" xmlns="http://www.w3.org/2000/svg">
"#
    );

    for (idx, &layer) in ALL_LAYERS.iter().enumerate() {
        let y_offset = MARGIN + idx as f64 * layer_height + 30.0;
        html.push_str(&render_layer(&keys, layer, y_offset));
        html.push('\n');
    }

    html.push_str("</svg>\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_matrix_position_drawn() {
        let keys = build_keys();
        assert_eq!(keys.len(), ROWS * COLS);
        for row in 0..ROWS {
            for col in 0..COLS {
                assert_eq!(keys.iter().filter(|k| k.row == row && k.col == col).count(), 1);
            }
        }
    }

    #[test]
    fn test_html_contains_both_layers() {
        let html = generate_html();
        assert!(html.contains("Layer Base"));
        assert!(html.contains("Layer Fn (hold Fn)"));
        assert!(html.contains(">F12<"));
        assert!(html.contains(r#"class="key layer""#));
        assert_eq!(html.matches("<rect").count(), 2 * ROWS * COLS);
    }
}
