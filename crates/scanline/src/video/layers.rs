use super::background::LayerLine;
use super::blend::{self, BlendControl, BlendMode, BlendTargets};
use super::screen::{Color, SCREEN_WIDTH};
use super::sprites::ObjectLayers;
use super::window::{LineWindows, WindowLayers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Backdrop,
    Background(usize),
    /// Objects of one priority.
    Objects(u8),
}

impl Layer {
    fn target(self) -> BlendTargets {
        match self {
            Layer::Backdrop => BlendTargets::BACKDROP,
            Layer::Background(bg) => BlendTargets::from_bits_truncate(1 << bg),
            Layer::Objects(_) => BlendTargets::OBJ,
        }
    }

    fn visible(self, window: WindowLayers) -> bool {
        match self {
            Layer::Backdrop => true,
            Layer::Background(bg) => window.background(bg),
            Layer::Objects(_) => window.contains(WindowLayers::OBJ),
        }
    }
}

/// Back-to-front draw order. `priorities` holds each displayed background's
/// priority. At equal priority objects draw above BG0, BG0 above BG1, and so
/// on; the backdrop is always at the back.
pub fn draw_order(priorities: [Option<u8>; 4], objects: bool) -> Vec<Layer> {
    let mut order = vec![Layer::Backdrop];
    for priority in (0..4).rev() {
        order.extend(
            (0..4)
                .rev()
                .filter(|bg| priorities[*bg] == Some(priority))
                .map(Layer::Background),
        );
        if objects {
            order.push(Layer::Objects(priority));
        }
    }
    order
}

pub struct Sources<'a> {
    pub backgrounds: &'a [LayerLine; 4],
    pub objects: &'a ObjectLayers,
    pub backdrop: Color,
}

#[derive(Debug, Clone, Copy)]
struct Hit {
    layer: Layer,
    color: Color,
    semi_transparent: bool,
}

impl Sources<'_> {
    fn hit(&self, layer: Layer, x: usize) -> Option<Hit> {
        let (color, semi_transparent) = match layer {
            Layer::Backdrop => (self.backdrop, false),
            Layer::Background(bg) => (self.backgrounds[bg][x]?, false),
            Layer::Objects(priority) => {
                let pixel = self.objects.buckets[usize::from(priority)][x]?;
                (pixel.color, pixel.semi_transparent)
            }
        };
        Some(Hit {
            layer,
            color,
            semi_transparent,
        })
    }

    /// The two frontmost visible pixels at `x`. Only the frontmost object
    /// bucket takes part, since objects form a single hardware layer.
    fn top_two(&self, order: &[Layer], x: usize, window: WindowLayers) -> (Hit, Option<Hit>) {
        let mut found: [Option<Hit>; 2] = [None; 2];
        let mut count = 0;
        let mut object_seen = false;

        for &layer in order.iter().rev() {
            if !layer.visible(window) {
                continue;
            }
            if matches!(layer, Layer::Objects(_)) && object_seen {
                continue;
            }
            let Some(hit) = self.hit(layer, x) else {
                continue;
            };

            object_seen |= matches!(layer, Layer::Objects(_));
            found[count] = Some(hit);
            count += 1;
            if count == 2 {
                break;
            }
        }

        let backdrop = Hit {
            layer: Layer::Backdrop,
            color: self.backdrop,
            semi_transparent: false,
        };
        (found[0].unwrap_or(backdrop), found[1])
    }
}

pub fn compose(
    order: &[Layer],
    sources: &Sources,
    windows: &LineWindows,
    blend: &BlendControl,
    out: &mut [Color],
) {
    for (x, pixel) in out.iter_mut().enumerate().take(SCREEN_WIDTH) {
        let window = windows.layers_at(x, sources.objects.window[x]);
        let (top, below) = sources.top_two(order, x, window);
        let second_target = below.filter(|hit| blend.second.contains(hit.layer.target()));

        let mix = |below: Hit| blend::alpha(top.color, below.color, blend.eva, blend.evb);

        // Semi-transparent objects blend even where the window disables effects.
        *pixel = match second_target {
            Some(below) if top.semi_transparent => mix(below),
            _ if window.contains(WindowLayers::EFFECTS)
                && blend.first.contains(top.layer.target()) =>
            {
                match blend.mode {
                    BlendMode::None => top.color,
                    BlendMode::Alpha => second_target.map_or(top.color, mix),
                    BlendMode::Brighten => blend::brighten(top.color, blend.evy),
                    BlendMode::Darken => blend::darken(top.color, blend.evy),
                }
            }
            _ => top.color,
        };
    }
}

/// Swaps the green channel of each horizontal pixel pair.
pub fn green_swap(line: &mut [Color]) {
    const GREEN: u16 = 0x1F << 5;
    for pair in line.chunks_exact_mut(2) {
        let (left, right) = (pair[0].0 & GREEN, pair[1].0 & GREEN);
        pair[0].0 = (pair[0].0 & !GREEN) | right;
        pair[1].0 = (pair[1].0 & !GREEN) | left;
    }
}
