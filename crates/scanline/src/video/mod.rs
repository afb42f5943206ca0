//! The scanline compositor.
//!
//! Each visible line is built from register state as it stands when the line
//! is drawn: backgrounds into per-layer buffers, objects into four priority
//! buckets, then a back-to-front pass applying windows and colour effects.

use crate::registers::{RegisterFile, io};

use background::{AffineMatrix, AffinePoint, BackgroundControl, LayerLine};
use blend::BlendControl;
use control::{DisplayControl, LayerKind, Mosaic};
use layers::Sources;
use screen::{Color, Frame, SCREEN_WIDTH, Screen};
use sprites::ObjectLayers;
use window::LineWindows;

pub mod background;
pub mod blend;
pub mod control;
pub mod layers;
pub mod screen;
pub mod sprites;
pub mod tiles;
pub mod window;

pub struct Video {
    screen: Screen,
    backgrounds: Box<[LayerLine; 4]>,
    objects: Box<ObjectLayers>,
    /// Internal reference points of BG2 and BG3, advanced by PB/PD each line.
    reference: [AffinePoint; 2],
    /// The reference points as of the last mosaic line.
    mosaic_reference: [AffinePoint; 2],
}

impl Video {
    pub fn new() -> Self {
        Self {
            screen: Screen::new(),
            backgrounds: Box::new([[None; SCREEN_WIDTH]; 4]),
            objects: Box::new(ObjectLayers::new()),
            reference: [AffinePoint::default(); 2],
            mosaic_reference: [AffinePoint::default(); 2],
        }
    }

    pub fn front(&self) -> &Frame {
        self.screen.front()
    }

    pub fn swap(&mut self) {
        log::trace!("Frame complete");
        self.screen.swap();
    }

    /// Reloads an affine layer's internal reference point from BGxX/BGxY.
    pub fn latch_reference(&mut self, registers: &RegisterFile, bg: usize) {
        let point = AffinePoint::read(registers, bg);
        self.reference[bg - 2] = point;
        self.mosaic_reference[bg - 2] = point;
    }

    pub fn render_line(&mut self, registers: &RegisterFile, line: usize) {
        if line == 0 {
            self.latch_reference(registers, 2);
            self.latch_reference(registers, 3);
        }

        let control = DisplayControl::new(registers.io16(io::DISPCNT));
        if control.forced_blank() {
            self.screen.active_line_mut(line).fill(Color::WHITE);
            self.step_references(registers);
            return;
        }

        let mode = control.mode();
        let mosaic = Mosaic::new(registers.io16(io::MOSAIC));
        if line % usize::from(mosaic.bg_height) == 0 {
            self.mosaic_reference = self.reference;
        }

        let mut priorities = [None; 4];
        for (bg, kind) in mode.layers().into_iter().enumerate() {
            let Some(kind) = kind else {
                continue;
            };
            if !control.background_enabled(bg) {
                continue;
            }

            let background = BackgroundControl::read(registers, bg);
            let out = &mut self.backgrounds[bg];
            match kind {
                LayerKind::Text => {
                    let y = if background.mosaic {
                        line - line % usize::from(mosaic.bg_height)
                    } else {
                        line
                    };
                    background::render_text(registers, bg, y, out);
                }
                _ => {
                    let origin = if background.mosaic {
                        self.mosaic_reference[bg - 2]
                    } else {
                        self.reference[bg - 2]
                    };
                    background::render_transformed(
                        registers,
                        bg,
                        kind,
                        control.bitmap_page(),
                        origin,
                        out,
                    );
                }
            }
            if background.mosaic {
                background::apply_mosaic(out, usize::from(mosaic.bg_width));
            }
            priorities[bg] = Some(background.priority);
        }

        if control.objects_enabled() {
            self.objects.render(registers, line as u32, mode.is_bitmap());
        } else {
            self.objects.clear();
        }

        let order = layers::draw_order(priorities, control.objects_enabled());
        let sources = Sources {
            backgrounds: &self.backgrounds,
            objects: &self.objects,
            backdrop: Color(registers.palette_color(0)),
        };
        let windows = LineWindows::new(registers, line);
        let blend = BlendControl::read(registers);
        let out = self.screen.active_line_mut(line);
        layers::compose(&order, &sources, &windows, &blend, out);

        if registers.io16(io::GREENSWAP) & 1 != 0 {
            layers::green_swap(out);
        }

        self.step_references(registers);
    }

    fn step_references(&mut self, registers: &RegisterFile) {
        for (index, reference) in self.reference.iter_mut().enumerate() {
            let matrix = AffineMatrix::read(registers, index + 2);
            reference.x += matrix.pb;
            reference.y += matrix.pd;
        }
    }
}

impl Default for Video {
    fn default() -> Self {
        Self::new()
    }
}
