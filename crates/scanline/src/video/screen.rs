use rgb::RGB8;

pub const SCREEN_WIDTH: usize = 240;
pub const SCREEN_HEIGHT: usize = 160;

/// A native BGR555 pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color(pub u16);

impl Color {
    pub const WHITE: Color = Color(0x7FFF);
    pub const BLACK: Color = Color(0);

    pub fn from_rgb(red: u16, green: u16, blue: u16) -> Self {
        Self((red & 0x1F) | ((green & 0x1F) << 5) | ((blue & 0x1F) << 10))
    }

    pub fn red(self) -> u16 {
        self.0 & 0x1F
    }

    pub fn green(self) -> u16 {
        (self.0 >> 5) & 0x1F
    }

    pub fn blue(self) -> u16 {
        (self.0 >> 10) & 0x1F
    }

    pub fn to_rgb8(self) -> RGB8 {
        let expand = |component: u16| ((component << 3) | (component >> 2)) as u8;
        RGB8::new(expand(self.red()), expand(self.green()), expand(self.blue()))
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    pixels: Box<[Color]>,
}

impl Frame {
    pub fn new() -> Self {
        Self {
            pixels: vec![Color::BLACK; SCREEN_WIDTH * SCREEN_HEIGHT].into_boxed_slice(),
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Color {
        self.pixels[y * SCREEN_WIDTH + x]
    }

    pub fn line(&self, y: usize) -> &[Color] {
        &self.pixels[y * SCREEN_WIDTH..(y + 1) * SCREEN_WIDTH]
    }

    pub fn line_mut(&mut self, y: usize) -> &mut [Color] {
        &mut self.pixels[y * SCREEN_WIDTH..(y + 1) * SCREEN_WIDTH]
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Row-major 8-bit RGB, for display backends and image encoders.
    pub fn to_rgb8(&self) -> Vec<RGB8> {
        self.pixels.iter().map(|pixel| pixel.to_rgb8()).collect()
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

/// Two frames: one being composited, one complete and safe to display.
pub struct Screen {
    frames: [Frame; 2],
    active: usize,
}

impl Screen {
    pub fn new() -> Self {
        Self {
            frames: [Frame::new(), Frame::new()],
            active: 0,
        }
    }

    pub fn active_line_mut(&mut self, y: usize) -> &mut [Color] {
        self.frames[self.active].line_mut(y)
    }

    /// The most recently completed frame.
    pub fn front(&self) -> &Frame {
        &self.frames[self.active ^ 1]
    }

    pub fn swap(&mut self) {
        self.active ^= 1;
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}
