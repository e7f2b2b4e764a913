//! Software drawing into a softbuffer framebuffer (u32 per pixel, 0x00RRGGBB).

pub const BG_COLOR: (u8, u8, u8) = (31, 31, 31);
pub const GLYPH_W: u32 = 6;
pub const GLYPH_H: u32 = 7;
/// Index of `?`, drawn for characters the font does not cover.
const REPLACEMENT_GLYPH: usize = 31;

/// 5x7 bitmap font covering ASCII 32..127. Each glyph is 5 columns x 7 rows
/// packed into 5 bytes (one byte per column, LSB = top row).
static FONT_5X7: [[u8; 5]; 96] = {
    let mut f = [[0u8; 5]; 96];
    // space
    f[0]  = [0x00, 0x00, 0x00, 0x00, 0x00];
    // !
    f[1]  = [0x00, 0x00, 0x5F, 0x00, 0x00];
    // "
    f[2]  = [0x00, 0x07, 0x00, 0x07, 0x00];
    // #
    f[3]  = [0x14, 0x7F, 0x14, 0x7F, 0x14];
    // $
    f[4]  = [0x24, 0x2A, 0x7F, 0x2A, 0x12];
    // %
    f[5]  = [0x23, 0x13, 0x08, 0x64, 0x62];
    // &
    f[6]  = [0x36, 0x49, 0x55, 0x22, 0x50];
    // '
    f[7]  = [0x00, 0x05, 0x03, 0x00, 0x00];
    // (
    f[8]  = [0x00, 0x1C, 0x22, 0x41, 0x00];
    // )
    f[9]  = [0x00, 0x41, 0x22, 0x1C, 0x00];
    // *
    f[10] = [0x14, 0x08, 0x3E, 0x08, 0x14];
    // +
    f[11] = [0x08, 0x08, 0x3E, 0x08, 0x08];
    // ,
    f[12] = [0x00, 0x50, 0x30, 0x00, 0x00];
    // -
    f[13] = [0x08, 0x08, 0x08, 0x08, 0x08];
    // .
    f[14] = [0x00, 0x60, 0x60, 0x00, 0x00];
    // /
    f[15] = [0x20, 0x10, 0x08, 0x04, 0x02];
    // 0
    f[16] = [0x3E, 0x51, 0x49, 0x45, 0x3E];
    // 1
    f[17] = [0x00, 0x42, 0x7F, 0x40, 0x00];
    // 2
    f[18] = [0x42, 0x61, 0x51, 0x49, 0x46];
    // 3
    f[19] = [0x21, 0x41, 0x45, 0x4B, 0x31];
    // 4
    f[20] = [0x18, 0x14, 0x12, 0x7F, 0x10];
    // 5
    f[21] = [0x27, 0x45, 0x45, 0x45, 0x39];
    // 6
    f[22] = [0x3C, 0x4A, 0x49, 0x49, 0x30];
    // 7
    f[23] = [0x01, 0x71, 0x09, 0x05, 0x03];
    // 8
    f[24] = [0x36, 0x49, 0x49, 0x49, 0x36];
    // 9
    f[25] = [0x06, 0x49, 0x49, 0x29, 0x1E];
    // :
    f[26] = [0x00, 0x36, 0x36, 0x00, 0x00];
    // ;
    f[27] = [0x00, 0x56, 0x36, 0x00, 0x00];
    // <
    f[28] = [0x08, 0x14, 0x22, 0x41, 0x00];
    // =
    f[29] = [0x14, 0x14, 0x14, 0x14, 0x14];
    // >
    f[30] = [0x00, 0x41, 0x22, 0x14, 0x08];
    // ?
    f[31] = [0x02, 0x01, 0x51, 0x09, 0x06];
    // @
    f[32] = [0x3E, 0x41, 0x5D, 0x55, 0x1E];
    // A
    f[33] = [0x7E, 0x11, 0x11, 0x11, 0x7E];
    // B
    f[34] = [0x7F, 0x49, 0x49, 0x49, 0x36];
    // C
    f[35] = [0x3E, 0x41, 0x41, 0x41, 0x22];
    // D
    f[36] = [0x7F, 0x41, 0x41, 0x22, 0x1C];
    // E
    f[37] = [0x7F, 0x49, 0x49, 0x49, 0x41];
    // F
    f[38] = [0x7F, 0x09, 0x09, 0x09, 0x01];
    // G
    f[39] = [0x3E, 0x41, 0x49, 0x49, 0x7A];
    // H
    f[40] = [0x7F, 0x08, 0x08, 0x08, 0x7F];
    // I
    f[41] = [0x00, 0x41, 0x7F, 0x41, 0x00];
    // J
    f[42] = [0x20, 0x40, 0x41, 0x3F, 0x01];
    // K
    f[43] = [0x7F, 0x08, 0x14, 0x22, 0x41];
    // L
    f[44] = [0x7F, 0x40, 0x40, 0x40, 0x40];
    // M
    f[45] = [0x7F, 0x02, 0x0C, 0x02, 0x7F];
    // N
    f[46] = [0x7F, 0x04, 0x08, 0x10, 0x7F];
    // O
    f[47] = [0x3E, 0x41, 0x41, 0x41, 0x3E];
    // P
    f[48] = [0x7F, 0x09, 0x09, 0x09, 0x06];
    // Q
    f[49] = [0x3E, 0x41, 0x51, 0x21, 0x5E];
    // R
    f[50] = [0x7F, 0x09, 0x19, 0x29, 0x46];
    // S
    f[51] = [0x46, 0x49, 0x49, 0x49, 0x31];
    // T
    f[52] = [0x01, 0x01, 0x7F, 0x01, 0x01];
    // U
    f[53] = [0x3F, 0x40, 0x40, 0x40, 0x3F];
    // V
    f[54] = [0x1F, 0x20, 0x40, 0x20, 0x1F];
    // W
    f[55] = [0x3F, 0x40, 0x38, 0x40, 0x3F];
    // X
    f[56] = [0x63, 0x14, 0x08, 0x14, 0x63];
    // Y
    f[57] = [0x07, 0x08, 0x70, 0x08, 0x07];
    // Z
    f[58] = [0x61, 0x51, 0x49, 0x45, 0x43];
    // [
    f[59] = [0x00, 0x7F, 0x41, 0x41, 0x00];
    // backslash
    f[60] = [0x02, 0x04, 0x08, 0x10, 0x20];
    // ]
    f[61] = [0x00, 0x41, 0x41, 0x7F, 0x00];
    // ^
    f[62] = [0x04, 0x02, 0x01, 0x02, 0x04];
    // _
    f[63] = [0x40, 0x40, 0x40, 0x40, 0x40];
    // `
    f[64] = [0x00, 0x01, 0x02, 0x04, 0x00];
    // a
    f[65] = [0x20, 0x54, 0x54, 0x54, 0x78];
    // b
    f[66] = [0x7F, 0x48, 0x44, 0x44, 0x38];
    // c
    f[67] = [0x38, 0x44, 0x44, 0x44, 0x20];
    // d
    f[68] = [0x38, 0x44, 0x44, 0x48, 0x7F];
    // e
    f[69] = [0x38, 0x54, 0x54, 0x54, 0x18];
    // f
    f[70] = [0x08, 0x7E, 0x09, 0x01, 0x02];
    // g
    f[71] = [0x0C, 0x52, 0x52, 0x52, 0x3E];
    // h
    f[72] = [0x7F, 0x08, 0x04, 0x04, 0x78];
    // i
    f[73] = [0x00, 0x44, 0x7D, 0x40, 0x00];
    // j
    f[74] = [0x20, 0x40, 0x44, 0x3D, 0x00];
    // k
    f[75] = [0x7F, 0x10, 0x28, 0x44, 0x00];
    // l
    f[76] = [0x00, 0x41, 0x7F, 0x40, 0x00];
    // m
    f[77] = [0x7C, 0x04, 0x18, 0x04, 0x78];
    // n
    f[78] = [0x7C, 0x08, 0x04, 0x04, 0x78];
    // o
    f[79] = [0x38, 0x44, 0x44, 0x44, 0x38];
    // p
    f[80] = [0x7C, 0x14, 0x14, 0x14, 0x08];
    // q
    f[81] = [0x08, 0x14, 0x14, 0x18, 0x7C];
    // r
    f[82] = [0x7C, 0x08, 0x04, 0x04, 0x08];
    // s
    f[83] = [0x48, 0x54, 0x54, 0x54, 0x20];
    // t
    f[84] = [0x04, 0x3F, 0x44, 0x40, 0x20];
    // u
    f[85] = [0x3C, 0x40, 0x40, 0x20, 0x7C];
    // v
    f[86] = [0x1C, 0x20, 0x40, 0x20, 0x1C];
    // w
    f[87] = [0x3C, 0x40, 0x30, 0x40, 0x3C];
    // x
    f[88] = [0x44, 0x28, 0x10, 0x28, 0x44];
    // y
    f[89] = [0x0C, 0x50, 0x50, 0x50, 0x3C];
    // z
    f[90] = [0x44, 0x64, 0x54, 0x4C, 0x44];
    // {
    f[91] = [0x00, 0x08, 0x36, 0x41, 0x00];
    // |
    f[92] = [0x00, 0x00, 0x7F, 0x00, 0x00];
    // }
    f[93] = [0x00, 0x41, 0x36, 0x08, 0x00];
    // ~
    f[94] = [0x10, 0x08, 0x08, 0x10, 0x08];
    // DEL (blank)
    f[95] = [0x00, 0x00, 0x00, 0x00, 0x00];
    f
};

/// Axis-aligned region of the framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x as f64
            && py >= self.y as f64
            && px < self.x as f64 + self.w as f64
            && py < self.y as f64 + self.h as f64
    }
}

/// A borrowed framebuffer with its dimensions.
pub struct Canvas<'a> {
    pub buf: &'a mut [u32],
    pub width: u32,
    pub height: u32,
}

pub fn rgb(r: u8, g: u8, b: u8) -> u32 {
    (r as u32) << 16 | (g as u32) << 8 | b as u32
}

fn unpack_rgb(v: u32) -> (u8, u8, u8) {
    ((v >> 16) as u8, (v >> 8) as u8, v as u8)
}

fn blend(dst: u32, color: (u8, u8, u8, u8)) -> u32 {
    let a = color.3 as u32;
    if a == 255 {
        return rgb(color.0, color.1, color.2);
    }
    let (dr, dg, db) = unpack_rgb(dst);
    let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * (255 - a)) / 255) as u8;
    rgb(mix(color.0, dr), mix(color.1, dg), mix(color.2, db))
}

/// Width in pixels of `chars` glyphs at `scale`.
pub fn text_width(chars: usize, scale: u32) -> u32 {
    chars as u32 * GLYPH_W * scale
}

/// Cut `text` so it fits in `max_w` pixels, marking the cut with `~`.
pub fn truncate_to_width(text: &str, max_w: u32, scale: u32) -> String {
    let max_chars = (max_w / (GLYPH_W * scale)) as usize;
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max_chars - 1).collect();
    out.push('~');
    out
}

impl Canvas<'_> {
    pub fn clear(&mut self, color: (u8, u8, u8)) {
        self.buf.fill(rgb(color.0, color.1, color.2));
    }

    fn put(&mut self, x: i32, y: i32, clip: Rect, color: (u8, u8, u8, u8)) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        if !clip.contains(x as f64, y as f64) {
            return;
        }
        let off = (y as u32 * self.width + x as u32) as usize;
        if let Some(px) = self.buf.get_mut(off) {
            *px = blend(*px, color);
        }
    }

    pub fn full(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Fill a rectangle with alpha blending.
    pub fn fill_rect(&mut self, r: Rect, color: (u8, u8, u8, u8)) {
        let clip = self.full();
        for row in 0..r.h as i32 {
            for col in 0..r.w as i32 {
                self.put(r.x + col, r.y + row, clip, color);
            }
        }
    }

    pub fn outline_rect(&mut self, r: Rect, color: (u8, u8, u8, u8)) {
        self.fill_rect(Rect::new(r.x, r.y, r.w, 1), color);
        self.fill_rect(Rect::new(r.x, r.y + r.h as i32 - 1, r.w, 1), color);
        self.fill_rect(Rect::new(r.x, r.y, 1, r.h), color);
        self.fill_rect(Rect::new(r.x + r.w as i32 - 1, r.y, 1, r.h), color);
    }

    fn draw_char(&mut self, ch: char, px: i32, py: i32, scale: u32, clip: Rect, color: (u8, u8, u8, u8)) {
        let idx = match (ch as u32).wrapping_sub(32) as usize {
            i if i < 95 => i,
            _ => REPLACEMENT_GLYPH,
        };
        let glyph = &FONT_5X7[idx];
        for col in 0..5u32 {
            let bits = glyph[col as usize];
            for row in 0..GLYPH_H {
                if bits & (1 << row) == 0 {
                    continue;
                }
                for sy in 0..scale {
                    for sx in 0..scale {
                        let x = px + (col * scale + sx) as i32;
                        let y = py + (row * scale + sy) as i32;
                        self.put(x, y, clip, color);
                    }
                }
            }
        }
    }

    /// Draw a string clipped to `clip`. Returns the x position after the
    /// last character. Characters outside the font are drawn as `?`.
    pub fn draw_text(&mut self, text: &str, px: i32, py: i32, scale: u32, clip: Rect, color: (u8, u8, u8, u8)) -> i32 {
        let mut x = px;
        for ch in text.chars() {
            self.draw_char(ch, x, py, scale, clip, color);
            x += (GLYPH_W * scale) as i32;
        }
        x
    }

    /// Copy an RGBA image 1:1 with its top-left at (x0, y0), clipped to `clip`.
    pub fn blit(&mut self, src: &[u8], src_w: u32, src_h: u32, x0: i32, y0: i32, clip: Rect) {
        for sy in 0..src_h {
            let y = y0 + sy as i32;
            for sx in 0..src_w {
                let x = x0 + sx as i32;
                let si = (sy as usize * src_w as usize + sx as usize) * 4;
                let a = src[si + 3];
                if a == 0 {
                    continue;
                }
                self.put(x, y, clip, (src[si], src[si + 1], src[si + 2], a));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_marks_cut_text() {
        assert_eq!(truncate_to_width("short", 100, 1), "short");
        assert_eq!(truncate_to_width("abcdefghij", 36, 1), "abcde~");
        assert_eq!(truncate_to_width("abc", 5, 1), "");
    }

    #[test]
    fn blit_respects_clip() {
        let mut buf = vec![0u32; 4 * 4];
        let mut canvas = Canvas { buf: &mut buf, width: 4, height: 4 };
        let src = [255u8, 0, 0, 255].repeat(4);
        canvas.blit(&src, 2, 2, 1, 1, Rect::new(0, 0, 2, 4));
        assert_eq!(buf[1 * 4 + 1], rgb(255, 0, 0));
        assert_eq!(buf[1 * 4 + 2], 0);
        assert_eq!(buf[2 * 4 + 1], rgb(255, 0, 0));
    }

    #[test]
    fn buffer_shorter_than_dimensions_is_not_overrun() {
        let mut buf = vec![0u32; 4];
        let mut canvas = Canvas { buf: &mut buf, width: 4, height: 4 };
        canvas.fill_rect(Rect::new(0, 0, 4, 4), (255, 255, 255, 255));
        assert!(buf.iter().all(|&p| p == rgb(255, 255, 255)));
    }

    fn text_pixels(text: &str) -> Vec<u32> {
        let mut buf = vec![0u32; 16 * 8];
        let mut canvas = Canvas { buf: &mut buf, width: 16, height: 8 };
        let clip = canvas.full();
        canvas.draw_text(text, 0, 0, 1, clip, (255, 255, 255, 255));
        buf
    }

    #[test]
    fn characters_outside_font_draw_replacement() {
        let question = text_pixels("?");
        assert!(question.iter().any(|&p| p != 0));
        assert_eq!(text_pixels("\u{e9}"), question);
        assert_eq!(text_pixels("\u{65e5}"), question);
        assert_eq!(text_pixels("\u{7f}"), question);
        assert!(text_pixels(" ").iter().all(|&p| p == 0));
    }

    #[test]
    fn half_alpha_fill_blends() {
        let mut buf = vec![rgb(0, 0, 0); 1];
        let mut canvas = Canvas { buf: &mut buf, width: 1, height: 1 };
        canvas.fill_rect(Rect::new(0, 0, 1, 1), (255, 255, 255, 128));
        assert_eq!(buf[0], rgb(128, 128, 128));
    }
}
