//! Static Helvetica metric table and greedy line wrapping.
//!
//! Character widths are in em units (relative to font size), taken from the
//! standard Helvetica AFM. Non-ASCII characters fall back to the average width.
//! Index = (char as usize) - 32.

/// Character-width table for one font.
///
/// `widths[i]` = width of ASCII character `(i + 32)`, covering 0x20 (space) through 0x7E (~).
pub struct FontMetricTable {
    widths: [f32; 95],
    /// Fallback width for non-ASCII characters (codepoints > 0x7E).
    pub average_char_width: f32,
    pub space_width: f32,
}

pub const HELVETICA: FontMetricTable = FontMetricTable {
    widths: [
        0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, // sp ! " # $ % & '
        0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278, // ( ) * + , - . /
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, // 0-7
        0.556, 0.556, 0.278, 0.278, 0.584, 0.584, 0.584, 0.556, // 8 9 : ; < = > ?
        1.015, 0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, // @ A-G
        0.722, 0.278, 0.500, 0.667, 0.556, 0.833, 0.722, 0.778, // H-O
        0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, // P-W
        0.667, 0.667, 0.611, 0.278, 0.278, 0.278, 0.469, 0.556, // X Y Z [ \ ] ^ _
        0.333, 0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, // ` a-g
        0.556, 0.222, 0.222, 0.500, 0.222, 0.833, 0.556, 0.556, // h-o
        0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, // p-w
        0.500, 0.500, 0.500, 0.334, 0.260, 0.334, 0.584, // x y z { | } ~
    ],
    average_char_width: 0.556,
    space_width: 0.278,
};

impl FontMetricTable {
    /// Measures the rendered width of a string in em units.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars().map(|c| self.char_width(c)).sum()
    }

    fn char_width(&self, c: char) -> f32 {
        let code = c as usize;
        if (32..=126).contains(&code) {
            self.widths[code - 32]
        } else {
            self.average_char_width
        }
    }

    /// Greedy word wrap of a single line of text to `max_width_em`.
    ///
    /// Words wider than a full line are broken at character boundaries.
    /// Whitespace-only input yields no lines.
    pub fn wrap(&self, text: &str, max_width_em: f32) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();
        let mut current_width = 0.0_f32;

        for word in text.split_whitespace() {
            let word_width = self.measure_str(word);

            if word_width > max_width_em {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                    current_width = 0.0;
                }
                for c in word.chars() {
                    let w = self.char_width(c);
                    if current_width + w > max_width_em && !current.is_empty() {
                        lines.push(std::mem::take(&mut current));
                        current_width = 0.0;
                    }
                    current.push(c);
                    current_width += w;
                }
                continue;
            }

            let needed = if current.is_empty() {
                word_width
            } else {
                current_width + self.space_width + word_width
            };

            if needed > max_width_em && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_width = word_width;
            } else {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
                current_width = needed;
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }
}
