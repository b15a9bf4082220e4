//! Standard-14 font metrics and WinAnsi text encoding.

/// Fonts registered on every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
    Mono,
}

impl Font {
    /// Resource name used in content streams.
    pub fn resource_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Mono => "F3",
        }
    }

    pub fn base_font(self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
            Font::Mono => "Courier",
        }
    }

    pub const ALL: [Font; 3] = [Font::Regular, Font::Bold, Font::Mono];
}

// Glyph widths for printable ASCII (0x20..=0x7E), in 1/1000 em.
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

const MONO_WIDTH: u16 = 600;
const FALLBACK_WIDTH: u16 = 556;

fn glyph_width(font: Font, c: char) -> u16 {
    if font == Font::Mono {
        return MONO_WIDTH;
    }
    let table = match font {
        Font::Bold => &HELVETICA_BOLD,
        _ => &HELVETICA,
    };
    match c as u32 {
        code @ 0x20..=0x7E => table[(code - 0x20) as usize],
        _ => FALLBACK_WIDTH,
    }
}

/// Width of `text` set in `font` at `size` points.
pub fn text_width(text: &str, font: Font, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(glyph_width(font, c))).sum();
    units as f32 * size / 1000.0
}

/// Map a character to its WinAnsiEncoding byte, if it has one.
fn winansi_byte(c: char) -> Option<u8> {
    let byte = match c {
        ' '..='~' => c as u8,
        '\u{A0}'..='\u{FF}' => c as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        '„' => 0x84,
        '…' => 0x85,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '™' => 0x99,
        _ => return None,
    };
    Some(byte)
}

/// Replace characters the standard fonts cannot show.
///
/// Arrows become ASCII arrows, tabs become spaces, other control characters
/// are dropped and anything else outside WinAnsi becomes `?`.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '→' | '⟶' => out.push_str("->"),
            '←' => out.push_str("<-"),
            '\t' => out.push_str("    "),
            c if c.is_control() => {}
            c if winansi_byte(c).is_some() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

/// Encode already sanitized text for a `Tj` operand.
pub fn encode(text: &str) -> Vec<u8> {
    text.chars().map(|c| winansi_byte(c).unwrap_or(b'?')).collect()
}

/// Greedy word wrap of `text` into lines no wider than `max_width`.
///
/// Words longer than a line are split by character. Explicit newlines are kept.
pub fn wrap(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };

            if text_width(&candidate, font, size) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if text_width(word, font, size) <= max_width {
                current = word.to_string();
            } else {
                for c in word.chars() {
                    current.push(c);
                    if text_width(&current, font, size) > max_width && current.chars().count() > 1 {
                        current.pop();
                        lines.push(std::mem::take(&mut current));
                        current.push(c);
                    }
                }
            }
        }

        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_width() {
        // "Hi": H=722, i=222
        assert!((text_width("Hi", Font::Regular, 10.0) - 9.44).abs() < 0.001);
        assert_eq!(text_width("abc", Font::Mono, 10.0), 18.0);
        assert_eq!(text_width("", Font::Bold, 12.0), 0.0);
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("Web → API"), "Web -> API");
        assert_eq!(sanitize("caf\u{e9}"), "caf\u{e9}");
        assert_eq!(sanitize("a\tb"), "a    b");
        assert_eq!(sanitize("日本"), "??");
        assert_eq!(sanitize("x\u{7}y"), "xy");
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode("A\u{e9}•"), vec![b'A', 0xE9, 0x95]);
    }

    #[test]
    fn test_wrap_respects_width() {
        let text = "the quick brown fox jumps over the lazy dog ".repeat(10);
        let lines = wrap(&text, Font::Regular, 10.0, 200.0);

        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, Font::Regular, 10.0) <= 200.0);
        }
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let lines = wrap(&"x".repeat(100), Font::Mono, 10.0, 60.0);
        assert_eq!(lines[0].len(), 10);
        assert_eq!(lines.len(), 10);
    }

    #[test]
    fn test_wrap_keeps_newlines() {
        let lines = wrap("one\n\ntwo", Font::Regular, 10.0, 500.0);
        assert_eq!(lines, vec!["one", "", "two"]);
    }
}
