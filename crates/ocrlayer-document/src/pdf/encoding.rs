// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// WinAnsiEncoding and Helvetica metrics for the invisible text layer.
//
// The text layer uses the standard-14 Helvetica font, so no font program is
// embedded. Characters outside WinAnsiEncoding cannot be shown with it; such
// words are reported as unencodable and skipped by the overlay.

/// Code points for WinAnsi bytes 0x80..=0x9F (`None` = undefined slot).
const WIN_ANSI_HIGH: [Option<char>; 32] = [
    Some('€'),
    None,
    Some('‚'),
    Some('ƒ'),
    Some('„'),
    Some('…'),
    Some('†'),
    Some('‡'),
    Some('ˆ'),
    Some('‰'),
    Some('Š'),
    Some('‹'),
    Some('Œ'),
    None,
    Some('Ž'),
    None,
    None,
    Some('‘'),
    Some('’'),
    Some('“'),
    Some('”'),
    Some('•'),
    Some('–'),
    Some('—'),
    Some('˜'),
    Some('™'),
    Some('š'),
    Some('›'),
    Some('œ'),
    None,
    Some('ž'),
    Some('Ÿ'),
];

/// Helvetica advance widths (1/1000 em) for ASCII 0x20..=0x7E.
const HELVETICA_ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Width used for non-ASCII glyphs.
const DEFAULT_WIDTH: u16 = 556;

/// Encode `text` as WinAnsi bytes, or `None` if any character has no slot.
pub fn encode_win_ansi(text: &str) -> Option<Vec<u8>> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(ch: char) -> Option<u8> {
    let code = u32::from(ch);
    match code {
        0x20..=0x7E | 0xA0..=0xFF => u8::try_from(code).ok(),
        _ => WIN_ANSI_HIGH
            .iter()
            .position(|slot| *slot == Some(ch))
            .and_then(|offset| u8::try_from(0x80 + offset).ok()),
    }
}

/// Width of `bytes` (WinAnsi-encoded) in points at `font_size`.
pub fn helvetica_width(bytes: &[u8], font_size: f32) -> f32 {
    let units: u32 = bytes
        .iter()
        .map(|&b| match b {
            0x20..=0x7E => u32::from(HELVETICA_ASCII_WIDTHS[usize::from(b - 0x20)]),
            _ => u32::from(DEFAULT_WIDTH),
        })
        .sum();
    units as f32 * font_size / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_maps_to_itself() {
        assert_eq!(encode_win_ansi("Hello, 42!").unwrap(), b"Hello, 42!".to_vec());
    }

    #[test]
    fn latin1_and_typographic_characters() {
        assert_eq!(encode_win_ansi("café").unwrap(), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode_win_ansi("€").unwrap(), vec![0x80]);
        assert_eq!(encode_win_ansi("“x”").unwrap(), vec![0x93, b'x', 0x94]);
        assert_eq!(encode_win_ansi("Ÿ").unwrap(), vec![0x9F]);
    }

    #[test]
    fn characters_outside_win_ansi_are_rejected() {
        assert!(encode_win_ansi("日本").is_none());
        assert!(encode_win_ansi("ok\u{0007}").is_none());
        assert!(encode_win_ansi("Ωmega").is_none());
    }

    #[test]
    fn width_uses_helvetica_metrics() {
        // 'i' is narrow, 'W' is wide.
        assert!(helvetica_width(b"iii", 12.0) < helvetica_width(b"WWW", 12.0));
        assert!((helvetica_width(b"0", 10.0) - 5.56).abs() < 1e-4);
        assert_eq!(helvetica_width(b"", 12.0), 0.0);
    }
}
