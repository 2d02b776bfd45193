use crate::fonts::FontEntry;

/// Line pitch as a multiple of font size. Used both for drawing and for
/// estimating block heights ahead of page-break decisions.
pub(crate) const LINE_HEIGHT_FACTOR: f32 = 1.2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Alignment {
    Left,
    Center,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct WrappedLine {
    pub(crate) text: String,
    pub(crate) width: f32,
}

pub(crate) fn line_height(font_size: f32) -> f32 {
    font_size * LINE_HEIGHT_FACTOR
}

/// Height of `line_count` lines: `fontSize × lineCount × LINE_HEIGHT_FACTOR`.
pub(crate) fn text_block_height(line_count: usize, font_size: f32) -> f32 {
    line_count as f32 * line_height(font_size)
}

struct LineBuilder {
    text: String,
    width: f32,
}

impl LineBuilder {
    fn new() -> Self {
        LineBuilder {
            text: String::new(),
            width: 0.0,
        }
    }

    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn start(&mut self, word: &str, width: f32) {
        self.text.clear();
        self.text.push_str(word);
        self.width = width;
    }

    fn finish(&mut self) -> WrappedLine {
        let width = self.width;
        self.width = 0.0;
        WrappedLine {
            text: std::mem::take(&mut self.text),
            width,
        }
    }
}

/// Splits a word wider than `max_width` into pieces that each fit. A single
/// character wider than `max_width` still gets its own piece.
fn split_long_word(
    word: &str,
    font: &FontEntry,
    font_size: f32,
    max_width: f32,
) -> Vec<WrappedLine> {
    let mut pieces = Vec::new();
    let mut current = LineBuilder::new();
    for ch in word.chars() {
        let cw = font.char_width(ch, font_size);
        if !current.is_empty() && current.width + cw > max_width {
            pieces.push(current.finish());
        }
        current.text.push(ch);
        current.width += cw;
    }
    if !current.is_empty() {
        pieces.push(current.finish());
    }
    pieces
}

/// Greedy word wrap. Newlines start a new line; runs of other whitespace
/// collapse to one space. Empty input gives no lines. Deterministic, and
/// re-wrapping any produced line at the same width returns it unchanged.
pub(crate) fn wrap_text(
    text: &str,
    max_width: f32,
    font_size: f32,
    font: &FontEntry,
) -> Vec<WrappedLine> {
    let space_w = font.space_width(font_size);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = LineBuilder::new();

        for word in paragraph.split_whitespace() {
            let ww = font.word_width(word, font_size);

            if ww > max_width {
                if !current.is_empty() {
                    lines.push(current.finish());
                }
                let mut pieces = split_long_word(word, font, font_size, max_width);
                if let Some(last) = pieces.pop() {
                    lines.extend(pieces);
                    current.start(&last.text, last.width);
                }
                continue;
            }

            if current.is_empty() {
                current.start(word, ww);
                continue;
            }

            let proposed = current.width + space_w + ww;
            if proposed > max_width {
                lines.push(current.finish());
                current.start(word, ww);
            } else {
                current.text.push(' ');
                current.text.push_str(word);
                current.width = proposed;
            }
        }

        if !current.is_empty() {
            lines.push(current.finish());
        }
    }

    log::trace!(
        "wrap_text: {} chars at {font_size}pt into {max_width:.1}pt -> {} lines",
        text.len(),
        lines.len()
    );
    lines
}

/// Horizontal start of a line inside a box of `box_width` starting at `x`.
pub(crate) fn aligned_x(alignment: Alignment, x: f32, box_width: f32, line_width: f32) -> f32 {
    match alignment {
        Alignment::Left => x,
        Alignment::Center => x + (box_width - line_width).max(0.0) / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::{FontSet, Weight};

    fn fonts() -> FontSet {
        FontSet::builtin()
    }

    const SAMPLE: &str = "Isolate the supply at the distribution board, lock off with a \
        personal padlock and prove dead using an approved voltage indicator before \
        commencing any work on the circuit.";

    #[test]
    fn empty_input_gives_no_lines() {
        let f = fonts();
        assert!(wrap_text("", 100.0, 10.0, f.get(Weight::Regular)).is_empty());
        assert!(wrap_text("   \n\t ", 100.0, 10.0, f.get(Weight::Regular)).is_empty());
    }

    #[test]
    fn every_line_fits() {
        let f = fonts();
        for weight in [Weight::Regular, Weight::Bold] {
            let font = f.get(weight);
            for &(width, size) in &[(60.0, 8.0), (120.0, 10.0), (250.0, 12.0), (523.0, 9.0)] {
                for line in wrap_text(SAMPLE, width, size, font) {
                    assert!(line.width <= width, "{:?} wider than {width}", line.text);
                    let measured = font.word_width(&line.text, size);
                    assert!((measured - line.width).abs() < 1e-3);
                }
            }
        }
    }

    #[test]
    fn joining_lines_reproduces_text() {
        let f = fonts();
        let lines = wrap_text(SAMPLE, 150.0, 10.0, f.get(Weight::Regular));
        assert!(lines.len() > 1);
        let joined: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        let normalized: Vec<&str> = SAMPLE.split_whitespace().collect();
        assert_eq!(joined.join(" "), normalized.join(" "));
    }

    #[test]
    fn rewrapping_a_line_is_identity() {
        let f = fonts();
        let font = f.get(Weight::Regular);
        for line in wrap_text(SAMPLE, 140.0, 10.0, font) {
            assert_eq!(wrap_text(&line.text, 140.0, 10.0, font), vec![line.clone()]);
        }
    }

    #[test]
    fn overlong_word_is_split_not_overflowed() {
        let f = fonts();
        let font = f.get(Weight::Regular);
        let word = "Electroluminescent-photovoltaic-interconnection";
        let lines = wrap_text(word, 60.0, 10.0, font);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.width <= 60.0));
        let rejoined: String = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(rejoined, word);
    }

    #[test]
    fn split_word_tail_continues_with_following_words() {
        let f = fonts();
        let font = f.get(Weight::Regular);
        let lines = wrap_text("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaa b", 50.0, 10.0, font);
        assert!(lines.last().is_some_and(|l| l.text.ends_with(" b")));
    }

    #[test]
    fn text_outside_winansi_wraps_at_drawn_width() {
        let f = fonts();
        let font = f.get(Weight::Regular);
        let text = format!("{} \u{4e2d}\u{6587}", "\u{142}\u{15b}\u{107}".repeat(40));
        let lines = wrap_text(&text, 100.0, 10.0, font);
        assert!(lines.len() > 1);
        for line in &lines {
            let drawn: f32 = font
                .encode(&line.text)
                .iter()
                .map(|&b| font.widths_1000[(b - 32) as usize])
                .sum::<f32>()
                * 10.0
                / 1000.0;
            assert!(drawn <= 100.0, "{:?} draws {drawn:.1} wide", line.text);
            assert!((drawn - line.width).abs() < 1e-3);
        }
    }

    #[test]
    fn newlines_are_hard_breaks() {
        let f = fonts();
        let lines = wrap_text("one\ntwo\n\nthree", 500.0, 10.0, f.get(Weight::Regular));
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[test]
    fn deterministic() {
        let f = fonts();
        let font = f.get(Weight::Bold);
        assert_eq!(wrap_text(SAMPLE, 97.0, 11.0, font), wrap_text(SAMPLE, 97.0, 11.0, font));
    }

    #[test]
    fn block_height_is_linear() {
        assert_eq!(text_block_height(0, 10.0), 0.0);
        assert!((text_block_height(3, 10.0) - 36.0).abs() < 1e-4);
    }

    #[test]
    fn alignment_offsets() {
        assert_eq!(aligned_x(Alignment::Left, 10.0, 100.0, 40.0), 10.0);
        assert_eq!(aligned_x(Alignment::Center, 10.0, 100.0, 40.0), 40.0);
    }
}
