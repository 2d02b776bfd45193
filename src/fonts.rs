use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use memmap2::Mmap;
use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::Face;

use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Weight {
    Regular,
    Bold,
}

pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    /// Advance widths for WinAnsi bytes 32..=255 at 1000 units/em.
    pub(crate) widths_1000: Vec<f32>,
    pub(crate) ascender_ratio: f32,
    /// Width of the glyph drawn for a character the font cannot encode:
    /// `?` for WinAnsi fonts, `.notdef` for embedded ones.
    pub(crate) missing_width_1000: f32,
    pub(crate) char_to_gid: Option<HashMap<char, u16>>,
    pub(crate) char_widths_1000: Option<HashMap<char, f32>>,
}

impl FontEntry {
    /// Metrics for one of the standard 14 fonts, no PDF objects written.
    pub(crate) fn builtin(weight: Weight, pdf_name: &str, font_ref: Ref) -> Self {
        let widths_1000 = helvetica_widths(weight);
        FontEntry {
            pdf_name: pdf_name.to_string(),
            font_ref,
            missing_width_1000: widths_1000[(b'?' - 32) as usize],
            widths_1000,
            ascender_ratio: 0.718,
            char_to_gid: None,
            char_widths_1000: None,
        }
    }

    /// Width in 1000-units of the glyph `encode` emits for `ch`.
    pub(crate) fn char_width_1000(&self, ch: char) -> f32 {
        if let Some(widths) = &self.char_widths_1000 {
            return widths.get(&ch).copied().unwrap_or(self.missing_width_1000);
        }
        match char_to_winansi(ch) {
            0 => self.missing_width_1000,
            byte => self.widths_1000[(byte - 32) as usize],
        }
    }

    pub(crate) fn char_width(&self, ch: char, font_size: f32) -> f32 {
        self.char_width_1000(ch) * font_size / 1000.0
    }

    pub(crate) fn word_width(&self, word: &str, font_size: f32) -> f32 {
        word.chars().map(|ch| self.char_width(ch, font_size)).sum()
    }

    pub(crate) fn space_width(&self, font_size: f32) -> f32 {
        self.char_width(' ', font_size)
    }

    /// Bytes for a `Str` operand in this font's encoding.
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

/// Regular and bold faces used by every report.
pub(crate) struct FontSet {
    pub(crate) regular: FontEntry,
    pub(crate) bold: FontEntry,
}

impl FontSet {
    pub(crate) fn get(&self, weight: Weight) -> &FontEntry {
        match weight {
            Weight::Regular => &self.regular,
            Weight::Bold => &self.bold,
        }
    }

    /// Built-in Helvetica pair, for layout without a PDF.
    #[cfg(test)]
    pub(crate) fn builtin() -> Self {
        FontSet {
            regular: FontEntry::builtin(Weight::Regular, "F1", Ref::new(1)),
            bold: FontEntry::builtin(Weight::Bold, "F2", Ref::new(2)),
        }
    }

    pub(crate) fn register(
        pdf: &mut Pdf,
        regular: Option<&Path>,
        bold: Option<&Path>,
        used_chars: &BTreeSet<char>,
        alloc: &mut impl FnMut() -> Ref,
    ) -> Result<Self, Error> {
        Ok(FontSet {
            regular: register_font(pdf, Weight::Regular, regular, "F1", alloc, used_chars)?,
            bold: register_font(pdf, Weight::Bold, bold, "F2", alloc, used_chars)?,
        })
    }

    pub(crate) fn entries(&self) -> [&FontEntry; 2] {
        [&self.regular, &self.bold]
    }
}

/// Characters every report may draw regardless of input data: printable
/// ASCII plus the typographic marks the renderers use.
pub(crate) fn base_charset() -> BTreeSet<char> {
    let mut chars: BTreeSet<char> = (' '..='~').collect();
    chars.extend(['\u{2022}', '\u{2013}', '\u{2014}', '\u{2026}', '\u{00A9}', '\u{00D7}']);
    chars
}

fn font_family_name(face: &Face) -> Option<String> {
    for name in face.names() {
        if name.name_id == ttf_parser::name_id::FAMILY
            && name.is_unicode()
            && let Some(s) = name.to_string()
        {
            return Some(s);
        }
    }
    None
}

/// Windows-1252 (WinAnsi) byte to Unicode char mapping.
/// Bytes 0x80-0x9F are remapped; all others map directly to their Unicode codepoint.
fn winansi_to_char(byte: u8) -> char {
    match byte {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        _ => byte as char,
    }
}

/// Map a single Unicode char to its WinAnsi byte, or 0 if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007F => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

/// Convert a UTF-8 string to WinAnsi bytes for PDF Str encoding. Characters
/// outside WinAnsi become '?'.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| match char_to_winansi(c) {
            0 => b'?',
            b => b,
        })
        .collect()
}

/// Encode UTF-8 text as big-endian 2-byte glyph IDs for CIDFont content streams.
pub(crate) fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
        out.push((gid >> 8) as u8);
        out.push((gid & 0xFF) as u8);
    }
    out
}

#[rustfmt::skip]
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    278, 278, 584, 584, 584, 556, 1015,
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    278, 278, 278, 469, 556, 333,
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

/// Helvetica AFM widths at 1000 units/em for WinAnsi bytes 32..=255.
fn helvetica_widths(weight: Weight) -> Vec<f32> {
    let (ascii, quote_w, dquote_w) = match weight {
        Weight::Regular => (&HELVETICA_ASCII, 222.0, 333.0),
        Weight::Bold => (&HELVETICA_BOLD_ASCII, 278.0, 500.0),
    };
    (32u8..=255u8)
        .map(|b| match b {
            32..=126 => ascii[(b - 32) as usize] as f32,
            0x85 | 0x89 | 0x97 => 1000.0,
            0x91 | 0x92 | 0x82 => quote_w,
            0x93 | 0x94 | 0x84 => dquote_w,
            0x95 => 350.0,
            0xA0 => 278.0,
            0xA9 | 0xAE => 737.0,
            0xB0 => 400.0,
            0xD7 => 584.0,
            _ => 556.0,
        })
        .collect()
}

struct EmbeddedMetrics {
    widths_1000: Vec<f32>,
    ascender_ratio: f32,
    notdef_width_1000: f32,
    char_to_gid: HashMap<char, u16>,
    char_widths_1000: HashMap<char, f32>,
}

/// Embed a TrueType/OpenType font as a CIDFont (Type0 composite) with Identity-H encoding.
/// The font data is subsetted to only include glyphs used in the document.
/// Glyph IDs are assigned in character order so output is reproducible.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    font_data: &[u8],
    used_chars: &BTreeSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Option<EmbeddedMetrics> {
    let face = Face::parse(font_data, 0).ok()?;
    let font_name = font_family_name(&face).unwrap_or_else(|| "EmbeddedFont".to_string());

    let units = face.units_per_em() as f32;
    let to_1000 = |v: f32| v / units * 1000.0;
    let cap_height = face
        .capital_height()
        .map(|h| to_1000(h as f32))
        .unwrap_or(700.0);

    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        to_1000(bb.x_min as f32),
        to_1000(bb.y_min as f32),
        to_1000(bb.x_max as f32),
        to_1000(bb.y_max as f32),
    );

    let widths_1000: Vec<f32> = (32u8..=255u8)
        .map(|byte| {
            face.glyph_index(winansi_to_char(byte))
                .and_then(|gid| face.glyph_hor_advance(gid))
                .map(|adv| to_1000(adv as f32))
                .unwrap_or(0.0)
        })
        .collect();

    let notdef_width_1000 = face
        .glyph_hor_advance(ttf_parser::GlyphId(0))
        .map(|adv| to_1000(adv as f32))
        .unwrap_or(0.0);

    let mut remapper = subsetter::GlyphRemapper::new();
    remapper.remap(0);
    let mut char_to_gid = HashMap::new();
    let mut char_widths_1000 = HashMap::new();
    for &ch in used_chars {
        if let Some(gid) = face.glyph_index(ch) {
            char_to_gid.insert(ch, remapper.remap(gid.0));
            let w = face
                .glyph_hor_advance(gid)
                .map(|adv| to_1000(adv as f32))
                .unwrap_or(0.0);
            char_widths_1000.insert(ch, w);
        }
    }

    let subset_data = subsetter::subset(font_data, 0, &remapper).unwrap_or_else(|e| {
        log::warn!("Font subsetting failed for {font_name}: {e}, embedding full font");
        font_data.to_vec()
    });

    let descriptor_ref = alloc();
    let data_ref = alloc();
    let data_len = i32::try_from(subset_data.len()).ok()?;
    pdf.stream(data_ref, &subset_data)
        .pair(Name(b"Length1"), data_len);

    let ps_name = font_name.replace(' ', "");

    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(bbox)
        .italic_angle(0.0)
        .ascent(to_1000(face.ascender() as f32))
        .descent(to_1000(face.descender() as f32))
        .cap_height(cap_height)
        .stem_v(80.0)
        .font_file2(data_ref);

    let system_info = || pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    };

    let cid_font_ref = alloc();
    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(system_info());
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        let mut gid_widths: Vec<(u16, f32)> = char_to_gid
            .iter()
            .map(|(ch, &new_gid)| (new_gid, char_widths_1000.get(ch).copied().unwrap_or(0.0)))
            .collect();
        gid_widths.push((0, notdef_width_1000));
        gid_widths.sort_by_key(|&(gid, _)| gid);
        gid_widths.dedup_by_key(|&mut (gid, _)| gid);
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let tounicode_ref = alloc();
    let cmap_name = format!("{ps_name}-UTF16");
    let mut cmap = pdf_writer::types::UnicodeCmap::new(Name(cmap_name.as_bytes()), system_info());
    for &ch in used_chars {
        if let Some(&new_gid) = char_to_gid.get(&ch) {
            cmap.pair(new_gid, ch);
        }
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    Some(EmbeddedMetrics {
        widths_1000,
        ascender_ratio: face.ascender() as f32 / units,
        notdef_width_1000,
        char_to_gid,
        char_widths_1000,
    })
}

fn builtin_base_font(weight: Weight) -> &'static [u8] {
    match weight {
        Weight::Regular => b"Helvetica",
        Weight::Bold => b"Helvetica-Bold",
    }
}

/// Writes the font objects for one face. An unreadable font file is an error;
/// a file that is not a usable font falls back to built-in Helvetica.
pub(crate) fn register_font(
    pdf: &mut Pdf,
    weight: Weight,
    source: Option<&Path>,
    pdf_name: &str,
    alloc: &mut impl FnMut() -> Ref,
    used_chars: &BTreeSet<char>,
) -> Result<FontEntry, Error> {
    let t0 = std::time::Instant::now();
    let font_ref = alloc();

    if let Some(path) = source {
        let font_error = |e: std::io::Error| Error::Font {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        let file = std::fs::File::open(path).map_err(font_error)?;
        // The mapping is only read while embedding and dropped before return.
        let data = unsafe { Mmap::map(&file) }.map_err(font_error)?;

        if let Some(metrics) = embed_truetype(pdf, font_ref, &data, used_chars, alloc) {
            log::debug!(
                "register_font: {} ({weight:?}) embedded {} glyphs in {:.1}ms",
                path.display(),
                metrics.char_to_gid.len(),
                t0.elapsed().as_secs_f64() * 1000.0,
            );
            return Ok(FontEntry {
                pdf_name: pdf_name.to_string(),
                font_ref,
                widths_1000: metrics.widths_1000,
                ascender_ratio: metrics.ascender_ratio,
                missing_width_1000: metrics.notdef_width_1000,
                char_to_gid: Some(metrics.char_to_gid),
                char_widths_1000: Some(metrics.char_widths_1000),
            });
        }
        log::warn!("Font {} could not be parsed, using Helvetica", path.display());
    }

    pdf.type1_font(font_ref)
        .base_font(Name(builtin_base_font(weight)))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
    Ok(FontEntry::builtin(weight, pdf_name, font_ref))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_table_spans_winansi() {
        let widths = helvetica_widths(Weight::Regular);
        assert_eq!(widths.len(), 224);
        assert_eq!(widths[0], 278.0);
        assert_eq!(widths[(b'M' - 32) as usize], 833.0);
        assert_eq!(widths[(b'i' - 32) as usize], 222.0);
    }

    #[test]
    fn bold_is_never_narrower_for_letters() {
        let regular = FontEntry::builtin(Weight::Regular, "F1", Ref::new(1));
        let bold = FontEntry::builtin(Weight::Bold, "F2", Ref::new(2));
        for ch in ('a'..='z').chain('A'..='Z') {
            assert!(bold.char_width_1000(ch) >= regular.char_width_1000(ch), "{ch}");
        }
    }

    #[test]
    fn word_width_scales_with_size() {
        let font = FontEntry::builtin(Weight::Regular, "F1", Ref::new(1));
        let w10 = font.word_width("Isolate", 10.0);
        let w20 = font.word_width("Isolate", 20.0);
        assert!((w20 - 2.0 * w10).abs() < 1e-3);
    }

    #[test]
    fn unmappable_chars_measure_as_the_replacement_glyph() {
        let font = FontEntry::builtin(Weight::Regular, "F1", Ref::new(1));
        assert_eq!(font.char_width_1000('\u{142}'), font.char_width_1000('?'));
        assert_eq!(font.char_width_1000('\u{4e2d}'), 556.0);
        assert_eq!(font.char_width_1000('\u{2022}'), 350.0);
    }

    #[test]
    fn winansi_replaces_unmappable_chars() {
        assert_eq!(to_winansi_bytes("a\u{2022}b"), vec![b'a', 0x95, b'b']);
        assert_eq!(to_winansi_bytes("\u{4e2d}"), vec![b'?']);
    }
}
