//! Assembles tiny TrueType faces in memory so the font tests do not depend on
//! font files being present on the machine.

const FIXED_HEADER_LEN: usize = 12;
const TABLE_RECORD_LEN: usize = 16;

/// A face with a `.notdef` glyph plus one glyph per entry in `glyphs`.
pub struct TestFace<'a> {
    pub family: &'a str,
    pub units_per_em: u16,
    pub notdef_advance: u16,
    /// Characters and their advances. Characters must be in the BMP.
    pub glyphs: &'a [(char, u16)],
}

impl TestFace<'_> {
    pub fn build(&self) -> Vec<u8> {
        // Table records must be sorted by tag.
        let tables: [(&[u8; 4], Vec<u8>); 6] = [
            (b"cmap", self.cmap()),
            (b"head", self.head()),
            (b"hhea", self.hhea()),
            (b"hmtx", self.hmtx()),
            (b"maxp", self.maxp()),
            (b"name", self.name()),
        ];

        let mut contents = Vec::new();
        contents.push_u32(0x00010000); // sfnt version = TrueType
        contents.push_u16(tables.len() as u16);
        contents.push_u16(0); // search range (not read)
        contents.push_u16(0); // entry selector (not read)
        contents.push_u16(0); // range shift (not read)
        contents.resize(FIXED_HEADER_LEN + TABLE_RECORD_LEN * tables.len(), 0);

        for (i, (tag, table)) in tables.iter().enumerate() {
            pad_to_multiple_of(&mut contents, 4);
            let offset = contents.len() as u32;
            contents.extend_from_slice(table);

            let record = FIXED_HEADER_LEN + TABLE_RECORD_LEN * i;
            contents[record..record + 4].copy_from_slice(*tag);
            // Checksums are not verified by the parser.
            contents[record + 8..record + 12].copy_from_slice(&offset.to_be_bytes());
            contents[record + 12..record + 16]
                .copy_from_slice(&(table.len() as u32).to_be_bytes());
        }

        contents
    }

    fn glyph_count(&self) -> u16 {
        self.glyphs.len() as u16 + 1
    }

    fn head(&self) -> Vec<u8> {
        let mut table = Vec::new();
        table.push_u32(0x00010000); // version
        table.push_u32(0x00010000); // font revision
        table.push_u32(0); // checksum adjustment
        table.push_u32(0x5F0F3CF5); // magic number
        table.push_u16(0); // flags
        table.push_u16(self.units_per_em);
        table.extend([0; 16]); // created and modified times
        table.extend([0; 8]); // bounding box
        table.push_u16(0); // mac style
        table.push_u16(8); // lowest PPEM
        table.push_u16(2); // font direction hint
        table.push_u16(0); // index to location format = short
        table.push_u16(0); // glyph data format
        table
    }

    fn hhea(&self) -> Vec<u8> {
        let mut table = Vec::new();
        table.push_u32(0x00010000); // version
        table.push_u16(self.units_per_em); // ascender
        table.push_u16(0); // descender
        table.push_u16(0); // line gap
        table.extend([0; 24]);
        table.push_u16(self.glyph_count()); // number of horizontal metrics
        table
    }

    fn hmtx(&self) -> Vec<u8> {
        let mut table = Vec::new();
        let advances = std::iter::once(self.notdef_advance)
            .chain(self.glyphs.iter().map(|&(_, advance)| advance));
        for advance in advances {
            table.push_u16(advance);
            table.push_u16(0); // left side bearing
        }
        table
    }

    fn maxp(&self) -> Vec<u8> {
        let mut table = Vec::new();
        table.push_u32(0x00005000); // version 0.5, no TrueType outlines
        table.push_u16(self.glyph_count());
        table
    }

    fn cmap(&self) -> Vec<u8> {
        let codes = || self.glyphs.iter().map(|&(c, _)| c as u16);
        let first = codes().min().unwrap_or(0);
        let last = codes().max().unwrap_or(0);

        let mut table = Vec::new();
        table.push_u16(0); // version
        table.push_u16(1); // num tables
        table.push_u16(0); // platform ID = Unicode
        table.push_u16(3); // encoding ID = 2.0+, BMP only
        table.push_u32(12); // subtable offset

        // Format 6 maps one contiguous range; gaps map to .notdef.
        let entry_count = last - first + 1;
        table.push_u16(6); // format = 6 (Trimmed table mapping)
        table.push_u16(10 + 2 * entry_count); // length
        table.push_u16(0); // language
        table.push_u16(first);
        table.push_u16(entry_count);
        for code in first..=last {
            let glyph_id = codes()
                .position(|c| c == code)
                .map_or(0, |index| index as u16 + 1);
            table.push_u16(glyph_id);
        }
        table
    }

    fn name(&self) -> Vec<u8> {
        let family: Vec<u16> = self.family.encode_utf16().collect();

        let mut table = Vec::new();
        table.push_u16(0); // version
        table.push_u16(1); // count
        table.push_u16(6 + 12); // storage offset

        table.push_u16(0); // platform ID = Unicode
        table.push_u16(3); // encoding ID
        table.push_u16(0); // language ID
        table.push_u16(1); // name ID = family
        table.push_u16(2 * family.len() as u16); // length
        table.push_u16(0); // offset into storage

        for unit in family {
            table.push_u16(unit);
        }
        table
    }
}

fn pad_to_multiple_of(contents: &mut Vec<u8>, alignment: usize) {
    while contents.len() % alignment != 0 {
        contents.push(0);
    }
}

trait VecExt: Extend<u8> {
    fn push_u16(&mut self, value: u16) {
        self.extend(value.to_be_bytes());
    }

    fn push_u32(&mut self, value: u32) {
        self.extend(value.to_be_bytes());
    }
}

impl VecExt for Vec<u8> {}
