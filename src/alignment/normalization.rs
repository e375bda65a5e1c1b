use std::collections::HashMap;
use std::sync::OnceLock;

/// Letter classes: every character of the set is rewritten to the canonical letter.
const ARABIC_LETTER_CLASSES: &[(&str, char)] = &[
    ("ءآأإاٱٲٳٵٰ", 'ا'),
    ("بٻټڀٮپ", 'ب'),
    ("ت", 'ت'),
    ("ثٹٺٽٿ", 'ث'),
    ("جڃڄچڇڿ", 'ج'),
    ("خځڅڂ", 'خ'),
    ("دډڍڊ", 'د'),
    ("ذڋڈڌڎڏڐۮ", 'ذ'),
    ("رڑڒۯڔڕږ", 'ر'),
    ("زڗژڙ", 'ز'),
    ("سښڛ", 'س'),
    ("شڜ", 'ش'),
    ("صڝ", 'ص'),
    ("ضڞ", 'ض'),
    ("طڟ", 'ط'),
    ("غڠ", 'غ'),
    ("فڡڢڣڤڥڦ", 'ف'),
    ("قڧڨ", 'ق'),
    ("كػؼکڪګڬڭڮگڰڱڲڳڴ", 'ك'),
    ("لڵڶڷڸ", 'ل'),
    ("نڹںڻڼڽ", 'ن'),
    ("هة", 'ه'),
    ("وؤٯٶٷۄۅۆۇۈۉۊۋۏ", 'و'),
    ("ىيؠیۍێېۑؽؾؿئٸ", 'ي'),
];

/// Digits, filler letters and tatweel, removed from the output entirely.
const ARABIC_DROPPED: &str = "٠١٢٣٤٥٦٧٨٩۰۱۲۳۴۵۶۷۸۹0123456789حعظم\u{0640}";

/// Tashkeel and Quranic annotation signs, also removed.
const ARABIC_DROPPED_RANGES: &[(char, char)] =
    &[('\u{064B}', '\u{065F}'), ('\u{06D6}', '\u{06ED}')];

/// Read-only character canonicalization table.
///
/// Characters the table does not know are passed through unchanged, which
/// keeps spaces and punctuation in the output.
#[derive(Debug, Clone)]
pub struct NormalizationTable {
    map: HashMap<char, Option<char>>,
}

impl NormalizationTable {
    pub fn new(
        classes: &[(&str, char)],
        dropped: impl IntoIterator<Item = char>,
    ) -> Self {
        let mut map = HashMap::new();
        for &(sources, canonical) in classes {
            for c in sources.chars() {
                map.insert(c, Some(canonical));
            }
        }
        for c in dropped {
            map.entry(c).or_insert(None);
        }
        Self { map }
    }

    /// Table for the reference script, built once per process.
    pub fn arabic() -> &'static Self {
        static TABLE: OnceLock<NormalizationTable> = OnceLock::new();
        TABLE.get_or_init(|| {
            let ranges = ARABIC_DROPPED_RANGES
                .iter()
                .flat_map(|&(first, last)| first..=last);
            Self::new(ARABIC_LETTER_CLASSES, ARABIC_DROPPED.chars().chain(ranges))
        })
    }

    /// `None` when the character is unknown, `Some(None)` when it is dropped.
    pub fn lookup(&self, c: char) -> Option<Option<char>> {
        self.map.get(&c).copied()
    }

    /// Canonicalizes `text`, collapsing space runs and trimming the ends.
    pub fn normalize(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut pending_space = false;
        for c in text.chars() {
            let mapped = match self.lookup(c) {
                Some(Some(canonical)) => canonical,
                Some(None) => continue,
                None => c,
            };
            if mapped == ' ' {
                pending_space = !out.is_empty();
                continue;
            }
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(mapped);
        }
        out
    }
}

pub fn normalize_arabic_text(text: &str) -> String {
    NormalizationTable::arabic().normalize(text)
}

/// Splits an already normalized string into words.
pub fn normalized_words(normalized: &str) -> Vec<&str> {
    normalized.split(' ').filter(|w| !w.is_empty()).collect()
}
