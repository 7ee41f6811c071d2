//! `Accept` header negotiation for data files.
//!
//! # Design Decisions
//! - Offered formats are extensions mapped to `application/<ext>`
//! - The most specific matching media range decides a format's quality
//! - Highest quality wins; ties go to the earlier offered format
//! - No `Accept` header accepts the first offered format

/// Formats tried when a mount's response type is `auto`.
pub const NEGOTIABLE_TYPES: [&str; 2] = ["json", "xml"];

struct MediaRange<'a> {
    kind: &'a str,
    subtype: &'a str,
    quality: f32,
}

impl<'a> MediaRange<'a> {
    fn parse(item: &'a str) -> Option<Self> {
        let mut parts = item.split(';');
        let (kind, subtype) = parts.next()?.trim().split_once('/')?;
        let mut quality = 1.0;
        for param in parts {
            if let Some((key, value)) = param.split_once('=') {
                if key.trim().eq_ignore_ascii_case("q") {
                    quality = value.trim().parse().unwrap_or(0.0);
                }
            }
        }
        Some(Self {
            kind: kind.trim(),
            subtype: subtype.trim(),
            quality,
        })
    }

    /// Specificity of a match against `application/<ext>`, 0 if none.
    fn specificity(&self, ext: &str) -> u8 {
        let kind_exact = self.kind.eq_ignore_ascii_case("application");
        let sub_exact = self.subtype.eq_ignore_ascii_case(ext);
        match (self.kind, self.subtype) {
            _ if kind_exact && sub_exact => 3,
            _ if kind_exact && self.subtype == "*" => 2,
            ("*", "*") => 1,
            _ => 0,
        }
    }
}

/// Pick the format to serve, or `None` if the client accepts none of them.
pub fn negotiate<'a>(accept: Option<&str>, offered: &[&'a str]) -> Option<&'a str> {
    let accept = accept.map(str::trim).filter(|a| !a.is_empty());
    let Some(accept) = accept else {
        return offered.first().copied();
    };

    let ranges: Vec<MediaRange<'_>> = accept.split(',').filter_map(MediaRange::parse).collect();

    let mut best: Option<(&'a str, f32)> = None;
    for ext in offered {
        let quality = ranges
            .iter()
            .map(|range| (range.specificity(ext), range.quality))
            .filter(|(specificity, _)| *specificity > 0)
            .max_by_key(|(specificity, _)| *specificity)
            .map(|(_, quality)| quality)
            .unwrap_or(0.0);

        if quality > 0.0 && best.map_or(true, |(_, q)| quality > q) {
            best = Some((*ext, quality));
        }
    }
    best.map(|(ext, _)| ext)
}
