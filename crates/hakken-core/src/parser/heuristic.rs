use regex::{Captures, Regex};

use crate::error::{HakkenError, Result};
use crate::parser::tokenizer::Tokenizer;
use crate::types::{Element, ElementKind};

/// Heuristic tokenizer using regex patterns and scene naming rules.
///
/// Fast and allocation-light; good enough for the common fansub and scene
/// layouts (`[Group] Title - 01 [1080p].mkv`, `Title.01.1080p.WEB.x264.mkv`).
/// Elements are returned ordered by their position in the input.
pub struct HeuristicTokenizer {
    re_resolution: Regex,
    re_vcodec: Regex,
    re_acodec: Regex,
    re_source: Regex,
    re_crc32: Regex,
    re_episode_range: Regex,
    re_episode_version: Regex,
    re_episode: Regex,
    re_season: Regex,
    re_version: Regex,
    re_year: Regex,
    re_extension: Regex,
    re_group: Regex,
    re_brackets: Regex,
}

/// An element together with the byte offset it was found at.
type Located = (usize, Element);

impl HeuristicTokenizer {
    /// Constructs a new `HeuristicTokenizer` with pre-compiled regex patterns.
    ///
    /// # Errors
    ///
    /// Returns `HakkenError::RegexError` if any pattern fails to compile
    /// (should never happen with the static patterns defined here).
    pub fn new() -> Result<Self> {
        Ok(Self {
            re_resolution: Regex::new(r"(?i)\b(2160|1080|720|480)[pi]\b")?,
            re_vcodec: Regex::new(
                r"(?i)\b(x\.?264|x\.?265|h\.?264|h\.?265|hevc|av1|vp9|mpeg4|xvid)\b",
            )?,
            re_acodec: Regex::new(
                r"(?i)\b(flac|aac|opus|ac3|dts(?:-?hd)?|truehd|true\shd|mp3|vorbis|ogg|e-?aac\+?)\b",
            )?,
            re_source: Regex::new(
                r"(?i)\b(blu-?ray\s*remux|bdremux|bd-?remux|blu-?ray|web-?dl|webrip|web-?rip|hdtv|dvd(?:rip)?|laserdisc|vhs)\b",
            )?,
            re_crc32: Regex::new(r"\[([0-9A-Fa-f]{8})\]")?,
            re_episode_range: Regex::new(
                r"(?i)(?:[\s\-_\.]|(?:^|[\s\-_\.\[\(])ep?\.?\s*)(\d{1,4})\s*[-~]\s*(\d{1,4})\b",
            )?,
            re_episode_version: Regex::new(
                r"(?i)(?:[\s\-_\.]|(?:^|[\s\-_\.\[\(])ep?\.?\s*)(\d{1,4})v(\d)\b",
            )?,
            re_episode: Regex::new(
                r"(?i)(?:[\s\-_\.]|(?:^|[\s\-_\.\[\(])(?:ep?\.?|episode)\s*)(\d{1,4})(?:\b|[^0-9v\-~])",
            )?,
            re_season: Regex::new(r"(?i)(?:\bS|season\s*)(\d{1,2})\b")?,
            re_version: Regex::new(r"(?i)\[v(\d)\]|\bv(\d)\b")?,
            re_year: Regex::new(r"\b((?:19|20)\d{2})\b")?,
            re_extension: Regex::new(r"\.(\w{2,4})$")?,
            re_group: Regex::new(r"^\[([^\]]+)\]")?,
            re_brackets: Regex::new(r"\[[^\]]*\]|\([^\)]*\)")?,
        })
    }

    fn extract_group(&self, input: &str) -> Option<Located> {
        self.re_group
            .captures(input)
            .map(|c| located(&c, 1, ElementKind::ReleaseGroup, c[1].trim()))
    }

    fn extract_extension(&self, input: &str) -> Option<Located> {
        self.re_extension
            .captures(input)
            .map(|c| located(&c, 1, ElementKind::FileExtension, c[1].to_lowercase()))
    }

    fn extract_crc32(&self, input: &str) -> Option<Located> {
        self.re_crc32
            .captures(input)
            .map(|c| located(&c, 1, ElementKind::FileChecksum, c[1].to_uppercase()))
    }

    fn extract_first(&self, re: &Regex, kind: ElementKind, input: &str) -> Option<Located> {
        re.captures(input).map(|c| located(&c, 1, kind, &c[1]))
    }

    fn extract_resolution(&self, input: &str) -> Option<Located> {
        self.re_resolution
            .captures(input)
            .map(|c| located(&c, 0, ElementKind::VideoResolution, c[0].to_lowercase()))
    }

    fn extract_season(&self, input: &str) -> Option<Located> {
        let caps = self.re_season.captures(input)?;
        let season: u32 = caps[1].parse().ok()?;
        Some(located(&caps, 1, ElementKind::Season, season.to_string()))
    }

    fn extract_year(&self, input: &str) -> Option<Located> {
        // Only plausible release years count
        let caps = self.re_year.captures(input)?;
        let year: u16 = caps[1].parse().ok()?;
        (1980..=2035)
            .contains(&year)
            .then(|| located(&caps, 1, ElementKind::Year, year.to_string()))
    }

    /// Returns the episode element and, for "12v2" forms, the version element.
    fn extract_episode(&self, input: &str) -> Vec<Located> {
        // Try episode range first: "01-12"
        if let Some(caps) = self.re_episode_range.captures(input) {
            let start: u32 = caps[1].parse().unwrap_or(0);
            let end: u32 = caps[2].parse().unwrap_or(0);
            if start < end {
                let value = format!("{}-{}", &caps[1], &caps[2]);
                return vec![located(&caps, 1, ElementKind::Episode, value)];
            }
        }

        // Try versioned episode: "12v2"
        if let Some(caps) = self.re_episode_version.captures(input) {
            return vec![
                located(&caps, 1, ElementKind::Episode, &caps[1]),
                located(&caps, 2, ElementKind::ReleaseVersion, &caps[2]),
            ];
        }

        self.extract_first(&self.re_episode, ElementKind::Episode, input)
            .into_iter()
            .collect()
    }

    fn extract_version(&self, input: &str) -> Option<Located> {
        let caps = self.re_version.captures(input)?;
        // Group 1 is the bracket form [v2], group 2 the bare v2
        let m = caps.get(1).or_else(|| caps.get(2))?;
        Some((m.start(), Element::new(ElementKind::ReleaseVersion, m.as_str())))
    }

    /// Extracts the title as the text region between the group tag (if any)
    /// and the first metadata token. Returns the title and its offset.
    fn extract_title(
        &self,
        input: &str,
        group: Option<&Located>,
        extension: Option<&Located>,
        year: Option<&Located>,
    ) -> Option<Located> {
        let mut work = input.to_string();
        let mut offset = 0;

        // Remove the group tag from the start
        if group.is_some() {
            if let Some(end) = work.find(']') {
                offset = end + 1;
                work = work[offset..].to_string();
            }
        }

        // Remove file extension from the end. Matched on `work` itself: case
        // folding may change byte lengths, so offsets from a lowercased copy
        // are not valid here.
        if extension.is_some() {
            if let Some(m) = self.re_extension.find(&work) {
                work.truncate(m.start());
            }
        }

        // Replace known metadata tokens with a sentinel
        let patterns_to_strip = [
            &self.re_resolution,
            &self.re_vcodec,
            &self.re_acodec,
            &self.re_source,
            &self.re_crc32,
            &self.re_episode_range,
            &self.re_episode_version,
            &self.re_season,
            &self.re_version,
            &self.re_episode,
        ];
        for pattern in patterns_to_strip {
            work = pattern.replace_all(&work, "\x00").into_owned();
        }

        // Strip the year only when it is bracketed
        if let Some((_, year)) = year {
            for bracketed in [format!("({})", year.value()), format!("[{}]", year.value())] {
                work = work.replace(&bracketed, "\x00");
            }
        }

        // Remaining bracketed content is typically tags like [Multiple Subtitle]
        work = self.re_brackets.replace_all(&work, " ").into_owned();

        let title_region = work.split('\x00').next().unwrap_or("");
        let leading = title_region.len() - title_region.trim_start().len();

        let cleaned = title_region
            .replace(['.', '_'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .trim_matches(|c: char| c == '-' || c == ' ')
            .to_string();

        if cleaned.is_empty() {
            None
        } else {
            Some((offset + leading, Element::new(ElementKind::Title, cleaned)))
        }
    }
}

impl Tokenizer for HeuristicTokenizer {
    /// Tokenizes the given filename using heuristic regex patterns.
    ///
    /// # Errors
    ///
    /// Returns `HakkenError::EmptyInput` if the input is empty or
    /// whitespace-only, and `HakkenError::TokenizeFailed` if no element at
    /// all could be extracted.
    fn tokenize(&self, input: &str) -> Result<Vec<Element>> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(HakkenError::EmptyInput);
        }

        let group = self.extract_group(trimmed);
        let extension = self.extract_extension(trimmed);
        let year = self.extract_year(trimmed);
        let title =
            self.extract_title(trimmed, group.as_ref(), extension.as_ref(), year.as_ref());

        let episode = self.extract_episode(trimmed);
        let has_version = episode
            .iter()
            .any(|(_, e)| e.kind() == ElementKind::ReleaseVersion);
        // "12v2" already carries the version
        let version = if has_version {
            None
        } else {
            self.extract_version(trimmed)
        };

        let mut found: Vec<Located> = [
            group,
            title,
            self.extract_season(trimmed),
            year,
            self.extract_resolution(trimmed),
            self.extract_first(&self.re_vcodec, ElementKind::VideoTerm, trimmed),
            self.extract_first(&self.re_acodec, ElementKind::AudioTerm, trimmed),
            self.extract_first(&self.re_source, ElementKind::Source, trimmed),
            self.extract_crc32(trimmed),
            version,
            extension,
        ]
        .into_iter()
        .flatten()
        .chain(episode)
        .collect();

        if found.is_empty() {
            return Err(HakkenError::TokenizeFailed {
                input: trimmed.to_string(),
            });
        }

        found.sort_by_key(|(pos, _)| *pos);
        Ok(found.into_iter().map(|(_, element)| element).collect())
    }
}

fn located(
    caps: &Captures<'_>,
    group: usize,
    kind: ElementKind,
    value: impl Into<String>,
) -> Located {
    let start = caps.get(group).map_or(0, |m| m.start());
    (start, Element::new(kind, value))
}
