//! Object-key construction
//!
//! Every uploaded object is named `<prefix><sequence><extension>`, where
//! the sequence is a printf-style template rendered with the task index
//! and partition index. The template is parsed and probed once at
//! configuration time, so a malformed template is a startup failure and
//! never a mid-upload surprise.

use crate::config::OssSinkConfig;
use crate::error::{Result, SinkError};
use std::fmt::Write;
use tracing::warn;

/// A parsed sequence-format template.
///
/// Accepted syntax: literal text, `%%` for a literal percent, and integer
/// conversions of the form `%d`, `%3d` (space padded) or `%03d` (zero
/// padded). The first conversion receives the task index, the second the
/// partition index. Anything else, including string or float conversions,
/// is rejected at parse time.
///
/// Rendering uses Rust's integer formatting, which always emits ASCII
/// digits; the output is identical in every environment and locale.
#[derive(Debug, Clone)]
pub struct SequenceFormat {
    template: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Index { width: usize, zero_pad: bool },
}

impl SequenceFormat {
    /// Parse a template, rejecting anything that is not two-integer shaped.
    pub fn parse(template: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut conversions = 0usize;
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            if chars.peek() == Some(&'%') {
                chars.next();
                literal.push('%');
                continue;
            }
            let zero_pad = if chars.peek() == Some(&'0') {
                chars.next();
                true
            } else {
                false
            };
            let mut width = 0usize;
            while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                chars.next();
                width = width * 10 + d as usize;
            }
            match chars.next() {
                Some('d') => {
                    conversions += 1;
                    if conversions > 2 {
                        return Err(SinkError::config(format!(
                            "invalid sequence_format '{template}': at most two integer \
                             conversions are accepted (task index, partition index)"
                        )));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Index { width, zero_pad });
                }
                Some(other) => {
                    return Err(SinkError::config(format!(
                        "invalid sequence_format '{template}': unsupported conversion \
                         '%{other}', only integer conversions like '%03d' are accepted"
                    )));
                }
                None => {
                    return Err(SinkError::config(format!(
                        "invalid sequence_format '{template}': dangling '%'"
                    )));
                }
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        if conversions < 2 {
            warn!(
                template,
                "sequence_format has fewer than two integer conversions, \
                 partition keys will collide within a task"
            );
        }
        Ok(Self {
            template: template.to_string(),
            segments,
        })
    }

    /// Render the sequence for one task/partition pair.
    pub fn render(&self, task_index: u32, partition_index: u32) -> String {
        let mut out = String::new();
        let mut args = [task_index, partition_index].into_iter();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Index { width, zero_pad } => {
                    let value = args.next().unwrap_or_default();
                    let width = *width;
                    if *zero_pad {
                        let _ = write!(out, "{value:0width$}");
                    } else if width > 0 {
                        let _ = write!(out, "{value:width$}");
                    } else {
                        let _ = write!(out, "{value}");
                    }
                }
            }
        }
        out
    }

    /// The template text this format was parsed from.
    pub fn template(&self) -> &str {
        &self.template
    }
}

/// Builds remote object keys for one sink configuration.
#[derive(Debug, Clone)]
pub struct KeyNamer {
    prefix: String,
    sequence: SequenceFormat,
    extension: String,
}

impl KeyNamer {
    pub fn new(
        prefix: impl Into<String>,
        sequence: SequenceFormat,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            sequence,
            extension: extension.into(),
        }
    }

    /// Parse the configured template into a namer.
    pub fn from_config(config: &OssSinkConfig) -> Result<Self> {
        let sequence = SequenceFormat::parse(&config.sequence_format)?;
        Ok(Self::new(
            config.path_prefix.clone(),
            sequence,
            config.file_ext.clone(),
        ))
    }

    /// Deterministic key for a task/partition pair.
    ///
    /// Prefix, sequence and extension are concatenated verbatim; no
    /// separator is inserted, so a directory-style prefix must carry its
    /// own trailing slash.
    pub fn object_key(&self, task_index: u32, partition_index: u32) -> String {
        format!(
            "{}{}{}",
            self.prefix,
            self.sequence.render(task_index, partition_index),
            self.extension
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_format_probe() {
        let format = SequenceFormat::parse(".%03d.%02d").unwrap();
        assert_eq!(format.render(0, 0), ".000.00");
    }

    #[test]
    fn test_default_format_renders_both_indices() {
        let format = SequenceFormat::parse(".%03d.%02d").unwrap();
        assert_eq!(format.render(2, 0), ".002.00");
        assert_eq!(format.render(2, 11), ".002.11");
        assert_eq!(format.render(120, 7), ".120.07");
    }

    #[test]
    fn test_width_overflow_grows() {
        let format = SequenceFormat::parse(".%02d").unwrap();
        assert_eq!(format.render(12345, 0), ".12345");
    }

    #[test]
    fn test_space_padding() {
        let format = SequenceFormat::parse("%4d-%d").unwrap();
        assert_eq!(format.render(7, 3), "   7-3");
    }

    #[test]
    fn test_literal_percent() {
        let format = SequenceFormat::parse("p%%%d.%d").unwrap();
        assert_eq!(format.render(1, 2), "p%1.2");
    }

    #[test]
    fn test_rejects_string_conversion() {
        let err = SequenceFormat::parse(".%s.%02d").unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("'%s'"));
    }

    #[test]
    fn test_rejects_float_conversion() {
        assert!(SequenceFormat::parse("%f").is_err());
    }

    #[test]
    fn test_rejects_three_conversions() {
        assert!(SequenceFormat::parse("%d.%d.%d").is_err());
    }

    #[test]
    fn test_rejects_dangling_percent() {
        assert!(SequenceFormat::parse("abc%").is_err());
        assert!(SequenceFormat::parse("abc%03").is_err());
    }

    #[test]
    fn test_single_conversion_accepted() {
        // tolerated for compatibility, the renderer just drops the
        // partition index
        let format = SequenceFormat::parse(".%03d").unwrap();
        assert_eq!(format.render(4, 9), ".004");
    }

    #[test]
    fn test_keys_injective_across_pairs() {
        let format = SequenceFormat::parse(".%03d.%02d").unwrap();
        let namer = KeyNamer::new("data/", format, ".csv");
        let mut seen = std::collections::HashSet::new();
        for task in 0..8u32 {
            for partition in 0..8u32 {
                assert!(seen.insert(namer.object_key(task, partition)));
            }
        }
        assert_eq!(seen.len(), 64);
    }

    #[test]
    fn test_key_concatenation_is_verbatim() {
        let format = SequenceFormat::parse(".%03d.%02d").unwrap();
        let namer = KeyNamer::new("tmp", format, ".csv");
        assert_eq!(namer.object_key(0, 0), "tmp.000.00.csv");
    }

    #[test]
    fn test_key_deterministic() {
        let format = SequenceFormat::parse(".%03d.%02d").unwrap();
        let namer = KeyNamer::new("data/", format, ".jsonl");
        assert_eq!(namer.object_key(2, 1), namer.object_key(2, 1));
        assert_eq!(namer.object_key(2, 1), "data/.002.01.jsonl");
    }
}
