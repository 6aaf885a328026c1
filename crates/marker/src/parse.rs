use crate::MarkerConfig;
use core_types::{Frame, FrameId, Mapping, MappingId};
use std::borrow::Cow;
use std::fmt;

/// A decoded marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Marker {
    Frame { index: FrameId, frame: Frame },
    MappingStart { index: MappingId, mapping: Mapping },
    MappingEnd { index: MappingId },
}

impl Marker {
    pub fn index(&self) -> usize {
        match self {
            Marker::Frame { index, .. }
            | Marker::MappingStart { index, .. }
            | Marker::MappingEnd { index } => *index,
        }
    }
}

#[derive(Debug)]
pub enum MarkerError {
    /// The text does not start with the configured prefix. Ordinary comments
    /// land here; callers usually ignore this variant silently.
    NotAMarker,
    UnknownKind(String),
    BadIndex(String),
    MissingPayload(usize),
    Json(serde_json::Error),
}

impl fmt::Display for MarkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerError::NotAMarker => f.write_str("not a marker"),
            MarkerError::UnknownKind(kind) => write!(f, "unknown marker kind {kind:?}"),
            MarkerError::BadIndex(raw) => write!(f, "invalid marker index {raw:?}"),
            MarkerError::MissingPayload(index) => write!(f, "marker {index} has no payload"),
            MarkerError::Json(err) => write!(f, "invalid marker payload: {err}"),
        }
    }
}

impl std::error::Error for MarkerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MarkerError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for MarkerError {
    fn from(err: serde_json::Error) -> Self {
        MarkerError::Json(err)
    }
}

const FRAME: &str = "frame:";
const MAPPING: &str = "mapping:";
const MAPPING_END: &str = "mapping end:";

/// Decode one marker from comment text or an attribute value.
pub fn parse_marker(text: &str, config: &MarkerConfig) -> Result<Marker, MarkerError> {
    let text = text.trim();
    let text: Cow<'_, str> = if text.contains("&quot;") {
        Cow::Owned(text.replace("&quot;", "\""))
    } else {
        Cow::Borrowed(text)
    };
    let rest = text
        .strip_prefix(config.prefix.as_str())
        .and_then(|r| r.strip_prefix(' '))
        .ok_or(MarkerError::NotAMarker)?;

    if let Some(body) = rest.strip_prefix(FRAME) {
        let (index, json) = split_index(body)?;
        let json = json.ok_or(MarkerError::MissingPayload(index))?;
        let frame: Frame = serde_json::from_str(json)?;
        return Ok(Marker::Frame { index, frame });
    }
    if let Some(body) = rest.strip_prefix(MAPPING) {
        let (index, json) = split_index(body)?;
        let json = json.ok_or(MarkerError::MissingPayload(index))?;
        let mapping: Mapping = serde_json::from_str(json)?;
        return Ok(Marker::MappingStart { index, mapping });
    }
    if let Some(body) = rest.strip_prefix(MAPPING_END) {
        let (index, _) = split_index(body)?;
        return Ok(Marker::MappingEnd { index });
    }

    let kind = rest.split(':').next().unwrap_or(rest);
    Err(MarkerError::UnknownKind(kind.to_string()))
}

// `" 12 {json}"` -> (12, Some("{json}")); `" 12"` -> (12, None)
fn split_index(body: &str) -> Result<(usize, Option<&str>), MarkerError> {
    let body = body.trim_start();
    let digits = body.bytes().take_while(u8::is_ascii_digit).count();
    let (raw, tail) = body.split_at(digits);
    let index = raw
        .parse::<usize>()
        .map_err(|_| MarkerError::BadIndex(body.chars().take(16).collect()))?;
    let payload = match tail.strip_prefix(' ') {
        Some(json) if !json.trim().is_empty() => Some(json),
        _ if tail.trim().is_empty() => None,
        _ => return Err(MarkerError::BadIndex(body.chars().take(16).collect())),
    };
    Ok((index, payload))
}

/// Whether an attribute name belongs to the marker family (`data-<prefix>`
/// or `data-<prefix>-…`). Names are compared ASCII case-insensitively because
/// the tokenizer lowercases them.
pub fn is_marker_attribute(name: &str, prefix: &str) -> bool {
    let Some(rest) = strip_prefix_ignore_case(name, "data-") else {
        return false;
    };
    let Some(rest) = strip_prefix_ignore_case(rest, prefix) else {
        return false;
    };
    rest.is_empty() || rest.starts_with('-')
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &s[prefix.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{comment, frame_payload, mapping_end_payload, mapping_payload};

    fn cfg() -> MarkerConfig {
        MarkerConfig::default()
    }

    #[test]
    fn parses_each_marker_kind() {
        let frame = Frame::new("view.rs", 3).with_class("View");
        let mapping = Mapping::new("rust", vec![0, 4]);

        assert_eq!(
            parse_marker(&frame_payload("hm", 5, &frame), &cfg()).unwrap(),
            Marker::Frame { index: 5, frame }
        );
        assert_eq!(
            parse_marker(&mapping_payload("hm", 9, &mapping), &cfg()).unwrap(),
            Marker::MappingStart { index: 9, mapping }
        );
        assert_eq!(
            parse_marker(&mapping_end_payload("hm", 9), &cfg()).unwrap(),
            Marker::MappingEnd { index: 9 }
        );
    }

    #[test]
    fn tolerates_surrounding_whitespace_and_quot_entities() {
        let text = " hm mapping: 1 {&quot;source&quot;:&quot;PHP&quot;,&quot;callStack&quot;:[0]}\n";
        let marker = parse_marker(text, &cfg()).unwrap();
        assert_eq!(marker.index(), 1);
        assert!(matches!(marker, Marker::MappingStart { mapping, .. } if mapping.source == "PHP"));
    }

    #[test]
    fn comment_body_round_trips() {
        let markup = comment(&mapping_end_payload("hm", 12));
        let body = markup.strip_prefix("<!--").unwrap().strip_suffix("-->").unwrap();
        assert_eq!(parse_marker(body, &cfg()).unwrap(), Marker::MappingEnd { index: 12 });
    }

    #[test]
    fn ordinary_comments_are_not_markers() {
        assert!(matches!(
            parse_marker(" The calls below map this html. ", &cfg()),
            Err(MarkerError::NotAMarker)
        ));
        assert!(matches!(parse_marker("hmm frame: 0 {}", &cfg()), Err(MarkerError::NotAMarker)));
    }

    #[test]
    fn malformed_markers_report_errors() {
        assert!(matches!(
            parse_marker("hm region: 0 {}", &cfg()),
            Err(MarkerError::UnknownKind(kind)) if kind == "region"
        ));
        assert!(matches!(
            parse_marker("hm frame: x {}", &cfg()),
            Err(MarkerError::BadIndex(_))
        ));
        assert!(matches!(
            parse_marker("hm frame: 3", &cfg()),
            Err(MarkerError::MissingPayload(3))
        ));
        assert!(matches!(
            parse_marker("hm mapping: 0 {not json", &cfg()),
            Err(MarkerError::Json(_))
        ));
        assert!(matches!(
            parse_marker("hm mapping end: 99999999999999999999999", &cfg()),
            Err(MarkerError::BadIndex(_))
        ));
    }

    #[test]
    fn custom_prefix_is_honored() {
        let config = MarkerConfig {
            prefix: "srcmap".to_string(),
            ..MarkerConfig::default()
        };
        assert!(parse_marker("srcmap mapping end: 2", &config).is_ok());
        assert!(matches!(
            parse_marker("hm mapping end: 2", &config),
            Err(MarkerError::NotAMarker)
        ));
    }

    #[test]
    fn marker_attribute_family() {
        assert!(is_marker_attribute("data-hm", "hm"));
        assert!(is_marker_attribute("data-hm-href", "hm"));
        assert!(is_marker_attribute("DATA-HM-END-href", "hm"));
        assert!(!is_marker_attribute("data-hmx", "hm"));
        assert!(!is_marker_attribute("data-mapping", "hm"));
        assert!(!is_marker_attribute("hm", "hm"));
    }
}
