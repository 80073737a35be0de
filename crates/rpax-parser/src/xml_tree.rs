//! A minimal, generic XML element tree built with `quick-xml`'s
//! non-namespace-aware event reader. The activity analyzer (`xaml.rs`)
//! classifies and flattens this tree into an `ActivityTree`; this module
//! only knows about XML structure.

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use rpax_core::{Result, RpaxError};

#[derive(Debug, Clone)]
pub struct RawElement {
    /// Fully-qualified tag as written, e.g. `Sequence.Variables` or
    /// `ui:Click`.
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<RawElement>,
    pub text: Option<String>,
}

impl RawElement {
    /// Local name: namespace prefix stripped.
    pub fn local_name(&self) -> &str {
        match self.tag.find(':') {
            Some(idx) => &self.tag[idx + 1..],
            None => &self.tag,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name || k.ends_with(&format!(":{name}")))
            .map(|(_, v)| v.as_str())
    }
}

/// Parse a XAML document into a `RawElement` tree rooted at the document
/// element. External entity resolution is disabled by construction:
/// `quick-xml`'s reader does not expand DTD entities.
pub fn parse(xml: &str) -> Result<RawElement> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<RawElement> = Vec::new();
    let mut root: Option<RawElement> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let mut attributes = Vec::new();
                for attr in e.attributes().flatten() {
                    let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                    let value = attr
                        .unescape_value()
                        .map(|v| v.to_string())
                        .unwrap_or_default();
                    attributes.push((key, value));
                }
                stack.push(RawElement {
                    tag,
                    attributes,
                    children: Vec::new(),
                    text: None,
                });
            }
            Ok(Event::Empty(e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let mut attributes = Vec::new();
                for attr in e.attributes().flatten() {
                    let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                    let value = attr
                        .unescape_value()
                        .map(|v| v.to_string())
                        .unwrap_or_default();
                    attributes.push((key, value));
                }
                let element = RawElement {
                    tag,
                    attributes,
                    children: Vec::new(),
                    text: None,
                };
                push_completed(&mut stack, &mut root, element);
            }
            Ok(Event::Text(t)) => {
                if let Some(top) = stack.last_mut() {
                    let text = t.unescape().map(|s| s.to_string()).unwrap_or_default();
                    if !text.trim().is_empty() {
                        top.text = Some(match top.text.take() {
                            Some(existing) => existing + &text,
                            None => text,
                        });
                    }
                }
            }
            Ok(Event::End(_)) => {
                if let Some(element) = stack.pop() {
                    push_completed(&mut stack, &mut root, element);
                }
            }
            Ok(Event::Eof) => break,
            Ok(Event::DocType(_)) => {
                return Err(RpaxError::Parse(
                    "DOCTYPE declarations are rejected (external entities disabled)".into(),
                ));
            }
            Err(e) => return Err(RpaxError::Parse(format!("XML parse error: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    root.ok_or_else(|| RpaxError::Parse("no root element found".into()))
}

fn push_completed(stack: &mut Vec<RawElement>, root: &mut Option<RawElement>, element: RawElement) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    } else {
        *root = Some(element);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements() {
        let xml = r#"<Sequence DisplayName="Main"><If DisplayName="Check"/></Sequence>"#;
        let root = parse(xml).unwrap();
        assert_eq!(root.local_name(), "Sequence");
        assert_eq!(root.attr("DisplayName"), Some("Main"));
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].local_name(), "If");
    }

    #[test]
    fn rejects_doctype() {
        let xml = r#"<!DOCTYPE foo [<!ENTITY xxe SYSTEM "file:///etc/passwd">]><Sequence/>"#;
        assert!(parse(xml).is_err());
    }
}
