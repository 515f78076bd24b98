// Minimal XML element tree built on quick-xml
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    /// Qualified name as written in the document, e.g. `gml:Point`.
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    pub text: String,
}

impl XmlElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Follow the first child with each name in turn.
    pub fn path(&self, names: &[&str]) -> Option<&XmlElement> {
        names.iter().try_fold(self, |element, name| element.child(name))
    }

    /// Trimmed text content, `None` when empty.
    pub fn text(&self) -> Option<&str> {
        let text = self.text.trim();
        (!text.is_empty()).then_some(text)
    }
}

fn start_element(start: &BytesStart<'_>) -> Result<XmlElement, String> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| format!("invalid attribute in <{name}>: {e}"))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| format!("invalid attribute value in <{name}>: {e}"))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(XmlElement {
        name,
        attributes,
        ..XmlElement::default()
    })
}

/// Parse a whole document and return its root element.
pub fn parse_document(xml: &[u8]) -> Result<XmlElement, String> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(start)) => stack.push(start_element(&start)?),
            Ok(Event::Empty(start)) => {
                let element = start_element(&start)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| "unexpected closing tag".to_string())?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Ok(Event::Text(text)) => {
                if let Some(current) = stack.last_mut() {
                    let text = text
                        .unescape()
                        .map_err(|e| format!("invalid text in <{}>: {e}", current.name))?;
                    current.text.push_str(&text);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(format!(
                    "XML error at position {}: {e}",
                    reader.buffer_position()
                ))
            }
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err("document ended before all elements were closed".to_string());
    }
    root.ok_or_else(|| "document has no root element".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_document() {
        let xml = br#"<?xml version="1.0"?>
            <wfs:FeatureCollection timeStamp="2024-01-15T10:31:00Z">
              <wfs:member><gml:pos>60.17 24.94 </gml:pos></wfs:member>
              <wfs:member><gml:name>Helsinki &amp; Espoo</gml:name><empty a="1"/></wfs:member>
            </wfs:FeatureCollection>"#;

        let root = parse_document(xml).unwrap();
        assert_eq!(root.name, "wfs:FeatureCollection");
        assert_eq!(root.attr("timeStamp"), Some("2024-01-15T10:31:00Z"));
        assert_eq!(root.children_named("wfs:member").count(), 2);
        assert_eq!(
            root.path(&["wfs:member", "gml:pos"]).and_then(XmlElement::text),
            Some("60.17 24.94")
        );
        let second = root.children_named("wfs:member").nth(1).unwrap();
        assert_eq!(second.child("gml:name").and_then(XmlElement::text), Some("Helsinki & Espoo"));
        assert_eq!(second.child("empty").and_then(|e| e.attr("a")), Some("1"));
    }

    #[test]
    fn test_missing_path_is_none() {
        let root = parse_document(b"<a><b/></a>").unwrap();
        assert!(root.path(&["b", "c"]).is_none());
        assert_eq!(root.child("b").and_then(XmlElement::text), None);
    }

    #[test]
    fn test_malformed_document_is_error() {
        assert!(parse_document(b"<a><b></a>").is_err());
        assert!(parse_document(b"").is_err());
    }
}
