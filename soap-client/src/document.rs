//! Generic XML document tree addressed by dotted paths
//!
//! Responses from ONVIF devices are parsed into a [`Document`] whose nodes
//! are keyed by local element name (namespace prefixes are dropped), so
//! `Envelope.Body.GetHostnameResponse.HostnameInformation.Name` resolves the
//! same way whether the device writes `s:Envelope` or `SOAP-ENV:Envelope`.
//!
//! A path segment starting with `@` selects an attribute and must be last:
//! `Envelope.Body.GetProfilesResponse.Profiles.@token`.
//!
//! Accessors never coerce: a missing node is [`PathError::Absent`], a node
//! with child elements where text was expected is [`PathError::WrongShape`],
//! and text that does not parse is [`PathError::Invalid`].

use std::collections::BTreeMap;
use std::str::FromStr;

use thiserror::Error;
use xmltree::{Element, XMLNode};

use crate::error::{Result, SoapError};

/// Failure to read a typed value out of a document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("no value at `{0}`")]
    Absent(String),

    #[error("value at `{path}` is not {expected}")]
    WrongShape { path: String, expected: &'static str },

    #[error("value `{value}` at `{path}` is invalid")]
    Invalid { path: String, value: String },
}

/// One element of a parsed document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    name: String,
    attributes: BTreeMap<String, String>,
    text: String,
    children: Vec<Node>,
}

impl Node {
    /// Local name of the element
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Child elements in document order
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// First child element with the given local name
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Trimmed text content, or `None` if this element has child elements
    pub fn as_text(&self) -> Option<&str> {
        if self.children.is_empty() {
            Some(self.text.trim())
        } else {
            None
        }
    }

    /// Whether this element carries child elements rather than text
    pub fn is_map(&self) -> bool {
        !self.children.is_empty()
    }

    /// Every node reachable through `path`, relative to this node's children
    pub fn all_at(&self, path: &str) -> Vec<&Node> {
        let mut current = vec![self];
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            current = current
                .into_iter()
                .flat_map(|node| node.children.iter().filter(move |c| c.name == segment))
                .collect();
            if current.is_empty() {
                break;
            }
        }
        current
    }

    /// First node reachable through `path`
    pub fn get(&self, path: &str) -> Option<&Node> {
        self.all_at(path).into_iter().next()
    }

    /// Scalar text (or attribute) at `path`
    pub fn value_at(&self, path: &str) -> std::result::Result<&str, PathError> {
        match path.rsplit_once('@') {
            Some((parent, attribute)) => {
                let parent = parent.trim_end_matches('.');
                let node = if parent.is_empty() {
                    Some(self)
                } else {
                    self.get(parent)
                };
                node.and_then(|n| n.attribute(attribute))
                    .ok_or_else(|| PathError::Absent(path.to_string()))
            }
            None => {
                let node = self
                    .get(path)
                    .ok_or_else(|| PathError::Absent(path.to_string()))?;
                node.as_text().ok_or_else(|| PathError::WrongShape {
                    path: path.to_string(),
                    expected: "a scalar",
                })
            }
        }
    }

    /// Scalar at `path`, or `None` when it is absent or not a scalar
    pub fn text_at(&self, path: &str) -> Option<String> {
        self.value_at(path).ok().map(str::to_string)
    }

    /// Scalar at `path` parsed with `FromStr`
    pub fn parse_at<T: FromStr>(&self, path: &str) -> std::result::Result<T, PathError> {
        let value = self.value_at(path)?;
        value.parse().map_err(|_| PathError::Invalid {
            path: path.to_string(),
            value: value.to_string(),
        })
    }

    /// `xs:boolean` at `path` (`true`/`false`/`1`/`0`)
    pub fn bool_at(&self, path: &str) -> std::result::Result<bool, PathError> {
        let value = self.value_at(path)?;
        match value.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(PathError::Invalid {
                path: path.to_string(),
                value: value.to_string(),
            }),
        }
    }
}

impl From<&Element> for Node {
    fn from(element: &Element) -> Self {
        let mut text = String::new();
        let mut children = Vec::new();
        for child in &element.children {
            match child {
                XMLNode::Element(e) => children.push(Node::from(e)),
                XMLNode::Text(t) | XMLNode::CData(t) => text.push_str(t),
                _ => {}
            }
        }

        Node {
            name: element.name.clone(),
            attributes: element
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            text,
            children,
        }
    }
}

/// A parsed XML document
///
/// Paths given to a document start at the root element's name, e.g.
/// `Envelope.Body.Fault.Reason.Text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Node,
}

impl Document {
    /// Parse raw XML bytes
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let element = Element::parse(bytes).map_err(|e| SoapError::Parse(e.to_string()))?;
        Ok(Self {
            root: Node::from(&element),
        })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn all_at(&self, path: &str) -> Vec<&Node> {
        match self.split_root(path) {
            Some("") => vec![&self.root],
            Some(rest) => self.root.all_at(rest),
            None => Vec::new(),
        }
    }

    pub fn get(&self, path: &str) -> Option<&Node> {
        self.all_at(path).into_iter().next()
    }

    pub fn value_at(&self, path: &str) -> std::result::Result<&str, PathError> {
        match self.split_root(path) {
            Some(rest) => self.root.value_at(rest).map_err(|e| rebase(e, path)),
            None => Err(PathError::Absent(path.to_string())),
        }
    }

    pub fn text_at(&self, path: &str) -> Option<String> {
        self.value_at(path).ok().map(str::to_string)
    }

    /// Strip the root element name off the front of `path`
    fn split_root<'p>(&self, path: &'p str) -> Option<&'p str> {
        let (first, rest) = path.split_once('.').unwrap_or((path, ""));
        (first == self.root.name).then_some(rest)
    }
}

/// Report errors against the full document path rather than the root-relative one
fn rebase(error: PathError, path: &str) -> PathError {
    match error {
        PathError::Absent(_) => PathError::Absent(path.to_string()),
        PathError::WrongShape { expected, .. } => PathError::WrongShape {
            path: path.to_string(),
            expected,
        },
        PathError::Invalid { value, .. } => PathError::Invalid {
            path: path.to_string(),
            value,
        },
    }
}

/// Escape text for inclusion in an XML element or attribute value
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
