use std::str::FromStr;

use soap_client::{Node, PathError};

use crate::error::ApiError;
use crate::service::Service;

/// Base trait for all ONVIF API operations
///
/// An operation is a request builder plus a response mapper. The client wraps
/// the payload in `<prefix:ACTION>` for the operation's service, sends it, and
/// hands the `{ACTION}Response` element to [`parse_response`](Self::parse_response).
pub trait OnvifOperation {
    /// The request type for this operation
    type Request;

    /// The response type for this operation
    type Response;

    /// The ONVIF service this operation belongs to
    const SERVICE: Service;

    /// The SOAP action name for this operation
    const ACTION: &'static str;

    /// Build the children of the action element
    ///
    /// Values taken from the request must be escaped. An empty string produces
    /// a self-closing action element.
    fn build_payload(request: &Self::Request) -> String;

    /// Map the `{ACTION}Response` element into the typed response
    fn parse_response(response: &Node) -> Result<Self::Response, ApiError>;
}

/// Scalar at `path` parsed with `FromStr`, `None` when the element is absent
pub(crate) fn optional<T: FromStr>(node: &Node, path: &str) -> Result<Option<T>, PathError> {
    match node.parse_at(path) {
        Ok(value) => Ok(Some(value)),
        Err(PathError::Absent(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// `xs:boolean` at `path`, `None` when the element is absent
pub(crate) fn optional_bool(node: &Node, path: &str) -> Result<Option<bool>, PathError> {
    match node.bool_at(path) {
        Ok(value) => Ok(Some(value)),
        Err(PathError::Absent(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soap_client::Document;

    fn node(xml: &str) -> Document {
        Document::parse(xml.as_bytes()).unwrap()
    }

    #[test]
    fn test_optional_distinguishes_absent_from_invalid() {
        let doc = node("<R><Level>0.5</Level><Mode>ON</Mode></R>");
        let root = doc.root();

        assert_eq!(optional::<f64>(root, "Level"), Ok(Some(0.5)));
        assert_eq!(optional::<f64>(root, "Gain"), Ok(None));
        assert!(matches!(optional::<f64>(root, "Mode"), Err(PathError::Invalid { .. })));
    }

    #[test]
    fn test_optional_bool() {
        let doc = node("<R><Fixed>true</Fixed></R>");
        assert_eq!(optional_bool(doc.root(), "Fixed"), Ok(Some(true)));
        assert_eq!(optional_bool(doc.root(), "Other"), Ok(None));
    }
}
