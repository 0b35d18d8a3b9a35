//! Edge name validation.
//!
//! Valid edge names:
//! - Must be non-empty
//! - Must not start with an ASCII digit
//! - Must not contain `.`, the composite-key separator

use docgraph_crypto::KEY_SEPARATOR;

use crate::error::{GraphError, GraphResult};

/// Validate an edge name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use docgraph_graph::names::validate_edge_name;
///
/// assert!(validate_edge_name("memberof").is_ok());
/// assert!(validate_edge_name("").is_err());
/// assert!(validate_edge_name("1st").is_err());
/// assert!(validate_edge_name("a.b").is_err());
/// ```
pub fn validate_edge_name(name: &str) -> GraphResult<()> {
    let invalid = |reason: &str| GraphError::InvalidEdgeName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("edge name cannot be empty"));
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(invalid("edge name cannot start with a number"));
    }
    if name.contains(KEY_SEPARATOR) {
        return Err(invalid("edge name cannot contain '.' characters"));
    }
    Ok(())
}
