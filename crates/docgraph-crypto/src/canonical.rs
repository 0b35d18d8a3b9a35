//! Canonical textual form of content groups.
//!
//! ```text
//! groups  = "[" group ("," group)* "]"
//! group   = "[" content ("," content)* "]"
//! content = "{" len ":" label "=" "[" tag "," payload "]" "}"
//! payload = len ":" text        ; string
//!         | micros              ; time_point
//!         | readable form       ; name, asset, int64, checksum256
//!         | ""                  ; none
//! ```
//!
//! `len` is a byte count, so labels and strings may contain any delimiter.
//! The remaining payloads are drawn from alphabets without delimiters. Empty
//! lists render as `[]`. The form is order-sensitive and is the only input to
//! a document's fingerprint, so it must never change for existing data.

use std::fmt::Write;

use docgraph_types::{Content, ContentGroup, FlexValue};

/// Canonical form of a single group.
pub fn canonical_group(group: &[Content]) -> String {
    let mut out = String::new();
    write_group(&mut out, group);
    out
}

/// Canonical form of a full set of groups.
pub fn canonical_groups(groups: &[ContentGroup]) -> String {
    let mut out = String::from("[");
    for (i, group) in groups.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_group(&mut out, group);
    }
    out.push(']');
    out
}

fn write_group(out: &mut String, group: &[Content]) {
    out.push('[');
    for (i, content) in group.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_content(out, content);
    }
    out.push(']');
}

// Writing into a String cannot fail.
fn write_content(out: &mut String, content: &Content) {
    let label = &content.label;
    let _ = write!(out, "{{{}:{label}=[{},", label.len(), content.value.type_name());
    let _ = match &content.value {
        FlexValue::Empty => Ok(()),
        FlexValue::String(text) => write!(out, "{}:{text}", text.len()),
        FlexValue::Time(at) => write!(out, "{}", at.micros()),
        other => write!(out, "{other}"),
    };
    out.push_str("]}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgraph_types::{labeled_group, AccountName, Asset, Checksum256, Symbol, Timestamp};

    #[test]
    fn empty_forms() {
        assert_eq!(canonical_groups(&[]), "[]");
        assert_eq!(canonical_groups(&[vec![]]), "[[]]");
        assert_eq!(canonical_group(&[]), "[]");
    }

    #[test]
    fn every_value_kind_renders() {
        let group = vec![
            Content::new("a", AccountName::new("alice").unwrap()),
            Content::new("b", "text"),
            Content::new("c", Asset::new(150, Symbol::new(2, "HUSD").unwrap())),
            Content::new("d", Timestamp::from_micros(1_500_000)),
            Content::new("e", -7i64),
            Content::new("f", Checksum256::from_hash([0x0f; 32])),
            Content::tombstone("g"),
        ];
        let expected = format!(
            "[{{1:a=[name,alice]}},{{1:b=[string,4:text]}},{{1:c=[asset,1.50 HUSD]}},\
             {{1:d=[time_point,1500000]}},{{1:e=[int64,-7]}},\
             {{1:f=[checksum256,{}]}},{{1:g=[none,]}}]",
            "0f".repeat(32)
        );
        assert_eq!(canonical_group(&group), expected);
    }

    #[test]
    fn groups_are_comma_joined() {
        let groups = vec![
            labeled_group("one", [Content::new("n", 1i64)]),
            labeled_group("two", Vec::<Content>::new()),
        ];
        assert_eq!(
            canonical_groups(&groups),
            "[[{19:content_group_label=[string,3:one]},{1:n=[int64,1]}],\
             [{19:content_group_label=[string,3:two]}]]"
        );
    }

    #[test]
    fn lengths_count_bytes() {
        let group = vec![Content::new("été", "ü")];
        assert_eq!(canonical_group(&group), "[{5:été=[string,2:ü]}]");
    }

    // -----------------------------------------------------------------------
    // Delimiters inside text
    // -----------------------------------------------------------------------

    #[test]
    fn embedded_delimiters_stay_inside_their_item() {
        let one = vec![Content::new("a", "b]},{1:c=[string,1:d")];
        let two = vec![Content::new("a", "b"), Content::new("c", "d")];
        assert_ne!(canonical_group(&one), canonical_group(&two));

        let nested = vec![vec![Content::new("a", "x]],[[")]];
        let split = vec![vec![Content::new("a", "x")], vec![]];
        assert_ne!(canonical_groups(&nested), canonical_groups(&split));
    }

    #[test]
    fn label_and_value_boundary_is_fixed() {
        let left = vec![Content::new("a=[string,1:b", "c")];
        let right = vec![Content::new("a", "b")];
        assert_ne!(canonical_group(&left), canonical_group(&right));
        assert_ne!(
            canonical_group(&[Content::new("ab", "c")]),
            canonical_group(&[Content::new("a", "bc")])
        );
    }

    #[test]
    fn sub_second_time_is_kept() {
        let at = |micros| canonical_group(&[Content::new("at", Timestamp::from_micros(micros))]);
        assert_ne!(at(5_000_001), at(5_999_999));
    }
}
