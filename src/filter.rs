//! @ai:module:intent Decide which paths and sub-annotations survive a compile run's visibility and vendor-tag policy
//! @ai:module:layer domain
//! @ai:module:public_api FilterPolicy
//! @ai:module:depends_on annotation
//! @ai:module:stateless true

use crate::annotation::Faceted;

/// @ai:intent Filtering policy for one compile run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPolicy {
    /// Keep `:private` paths and annotations
    pub load_private: bool,
    /// `None` disables vendor-tag filtering; `Some(vec![])` excludes every tagged item
    pub vendor_tags: Option<Vec<String>>,
}

impl FilterPolicy {
    pub fn new(load_private: bool, vendor_tags: Option<Vec<String>>) -> Self {
        Self {
            load_private,
            vendor_tags,
        }
    }

    /// @ai:intent Decide whether a path (or anything carrying the same facets) is compiled
    /// @ai:pre vendor_tags are the item's own tags
    /// @ai:post an allow-list rejects tagged items unless every tag is allowed
    /// @ai:example (allow [tag:X, tag:Y], visible, [tag:X]) -> true
    /// @ai:example (allow [], visible, [tag:X]) -> false
    /// @ai:example (no allow-list, hidden, [], load_private=false) -> false
    /// @ai:effects pure
    pub fn should_parse_path(&self, visible: bool, vendor_tags: &[String]) -> bool {
        if let Some(allowed) = &self.vendor_tags {
            if !vendor_tags.is_empty() && !vendor_tags.iter().all(|tag| allowed.contains(tag)) {
                return false;
            }
        }

        visible || self.load_private
    }

    /// @ai:intent Same predicate applied to a single annotation's own facets
    pub fn allows<F: Faceted + ?Sized>(&self, item: &F) -> bool {
        self.should_parse_path(item.is_visible(), item.vendor_tags())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Annotation, Payload};

    fn tags(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_allow_list_scenarios() {
        let path_tags = tags(&["tag:X"]);

        let both = FilterPolicy::new(false, Some(tags(&["tag:X", "tag:Y"])));
        let other = FilterPolicy::new(false, Some(tags(&["tag:Y"])));
        let empty = FilterPolicy::new(false, Some(Vec::new()));
        let none = FilterPolicy::new(false, None);

        assert!(both.should_parse_path(true, &path_tags));
        assert!(!other.should_parse_path(true, &path_tags));
        assert!(!empty.should_parse_path(true, &path_tags));
        assert!(none.should_parse_path(true, &path_tags));
    }

    #[test]
    fn test_every_tag_must_be_allowed() {
        let policy = FilterPolicy::new(false, Some(tags(&["tag:X"])));
        assert!(!policy.should_parse_path(true, &tags(&["tag:X", "tag:Z"])));
    }

    #[test]
    fn test_untagged_items_fall_back_to_visibility() {
        let public_only = FilterPolicy::new(false, Some(Vec::new()));
        let with_private = FilterPolicy::new(true, None);

        assert!(public_only.should_parse_path(true, &[]));
        assert!(!public_only.should_parse_path(false, &[]));
        assert!(with_private.should_parse_path(false, &[]));
    }

    #[test]
    fn test_allowed_tag_does_not_lift_privacy() {
        let path_tags = tags(&["tag:X"]);

        let public_only = FilterPolicy::new(false, Some(tags(&["tag:X"])));
        let with_private = FilterPolicy::new(true, Some(tags(&["tag:X"])));

        assert!(!public_only.should_parse_path(false, &path_tags));
        assert!(with_private.should_parse_path(false, &path_tags));
        assert!(!with_private.should_parse_path(false, &tags(&["tag:Z"])));
    }

    #[test]
    fn test_allows_uses_annotation_facets() {
        let mut content_type = Annotation::new(Payload::ContentType {
            media_type: "application/json".to_string(),
        });
        // content types carry no visibility facet, so a stray flag is ignored
        content_type.facets.visible = false;

        assert!(FilterPolicy::default().allows(&content_type));
    }
}
