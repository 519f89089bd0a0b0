use std::collections::BTreeMap;

use kube::ResourceExt;

/// Marks a CR as adopting an already existing remote object ("true"/"false").
pub const IMPORT_ANNOTATION: &str = "resource.k8s.netris.ai/import";
/// Controls whether the remote object outlives the CR ("retain"/"delete").
pub const RECLAIM_ANNOTATION: &str = "resource.k8s.netris.ai/reclaimPolicy";

pub fn imported(resource: &impl ResourceExt) -> bool {
    resource
        .annotations()
        .get(IMPORT_ANNOTATION)
        .map(|value| value == "true")
        .unwrap_or(false)
}

pub fn reclaim(resource: &impl ResourceExt) -> bool {
    resource
        .annotations()
        .get(RECLAIM_ANNOTATION)
        .map(|value| value == "retain")
        .unwrap_or(false)
}

/// Whether either provenance annotation is absent or holds an illegal value.
pub fn annotations_need_defaults(resource: &impl ResourceExt) -> bool {
    let annotations = resource.annotations();

    !matches!(
        annotations.get(IMPORT_ANNOTATION).map(String::as_str),
        Some("true") | Some("false")
    ) || !matches!(
        annotations.get(RECLAIM_ANNOTATION).map(String::as_str),
        Some("retain") | Some("delete")
    )
}

/// Both provenance annotations with defaults filled in; legal values already
/// present keep their meaning, anything else is reset.
pub fn default_annotations(resource: &impl ResourceExt) -> BTreeMap<String, String> {
    let import = if imported(resource) { "true" } else { "false" };
    let reclaim = if reclaim(resource) { "retain" } else { "delete" };

    BTreeMap::from([
        (IMPORT_ANNOTATION.to_owned(), import.to_owned()),
        (RECLAIM_ANNOTATION.to_owned(), reclaim.to_owned()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::crd::v1alpha1::site::{Site, SiteSpec};

    fn site_with(annotations: &[(&str, &str)]) -> Site {
        let mut site = Site::new("yerevan", SiteSpec::default());
        site.metadata.annotations = Some(
            annotations
                .iter()
                .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
                .collect(),
        );
        site
    }

    #[test]
    fn missing_annotations_need_defaults() {
        let site = site_with(&[]);

        assert!(annotations_need_defaults(&site));

        let defaults = default_annotations(&site);
        assert_eq!(defaults[IMPORT_ANNOTATION], "false");
        assert_eq!(defaults[RECLAIM_ANNOTATION], "delete");
    }

    #[test]
    fn legal_values_are_kept() {
        let site = site_with(&[(IMPORT_ANNOTATION, "true"), (RECLAIM_ANNOTATION, "retain")]);

        assert!(!annotations_need_defaults(&site));
        assert!(imported(&site));
        assert!(reclaim(&site));
    }

    #[test]
    fn illegal_values_are_reset() {
        let site = site_with(&[(IMPORT_ANNOTATION, "yes"), (RECLAIM_ANNOTATION, "retain")]);

        assert!(annotations_need_defaults(&site));

        let defaults = default_annotations(&site);
        assert_eq!(defaults[IMPORT_ANNOTATION], "false");
        assert_eq!(defaults[RECLAIM_ANNOTATION], "retain");
    }
}
