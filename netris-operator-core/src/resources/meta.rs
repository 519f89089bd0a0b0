use std::fmt::Display;

/// Identifier a Meta resource records for its remote counterpart.
///
/// Numeric collections use `u32` where `0` means "not created yet"; links are
/// identified by a `local-remote` port-ID pair encoded as a string, where the
/// empty string means the same.
pub trait RemoteId: Clone + Display {
    fn is_assigned(&self) -> bool;
}

impl RemoteId for u32 {
    fn is_assigned(&self) -> bool {
        *self != 0
    }
}

impl RemoteId for String {
    fn is_assigned(&self) -> bool {
        !self.is_empty()
    }
}

/// Bookkeeping surface shared by every Meta spec, implemented through
/// `netris_operator_macros::ResolvedSpec`.
///
/// A Meta spec is the user resource translated into remote-API terms: names
/// resolved to numeric IDs, plus the provenance flags and the parent CR
/// generation the translation was made from.
pub trait ResolvedSpec {
    type Id: RemoteId;

    /// Name of the user CR this Meta was generated from.
    fn parent_name(&self) -> &str;
    fn recorded_generation(&self) -> i64;
    fn record_generation(&mut self, generation: i64);
    /// True when the remote object existed before the CR and was adopted.
    fn imported(&self) -> bool;
    fn set_imported(&mut self, imported: bool);
    /// True when the remote object is kept around on CR deletion.
    fn reclaim(&self) -> bool;
    fn set_reclaim(&mut self, reclaim: bool);
    fn remote_id(&self) -> &Self::Id;
    fn assign_remote_id(&mut self, id: Self::Id);

    /// Whether the remote object has been created (or found, for imports).
    fn exists_remotely(&self) -> bool {
        self.remote_id().is_assigned()
    }

    /// A Meta must be regenerated when its parent moved to a generation other
    /// than the recorded one, or when the provenance annotations changed.
    fn is_stale(&self, parent_generation: Option<i64>, imported: bool, reclaim: bool) -> bool {
        self.recorded_generation() != parent_generation.unwrap_or_default()
            || self.imported() != imported
            || self.reclaim() != reclaim
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::crd::v1alpha1::site::SiteMetaSpec;

    #[test]
    fn regeneration_tracks_generation_and_provenance() {
        let mut spec = SiteMetaSpec::default();
        spec.record_generation(2);

        assert!(!spec.is_stale(Some(2), false, false));
        assert!(spec.is_stale(Some(3), false, false));
        assert!(spec.is_stale(Some(2), true, false));
        assert!(spec.is_stale(Some(2), false, true));
    }

    #[test]
    fn remote_id_assignment() {
        assert!(!0u32.is_assigned());
        assert!(42u32.is_assigned());
        assert!(!String::new().is_assigned());
        assert!("61-64".to_owned().is_assigned());
    }
}
