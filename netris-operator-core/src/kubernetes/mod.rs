use kube::core::object::HasStatus;

pub mod operations;

/// Builds an otherwise-default object carrying only a status, for status
/// subresource patches.
pub trait FromStatus<S> {
    fn from_status(status: S) -> Self;
}

impl<T: Default + HasStatus<Status = S>, S> FromStatus<S> for T {
    fn from_status(status: S) -> Self {
        let mut object = Self::default();

        *object.status_mut() = Some(status);

        object
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::crd::v1alpha1::site::Site;
    use crate::resources::crd::v1alpha1::ResourceStatus;

    #[test]
    fn from_status_carries_only_the_status() {
        let site = Site::from_status(ResourceStatus {
            status: Some("Active".to_owned()),
            message: Some("Success".to_owned()),
        });

        assert_eq!(site.status.as_ref().unwrap().status.as_deref(), Some("Active"));
        assert_eq!(site.metadata.name, None);
        assert_eq!(site.spec.public_asn, 0);
    }
}
