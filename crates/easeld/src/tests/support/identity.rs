//! Mock identity service.

use mockall::mock;

use crate::identity::{IdentityError, IdentityProvider, Session};

mock! {
    pub Identity {}

    impl IdentityProvider for Identity {
        fn resolve(&self, token: &str) -> Result<Option<Session>, IdentityError>;
        fn renew_service_session(&self) -> Result<(), IdentityError>;
    }
}
