//! Process-wide client slot for hosts that need a single shared instance.
//!
//! Prefer owning a [`Featrack`] directly. This module exists for hosts that
//! cannot thread a client through their code.

use crate::{Error, Featrack, FeatrackBuilder};
use std::sync::{Arc, PoisonError, RwLock};

static GLOBAL: RwLock<Option<Arc<Featrack>>> = RwLock::new(None);

/// Build a client and install it as the global instance, replacing any
/// previous one (and with it, its session and identity).
pub fn init(builder: FeatrackBuilder) -> Result<Arc<Featrack>, Error> {
    let client = Arc::new(builder.build()?);
    *GLOBAL.write().unwrap_or_else(PoisonError::into_inner) = Some(client.clone());
    Ok(client)
}

/// Get the global client.
///
/// Before [`init`] this is an uninitialized client in warn mode: its
/// operations report [`Error::NotInitialized`].
pub fn get() -> Arc<Featrack> {
    GLOBAL
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .unwrap_or_else(|| Arc::new(Featrack::default()))
}

/// Whether a global client has been installed.
pub fn is_initialized() -> bool {
    GLOBAL
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .is_some()
}

/// Drop the global client.
pub fn reset() {
    *GLOBAL.write().unwrap_or_else(PoisonError::into_inner) = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorMode;

    // Single test: the slot is shared by the whole test binary.
    #[tokio::test]
    async fn test_global_lifecycle() {
        reset();
        assert!(!is_initialized());

        let client = get();
        assert!(!client.is_initialized());
        assert!(matches!(client.sessions().start().send().await, Ok(None)));

        let installed = init(
            Featrack::builder("tok", "app")
                .api_url("http://127.0.0.1:9")
                .error_mode(ErrorMode::Throw),
        )
        .unwrap();
        assert!(is_initialized());
        assert!(Arc::ptr_eq(&installed, &get()));

        get().customers().identify("u1").unwrap();
        assert_eq!(installed.customer_unique_id().as_deref(), Some("u1"));

        reset();
        assert!(!is_initialized());
        assert_eq!(get().customer_unique_id(), None);
    }
}
