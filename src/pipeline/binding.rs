//! Binding the open document to its CAM part, and releasing it again.

use crate::error::{CamError, Result};
use crate::host::{CamApplication, CamPart};
use std::ops::{Deref, DerefMut};
use tracing::{debug, error};

/// Resolve the CAM part of the active document.
pub fn bind<A: CamApplication>(app: &mut A) -> Result<BoundPart<A::Part>> {
    app.current_part()
        .map(BoundPart::new)
        .ok_or(CamError::NotACamPart)
}

/// A CAM part that is closed on the CAM side when dropped.
///
/// Release never closes the underlying CAD document; the batch driver owns
/// that lifecycle.
pub struct BoundPart<P: CamPart> {
    part: P,
    released: bool,
}

impl<P: CamPart> BoundPart<P> {
    pub fn new(part: P) -> Self {
        Self {
            part,
            released: false,
        }
    }

    /// Release the CAM part now, reporting the engine's answer.
    pub fn release(mut self) -> Result<()> {
        self.close_once()
    }

    fn close_once(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        debug!("Releasing CAM part");
        self.part.close(false)
    }
}

impl<P: CamPart> Deref for BoundPart<P> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.part
    }
}

impl<P: CamPart> DerefMut for BoundPart<P> {
    fn deref_mut(&mut self) -> &mut P {
        &mut self.part
    }
}

impl<P: CamPart> Drop for BoundPart<P> {
    fn drop(&mut self) {
        if let Err(e) = self.close_once() {
            error!(" - Failed to release CAM part: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::simulated::{self, OperationFixture, PartFixture, SimulatedPart};
    use crate::host::CadHost;
    use std::path::Path;

    #[test]
    fn test_bind_without_document() {
        let (mut cad, mut cam) = simulated::session();
        cad.load_addin(Path::new("addin.dll"));
        let mut app = crate::host::CamEngine::launch_from_cad(&mut cam).unwrap();
        assert!(matches!(bind(&mut app), Err(CamError::NotACamPart)));
    }

    #[test]
    fn test_release_on_drop() {
        let part = SimulatedPart::detached("a", PartFixture::with_operations([OperationFixture::ok("A")]));
        let session = part.session().clone();
        {
            let _bound = BoundPart::new(part);
        }
        assert_eq!(session.stats().part_releases, 1);
        assert_eq!(session.stats().models_closed_by_cam, 0);
        assert!(session.journal().contains(&"release:close_document=false".to_string()));
    }

    #[test]
    fn test_explicit_release_is_not_repeated_on_drop() {
        let part = SimulatedPart::detached("a", PartFixture::default());
        let session = part.session().clone();
        let bound = BoundPart::new(part);
        bound.release().unwrap();
        assert_eq!(session.stats().part_releases, 1);
    }

    #[test]
    fn test_release_after_panic() {
        let part = SimulatedPart::detached("a", PartFixture::default());
        let session = part.session().clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _bound = BoundPart::new(part);
            panic!("engine crashed");
        }));
        assert!(result.is_err());
        assert_eq!(session.stats().part_releases, 1);
    }
}
