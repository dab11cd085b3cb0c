use std::collections::HashMap;
use std::sync::Mutex;

use bulkstate_core::{GatewayError, TransitionGateway, TransitionRequest};
use tracing::info;

/// In-memory gateway for tests and rehearsals. Succeeds unless a failure was
/// scripted for the identifier; every call is remembered in order.
#[derive(Default)]
pub struct ScriptedGateway {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    failures: HashMap<String, GatewayError>,
    calls: Vec<TransitionRequest>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(self, id: impl Into<String>, error: GatewayError) -> Self {
        self.inner
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .failures
            .insert(id.into(), error);
        self
    }

    pub fn calls(&self) -> Vec<TransitionRequest> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).calls.len()
    }
}

impl TransitionGateway for ScriptedGateway {
    fn apply_transition(&self, request: &TransitionRequest) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        inner.calls.push(request.clone());
        match inner.failures.get(request.record_id().as_str()) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

/// Accepts every well-formed record without contacting anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct DryRunGateway;

impl TransitionGateway for DryRunGateway {
    fn apply_transition(&self, request: &TransitionRequest) -> Result<(), GatewayError> {
        let t = request.transition();
        info!(
            entity = request.entity(),
            record = request.record_id().as_str(),
            state = t.state,
            status = t.status,
            "DRY RUN: would apply transition"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulkstate_core::{IdentifierSyntax, RecordId, TargetTransition};

    fn request(id: &str) -> TransitionRequest {
        TransitionRequest::new(
            "contact",
            RecordId::parse(id, IdentifierSyntax::Opaque).unwrap(),
            TargetTransition::new(1, 2),
        )
    }

    #[test]
    fn scripted_failures_and_call_log() {
        let gw = ScriptedGateway::new().fail("b", GatewayError::Rejected("locked record".into()));
        assert!(gw.apply_transition(&request("a")).is_ok());
        assert_eq!(
            gw.apply_transition(&request("b")),
            Err(GatewayError::Rejected("locked record".into()))
        );
        let calls = gw.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].record_id().as_str(), "a");
        assert_eq!(calls[1].record_id().as_str(), "b");
    }

    #[test]
    fn dry_run_accepts_everything() {
        assert!(DryRunGateway.apply_transition(&request("anything")).is_ok());
    }
}
