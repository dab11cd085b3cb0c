use crate::errors::GatewayError;
use crate::model::TransitionRequest;

/// Narrow capability over the remote record service: change the state and
/// status of one record. Called once per well-formed identifier.
pub trait TransitionGateway: Send + Sync {
    fn apply_transition(&self, request: &TransitionRequest) -> Result<(), GatewayError>;
}

impl<T: TransitionGateway + ?Sized> TransitionGateway for Box<T> {
    fn apply_transition(&self, request: &TransitionRequest) -> Result<(), GatewayError> {
        (**self).apply_transition(request)
    }
}

impl<T: TransitionGateway + ?Sized> TransitionGateway for &T {
    fn apply_transition(&self, request: &TransitionRequest) -> Result<(), GatewayError> {
        (**self).apply_transition(request)
    }
}
