use crate::console::application::backend::BackendCall;
use crate::query::UrlParams;

/// A backend call tagged with the generation that requested it.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchPlan {
    pub id: u64,
    pub call: BackendCall,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    None,
    /// Abort whatever is in flight and start this call.
    Fetch(FetchPlan),
    /// Abort whatever is in flight.
    Cancel,
    /// Write the URL store; the driver feeds the change back as `UrlChanged`.
    PushUrl(UrlParams),
    /// Open these parameters in a new browsing context.
    OpenNavigation(UrlParams),
}
