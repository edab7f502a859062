use market::types::{InstrumentId, SubscriberId};

/// One subscription row: `subscriber` watches `instrument`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Watch {
    pub subscriber: SubscriberId,
    pub instrument: InstrumentId,
}

impl Watch {
    pub fn new(subscriber: SubscriberId, instrument: InstrumentId) -> Self {
        Self {
            subscriber,
            instrument,
        }
    }
}
