mod circuit;
mod window;

use item_gateway_circuitbreaker::OutcomeKind;
use proptest::prelude::*;

pub(crate) fn outcome_kind() -> impl Strategy<Value = OutcomeKind> {
    prop_oneof![
        Just(OutcomeKind::Success),
        Just(OutcomeKind::Failure),
        Just(OutcomeKind::SlowSuccess),
    ]
}
