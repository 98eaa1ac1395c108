//! Sample submissions demonstrating the accepted shape of code blocks.
//!
//! `pop-density` is the canonical algorithm: a main script deriving from
//! `OPALAlgorithm` plus a privacy script deriving from `OPALPrivacy`.

use crate::algorithm::{AlgorithmSubmission, MainCodeSubmission, PrivacyCodeSubmission, ReducerKind};
use crate::codec::TransportCodec;
use crate::error::CoreError;
use crate::id::AlgoName;

/// Main algorithm source for `pop-density`.
pub const POP_DENSITY_SOURCE: &str = r#"import opalalgorithms.utils as utils
from opalalgorithms.core import OPALAlgorithm


class PopulationDensity(OPALAlgorithm):
    """Count users per home antenna."""

    def __init__(self):
        super(PopulationDensity, self).__init__()

    def map(self, params, bandicoot_user):
        # one vote per user for their home location
        home = bandicoot_user.recharges_home()
        return {str(home): 1}
"#;

/// Privacy script source for `pop-density`.
pub const DENSITY_PRIVACY_SOURCE: &str = r#"from opalalgorithms.core import OPALPrivacy


class Density(OPALPrivacy):
    """Drop buckets smaller than the configured threshold."""

    def __call__(self, params, result, salt):
        threshold = params.get("threshold", 10)
        return {k: v for k, v in result.items() if v >= threshold}
"#;

/// Builds the canonical `pop-density` submission.
///
/// `key` is placed in the privacy block; pass `None` to omit the block.
///
/// # Errors
/// Never fails for the built-in name; the `Result` is the name parser's.
pub fn pop_density_submission(
    codec: &dyn TransportCodec,
    key: Option<&str>,
) -> Result<AlgorithmSubmission, CoreError> {
    Ok(AlgorithmSubmission {
        algo_name: AlgoName::parse("pop-density")?,
        description: "Population density".to_owned(),
        algorithm: MainCodeSubmission {
            code: codec.encode(POP_DENSITY_SOURCE),
            class_name: "PopulationDensity".to_owned(),
            reducer: ReducerKind::Sum,
        },
        privacy_algorithm: key.map(|key| PrivacyCodeSubmission {
            code: codec.encode(DENSITY_PRIVACY_SOURCE),
            class_name: "Density".to_owned(),
            key: key.to_owned(),
        }),
    })
}
