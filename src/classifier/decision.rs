//! The classification decision procedure, as pure functions over pass
//! outcomes.

use crate::domain::RegistrableDomain;
use crate::models::ClassificationResult;
use crate::prominence::ProminenceResult;
use crate::search::SearchedDomainSet;

/// Searched and prominent domains of one analysis pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassOutcome {
    pub searched: SearchedDomainSet,
    pub prominent: ProminenceResult,
}

impl PassOutcome {
    /// Whether the site's own domain came back from its own keywords.
    pub fn confirms(&self, own_domain: &RegistrableDomain) -> bool {
        own_domain.mld().is_some() && self.searched.contains(own_domain)
    }
}

/// Result of the first pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Final(ClassificationResult),
    /// Inconclusive on a credential-harvesting page: rerun with OCR text.
    Escalate,
}

/// Decide after the link/keyword pass.
///
/// The own domain appearing among searched domains is the strongest signal
/// of authenticity and wins outright. Pages with a password field escalate
/// when nothing prominent was found; pages without one settle for
/// "not phish".
pub fn decide_first_pass(
    own_domain: &RegistrableDomain,
    has_password_field: bool,
    pass: &PassOutcome,
) -> Decision {
    if pass.confirms(own_domain) {
        return Decision::Final(ClassificationResult::not_phish());
    }
    match (has_password_field, pass.prominent.is_empty()) {
        (true, false) => Decision::Final(ClassificationResult::phish(pass.prominent.clone())),
        (true, true) => Decision::Escalate,
        (false, false) => {
            Decision::Final(ClassificationResult::suspicious(pass.prominent.clone()))
        }
        (false, true) => Decision::Final(ClassificationResult::not_phish()),
    }
}

/// Decide after the OCR pass. Only reached for pages with a password field.
pub fn decide_escalated(own_domain: &RegistrableDomain, pass: &PassOutcome) -> ClassificationResult {
    if pass.confirms(own_domain) {
        ClassificationResult::not_phish()
    } else if !pass.prominent.is_empty() {
        ClassificationResult::phish(pass.prominent.clone())
    } else {
        ClassificationResult::suspicious(Default::default())
    }
}
