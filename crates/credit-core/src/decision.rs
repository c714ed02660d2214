use crate::{Decision, Zone};

impl Decision {
    /// Merge the Altman and Merton zones into one advisory decision.
    ///
    /// Any distress dominates; otherwise the decision degrades one step for
    /// each model that is only in the grey zone.
    pub fn from_zones(altman: Zone, merton: Zone) -> Self {
        match (altman, merton) {
            (Zone::Distress, _) | (_, Zone::Distress) => Decision::Dismissed,
            (Zone::Safe, Zone::Safe) => Decision::Approved,
            (Zone::Safe, Zone::Grey) | (Zone::Grey, Zone::Safe) => Decision::ApprovedWithCaution,
            (Zone::Grey, Zone::Grey) => Decision::AnalysisRequired,
        }
    }
}
