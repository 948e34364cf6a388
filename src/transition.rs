//! Two-haplotype recombination kernel between adjacent columns (spec §4.2).
//! Probabilities are carried in log space via `bio::stats::LogProb`, the
//! teacher crate's representation for every probability in `model/`
//! (`model/evidence/observation.rs`, `model/modes/generic.rs`), chosen per
//! spec §9's "deep precision" note over an 80-bit float.

use bio::stats::{LogProb, Prob};

/// Precomputed recombination-kernel values between two adjacent sites.
/// Only four distinct pair-transition values occur because the pair
/// transition is the product of two independent per-haplotype
/// transitions (spec §4.2).
#[derive(Debug, Clone, Copy)]
pub struct TransitionProbabilityComputer {
    p_stay: LogProb,
    p_switch: LogProb,
    both_stay: LogProb,
    one_switch: LogProb,
    both_switch: LogProb,
}

impl TransitionProbabilityComputer {
    /// Builds the computer for the gap between `prev_pos` and `cur_pos`
    /// under the given recombination rate (cM/Mb). `cur_pos == prev_pos`
    /// degenerates to `p_stay = 1` (spec §4.2 tie-break).
    pub fn new(prev_pos: u64, cur_pos: u64, recombination_rate: f64) -> Self {
        debug_assert!(cur_pos >= prev_pos);
        let distance_bp = cur_pos.saturating_sub(prev_pos) as f64;
        let d = distance_bp * recombination_rate * 1e-8;
        let p_stay = if d == 0.0 {
            Prob(1.0)
        } else {
            Prob(0.5 * (1.0 + (-d).exp()))
        };
        let p_stay = LogProb::from(p_stay);
        let p_switch = p_stay.ln_one_minus_exp();

        TransitionProbabilityComputer {
            p_stay,
            p_switch,
            both_stay: p_stay + p_stay,
            one_switch: p_stay + p_switch,
            both_switch: p_switch + p_switch,
        }
    }

    pub fn p_stay(&self) -> LogProb {
        self.p_stay
    }

    pub fn p_switch(&self) -> LogProb {
        self.p_switch
    }

    /// Pair transition between predecessor slots `(prev_i, prev_j)` and
    /// successor slots `(cur_i, cur_j)`. Path ids are compared for
    /// equality, never slot indices (spec §4.2: "Transitions never
    /// compare path_ids across sites as equal unless the path_ids are
    /// literally equal").
    pub fn transition(&self, prev_i: u32, prev_j: u32, cur_i: u32, cur_j: u32) -> LogProb {
        let i_stays = prev_i == cur_i;
        let j_stays = prev_j == cur_j;
        match (i_stays, j_stays) {
            (true, true) => self.both_stay,
            (false, false) => self.both_switch,
            _ => self.one_switch,
        }
    }
}
