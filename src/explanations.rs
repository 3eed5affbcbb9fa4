//! Short help texts shown next to the algorithm and sampling strategy pickers.

use crate::session::{Algorithm, SamplingStrategy};

pub fn algorithm(algorithm: Algorithm) -> &'static str {
    match algorithm {
        Algorithm::McDropout => {
            "Monte Carlo dropout keeps dropout active at prediction time and averages \
             several stochastic forward passes. The spread between passes approximates \
             the model's uncertainty about a sample."
        }
    }
}

pub fn sampling(strategy: SamplingStrategy) -> &'static str {
    match strategy {
        SamplingStrategy::Random => {
            "Picks unlabeled samples uniformly at random. Useful as a reference curve \
             for the other strategies."
        }
        SamplingStrategy::MaxEntropy => {
            "Picks the samples whose averaged class probabilities have the highest \
             entropy, i.e. where the model is least sure which class applies."
        }
        SamplingStrategy::Bald => {
            "Bayesian Active Learning by Disagreement: picks samples where individual \
             dropout passes disagree most, measured as the mutual information between \
             prediction and model weights."
        }
        SamplingStrategy::VarRatio => {
            "Variation ratio: picks samples where the most frequent predicted class \
             across dropout passes wins the smallest share of votes."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_choice_has_an_explanation() {
        for strategy in SamplingStrategy::ALL {
            assert!(!sampling(strategy).is_empty());
        }
        assert!(!algorithm(Algorithm::McDropout).is_empty());
    }
}
