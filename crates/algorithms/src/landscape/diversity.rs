//! Category diversity indices
//!
//! Both indices are information entropies over the categories found in a
//! zone; they differ only in how category proportions are weighted.

/// Shannon Diversity Index (H'), area-weighted
///
/// `H' = -sum(pi * ln(pi))` where `pi = ai / sum(a)` is the share of the
/// zone's landscape area covered by category i.
///
/// Categories with zero or non-finite weight contribute nothing. A zone with
/// a single category has H' = 0; a zone without any area has H' = 0.
pub fn shannon_diversity<I>(weights: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let weights: Vec<f64> = weights
        .into_iter()
        .filter(|w| w.is_finite() && *w > 0.0)
        .collect();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }

    let mut h = 0.0;
    for w in weights {
        let pi = w / total;
        if pi > 0.0 {
            h -= pi * pi.ln();
        }
    }
    h
}

/// Unit entropy (H), point-count-weighted
///
/// `H = -sum(qi * ln(qi))` with `qi = Nci / Ne`, where `Nci` is the number of
/// points of category i in the zone and `Ne` the zone's total point count.
/// With `Ne = 0` every `qi` is 0 and H = 0.
pub fn unit_entropy<I>(category_counts: I, ne: usize) -> f64
where
    I: IntoIterator<Item = usize>,
{
    if ne == 0 {
        return 0.0;
    }

    let ne = ne as f64;
    let mut h = 0.0;
    for count in category_counts {
        let qi = count as f64 / ne;
        if qi > 0.0 {
            h -= qi * qi.ln();
        }
    }
    h
}
