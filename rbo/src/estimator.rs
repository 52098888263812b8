use crate::cancel::CancellationToken;
use crate::list::RankedList;
use crate::overlap::OverlapProfile;
use crate::{RboError, RboScore};

/// Compute all three RBO quantities for a pair of lists
///
/// `p` is the probability of looking at rank k + 1 after having examined rank k.
///
/// # Errors
/// - `RboError::Parameter` if `p` is outside [0, 1]
/// - `RboError::DegenerateInput` if either list is empty
pub fn rbo<A, B>(a: &A, b: &B, p: f64) -> Result<RboScore, RboError>
where
    A: RankedList + ?Sized,
    B: RankedList + ?Sized,
{
    rbo_with_cancel(a, b, p, &CancellationToken::new())
}

/// Same as [`rbo`], checking `cancel` before each of the three passes
pub fn rbo_with_cancel<A, B>(
    a: &A,
    b: &B,
    p: f64,
    cancel: &CancellationToken,
) -> Result<RboScore, RboError>
where
    A: RankedList + ?Sized,
    B: RankedList + ?Sized,
{
    validate(a, b, p)?;
    let profile = OverlapProfile::new(a, b, a.len().max(b.len()));

    let checkpoint = || match cancel.is_cancelled() {
        true => Err(RboError::Cancelled),
        false => Ok(()),
    };

    checkpoint()?;
    let min = min_bound(&profile, p, profile.short());
    checkpoint()?;
    let residual = residual(&profile, p);
    checkpoint()?;
    let extrapolated = extrapolated(&profile, p);

    Ok(RboScore {
        min,
        residual,
        extrapolated,
    })
}

/// Tight lower bound on RBO at `depth`
///
/// Formula: (1-p)/p * (Σ_{d=1}^{k} p^d/d * (X(d) - X(k)) - X(k) * ln(1-p))
///
/// `depth` defaults to the length of the shorter list when `None` or `Some(0)`.
pub fn rbo_min<A, B>(a: &A, b: &B, p: f64, depth: Option<usize>) -> Result<f64, RboError>
where
    A: RankedList + ?Sized,
    B: RankedList + ?Sized,
{
    validate(a, b, p)?;
    let depth = depth
        .filter(|depth| *depth > 0)
        .unwrap_or_else(|| a.len().min(b.len()));
    let profile = OverlapProfile::new(a, b, depth.max(a.len()).max(b.len()));
    Ok(min_bound(&profile, p, depth))
}

/// Upper bound on the overlap mass beyond the evaluated ranks
pub fn rbo_res<A, B>(a: &A, b: &B, p: f64) -> Result<f64, RboError>
where
    A: RankedList + ?Sized,
    B: RankedList + ?Sized,
{
    validate(a, b, p)?;
    let profile = OverlapProfile::new(a, b, a.len().max(b.len()));
    Ok(residual(&profile, p))
}

/// Point estimate extrapolating the observed overlap to infinite depth
pub fn rbo_ext<A, B>(a: &A, b: &B, p: f64) -> Result<f64, RboError>
where
    A: RankedList + ?Sized,
    B: RankedList + ?Sized,
{
    validate(a, b, p)?;
    let profile = OverlapProfile::new(a, b, a.len().max(b.len()));
    Ok(extrapolated(&profile, p))
}

fn validate<A, B>(a: &A, b: &B, p: f64) -> Result<(), RboError>
where
    A: RankedList + ?Sized,
    B: RankedList + ?Sized,
{
    // NaN fails the range check as well
    if !(0.0..=1.0).contains(&p) {
        return Err(RboError::Parameter(p));
    }
    if a.is_empty() {
        return Err(RboError::DegenerateInput(a.label().to_string()));
    }
    if b.is_empty() {
        return Err(RboError::DegenerateInput(b.label().to_string()));
    }
    Ok(())
}

/// (1-p)/p * p^d, written so that p = 0 is defined
fn weight(p: f64, d: usize) -> f64 {
    (1.0 - p) * p.powi(d as i32 - 1)
}

/// Σ_{d=from}^{to} weight(p, d) / d
fn harmonic(p: f64, from: usize, to: usize) -> f64 {
    (from.max(1)..=to).map(|d| weight(p, d) / d as f64).sum()
}

/// (1-p)/p * ln(1/(1-p)), continuous at both ends of [0, 1]
fn damped_log(p: f64) -> f64 {
    if p == 0.0 {
        1.0
    } else if p == 1.0 {
        0.0
    } else {
        (1.0 - p) * -(-p).ln_1p() / p
    }
}

fn min_bound(profile: &OverlapProfile, p: f64, depth: usize) -> f64 {
    let x_k = profile.overlap(depth);
    let sum: f64 = (1..=depth)
        .map(|d| weight(p, d) / d as f64 * (profile.overlap(d) - x_k))
        .sum();
    sum + x_k * damped_log(p)
}

fn residual(profile: &OverlapProfile, p: f64) -> f64 {
    let s = profile.short();
    let l = profile.long();
    let x_l = profile.overlap(l);
    // f = ceil(l + s - X(l)) with X(l) = 2|I|s / (s + l), kept in integers
    let f = l + s - (2 * profile.shared(l) * s) / (s + l);

    let term1 = s as f64 * harmonic(p, s + 1, f);
    let term2 = l as f64 * harmonic(p, l + 1, f);
    let term3 = x_l * (damped_log(p) - harmonic(p, 1, f));

    p.powi(s as i32) + p.powi(l as i32) - p.powi(f as i32) - (term1 + term2 + term3)
}

fn extrapolated(profile: &OverlapProfile, p: f64) -> f64 {
    let s = profile.short();
    let l = profile.long();
    let x_l = profile.overlap(l);
    let x_s = profile.overlap(s);

    let observed: f64 = (1..=l).map(|d| weight(p, d) * profile.agreement(d)).sum();
    let carried: f64 = (s + 1..=l)
        .map(|d| weight(p, d) * x_s * (d - s) as f64 / s as f64 / d as f64)
        .sum();
    let tail = p.powi(l as i32) * ((x_l - x_s) / l as f64 + x_s / s as f64);

    observed + carried + tail
}
